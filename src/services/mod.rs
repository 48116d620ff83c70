/// Business logic services bridging HTTP handlers and the database.
///
/// Each service owns one aggregate, validates its requests with
/// `validator`, runs multi-row writes in a transaction, and emits an
/// [`crate::events::Event`] after every committed mutation.
pub mod analytics;
pub mod carts;
pub mod categories;
pub mod clients;
pub mod orders;
pub mod products;
pub mod quotations;
pub mod suppliers;
pub mod whatsapp;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Shared `validator` hook for money fields. Zero is allowed, negative
/// amounts never are.
pub(crate) fn validate_non_negative_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        let mut err = ValidationError::new("negative_price");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}
