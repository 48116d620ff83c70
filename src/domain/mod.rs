/// Pure business rules shared by services and handlers.
///
/// Nothing in this module touches the database or the network; everything is
/// a plain function over values so the pricing, workflow, and reporting rules
/// stay unit-testable without a running store.
pub mod pricing;
pub mod reports;
pub mod status;
