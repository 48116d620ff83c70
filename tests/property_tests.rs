//! Property-based tests for the pricing and status rules.
//!
//! These exercise the pure domain functions across generated inputs to
//! catch boundary mistakes the example-based tests would miss.

use proptest::prelude::*;
use rust_decimal::Decimal;

use distriplast_api::domain::pricing;
use distriplast_api::domain::status::{OrderStatus, QuotationStatus};
use distriplast_api::services::whatsapp;

// Input strategies
fn money_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn margin_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=30_000).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn quantity_strategy() -> impl Strategy<Value = i32> {
    1i32..=5_000
}

fn threshold_strategy() -> impl Strategy<Value = Option<i32>> {
    prop_oneof![Just(None), (1i32..=500).prop_map(Some)]
}

fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pendiente),
        Just(OrderStatus::Enproceso),
        Just(OrderStatus::Enviado),
        Just(OrderStatus::EntregadoPp),
        Just(OrderStatus::EntregadoPr),
        Just(OrderStatus::Cancelado),
    ]
}

fn quotation_status_strategy() -> impl Strategy<Value = QuotationStatus> {
    prop_oneof![
        Just(QuotationStatus::Pendiente),
        Just(QuotationStatus::Aceptada),
        Just(QuotationStatus::Rechazada),
        Just(QuotationStatus::Anulada),
        Just(QuotationStatus::PedidoGenerado),
    ]
}

// Property: tier resolution never invents a price
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn resolved_price_is_one_of_the_two_tiers(
        unit in money_strategy(),
        wholesale in money_strategy(),
        min in threshold_strategy(),
        qty in quantity_strategy(),
    ) {
        let price = pricing::resolve_unit_price(unit, wholesale, min, qty);
        prop_assert!(
            price == unit || price == wholesale,
            "Resolved price {} is neither tier", price
        );
    }

    #[test]
    fn wholesale_applies_exactly_at_the_threshold(
        unit in money_strategy(),
        wholesale in money_strategy(),
        min in 1i32..=500,
        qty in quantity_strategy(),
    ) {
        let price = pricing::resolve_unit_price(unit, wholesale, Some(min), qty);
        if qty >= min {
            prop_assert_eq!(price, wholesale);
        } else {
            prop_assert_eq!(price, unit);
        }
    }

    #[test]
    fn missing_threshold_behaves_like_the_default(
        unit in money_strategy(),
        wholesale in money_strategy(),
        qty in quantity_strategy(),
    ) {
        let implicit = pricing::resolve_unit_price(unit, wholesale, None, qty);
        let explicit = pricing::resolve_unit_price(
            unit,
            wholesale,
            Some(pricing::DEFAULT_MIN_WHOLESALE_QTY),
            qty,
        );
        prop_assert_eq!(implicit, explicit);
    }

    #[test]
    fn subtotal_is_resolved_price_times_quantity(
        unit in money_strategy(),
        wholesale in money_strategy(),
        min in threshold_strategy(),
        qty in quantity_strategy(),
    ) {
        let subtotal = pricing::line_subtotal(unit, wholesale, min, qty);
        let price = pricing::resolve_unit_price(unit, wholesale, min, qty);
        prop_assert_eq!(subtotal, price * Decimal::from(qty));
    }
}

// Property: margin math round-trips without drift
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn margin_survives_the_round_trip(
        cost in money_strategy(),
        margin in margin_strategy(),
    ) {
        let sale = pricing::sale_price_from_margin(cost, margin);
        prop_assert_eq!(pricing::margin_percent(sale, cost), margin);
    }

    #[test]
    fn non_negative_margins_never_sell_below_cost(
        cost in money_strategy(),
        margin in margin_strategy(),
    ) {
        let sale = pricing::sale_price_from_margin(cost, margin);
        prop_assert!(sale >= cost, "Sale {} fell below cost {}", sale, cost);
    }
}

// Property: the order status machine is a short straight line
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn advancing_always_terminates(status in order_status_strategy()) {
        let mut current = status;
        let mut hops = 0;
        while let Some(next) = current.advance() {
            prop_assert_ne!(next, OrderStatus::Cancelado, "Advance must never cancel");
            current = next;
            hops += 1;
            prop_assert!(hops <= 5, "Advance chain did not terminate");
        }
        prop_assert!(current.is_terminal());
    }

    #[test]
    fn order_status_keys_round_trip(status in order_status_strategy()) {
        let key = status.to_string();
        prop_assert!(
            key.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
            "Key {} is not a lowercase identifier", key
        );
        prop_assert_eq!(OrderStatus::from_key(&key), Some(status));
    }

    #[test]
    fn cancellable_orders_are_still_open(status in order_status_strategy()) {
        if status.can_cancel() {
            prop_assert!(!status.is_terminal());
            prop_assert!(!status.is_delivered());
        }
        prop_assert_eq!(status.allows_item_edit(), !status.is_terminal());
    }
}

// Property: quotation resolution and conversion stay disjoint
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn resolution_only_leaves_pending(
        from in quotation_status_strategy(),
        to in quotation_status_strategy(),
    ) {
        if from.can_resolve_to(to) {
            prop_assert_eq!(from, QuotationStatus::Pendiente);
            prop_assert!(to.is_resolution());
        }
        if from == QuotationStatus::Pendiente && to.is_resolution() {
            prop_assert!(from.can_resolve_to(to));
        }
    }

    #[test]
    fn frozen_quotations_never_convert(status in quotation_status_strategy()) {
        prop_assert!(!(status.is_frozen() && status.can_convert()));
        let key = status.to_string();
        prop_assert_eq!(QuotationStatus::from_key(&key), Some(status));
    }
}

// Property: phone normalization produces dialable digits
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn normalized_phones_contain_only_digits(raw in "[0-9 ()+-]{0,20}") {
        let normalized = whatsapp::normalize_phone(&raw, "51");
        prop_assert!(
            normalized.chars().all(|c| c.is_ascii_digit()),
            "Normalized phone {} has non-digits", normalized
        );
    }

    #[test]
    fn nine_digit_numbers_gain_the_country_code(digits in "[0-9]{9}") {
        let normalized = whatsapp::normalize_phone(&digits, "51");
        prop_assert_eq!(normalized, format!("51{}", digits));
    }
}
