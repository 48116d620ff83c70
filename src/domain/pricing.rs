use rust_decimal::Decimal;

/// Quantity at which the wholesale tier kicks in for products that do not
/// set their own threshold.
pub const DEFAULT_MIN_WHOLESALE_QTY: i32 = 10;

/// Picks the applicable price tier for a quantity.
///
/// At or above the wholesale threshold the wholesale price applies, below it
/// the retail unit price does. The resolver assumes a validated positive
/// quantity; callers clamp user input before reaching it.
pub fn resolve_unit_price(
    unit_price: Decimal,
    wholesale_price: Decimal,
    min_wholesale_qty: Option<i32>,
    quantity: i32,
) -> Decimal {
    if quantity >= min_wholesale_qty.unwrap_or(DEFAULT_MIN_WHOLESALE_QTY) {
        wholesale_price
    } else {
        unit_price
    }
}

/// Resolved tier price times quantity. No rounding; display formatting is a
/// presentation concern.
pub fn line_subtotal(
    unit_price: Decimal,
    wholesale_price: Decimal,
    min_wholesale_qty: Option<i32>,
    quantity: i32,
) -> Decimal {
    resolve_unit_price(unit_price, wholesale_price, min_wholesale_qty, quantity)
        * Decimal::from(quantity)
}

/// Sum of already-resolved line subtotals. Zero for an empty set.
pub fn lines_total<I>(subtotals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    subtotals.into_iter().sum()
}

/// Profit of the sale price over the cost price, as a percentage. A zero or
/// missing cost yields zero rather than dividing by it.
pub fn margin_percent(sale_price: Decimal, cost_price: Decimal) -> Decimal {
    if cost_price > Decimal::ZERO {
        (sale_price - cost_price) / cost_price * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Sale price implied by a cost price and a margin percentage. This is the
/// single place quotation unit prices are derived from the
/// `precio_compra`/`margen` pair.
pub fn sale_price_from_margin(cost_price: Decimal, margin: Decimal) -> Decimal {
    cost_price * (Decimal::ONE + margin / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn below_threshold_uses_retail_price() {
        assert_eq!(
            resolve_unit_price(dec!(10.00), dec!(8.00), Some(10), 9),
            dec!(10.00)
        );
        assert_eq!(
            line_subtotal(dec!(10.00), dec!(8.00), Some(10), 9),
            dec!(90.00)
        );
    }

    #[test]
    fn at_threshold_uses_wholesale_price() {
        assert_eq!(
            resolve_unit_price(dec!(10.00), dec!(8.00), Some(10), 10),
            dec!(8.00)
        );
        assert_eq!(
            line_subtotal(dec!(10.00), dec!(8.00), Some(10), 10),
            dec!(80.00)
        );
    }

    #[test]
    fn missing_threshold_defaults_to_ten() {
        assert_eq!(
            resolve_unit_price(dec!(5.50), dec!(4.75), None, 9),
            dec!(5.50)
        );
        assert_eq!(
            resolve_unit_price(dec!(5.50), dec!(4.75), None, 10),
            dec!(4.75)
        );
    }

    #[test]
    fn lines_total_sums_and_defaults_to_zero() {
        assert_eq!(lines_total(Vec::new()), Decimal::ZERO);
        assert_eq!(
            lines_total(vec![dec!(90.00), dec!(80.00), dec!(12.50)]),
            dec!(182.50)
        );
    }

    #[test]
    fn margin_pair_round_trips() {
        assert_eq!(sale_price_from_margin(dec!(50), dec!(20)), dec!(60.00));
        assert_eq!(sale_price_from_margin(dec!(40), dec!(20)), dec!(48.00));
        assert_eq!(margin_percent(dec!(60), dec!(50)), dec!(20));
        assert_eq!(margin_percent(dec!(48), dec!(40)), dec!(20));
    }

    #[test]
    fn zero_cost_margin_is_zero() {
        assert_eq!(margin_percent(dec!(10), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(sale_price_from_margin(Decimal::ZERO, dec!(35)), Decimal::ZERO);
    }
}
