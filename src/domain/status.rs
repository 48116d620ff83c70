use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle states of an order.
///
/// The sequence is fixed: `pendiente → enproceso → enviado → entregado_pp →
/// entregado_pr`. `cancelado` sits outside the sequence and is absorbing.
/// Keys are the Spanish wire vocabulary the storefront has always used.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pendiente,
    Enproceso,
    Enviado,
    EntregadoPp,
    EntregadoPr,
    Cancelado,
}

impl OrderStatus {
    /// Next state in the fulfillment sequence, or `None` once terminal.
    pub fn advance(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pendiente => Some(OrderStatus::Enproceso),
            OrderStatus::Enproceso => Some(OrderStatus::Enviado),
            OrderStatus::Enviado => Some(OrderStatus::EntregadoPp),
            OrderStatus::EntregadoPp => Some(OrderStatus::EntregadoPr),
            OrderStatus::EntregadoPr | OrderStatus::Cancelado => None,
        }
    }

    /// Cancellation is only open while the order has not shipped.
    pub fn can_cancel(self) -> bool {
        matches!(self, OrderStatus::Pendiente | OrderStatus::Enproceso)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::EntregadoPr | OrderStatus::Cancelado)
    }

    /// Both delivered states count as a completed sale in reporting.
    pub fn is_delivered(self) -> bool {
        matches!(self, OrderStatus::EntregadoPp | OrderStatus::EntregadoPr)
    }

    /// Line items may be replaced until the order reaches a terminal state.
    pub fn allows_item_edit(self) -> bool {
        !self.is_terminal()
    }

    /// Parses a persisted status key. Unknown keys stay unparsed so callers
    /// can surface them verbatim instead of failing the whole row.
    pub fn from_key(key: &str) -> Option<OrderStatus> {
        key.parse().ok()
    }

    /// Spanish display label used by dashboards and outbound messages.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "Pendiente",
            OrderStatus::Enproceso => "En proceso",
            OrderStatus::Enviado => "Enviado",
            OrderStatus::EntregadoPp => "Entregado (pago pendiente)",
            OrderStatus::EntregadoPr => "Entregado (pago realizado)",
            OrderStatus::Cancelado => "Cancelado",
        }
    }
}

/// Lifecycle states of a quotation.
///
/// A pending quotation resolves to exactly one of `aceptada`, `rechazada` or
/// `anulada`. Converting an accepted quotation into an order moves it to
/// `pedido_generado`, after which the record is read-only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotationStatus {
    Pendiente,
    Aceptada,
    Rechazada,
    Anulada,
    PedidoGenerado,
}

impl QuotationStatus {
    /// The three manual outcomes a staff member can pick for a pending
    /// quotation. `pedido_generado` is never one of them.
    pub fn is_resolution(self) -> bool {
        matches!(
            self,
            QuotationStatus::Aceptada | QuotationStatus::Rechazada | QuotationStatus::Anulada
        )
    }

    pub fn can_resolve_to(self, next: QuotationStatus) -> bool {
        self == QuotationStatus::Pendiente && next.is_resolution()
    }

    /// Only accepted quotations can generate an order.
    pub fn can_convert(self) -> bool {
        self == QuotationStatus::Aceptada
    }

    /// Frozen quotations reject edits, deletion, and further resolution.
    pub fn is_frozen(self) -> bool {
        self == QuotationStatus::PedidoGenerado
    }

    pub fn from_key(key: &str) -> Option<QuotationStatus> {
        key.parse().ok()
    }

    pub fn label(self) -> &'static str {
        match self {
            QuotationStatus::Pendiente => "Pendiente",
            QuotationStatus::Aceptada => "Aceptada",
            QuotationStatus::Rechazada => "Rechazada",
            QuotationStatus::Anulada => "Anulada",
            QuotationStatus::PedidoGenerado => "Pedido generado",
        }
    }
}

/// Display label for a raw order status key. Keys outside the known set pass
/// through untranslated.
pub fn order_status_label(key: &str) -> String {
    match OrderStatus::from_key(key) {
        Some(status) => status.label().to_string(),
        None => key.to_string(),
    }
}

/// Display label for a raw quotation status key, unknown keys verbatim.
pub fn quotation_status_label(key: &str) -> String {
    match QuotationStatus::from_key(key) {
        Some(status) => status.label().to_string(),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(OrderStatus::Pendiente => Some(OrderStatus::Enproceso))]
    #[test_case(OrderStatus::Enproceso => Some(OrderStatus::Enviado))]
    #[test_case(OrderStatus::Enviado => Some(OrderStatus::EntregadoPp))]
    #[test_case(OrderStatus::EntregadoPp => Some(OrderStatus::EntregadoPr))]
    #[test_case(OrderStatus::EntregadoPr => None)]
    #[test_case(OrderStatus::Cancelado => None)]
    fn advance_follows_the_fixed_sequence(status: OrderStatus) -> Option<OrderStatus> {
        status.advance()
    }

    #[test]
    fn cancellation_only_before_shipping() {
        assert!(OrderStatus::Pendiente.can_cancel());
        assert!(OrderStatus::Enproceso.can_cancel());
        assert!(!OrderStatus::Enviado.can_cancel());
        assert!(!OrderStatus::EntregadoPp.can_cancel());
        assert!(!OrderStatus::EntregadoPr.can_cancel());
        assert!(!OrderStatus::Cancelado.can_cancel());
    }

    #[test]
    fn advance_never_reaches_cancelado() {
        let mut status = OrderStatus::Pendiente;
        while let Some(next) = status.advance() {
            assert_ne!(next, OrderStatus::Cancelado);
            status = next;
        }
        assert_eq!(status, OrderStatus::EntregadoPr);
    }

    #[test]
    fn status_keys_round_trip() {
        for key in [
            "pendiente",
            "enproceso",
            "enviado",
            "entregado_pp",
            "entregado_pr",
            "cancelado",
        ] {
            let status = OrderStatus::from_key(key).expect(key);
            assert_eq!(status.to_string(), key);
        }
        assert_eq!(OrderStatus::from_key("despachado"), None);
    }

    #[test]
    fn unknown_keys_render_verbatim() {
        assert_eq!(order_status_label("pendiente"), "Pendiente");
        assert_eq!(order_status_label("entregado_pp"), "Entregado (pago pendiente)");
        assert_eq!(order_status_label("legacy_status"), "legacy_status");
        assert_eq!(quotation_status_label("misterioso"), "misterioso");
    }

    #[test_case(QuotationStatus::Aceptada => true)]
    #[test_case(QuotationStatus::Rechazada => true)]
    #[test_case(QuotationStatus::Anulada => true)]
    #[test_case(QuotationStatus::Pendiente => false)]
    #[test_case(QuotationStatus::PedidoGenerado => false)]
    fn resolution_outcomes(status: QuotationStatus) -> bool {
        status.is_resolution()
    }

    #[test]
    fn quotation_resolution_only_from_pendiente() {
        assert!(QuotationStatus::Pendiente.can_resolve_to(QuotationStatus::Aceptada));
        assert!(QuotationStatus::Pendiente.can_resolve_to(QuotationStatus::Rechazada));
        assert!(QuotationStatus::Pendiente.can_resolve_to(QuotationStatus::Anulada));
        assert!(!QuotationStatus::Pendiente.can_resolve_to(QuotationStatus::PedidoGenerado));
        assert!(!QuotationStatus::Aceptada.can_resolve_to(QuotationStatus::Rechazada));
        assert!(!QuotationStatus::PedidoGenerado.can_resolve_to(QuotationStatus::Anulada));
    }

    #[test]
    fn conversion_gates() {
        assert!(QuotationStatus::Aceptada.can_convert());
        assert!(!QuotationStatus::Pendiente.can_convert());
        assert!(!QuotationStatus::Rechazada.can_convert());
        assert!(!QuotationStatus::PedidoGenerado.can_convert());
        assert!(QuotationStatus::PedidoGenerado.is_frozen());
    }
}
