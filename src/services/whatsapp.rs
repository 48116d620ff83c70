use crate::entities::{
    order::Model as OrderModel, order_item::Model as OrderItemModel,
    quotation::Model as QuotationModel, quotation_item::Model as QuotationItemModel,
};
use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Prefilled chat link for an order or quotation summary.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WhatsAppLinkResponse {
    /// International phone number in digits-only form.
    pub phone: String,
    /// Ready-to-open `https://wa.me/...` URL.
    pub url: String,
    /// The plain-text message carried in the link.
    pub message: String,
}

/// Reduces a stored phone number to international digits. Local nine-digit
/// mobile numbers get the configured country code prepended.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 9 {
        format!("{}{}", country_code, digits)
    } else {
        digits
    }
}

/// Builds a `wa.me` link carrying `message` as the prefilled text.
pub fn build_link(
    raw_phone: &str,
    country_code: &str,
    message: &str,
) -> Result<WhatsAppLinkResponse, ServiceError> {
    let phone = normalize_phone(raw_phone, country_code);
    if phone.is_empty() {
        return Err(ServiceError::ValidationError(
            "Phone number contains no digits".to_string(),
        ));
    }

    let mut url = Url::parse(&format!("https://wa.me/{}", phone)).map_err(|e| {
        ServiceError::InternalError(format!("Failed to build WhatsApp URL: {}", e))
    })?;
    url.query_pairs_mut().append_pair("text", message);

    Ok(WhatsAppLinkResponse {
        phone,
        url: url.into(),
        message: message.to_string(),
    })
}

/// Summary text sent to the client for an order.
pub fn order_message(order: &OrderModel, items: &[OrderItemModel]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 3);
    lines.push(format!(
        "Hola {}, le compartimos el detalle de su pedido {}:",
        order.client_name, order.order_number
    ));
    for item in items {
        lines.push(format!(
            "- {} x {} = S/ {}",
            item.quantity,
            item.product_name,
            item.subtotal.round_dp(2)
        ));
    }
    lines.push(format!("Total: S/ {}", order.total.round_dp(2)));
    lines.push("Gracias por su preferencia.".to_string());
    lines.join("\n")
}

/// Summary text sent to the client for a quotation.
pub fn quotation_message(quotation: &QuotationModel, items: &[QuotationItemModel]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 3);
    lines.push(format!(
        "Hola {}, le enviamos su cotización {}:",
        quotation.client_name, quotation.quotation_number
    ));
    for item in items {
        lines.push(format!(
            "- {} x {} a S/ {} c/u = S/ {}",
            item.quantity,
            item.product_name,
            item.precio_unitario.round_dp(2),
            item.subtotal.round_dp(2)
        ));
    }
    lines.push(format!("Total: S/ {}", quotation.total.round_dp(2)));
    if let Some(valid_until) = quotation.valid_until {
        lines.push(format!(
            "Cotización válida hasta el {}.",
            valid_until.format("%d/%m/%Y")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_order() -> (OrderModel, Vec<OrderItemModel>) {
        let order_id = Uuid::new_v4();
        let order = OrderModel {
            id: order_id,
            order_number: "PED-0007".to_string(),
            client_id: None,
            client_name: "María Torres".to_string(),
            client_email: None,
            client_phone: Some("987 654 321".to_string()),
            status: "pendiente".to_string(),
            total: dec!(125.00),
            source_quotation_id: None,
            notes: None,
            cancelado_en: None,
            motivo_cancelacion: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let items = vec![OrderItemModel {
            id: Uuid::new_v4(),
            order_id,
            product_code: "BAL-20".to_string(),
            product_name: "Balde industrial 20L".to_string(),
            quantity: 5,
            unit_price: dec!(25.00),
            cost_price: None,
            subtotal: dec!(125.00),
            position: 0,
            created_at: Utc::now(),
        }];
        (order, items)
    }

    #[test]
    fn nine_digit_numbers_get_country_code() {
        assert_eq!(normalize_phone("987 654 321", "51"), "51987654321");
        assert_eq!(normalize_phone("987-654-321", "51"), "51987654321");
    }

    #[test]
    fn full_international_numbers_pass_through() {
        assert_eq!(normalize_phone("+51 987 654 321", "51"), "51987654321");
        assert_eq!(normalize_phone("5491122334455", "51"), "5491122334455");
    }

    #[test]
    fn empty_phone_is_rejected() {
        let err = build_link("sin teléfono", "51", "hola");
        assert_matches!(err, Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn link_carries_encoded_message() {
        let link = build_link("987654321", "51", "Hola María, su pedido").unwrap();
        assert_eq!(link.phone, "51987654321");
        assert!(link.url.starts_with("https://wa.me/51987654321?text="));

        let parsed = Url::parse(&link.url).unwrap();
        let text = parsed
            .query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(text, "Hola María, su pedido");
    }

    #[test]
    fn order_message_lists_lines_and_total() {
        let (order, items) = sample_order();
        let message = order_message(&order, &items);
        assert!(message.contains("PED-0007"));
        assert!(message.contains("María Torres"));
        assert!(message.contains("5 x Balde industrial 20L = S/ 125.00"));
        assert!(message.contains("Total: S/ 125.00"));
    }

    #[test]
    fn quotation_message_includes_validity_when_set() {
        let quotation_id = Uuid::new_v4();
        let quotation = QuotationModel {
            id: quotation_id,
            quotation_number: "COT-0003".to_string(),
            client_id: None,
            client_name: "Constructora Andina".to_string(),
            client_email: None,
            client_phone: Some("912345678".to_string()),
            status: "pendiente".to_string(),
            total: dec!(480.00),
            generated_order_id: None,
            notes: None,
            valid_until: Some("2024-03-31T00:00:00Z".parse().unwrap()),
            created_at: Utc::now(),
            updated_at: None,
        };
        let items = vec![QuotationItemModel {
            id: Uuid::new_v4(),
            quotation_id,
            product_code: "TUB-110".to_string(),
            product_name: "Tubo PVC 110mm".to_string(),
            quantity: 10,
            precio_compra: dec!(40.00),
            margen: dec!(20),
            precio_unitario: dec!(48.00),
            subtotal: dec!(480.00),
            position: 0,
            created_at: Utc::now(),
        }];

        let message = quotation_message(&quotation, &items);
        assert!(message.contains("COT-0003"));
        assert!(message.contains("10 x Tubo PVC 110mm a S/ 48.00 c/u = S/ 480.00"));
        assert!(message.contains("válida hasta el 31/03/2024"));
    }
}
