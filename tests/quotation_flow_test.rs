//! Quotation lifecycle coverage: margin pricing at capture time, manual
//! resolution, conversion into an order, and the frozen state that follows.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use test_case::test_case;

fn quotation_payload(client_name: &str, phone: Option<&str>) -> Value {
    json!({
        "client_name": client_name,
        "client_phone": phone,
        "items": [
            {
                "product_code": "CAJ-60L",
                "product_name": "Caja organizadora 60L",
                "quantity": 2,
                "precio_compra": "50.00",
                "margen": "20"
            },
            {
                "product_code": "VAS-05L",
                "product_name": "Vaso medidor 0.5L",
                "quantity": 10,
                "precio_compra": "4.00",
                "margen": "25"
            }
        ]
    })
}

async fn create_quotation(app: &TestApp) -> String {
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/quotations",
            Some(quotation_payload("Rosa Díaz", Some("987654321"))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"]
        .as_str()
        .expect("quotation id")
        .to_string()
}

async fn resolve(app: &TestApp, id: &str, outcome: &str) -> (StatusCode, Value) {
    app.request_json(
        Method::POST,
        &format!("/api/v1/quotations/{}/resolve", id),
        Some(json!({ "outcome": outcome })),
    )
    .await
}

#[tokio::test]
async fn quotations_price_lines_from_cost_and_margin() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/quotations",
            Some(quotation_payload("Rosa Díaz", Some("987654321"))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));

    let quotation = &body["data"];
    assert_eq!(quotation["quotation_number"], "COT-0001");
    assert_eq!(quotation["status"], "pendiente");
    assert_eq!(quotation["status_label"], "Pendiente");
    assert_eq!(decimal_field(quotation, "total"), dec!(170));
    assert!(quotation["generated_order_id"].is_null());

    let items = quotation["items"].as_array().expect("quotation items");
    assert_eq!(items.len(), 2);
    assert_eq!(decimal_field(&items[0], "precio_unitario"), dec!(60));
    assert_eq!(decimal_field(&items[0], "subtotal"), dec!(120));
    assert_eq!(decimal_field(&items[1], "precio_unitario"), dec!(5));
    assert_eq!(decimal_field(&items[1], "subtotal"), dec!(50));

    let (_, body) = app
        .request_json(
            Method::POST,
            "/api/v1/quotations",
            Some(quotation_payload("Luis Paredes", None)),
        )
        .await;
    assert_eq!(body["data"]["quotation_number"], "COT-0002");
}

#[tokio::test]
async fn quotations_do_not_require_contact_details() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/quotations",
            Some(quotation_payload("Cliente de mostrador", None)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn omitted_cost_and_margin_default_to_zero() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/quotations",
            Some(json!({
                "client_name": "Aún sin costos",
                "items": [
                    {
                        "product_code": "BAL-20L",
                        "product_name": "Balde industrial 20L",
                        "quantity": 3
                    }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item = &body["data"]["items"][0];
    assert_eq!(decimal_field(item, "precio_compra"), dec!(0));
    assert_eq!(decimal_field(item, "margen"), dec!(0));
    assert_eq!(decimal_field(item, "precio_unitario"), dec!(0));
    assert_eq!(decimal_field(&body["data"], "total"), dec!(0));
}

#[tokio::test]
async fn resolution_only_accepts_manual_outcomes_from_pending() {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;

    let (status, body) = resolve(&app, &id, "perdida").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("Unknown quotation outcome"));

    let (status, body) = resolve(&app, &id, "pedido_generado").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("not a manual resolution"));

    let (status, body) = resolve(&app, &id, "aceptada").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "aceptada");
    assert_eq!(body["data"]["status_label"], "Aceptada");

    // Resolution is single-shot.
    let (status, body) = resolve(&app, &id, "rechazada").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("cannot be resolved"));
}

#[tokio::test]
async fn conversion_copies_lines_into_a_pending_order() {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/quotations/{}/convert", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("Only accepted quotations"));

    resolve(&app, &id, "aceptada").await;
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/quotations/{}/convert", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let order = &body["data"];
    assert_eq!(order["order_number"], "PED-0001");
    assert_eq!(order["status"], "pendiente");
    assert_eq!(order["source_quotation_id"].as_str(), Some(id.as_str()));
    assert_eq!(order["client_name"], "Rosa Díaz");
    assert_eq!(decimal_field(order, "total"), dec!(170));

    let items = order["items"].as_array().expect("order items");
    assert_eq!(decimal_field(&items[0], "unit_price"), dec!(60));
    assert_eq!(decimal_field(&items[0], "cost_price"), dec!(50));
    assert_eq!(decimal_field(&items[0], "subtotal"), dec!(120));

    let order_id = order["id"].as_str().expect("order id").to_string();
    let (_, body) = app
        .request_json(Method::GET, &format!("/api/v1/quotations/{}", id), None)
        .await;
    assert_eq!(body["data"]["status"], "pedido_generado");
    assert_eq!(body["data"]["status_label"], "Pedido generado");
    assert_eq!(
        body["data"]["generated_order_id"].as_str(),
        Some(order_id.as_str())
    );

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/quotations/{}/convert", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("already converted"));
}

#[test_case("rechazada")]
#[test_case("anulada")]
#[tokio::test]
async fn closed_quotations_cannot_convert(outcome: &str) {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;
    let (status, _) = resolve(&app, &id, outcome).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/quotations/{}/convert", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains(outcome));
}

#[tokio::test]
async fn converted_quotations_are_frozen() {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;
    resolve(&app, &id, "aceptada").await;
    app.request_json(
        Method::POST,
        &format!("/api/v1/quotations/{}/convert", id),
        None,
    )
    .await;

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/quotations/{}", id),
            Some(json!({ "notes": "ajuste tardío" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("can no longer be modified"));

    let (status, _) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/quotations/{}/items", id),
            Some(json!({
                "items": [
                    {
                        "product_code": "X",
                        "product_name": "X",
                        "quantity": 1,
                        "precio_compra": "1.00",
                        "margen": "0"
                    }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/v1/quotations/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replacing_items_reprices_the_quotation() {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/quotations/{}/items", id),
            Some(json!({
                "items": [
                    {
                        "product_code": "BID-10L",
                        "product_name": "Bidón con caño 10L",
                        "quantity": 3,
                        "precio_compra": "100.00",
                        "margen": "10"
                    },
                    {
                        "product_code": "JAR-2L",
                        "product_name": "Jarra 2L",
                        "quantity": 1,
                        "precio_compra": "8.00",
                        "margen": "0"
                    }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let items = body["data"]["items"].as_array().expect("quotation items");
    assert_eq!(decimal_field(&items[0], "precio_unitario"), dec!(110));
    // Zero margin sells at cost.
    assert_eq!(decimal_field(&items[1], "precio_unitario"), dec!(8));
    assert_eq!(decimal_field(&body["data"], "total"), dec!(338));
}

#[tokio::test]
async fn header_updates_leave_items_untouched() {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/quotations/{}", id),
            Some(json!({
                "notes": "entrega en obra",
                "client_phone": "912345678"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], "entrega en obra");
    assert_eq!(body["data"]["client_phone"], "912345678");
    assert_eq!(body["data"]["items"].as_array().expect("items").len(), 2);
    assert_eq!(decimal_field(&body["data"], "total"), dec!(170));

    let (status, _) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/quotations/{}", id),
            Some(json!({ "client_name": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whatsapp_link_carries_the_quotation_summary() {
    let app = TestApp::new().await;

    let mut payload = quotation_payload("Rosa Díaz", Some("987 654 321"));
    payload["valid_until"] = json!("2026-12-31T00:00:00Z");
    let (_, body) = app
        .request_json(Method::POST, "/api/v1/quotations", Some(payload))
        .await;
    let id = body["data"]["id"].as_str().expect("quotation id");

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/quotations/{}/whatsapp-link", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "51987654321");
    assert!(body["data"]["url"]
        .as_str()
        .expect("link url")
        .starts_with("https://wa.me/51987654321?text="));
    let message = body["data"]["message"].as_str().expect("link message");
    assert!(message.contains("COT-0001"));
    assert!(message.contains("Rosa Díaz"));
}

#[tokio::test]
async fn pending_quotations_can_be_deleted() {
    let app = TestApp::new().await;
    let id = create_quotation(&app).await;

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/v1/quotations/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/quotations/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}
