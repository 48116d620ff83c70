//! End-to-end coverage of the order workflow: creation, the fixed status
//! chain, cancellation, line replacement, and the WhatsApp handoff.

mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn order_payload(client_name: &str, phone: Option<&str>, email: Option<&str>) -> Value {
    json!({
        "client_name": client_name,
        "client_phone": phone,
        "client_email": email,
        "items": [
            {
                "product_code": "BAL-20L",
                "product_name": "Balde industrial 20L",
                "quantity": 4,
                "unit_price": "18.90"
            },
            {
                "product_code": "TAP-3L",
                "product_name": "Taper hermético 3L",
                "quantity": 2,
                "unit_price": "7.50",
                "cost_price": "5.00"
            }
        ]
    })
}

async fn create_order(app: &TestApp) -> String {
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("María Torres", Some("987654321"), None)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().expect("order id").to_string()
}

async fn advance(app: &TestApp, id: &str) -> (StatusCode, Value) {
    app.request_json(
        Method::POST,
        &format!("/api/v1/orders/{}/advance", id),
        None,
    )
    .await
}

#[tokio::test]
async fn orders_start_pending_with_sequential_numbers() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("María Torres", Some("987654321"), None)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert!(body["meta"]["request_id"].is_string());

    let order = &body["data"];
    assert_eq!(order["order_number"], "PED-0001");
    assert_eq!(order["status"], "pendiente");
    assert_eq!(order["status_label"], "Pendiente");
    assert_eq!(decimal_field(order, "total"), dec!(90.60));
    assert!(order["cancelado_en"].is_null());

    let items = order["items"].as_array().expect("order items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["position"], 0);
    assert_eq!(decimal_field(&items[0], "subtotal"), dec!(75.60));
    assert!(items[0]["cost_price"].is_null());
    assert_eq!(decimal_field(&items[1], "cost_price"), dec!(5));

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("Jorge Quispe", None, Some("jorge@example.com"))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["order_number"], "PED-0002");
}

#[tokio::test]
async fn orders_require_a_contact_method() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("María Torres", None, None)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("María Torres", Some("   "), None)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut payload = order_payload("María Torres", Some("987654321"), None);
    payload["items"] = json!([]);
    let (status, _) = app
        .request_json(Method::POST, "/api/v1/orders", Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut payload = order_payload("María Torres", Some("987654321"), None);
    payload["items"][0]["quantity"] = json!(0);
    let (status, _) = app
        .request_json(Method::POST, "/api/v1/orders", Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn advancing_walks_the_fixed_chain_and_stops_at_the_end() {
    let app = TestApp::new().await;
    let id = create_order(&app).await;

    for expected in ["enproceso", "enviado", "entregado_pp", "entregado_pr"] {
        let (status, body) = advance(&app, &id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], expected);
    }

    let (status, body) = advance(&app, &id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("cannot advance"));
}

#[tokio::test]
async fn cancellation_is_limited_to_early_statuses() {
    let app = TestApp::new().await;

    let id = create_order(&app).await;
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", id),
            Some(json!({ "motivo": "El cliente no confirmó el pago" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelado");
    assert_eq!(
        body["data"]["motivo_cancelacion"],
        "El cliente no confirmó el pago"
    );
    assert!(body["data"]["cancelado_en"].is_string());

    // A cancelled order is terminal.
    let (status, _) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", id),
            Some(json!({ "motivo": "otra vez" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = advance(&app, &id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Once shipped, cancellation closes.
    let shipped = create_order(&app).await;
    for _ in 0..3 {
        let (status, _) = advance(&app, &shipped).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", shipped),
            Some(json!({ "motivo": "tarde" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("cannot be cancelled"));
}

#[tokio::test]
async fn an_empty_cancellation_reason_is_accepted() {
    let app = TestApp::new().await;
    let id = create_order(&app).await;

    let (status, body) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/orders/{}/cancel", id),
            Some(json!({ "motivo": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["motivo_cancelacion"], "");
}

#[tokio::test]
async fn replacing_items_recomputes_the_total() {
    let app = TestApp::new().await;
    let id = create_order(&app).await;

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/orders/{}/items", id),
            Some(json!({
                "items": [
                    {
                        "product_code": "TACH-50L",
                        "product_name": "Tacho con tapa 50L",
                        "quantity": 10,
                        "unit_price": "9.90"
                    }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal_field(&body["data"], "total"), dec!(99));
    let items = body["data"]["items"].as_array().expect("order items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["position"], 0);

    // Terminal orders no longer take edits.
    for _ in 0..4 {
        let (status, _) = advance(&app, &id).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/orders/{}/items", id),
            Some(json!({
                "items": [
                    {
                        "product_code": "X",
                        "product_name": "X",
                        "quantity": 1,
                        "unit_price": "1.00"
                    }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("cannot have its items edited"));
}

#[tokio::test]
async fn legacy_status_rows_stay_readable_but_cannot_advance() {
    let app = TestApp::new().await;
    let id = app
        .insert_order_row("PED-9001", "en_camino", dec!(75), None, Utc::now())
        .await;

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/orders/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "en_camino");
    assert_eq!(body["data"]["status_label"], "en_camino");

    let (status, body) = advance(&app, &id.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("unrecognized status"));

    // The raw key is still reachable through the list filter.
    let (status, body) = app
        .request_json(Method::GET, "/api/v1/orders?status=en_camino", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["orders"][0]["order_number"], "PED-9001");
}

#[tokio::test]
async fn listing_filters_by_status_and_paginates_newest_first() {
    let app = TestApp::new().await;
    for _ in 0..3 {
        create_order(&app).await;
    }
    let cancelled = create_order(&app).await;
    app.request_json(
        Method::POST,
        &format!("/api/v1/orders/{}/cancel", cancelled),
        Some(json!({ "motivo": "cambio de planes" })),
    )
    .await;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/orders?status=pendiente", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/orders?page=1&per_page=3", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 4);
    let orders = body["data"]["orders"].as_array().expect("orders page");
    assert_eq!(orders.len(), 3);
    assert_eq!(orders[0]["order_number"], "PED-0004");

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/orders?page=2&per_page=3", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orders"].as_array().expect("orders page").len(), 1);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["per_page"], 3);
}

#[tokio::test]
async fn deleted_orders_disappear() {
    let app = TestApp::new().await;
    let id = create_order(&app).await;

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/v1/orders/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/orders/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn whatsapp_link_prefills_the_order_summary() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("María Torres", Some("987 654 321"), None)),
        )
        .await;
    let id = body["data"]["id"].as_str().expect("order id");

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/orders/{}/whatsapp-link", id),
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
    assert!(message.contains("María Torres"));
    assert!(message.contains("PED-0001"));
    assert!(message.contains("Balde industrial 20L"));

    // Orders captured without a phone cannot produce a link.
    let (_, body) = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(order_payload("Jorge Quispe", None, Some("jorge@example.com"))),
        )
        .await;
    let id = body["data"]["id"].as_str().expect("order id");
    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/orders/{}/whatsapp-link", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("no client phone"));
}
