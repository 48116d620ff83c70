//! Catalog CRUD coverage: products with two-tier pricing, categories,
//! clients (individuals and companies), and suppliers.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

fn product_payload(code: &str, name: &str) -> Value {
    json!({
        "code": code,
        "name": name,
        "brand": "Rey",
        "unit_price": "18.90",
        "wholesale_price": "15.50",
        "min_wholesale_qty": 6
    })
}

#[tokio::test]
async fn product_codes_are_unique() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/products",
            Some(product_payload("BAL-20L", "Balde industrial 20L")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], "BAL-20L");
    assert_eq!(body["data"]["is_active"], json!(true));
    assert_eq!(decimal_field(&body["data"], "unit_price"), dec!(18.90));

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/products",
            Some(product_payload("BAL-20L", "Otro balde")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("already exists"));
}

#[tokio::test]
async fn products_resolve_by_id_and_by_code() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("BAL-20L", dec!(18.90), dec!(15.50), Some(6))
        .await;

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/products/{}", product.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["code"], "BAL-20L");

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/products/by-code/BAL-20L", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_str(), Some(product.id.to_string().as_str()));

    let (status, _) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/products/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request_json(Method::GET, "/api/v1/products/by-code/NO-EXISTE", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn price_quotes_switch_tiers_at_the_threshold() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("BAL-20L", dec!(18.90), dec!(15.50), Some(6))
        .await;

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/products/{}/price-quote?quantity=5", product.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wholesale_applied"], json!(false));
    assert_eq!(decimal_field(&body["data"], "unit_price"), dec!(18.90));
    assert_eq!(decimal_field(&body["data"], "subtotal"), dec!(94.50));

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/products/{}/price-quote?quantity=6", product.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["wholesale_applied"], json!(true));
    assert_eq!(body["data"]["min_wholesale_qty"], 6);
    assert_eq!(decimal_field(&body["data"], "unit_price"), dec!(15.50));
    assert_eq!(decimal_field(&body["data"], "subtotal"), dec!(93));

    // Without a product threshold the default of 10 applies.
    let default_product = app
        .seed_product("TAP-3L", dec!(7.50), dec!(6.00), None)
        .await;
    let (_, body) = app
        .request_json(
            Method::GET,
            &format!(
                "/api/v1/products/{}/price-quote?quantity=9",
                default_product.id
            ),
            None,
        )
        .await;
    assert_eq!(body["data"]["wholesale_applied"], json!(false));
    let (_, body) = app
        .request_json(
            Method::GET,
            &format!(
                "/api/v1/products/{}/price-quote?quantity=10",
                default_product.id
            ),
            None,
        )
        .await;
    assert_eq!(body["data"]["wholesale_applied"], json!(true));
    assert_eq!(body["data"]["min_wholesale_qty"], 10);

    let (status, _) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/products/{}/price-quote?quantity=0", product.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_search_and_hides_inactive_products() {
    let app = TestApp::new().await;
    let balde = app
        .seed_product("BAL-20L", dec!(18.90), dec!(15.50), Some(6))
        .await;
    app.seed_product("TAP-3L", dec!(7.50), dec!(6.00), None).await;
    app.seed_product("JAR-2L", dec!(5.00), dec!(4.20), None).await;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/products?per_page=2", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["products"].as_array().expect("page").len(), 2);

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/products?search=BAL-20L", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["products"][0]["code"], "BAL-20L");

    let (status, _) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/products/{}", balde.id),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.request_json(Method::GET, "/api/v1/products", None).await;
    assert_eq!(body["data"]["total"], 2);

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/products?include_inactive=true", None)
        .await;
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn deleting_a_category_detaches_its_products() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Baldes", "description": "Baldes y tachos" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = body["data"]["id"].as_str().expect("category id").to_string();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Baldes" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"]
        .as_str()
        .expect("error message")
        .contains("already exists"));

    let mut payload = product_payload("BAL-20L", "Balde industrial 20L");
    payload["category_id"] = json!(category_id);
    let (status, body) = app
        .request_json(Method::POST, "/api/v1/products", Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = body["data"]["id"].as_str().expect("product id").to_string();
    assert_eq!(body["data"]["category_id"].as_str(), Some(category_id.as_str()));

    let (_, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/products?category_id={}", category_id),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app
        .request_json(
            Method::DELETE,
            &format!("/api/v1/categories/{}", category_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/products/{}", product_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["category_id"].is_null());
}

#[tokio::test]
async fn categories_list_sorted_by_name() {
    let app = TestApp::new().await;
    for name in ["Tachos", "Baldes", "Organizadores"] {
        let (status, _) = app
            .request_json(
                Method::POST,
                "/api/v1/categories",
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/categories", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("categories")
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Baldes", "Organizadores", "Tachos"]);
}

#[tokio::test]
async fn clients_cover_individuals_and_companies() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/clients",
            Some(json!({
                "name": "María Torres",
                "phone": "987654321"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["es_empresa"], json!(false));
    assert_eq!(body["data"]["display_name"], "María Torres");
    let individual_id = body["data"]["id"].as_str().expect("client id").to_string();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/clients",
            Some(json!({
                "es_empresa": true,
                "name": "Carlos Gamarra",
                "razon_social": "Distribuciones Gamarra S.A.C.",
                "ruc": "20512345678",
                "email": "compras@gamarra.pe"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["es_empresa"], json!(true));
    assert_eq!(body["data"]["display_name"], "Distribuciones Gamarra S.A.C.");
    assert_eq!(body["data"]["ruc"], "20512345678");

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/clients",
            Some(json!({ "name": "Mal Correo", "email": "no-es-correo" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Companies must carry a razón social.
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/clients",
            Some(json!({
                "es_empresa": true,
                "name": "Sin Razón",
                "phone": "911111111"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .contains("razón social"),
        "unexpected message: {}",
        body["message"]
    );

    // A client without email or phone cannot be contacted.
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/clients",
            Some(json!({ "name": "Incomunicado" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .expect("message")
            .contains("contact method"),
        "unexpected message: {}",
        body["message"]
    );

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/clients?search=Gamarra", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/clients/{}", individual_id),
            Some(json!({ "phone": "912345678" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], "912345678");

    let (status, _) = app
        .request_json(
            Method::DELETE,
            &format!("/api/v1/clients/{}", individual_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/clients/{}", individual_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suppliers_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Plásticos del Sur",
                "ruc": "20487654321",
                "contact_name": "Elena Ríos",
                "phone": "998877665"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().expect("supplier id").to_string();

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/suppliers/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Plásticos del Sur");
    assert_eq!(body["data"]["contact_name"], "Elena Ríos");

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/suppliers/{}", id),
            Some(json!({ "notes": "entrega los martes" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notes"], "entrega los martes");

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/suppliers?search=Sur", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app
        .request_json(Method::DELETE, &format!("/api/v1/suppliers/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .request_json(Method::GET, &format!("/api/v1/suppliers/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
