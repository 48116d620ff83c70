//! Loads a demo dataset for local development.
//!
//! `cargo run --bin seed-data` populates:
//! - 5 categories and 12 catalog products with both price tiers
//! - 6 clients (individuals and companies) and 2 suppliers
//! - 5 quotations in various states, one already converted
//! - 10 orders spread across the status workflow, one cancelled

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use tracing::info;
use uuid::Uuid;

use distriplast_api::db;
use distriplast_api::domain::pricing;
use distriplast_api::domain::status::{OrderStatus, QuotationStatus};
use distriplast_api::entities::{
    category, client, order, order_item, product, quotation, quotation_item, supplier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Distriplast API Seed Data ===");
    info!("Creating realistic demo data for exploration...\n");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://distriplast.db?mode=rwc".to_string());

    info!("Connecting to database: {}", database_url);
    let conn = db::establish_connection(&database_url).await?;
    db::run_migrations(&conn).await?;
    info!("Connected, schema up to date\n");

    info!("Creating categories...");
    let categories = create_categories(&conn).await?;
    info!("  Created {} categories", categories.len());

    info!("Creating products...");
    let products = create_products(&conn, &categories).await?;
    info!("  Created {} products", products.len());

    info!("Creating clients...");
    let clients = create_clients(&conn).await?;
    info!("  Created {} clients", clients.len());

    info!("Creating suppliers...");
    let supplier_count = create_suppliers(&conn).await?;
    info!("  Created {} suppliers", supplier_count);

    // Ids shared by the already-converted quotation and the order it produced
    let converted_quotation_id = Uuid::new_v4();
    let converted_order_id = Uuid::new_v4();

    info!("Creating quotations...");
    let quotation_count = create_quotations(
        &conn,
        &products,
        &clients,
        converted_quotation_id,
        converted_order_id,
    )
    .await?;
    info!("  Created {} quotations with items", quotation_count);

    info!("Creating orders...");
    let order_count = create_orders(
        &conn,
        &products,
        &clients,
        converted_quotation_id,
        converted_order_id,
    )
    .await?;
    info!("  Created {} orders with items", order_count);

    info!("Seeding finished. Some places to look:");
    info!("  curl http://localhost:8080/api/v1/products");
    info!("  curl http://localhost:8080/api/v1/quotations");
    info!("  curl http://localhost:8080/api/v1/reports/dashboard");
    info!("  http://localhost:8080/swagger-ui for the interactive docs");

    Ok(())
}

async fn create_categories(
    conn: &sea_orm::DatabaseConnection,
) -> anyhow::Result<Vec<category::Model>> {
    let categories_data = vec![
        ("Baldes y bateas", "Baldes, bateas y tinas para uso doméstico e industrial"),
        ("Envases y tapers", "Envases herméticos para alimentos y almacenamiento"),
        ("Menaje de cocina", "Jarras, vasos y utensilios para la mesa"),
        ("Muebles plásticos", "Sillas y mesas apilables para hogar y eventos"),
        ("Organización y limpieza", "Tachos, ganchos y organizadores"),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (name, description) in categories_data {
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            image_url: Set(None),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_products(
    conn: &sea_orm::DatabaseConnection,
    categories: &[category::Model],
) -> anyhow::Result<Vec<product::Model>> {
    // (code, name, brand, category index, retail, wholesale, min wholesale qty)
    let products_data = vec![
        ("BAL-20L", "Balde industrial 20 L", "Rey", 0, dec!(18.90), dec!(15.50), Some(6)),
        ("BAL-04L", "Balde con asa 4 L", "Rey", 0, dec!(6.50), dec!(5.20), None),
        ("BAT-40L", "Batea multiuso 40 L", "Duraplast", 0, dec!(24.90), dec!(21.00), Some(6)),
        ("TAP-1L", "Taper hermético 1 L", "Basa", 1, dec!(8.90), dec!(7.10), None),
        ("TAP-3L", "Taper hermético 3 L", "Basa", 1, dec!(14.50), dec!(11.90), None),
        ("JAR-2L", "Jarra con tapa 2 L", "Wenco", 2, dec!(12.90), dec!(10.50), None),
        ("VAS-SET6", "Set de 6 vasos 350 ml", "Wenco", 2, dec!(15.90), dec!(12.90), None),
        ("SIL-APIL", "Silla apilable reforzada", "Rey", 3, dec!(32.00), dec!(26.50), Some(4)),
        ("MES-CUAD", "Mesa cuadrada plegable", "Duraplast", 3, dec!(89.00), dec!(75.00), Some(4)),
        ("TACH-50L", "Tacho con pedal 50 L", "Basa", 4, dec!(54.90), dec!(46.00), Some(5)),
        ("GAN-X12", "Ganchos de ropa x 12", "Wenco", 4, dec!(7.90), dec!(6.30), None),
        ("ORG-3NIV", "Organizador de 3 niveles", "Duraplast", 4, dec!(45.90), dec!(38.50), Some(5)),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (code, name, brand, cat_idx, unit_price, wholesale_price, min_qty) in products_data {
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            brand: Set(Some(brand.to_string())),
            description: Set(Some(format!("{} marca {}.", name, brand))),
            image_url: Set(None),
            category_id: Set(Some(categories[cat_idx].id)),
            tags: Set(None),
            unit_price: Set(unit_price),
            wholesale_price: Set(wholesale_price),
            min_wholesale_qty: Set(min_qty),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_clients(conn: &sea_orm::DatabaseConnection) -> anyhow::Result<Vec<client::Model>> {
    // (name, es_empresa, razon_social, ruc, email, phone)
    let clients_data = vec![
        (
            "María Torres",
            false,
            None,
            None,
            Some("maria.torres@gmail.com"),
            Some("987654321"),
        ),
        ("Jorge Quispe", false, None, None, None, Some("912345678")),
        (
            "Ana Lucía Campos",
            false,
            None,
            None,
            Some("analucia.campos@hotmail.com"),
            None,
        ),
        (
            "Carmen Díaz",
            true,
            Some("Comercial Andina SAC"),
            Some("20512345678"),
            Some("compras@comercialandina.pe"),
            Some("014567890"),
        ),
        (
            "Luis Paredes",
            true,
            Some("Restaurante El Fogón EIRL"),
            Some("20487654321"),
            Some("elfogon.lima@gmail.com"),
            Some("998877665"),
        ),
        (
            "Rosa Mendoza",
            true,
            Some("Distribuidora Selva Central SRL"),
            Some("20609876543"),
            None,
            Some("964312785"),
        ),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (name, es_empresa, razon_social, ruc, email, phone) in clients_data {
        let model = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            es_empresa: Set(es_empresa),
            name: Set(name.to_string()),
            razon_social: Set(razon_social.map(str::to_string)),
            ruc: Set(ruc.map(str::to_string)),
            email: Set(email.map(str::to_string)),
            phone: Set(phone.map(str::to_string)),
            address: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_suppliers(conn: &sea_orm::DatabaseConnection) -> anyhow::Result<usize> {
    let suppliers_data = vec![
        (
            "Plásticos Rey S.A.",
            "20100123456",
            "Carlos Núñez",
            "ventas@rey.com.pe",
            "014412233",
        ),
        (
            "Basa Internacional S.A.C.",
            "20100654321",
            "Paola Vega",
            "pedidos@basa.com.pe",
            "016543210",
        ),
    ];

    let now = Utc::now();
    let mut count = 0;

    for (name, ruc, contact_name, email, phone) in suppliers_data {
        supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            ruc: Set(Some(ruc.to_string())),
            contact_name: Set(Some(contact_name.to_string())),
            email: Set(Some(email.to_string())),
            phone: Set(Some(phone.to_string())),
            address: Set(None),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;
        count += 1;
    }

    Ok(count)
}

async fn create_quotations(
    conn: &sea_orm::DatabaseConnection,
    products: &[product::Model],
    clients: &[client::Model],
    converted_quotation_id: Uuid,
    converted_order_id: Uuid,
) -> anyhow::Result<usize> {
    // (status, days ago, is the converted one)
    let scenarios = vec![
        (QuotationStatus::PedidoGenerado, 29, true),
        (QuotationStatus::Rechazada, 12, false),
        (QuotationStatus::Aceptada, 5, false),
        (QuotationStatus::Pendiente, 3, false),
        (QuotationStatus::Pendiente, 1, false),
    ];

    let now = Utc::now();
    let mut count = 0;

    for (i, (status, days_ago, is_converted)) in scenarios.iter().enumerate() {
        let client = &clients[(i + 2) % clients.len()];
        let quoted_at = now - Duration::days(*days_ago);
        let quotation_id = if *is_converted {
            converted_quotation_id
        } else {
            Uuid::new_v4()
        };

        let mut total = Decimal::ZERO;
        let mut position = 0;
        let num_items = (i % 2) + 2;

        for prod in products.iter().skip(i * 2 % 8).take(num_items) {
            let quantity = ((i + position as usize) % 8 + 2) as i32;
            // Quotation lines are priced from cost plus margin, not catalog tiers
            let precio_compra = (prod.wholesale_price * dec!(0.8)).round_dp(2);
            let margen = dec!(25);
            let precio_unitario = pricing::sale_price_from_margin(precio_compra, margen);
            let subtotal = precio_unitario * Decimal::from(quantity);
            total += subtotal;

            quotation_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                quotation_id: Set(quotation_id),
                product_code: Set(prod.code.clone()),
                product_name: Set(prod.name.clone()),
                quantity: Set(quantity),
                precio_compra: Set(precio_compra),
                margen: Set(margen),
                precio_unitario: Set(precio_unitario),
                subtotal: Set(subtotal),
                position: Set(position),
                created_at: Set(quoted_at),
            }
            .insert(conn)
            .await?;
            position += 1;
        }

        quotation::ActiveModel {
            id: Set(quotation_id),
            quotation_number: Set(format!("COT-{:04}", i + 1)),
            client_id: Set(Some(client.id)),
            client_name: Set(client.name.clone()),
            client_email: Set(client.email.clone()),
            client_phone: Set(client.phone.clone()),
            status: Set(status.to_string()),
            total: Set(total),
            generated_order_id: Set(is_converted.then_some(converted_order_id)),
            notes: Set(None),
            valid_until: Set(Some(quoted_at + Duration::days(15))),
            created_at: Set(quoted_at),
            updated_at: Set(Some(quoted_at)),
        }
        .insert(conn)
        .await?;
        count += 1;
    }

    Ok(count)
}

async fn create_orders(
    conn: &sea_orm::DatabaseConnection,
    products: &[product::Model],
    clients: &[client::Model],
    converted_quotation_id: Uuid,
    converted_order_id: Uuid,
) -> anyhow::Result<usize> {
    // (status, days ago, from the converted quotation)
    let scenarios = vec![
        (OrderStatus::EntregadoPr, 28, true),
        (OrderStatus::EntregadoPr, 24, false),
        (OrderStatus::EntregadoPp, 18, false),
        (OrderStatus::Cancelado, 15, false),
        (OrderStatus::Enviado, 10, false),
        (OrderStatus::Enproceso, 6, false),
        (OrderStatus::Enproceso, 4, false),
        (OrderStatus::Pendiente, 2, false),
        (OrderStatus::Pendiente, 1, false),
        (OrderStatus::Pendiente, 0, false),
    ];

    let now = Utc::now();
    let mut count = 0;

    for (i, (status, days_ago, from_quotation)) in scenarios.iter().enumerate() {
        let client = &clients[i % clients.len()];
        let order_date = now - Duration::days(*days_ago);
        let order_id = if *from_quotation {
            converted_order_id
        } else {
            Uuid::new_v4()
        };

        let mut total = Decimal::ZERO;
        let mut position = 0;
        let num_items = (i % 3) + 1;

        for prod in products.iter().skip(i % 9).take(num_items) {
            let quantity = ((i * 3 + position as usize * 5) % 12 + 1) as i32;
            let (unit_price, cost_price) = if *from_quotation {
                // Mirrors the quotation lines this order was generated from
                let precio_compra = (prod.wholesale_price * dec!(0.8)).round_dp(2);
                (
                    pricing::sale_price_from_margin(precio_compra, dec!(25)),
                    Some(precio_compra),
                )
            } else {
                (
                    pricing::resolve_unit_price(
                        prod.unit_price,
                        prod.wholesale_price,
                        prod.min_wholesale_qty,
                        quantity,
                    ),
                    None,
                )
            };
            let subtotal = unit_price * Decimal::from(quantity);
            total += subtotal;

            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_code: Set(prod.code.clone()),
                product_name: Set(prod.name.clone()),
                quantity: Set(quantity),
                unit_price: Set(unit_price),
                cost_price: Set(cost_price),
                subtotal: Set(subtotal),
                position: Set(position),
                created_at: Set(order_date),
            }
            .insert(conn)
            .await?;
            position += 1;
        }

        let cancelled = *status == OrderStatus::Cancelado;
        order::ActiveModel {
            id: Set(order_id),
            order_number: Set(format!("PED-{:04}", i + 1)),
            client_id: Set(Some(client.id)),
            client_name: Set(client.name.clone()),
            client_email: Set(client.email.clone()),
            client_phone: Set(client.phone.clone()),
            status: Set(status.to_string()),
            total: Set(total),
            source_quotation_id: Set(from_quotation.then_some(converted_quotation_id)),
            notes: Set(None),
            cancelado_en: Set(cancelled.then(|| order_date + Duration::hours(6))),
            motivo_cancelacion: Set(cancelled.then(|| "El cliente no confirmó el pago".to_string())),
            created_at: Set(order_date),
            updated_at: Set(Some(order_date)),
        }
        .insert(conn)
        .await?;
        count += 1;
    }

    Ok(count)
}
