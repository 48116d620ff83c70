use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Distriplast API",
        description = r#"
# Distriplast Storefront & Back-Office API

API for a plastics distributor: public catalog and carts for the
storefront, quotations and orders with a fixed status workflow for the
back office, and sales reports.

## Features

- **Catalog**: products with retail and wholesale price tiers, grouped by category
- **Carts**: server-side session carts that check out into orders
- **Quotations**: cost-plus-margin line items, resolvable and convertible into orders
- **Orders**: numbered `PED-0001` sequence with a forward-only status workflow
- **WhatsApp**: prefilled `wa.me` links summarizing an order or quotation
- **Reports**: sales summary, funnel, status distribution, and revenue series

## Error Handling

Failures use one shape with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "request_id": "0199b2c6-...",
  "timestamp": "2026-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `per_page` (configured
default 20, capped at the configured maximum).
        "#,
        contact(
            name = "Distriplast Sistemas",
            email = "sistemas@distriplast.pe"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.distriplast.pe", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Catalog products and price quoting"),
        (name = "categories", description = "Catalog categories"),
        (name = "clients", description = "Client directory"),
        (name = "suppliers", description = "Supplier directory"),
        (name = "orders", description = "Orders and their status workflow"),
        (name = "quotations", description = "Quotations, resolution, and conversion"),
        (name = "carts", description = "Storefront carts and checkout"),
        (name = "analytics", description = "Sales reporting")
    ),
    paths(
        // Catalog
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_code,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::quote_price,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Directory
        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,

        // Orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::replace_items,
        crate::handlers::orders::advance_status,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::whatsapp_link,

        // Quotations
        crate::handlers::quotations::list_quotations,
        crate::handlers::quotations::create_quotation,
        crate::handlers::quotations::get_quotation,
        crate::handlers::quotations::update_quotation,
        crate::handlers::quotations::replace_items,
        crate::handlers::quotations::resolve_quotation,
        crate::handlers::quotations::convert_to_order,
        crate::handlers::quotations::delete_quotation,
        crate::handlers::quotations::whatsapp_link,

        // Carts
        crate::handlers::carts::create_cart,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::get_cart_by_session,
        crate::handlers::carts::add_item,
        crate::handlers::carts::update_item,
        crate::handlers::carts::remove_item,
        crate::handlers::carts::clear_cart,
        crate::handlers::carts::checkout,

        // Reports
        crate::handlers::analytics::dashboard,
        crate::handlers::analytics::revenue_series,
        crate::handlers::analytics::funnel,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::errors::ErrorResponse,

            // Catalog types
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::products::ProductResponse,
            crate::services::products::ProductListResponse,
            crate::services::products::PriceQuoteResponse,
            crate::services::categories::CreateCategoryRequest,
            crate::services::categories::UpdateCategoryRequest,
            crate::services::categories::CategoryResponse,

            // Directory types
            crate::services::clients::CreateClientRequest,
            crate::services::clients::UpdateClientRequest,
            crate::services::clients::ClientResponse,
            crate::services::clients::ClientListResponse,
            crate::services::suppliers::CreateSupplierRequest,
            crate::services::suppliers::UpdateSupplierRequest,
            crate::services::suppliers::SupplierResponse,
            crate::services::suppliers::SupplierListResponse,

            // Order types
            crate::services::orders::OrderItemInput,
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::ReplaceOrderItemsRequest,
            crate::services::orders::CancelOrderRequest,
            crate::services::orders::OrderItemResponse,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderListResponse,

            // Quotation types
            crate::services::quotations::QuotationItemInput,
            crate::services::quotations::CreateQuotationRequest,
            crate::services::quotations::UpdateQuotationRequest,
            crate::services::quotations::ReplaceQuotationItemsRequest,
            crate::services::quotations::ResolveQuotationRequest,
            crate::services::quotations::QuotationItemResponse,
            crate::services::quotations::QuotationResponse,
            crate::services::quotations::QuotationListResponse,

            // Cart types
            crate::services::carts::CreateCartRequest,
            crate::services::carts::AddCartItemRequest,
            crate::services::carts::UpdateCartItemRequest,
            crate::services::carts::CheckoutRequest,
            crate::services::carts::CartItemResponse,
            crate::services::carts::CartResponse,

            // WhatsApp types
            crate::services::whatsapp::WhatsAppLinkResponse,

            // Report types
            crate::services::analytics::DashboardReport,
            crate::domain::reports::SalesSummary,
            crate::domain::reports::SalesFunnel,
            crate::domain::reports::TimeGranularity,
            crate::domain::reports::RevenuePoint,
            crate::domain::reports::RevenueSeries,
            crate::domain::reports::StatusSlice,
            crate::domain::reports::CustomerMetrics,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_covers_the_main_surfaces() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Distriplast API"));
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/quotations/{id}/convert"));
        assert!(json.contains("/api/v1/carts/{id}/checkout"));
        assert!(json.contains("/api/v1/reports/dashboard"));
    }

    #[test]
    fn error_schema_is_registered() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("ErrorResponse"));
    }
}
