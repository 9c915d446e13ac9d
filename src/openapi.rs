use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tillpoint API",
        version = "0.1.0",
        description = r#"
# Tillpoint Point-of-Sale API

Backend for a point-of-sale business management application.

## Features

- **Menu Items**: Create, update, and soft-delete the item catalog
- **Invoicing**: Record orders with line items, replaced atomically
- **Dashboard**: Revenue metrics, top sellers, and recent orders

## Error Handling

Failed requests return a consistent error body:

```json
{
  "error": "Not Found",
  "message": "Invoice with ID 42 not found"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Items", description = "Menu item management endpoints"),
        (name = "Invoices", description = "Invoice management endpoints"),
        (name = "Dashboard", description = "Aggregate dashboard endpoints")
    ),
    paths(
        // Items
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::items::create_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,

        // Invoices
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::update_invoice,
        crate::handlers::invoices::delete_invoice,

        // Dashboard
        crate::handlers::dashboard::get_metrics,
        crate::handlers::dashboard::get_top_selling_items,
        crate::handlers::dashboard::get_recent_orders,
    ),
    components(schemas(
        crate::entities::item::Model,
        crate::entities::invoice::Model,
        crate::entities::invoice_item::Model,
        crate::services::items::ItemPayload,
        crate::services::invoices::InvoicePayload,
        crate::services::invoices::InvoiceItemPayload,
        crate::services::invoices::InvoiceResponse,
        crate::services::dashboard::DashboardMetrics,
        crate::services::dashboard::TopSellingItem,
        crate::services::dashboard::RecentOrder,
        crate::errors::ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// Swagger UI router serving the generated OpenAPI document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
