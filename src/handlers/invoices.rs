use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::{
    errors::ServiceError,
    services::invoices::{InvoicePayload, InvoiceResponse},
    AppState,
};

/// Build the invoice Router mounted at the application root.
pub fn invoices_routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
}

/// List all invoices with their line items
#[utoipa::path(
    get,
    path = "/invoices",
    responses(
        (status = 200, description = "Invoices retrieved successfully", body = Vec<InvoiceResponse>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceResponse>>, ServiceError> {
    let invoices = state.services.invoices.list_invoices().await?;
    Ok(Json(invoices))
}

/// Get an invoice by ID, line items included
#[utoipa::path(
    get,
    path = "/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice retrieved successfully", body = InvoiceResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<InvoiceResponse>, ServiceError> {
    let invoice = state.services.invoices.get_invoice(id).await?;
    Ok(Json(invoice))
}

/// Create an invoice together with its line items
#[utoipa::path(
    post,
    path = "/invoices",
    request_body = InvoicePayload,
    responses(
        (status = 201, description = "Invoice created successfully", body = InvoiceResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<InvoicePayload>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ServiceError> {
    let invoice = state.services.invoices.create_invoice(payload).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Fully replace an invoice's fields and line items
#[utoipa::path(
    put,
    path = "/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice ID")),
    request_body = InvoicePayload,
    responses(
        (status = 200, description = "Invoice updated successfully", body = InvoiceResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<InvoicePayload>,
) -> Result<Json<InvoiceResponse>, ServiceError> {
    let invoice = state.services.invoices.update_invoice(id, payload).await?;
    Ok(Json(invoice))
}

/// Delete an invoice and all of its line items
#[utoipa::path(
    delete,
    path = "/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice deleted successfully"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ServiceError> {
    state.services.invoices.delete_invoice(id).await?;
    Ok(Json(json!({ "message": "Invoice deleted successfully" })))
}
