use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::{
    entities::item, errors::ServiceError, services::items::ItemPayload, AppState,
};

/// Build the menu item Router mounted at the application root.
pub fn items_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
}

/// List all menu items
#[utoipa::path(
    get,
    path = "/items",
    responses(
        (status = 200, description = "Items retrieved successfully", body = Vec<item::Model>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Items"
)]
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<item::Model>>, ServiceError> {
    let items = state.services.items.list_items().await?;
    Ok(Json(items))
}

/// Get a menu item by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item retrieved successfully", body = item::Model),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<item::Model>, ServiceError> {
    let item = state.services.items.get_item(id).await?;
    Ok(Json(item))
}

/// Create a menu item
#[utoipa::path(
    post,
    path = "/items",
    request_body = ItemPayload,
    responses(
        (status = 201, description = "Item created successfully", body = item::Model),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> Result<(StatusCode, Json<item::Model>), ServiceError> {
    let item = state.services.items.create_item(payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Overwrite a menu item
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = i32, Path, description = "Item ID")),
    request_body = ItemPayload,
    responses(
        (status = 200, description = "Item updated successfully", body = item::Model),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<item::Model>, ServiceError> {
    let item = state.services.items.update_item(id, payload).await?;
    Ok(Json(item))
}

/// Soft-delete a menu item
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted successfully"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ServiceError> {
    state.services.items.delete_item(id).await?;
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}
