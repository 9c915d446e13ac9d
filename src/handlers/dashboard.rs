use axum::{extract::State, response::Json, routing::get, Router};

use crate::{
    errors::ServiceError,
    services::dashboard::{DashboardMetrics, RecentOrder, TopSellingItem},
    AppState,
};

/// Build the dashboard Router scoped under `/dashboard`.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/top-items", get(get_top_selling_items))
        .route("/recent-orders", get(get_recent_orders))
}

/// Summary metrics over all invoices and items
#[utoipa::path(
    get,
    path = "/dashboard/metrics",
    responses(
        (status = 200, description = "Dashboard metrics retrieved successfully", body = DashboardMetrics),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Dashboard"
)]
pub async fn get_metrics(
    State(state): State<AppState>,
) -> Result<Json<DashboardMetrics>, ServiceError> {
    let metrics = state.services.dashboard.get_metrics().await?;
    Ok(Json(metrics))
}

/// Top five items by units sold
#[utoipa::path(
    get,
    path = "/dashboard/top-items",
    responses(
        (status = 200, description = "Top selling items retrieved successfully", body = Vec<TopSellingItem>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Dashboard"
)]
pub async fn get_top_selling_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<TopSellingItem>>, ServiceError> {
    let items = state.services.dashboard.get_top_selling_items().await?;
    Ok(Json(items))
}

/// Latest five invoices by business date
#[utoipa::path(
    get,
    path = "/dashboard/recent-orders",
    responses(
        (status = 200, description = "Recent orders retrieved successfully", body = Vec<RecentOrder>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Dashboard"
)]
pub async fn get_recent_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecentOrder>>, ServiceError> {
    let orders = state.services.dashboard.get_recent_orders().await?;
    Ok(Json(orders))
}
