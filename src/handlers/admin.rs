use axum::{extract::State, response::Json, routing::get, Router};

use super::events::admin_stream;
use crate::{
    auth::AdminUser,
    errors::ServiceError,
    services::admin::AdminStats,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    summary = "Dashboard totals",
    description = "Paid sales, order/product/customer counts and the last six months by calendar month",
    responses(
        (status = 200, description = "Dashboard figures", body = AdminStats),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<AdminStats>, ServiceError> {
    Ok(Json(state.services.admin.stats().await?))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/stream", get(admin_stream))
}
