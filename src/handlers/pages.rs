use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};

use super::events::public_stream;
use crate::{
    auth::AdminUser,
    errors::ServiceError,
    services::pages::{PageContentResponse, UpsertPageRequest},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/pages/{page}",
    summary = "Get page content",
    params(("page" = String, Path, description = "Page slug, e.g. about")),
    responses(
        (status = 200, description = "Page content", body = PageContentResponse),
        (status = 404, description = "Content not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Pages"
)]
pub async fn get_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<PageContentResponse>, ServiceError> {
    Ok(Json(state.services.pages.get_page(&page).await?))
}

/// Creates the page or merges the given fields into it
#[utoipa::path(
    post,
    path = "/api/pages/{page}",
    summary = "Save page content",
    params(("page" = String, Path, description = "Page slug")),
    request_body = UpsertPageRequest,
    responses(
        (status = 200, description = "Saved page", body = PageContentResponse),
        (status = 400, description = "Invalid slug or missing title", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Pages"
)]
pub async fn upsert_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<UpsertPageRequest>,
) -> Result<Json<PageContentResponse>, ServiceError> {
    Ok(Json(state.services.pages.upsert_page(&page, payload).await?))
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(public_stream))
        .route("/:page", get(get_page).post(upsert_page))
}
