use axum::{extract::State, response::Response};
use tracing::debug;

use crate::{auth::StreamAdmin, events::event_stream_response, AppState};

/// Storefront event stream.
///
/// Every stream endpoint shares the one bus; clients filter on the
/// envelope's `channel`.
#[utoipa::path(
    get,
    path = "/api/products/events",
    summary = "Live storefront events",
    responses((status = 200, description = "text/event-stream of store events", body = String, content_type = "text/event-stream")),
    tag = "Events"
)]
pub async fn public_stream(State(state): State<AppState>) -> Response {
    event_stream_response(&*state.events, state.config.sse_heartbeat())
}

/// Back-office stream; `EventSource` may pass the token as `?token=`
#[utoipa::path(
    get,
    path = "/api/admin/stream",
    summary = "Live admin events",
    params(("token" = Option<String>, Query, description = "Bearer token when headers cannot be set")),
    responses(
        (status = 200, description = "text/event-stream of store events", body = String, content_type = "text/event-stream"),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
    ),
    tag = "Events"
)]
pub async fn admin_stream(State(state): State<AppState>, StreamAdmin(admin): StreamAdmin) -> Response {
    debug!(user_id = %admin.user_id, "admin stream opened");
    event_stream_response(&*state.events, state.config.sse_heartbeat())
}
