use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};

use super::events::public_stream;
use crate::{
    auth::MaybeAuthUser,
    errors::ServiceError,
    services::chat::{ChatRequest, ChatResponse},
    AppState,
};

/// Shopping assistant.
///
/// Orders are only listed for the bearer of a valid token; `userId` in the
/// body keys the session and nothing else.
#[utoipa::path(
    post,
    path = "/api/chat",
    summary = "Ask the assistant",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply, suggestions and updated context", body = ChatResponse),
        (status = 400, description = "Message is required", body = crate::errors::ErrorResponse),
    ),
    tag = "Chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServiceError> {
    Ok(Json(state.services.chat.respond(viewer.as_ref(), payload).await?))
}

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(chat))
        .route("/events", get(public_stream))
}
