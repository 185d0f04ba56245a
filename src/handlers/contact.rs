use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};

use super::common::{created_response, parse_id};
use super::events::public_stream;
use crate::{
    auth::{AdminUser, AuthUser, MaybeAuthUser},
    errors::ServiceError,
    services::contact::{
        AckResponse, ContactMessageResponse, CreateMessageRequest, MessageCreatedResponse,
        ReplyRequest, SubscribeRequest,
    },
    AppState,
};

/// Contact form; a bearer token, when present, links the message to the account
#[utoipa::path(
    post,
    path = "/api/contact",
    summary = "Send a message",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageCreatedResponse),
        (status = 400, description = "Missing fields", body = crate::errors::ErrorResponse),
    ),
    tag = "Contact"
)]
pub async fn create_message(
    State(state): State<AppState>,
    MaybeAuthUser(sender): MaybeAuthUser,
    Json(payload): Json<CreateMessageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .contact
        .create_message(sender.as_ref(), payload)
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    summary = "Inbox",
    responses(
        (status = 200, description = "All messages, newest first", body = [ContactMessageResponse]),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Contact"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<ContactMessageResponse>>, ServiceError> {
    Ok(Json(state.services.contact.list_messages().await?))
}

#[utoipa::path(
    get,
    path = "/api/contact/mine",
    summary = "My messages",
    responses(
        (status = 200, description = "Messages sent by the caller", body = [ContactMessageResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Contact"
)]
pub async fn my_messages(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<ContactMessageResponse>>, ServiceError> {
    Ok(Json(state.services.contact.list_mine(&auth_user).await?))
}

#[utoipa::path(
    put,
    path = "/api/contact/{id}/read",
    summary = "Mark read",
    params(("id" = String, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Updated message", body = ContactMessageResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Contact"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<ContactMessageResponse>, ServiceError> {
    let message_id = parse_id(&id, "Message")?;
    Ok(Json(state.services.contact.mark_read(message_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/contact/{id}/reply",
    summary = "Reply to a message",
    params(("id" = String, Path, description = "Message ID")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Replied message", body = ContactMessageResponse),
        (status = 400, description = "Reply is required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Contact"
)]
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<ReplyRequest>,
) -> Result<Json<ContactMessageResponse>, ServiceError> {
    let message_id = parse_id(&id, "Message")?;
    Ok(Json(state.services.contact.reply(message_id, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/contact/{id}/seen",
    summary = "Acknowledge a reply",
    params(("id" = String, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Updated message", body = ContactMessageResponse),
        (status = 403, description = "Not the sender", body = crate::errors::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Contact"
)]
pub async fn mark_seen(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
) -> Result<Json<ContactMessageResponse>, ServiceError> {
    let message_id = parse_id(&id, "Message")?;
    Ok(Json(state.services.contact.mark_seen(&auth_user, message_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    summary = "Newsletter sign-up",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Acknowledged", body = AckResponse),
        (status = 400, description = "Missing or invalid email", body = crate::errors::ErrorResponse),
    ),
    tag = "Contact"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<AckResponse>, ServiceError> {
    Ok(Json(state.services.contact.subscribe(payload)?))
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_message).get(list_messages))
        .route("/mine", get(my_messages))
        .route("/events", get(public_stream))
        .route("/:id/read", put(mark_read))
        .route("/:id/reply", put(reply))
        .route("/:id/seen", put(mark_seen))
}

pub fn newsletter_routes() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribe))
}
