use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};

use super::common::{created_response, parse_id};
use crate::{
    auth::{AdminUser, AuthUser},
    errors::ServiceError,
    services::users::{
        AuthResponse, LoginRequest, RegisterRequest, SetAdminRequest, UpdateProfileRequest,
        UserResponse,
    },
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/users",
    summary = "Register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, token issued", body = AuthResponse),
        (status = 400, description = "Invalid data or email already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state.services.users.register(payload).await?;
    Ok(created_response(account))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorResponse),
    ),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    Ok(Json(state.services.users.login(payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    summary = "Current user",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserResponse>, ServiceError> {
    Ok(Json(state.services.users.profile(&auth_user).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    summary = "Update current user",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile saved, token re-issued", body = AuthResponse),
        (status = 400, description = "Invalid data or email already registered", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AuthResponse>, ServiceError> {
    Ok(Json(
        state.services.users.update_profile(&auth_user, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/users",
    summary = "List users",
    responses(
        (status = 200, description = "Every account", body = [UserResponse]),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, ServiceError> {
    Ok(Json(state.services.users.list_users().await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/admin",
    summary = "Grant or revoke admin",
    params(("id" = String, Path, description = "User ID")),
    request_body = SetAdminRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Cannot demote yourself", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn set_admin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<SetAdminRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    let user_id = parse_id(&id, "User")?;
    let user = state
        .services
        .users
        .set_admin(&admin, user_id, payload.is_admin)
        .await?;
    Ok(Json(user))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register).get(list_users))
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
        .route("/:id/admin", put(set_admin))
}
