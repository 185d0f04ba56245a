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
    services::orders::{CreateOrderRequest, OrderResponse, UpdateOrderStatusRequest},
    AppState,
};

/// Place an order
///
/// Item prices and totals are taken as sent by the client; stock is
/// decremented in the same transaction as the insert.
#[utoipa::path(
    post,
    path = "/api/orders",
    summary = "Create order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "No order items or invalid payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(&auth_user, payload).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    summary = "Get order",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its owner", body = OrderResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Not the owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth_user: AuthUser,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order_id = parse_id(&id, "Order")?;
    let order = state.services.orders.get_order(order_id, &auth_user).await?;
    Ok(Json(order))
}

#[utoipa::path(
    get,
    path = "/api/orders/myorders",
    summary = "List my orders",
    responses(
        (status = 200, description = "Orders of the caller, newest first", body = [OrderResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    let orders = state.services.orders.list_for_user(auth_user.user_id).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/orders/all",
    summary = "List all orders",
    responses(
        (status = 200, description = "Every order with its customer", body = [OrderResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn all_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<OrderResponse>>, ServiceError> {
    Ok(Json(state.services.orders.list_all().await?))
}

/// Admin payment/delivery override
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    summary = "Update order status",
    params(("id" = String, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 403, description = "Admin only", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AdminUser(_admin): AdminUser,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order_id = parse_id(&id, "Order")?;
    let order = state.services.orders.update_status(order_id, payload).await?;
    Ok(Json(order))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/myorders", get(my_orders))
        .route("/all", get(all_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}
