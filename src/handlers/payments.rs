use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use bytes::Bytes;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::{
        orders::OrderResponse,
        payments::{
            ClientSecretResponse, ConfirmStripePaymentRequest, CreatePaymentIntentRequest,
            PaymentConfigResponse, VerifyPayPalRequest, WebhookAck,
        },
    },
    AppState,
};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    get,
    path = "/api/payment/config",
    summary = "Publishable payment configuration",
    responses((status = 200, description = "Stripe publishable key", body = PaymentConfigResponse)),
    tag = "Payments"
)]
pub async fn payment_config(State(state): State<AppState>) -> Json<PaymentConfigResponse> {
    Json(state.services.payments.config())
}

/// Returns the order's PaymentIntent client secret, creating the intent on first use
#[utoipa::path(
    post,
    path = "/api/payment/create-payment-intent",
    summary = "Create or reuse a PaymentIntent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret for Stripe Elements", body = ClientSecretResponse),
        (status = 400, description = "Order already paid or Stripe error", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePaymentIntentRequest>,
) -> Result<Json<ClientSecretResponse>, ServiceError> {
    let secret = state
        .services
        .payments
        .create_or_retrieve_intent(&auth_user, payload.order_id)
        .await?;
    Ok(Json(secret))
}

#[utoipa::path(
    post,
    path = "/api/payment/stripe/confirm",
    summary = "Confirm a card payment",
    description = "Re-reads the PaymentIntent from Stripe and marks the order paid when it succeeded",
    request_body = ConfirmStripePaymentRequest,
    responses(
        (status = 200, description = "Paid order", body = OrderResponse),
        (status = 400, description = "Intent not succeeded or mismatched", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn confirm_stripe_payment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<ConfirmStripePaymentRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order = state
        .services
        .payments
        .confirm_stripe_payment(&auth_user, payload.order_id, &payload.payment_intent_id)
        .await?;
    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/payment/paypal/verify",
    summary = "Verify a captured PayPal order",
    request_body = VerifyPayPalRequest,
    responses(
        (status = 200, description = "Paid order", body = OrderResponse),
        (status = 400, description = "Not completed, currency or amount mismatch, already paid", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn verify_paypal(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<VerifyPayPalRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order = state
        .services
        .payments
        .verify_paypal(&auth_user, payload.order_id, &payload.paypal_order_id)
        .await?;
    Ok(Json(order))
}

/// Stripe webhook endpoint.
///
/// The body is taken as raw bytes: the signature covers the exact payload.
#[utoipa::path(
    post,
    path = "/api/payment/webhook",
    summary = "Stripe webhook",
    request_body(content = String, description = "Raw Stripe event", content_type = "application/json"),
    params(("Stripe-Signature" = String, Header, description = "Stripe signature header")),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature", body = crate::errors::ErrorResponse),
    ),
    tag = "Payments"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ServiceError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let ack = state
        .services
        .payments
        .handle_stripe_webhook(&body, signature)
        .await?;
    Ok(Json(ack))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(payment_config))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/stripe/confirm", post(confirm_stripe_payment))
        .route("/paypal/verify", post(verify_paypal))
        .route("/webhook", post(stripe_webhook))
}
