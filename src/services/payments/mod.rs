//! Payment confirmation.
//!
//! Stripe and PayPal each verify a payment on their side and hand a
//! [`PaymentReceipt`] to [`OrderService::mark_paid`], which is the only place
//! an order becomes paid.

pub mod paypal;
pub mod stripe;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    common::{format_amount, to_minor_units},
    config::AppConfig,
    entities::order,
    errors::ServiceError,
    events::{EventBus, StoreEvent},
    services::orders::{MarkPaid, OrderResponse, OrderService},
};

pub use paypal::PayPalClient;
pub use stripe::{PaymentIntent, StripeClient, StripeEvent};

/// Who confirmed the money
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    PayPal,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::PayPal => "paypal",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-side proof of payment
#[derive(Clone, Debug)]
pub struct PaymentReceipt {
    pub provider: PaymentProvider,
    /// PaymentIntent id or PayPal order id
    pub reference: String,
    pub status: String,
    pub payer_email: Option<String>,
}

impl PaymentReceipt {
    /// Blob stored in `orders.payment_result`
    pub fn payment_result(&self, at: DateTime<Utc>) -> Value {
        json!({
            "id": self.reference,
            "provider": self.provider.as_str(),
            "status": self.status,
            "updateTime": at.to_rfc3339(),
            "emailAddress": self.payer_email,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigResponse {
    pub publishable_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretResponse {
    pub client_secret: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmStripePaymentRequest {
    pub order_id: Uuid,
    pub payment_intent_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayPalRequest {
    pub order_id: Uuid,
    pub paypal_order_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

/// Stripe and PayPal flows on top of the order service
#[derive(Clone)]
pub struct PaymentService {
    orders: OrderService,
    events: Arc<dyn EventBus>,
    stripe: Option<StripeClient>,
    paypal: Option<PayPalClient>,
    currency: String,
    publishable_key: Option<String>,
}

impl PaymentService {
    pub fn new(
        orders: OrderService,
        events: Arc<dyn EventBus>,
        stripe: Option<StripeClient>,
        paypal: Option<PayPalClient>,
        currency: impl Into<String>,
        publishable_key: Option<String>,
    ) -> Self {
        Self {
            orders,
            events,
            stripe,
            paypal,
            currency: currency.into().to_uppercase(),
            publishable_key,
        }
    }

    /// Builds the provider clients that have credentials configured
    pub fn from_config(
        config: &AppConfig,
        orders: OrderService,
        events: Arc<dyn EventBus>,
    ) -> Result<Self, ServiceError> {
        let timeout = config.provider_timeout();

        let stripe = match config.stripe_secret_key.as_deref().filter(|k| !k.is_empty()) {
            Some(secret) => Some(StripeClient::new(
                &config.stripe_api_base,
                secret,
                config.stripe_webhook_secret.clone().filter(|s| !s.is_empty()),
                config.stripe_webhook_tolerance_secs,
                timeout,
            )?),
            None => {
                warn!("Stripe secret key not set, card payments disabled");
                None
            }
        };

        let paypal = match (
            config.paypal_client_id.as_deref().filter(|s| !s.is_empty()),
            config.paypal_client_secret.as_deref().filter(|s| !s.is_empty()),
        ) {
            (Some(id), Some(secret)) => Some(PayPalClient::new(
                &config.paypal_api_base,
                id,
                secret,
                timeout,
            )?),
            _ => {
                warn!("PayPal credentials not set, PayPal verification disabled");
                None
            }
        };

        Ok(Self::new(
            orders,
            events,
            stripe,
            paypal,
            config.store_currency.clone(),
            config.stripe_publishable_key.clone(),
        ))
    }

    pub fn config(&self) -> PaymentConfigResponse {
        PaymentConfigResponse {
            publishable_key: self.publishable_key.clone(),
        }
    }

    fn stripe(&self) -> Result<&StripeClient, ServiceError> {
        self.stripe
            .as_ref()
            .ok_or_else(|| ServiceError::BadRequest("Stripe is not configured".to_string()))
    }

    fn paypal(&self) -> Result<&PayPalClient, ServiceError> {
        self.paypal
            .as_ref()
            .ok_or_else(|| ServiceError::BadRequest("PayPal is not configured".to_string()))
    }

    /// Client secret for the order's PaymentIntent, creating one when the
    /// order has none or its previous intent was canceled.
    #[instrument(skip(self, viewer), fields(order_id = %order_id))]
    pub async fn create_or_retrieve_intent(
        &self,
        viewer: &AuthUser,
        order_id: Uuid,
    ) -> Result<ClientSecretResponse, ServiceError> {
        let stripe = self.stripe()?;
        let order = self.orders.find_owned(order_id, viewer).await?;
        if order.is_paid {
            return Err(ServiceError::BadRequest("Order already paid".to_string()));
        }

        let mut replaced = None;
        if let Some(existing) = order.stripe_payment_intent_id.as_deref() {
            let intent = stripe.retrieve_intent(existing).await?;
            if intent.status != "canceled" {
                if let Some(secret) = intent.client_secret {
                    debug!(intent_id = %intent.id, "Reusing existing PaymentIntent");
                    return Ok(ClientSecretResponse {
                        client_secret: secret,
                    });
                }
            }
            replaced = Some(existing.to_string());
        }

        let amount = to_minor_units(order.total_price)?;
        let idempotency_key = match &replaced {
            Some(previous) => format!("order-{}-replaces-{}", order.id, previous),
            None => format!("order-{}", order.id),
        };
        let intent = stripe
            .create_intent(
                amount,
                &self.currency.to_lowercase(),
                order.id,
                &idempotency_key,
            )
            .await?;
        self.orders.attach_stripe_intent(order.id, &intent.id).await?;
        info!(intent_id = %intent.id, amount, "PaymentIntent created");

        intent.client_secret.map(|client_secret| ClientSecretResponse { client_secret }).ok_or_else(|| {
            ServiceError::PaymentProvider("Stripe returned no client secret".to_string())
        })
    }

    /// Client-reported card success, re-checked against Stripe
    #[instrument(skip(self, viewer), fields(order_id = %order_id, intent_id = %intent_id))]
    pub async fn confirm_stripe_payment(
        &self,
        viewer: &AuthUser,
        order_id: Uuid,
        intent_id: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let stripe = self.stripe()?;
        let order = self.orders.find_owned(order_id, viewer).await?;
        let intent = stripe.retrieve_intent(intent_id).await?;

        if intent.status != "succeeded" {
            return Err(ServiceError::PaymentProvider(format!(
                "Payment not completed (status {})",
                intent.status
            )));
        }
        if intent.order_id() != Some(order.id) {
            return Err(ServiceError::BadRequest(
                "Payment intent does not belong to this order".to_string(),
            ));
        }
        if intent.amount != to_minor_units(order.total_price)? {
            return Err(ServiceError::BadRequest("Payment amount mismatch".to_string()));
        }

        let outcome = self.orders.mark_paid(order.id, intent.receipt()).await?;
        Ok(outcome.into_order())
    }

    /// Verifies and applies a Stripe webhook delivery
    #[instrument(skip(self, payload, signature), fields(bytes = payload.len()))]
    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck, ServiceError> {
        let stripe = self.stripe()?;
        let signature = signature
            .ok_or_else(|| ServiceError::BadRequest("Missing Stripe-Signature header".to_string()))?;
        stripe.verify_webhook(payload, signature, Utc::now().timestamp())?;

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid webhook payload: {}", e)))?;
        info!(event_id = %event.id, kind = %event.kind, "Stripe webhook received");

        match event.kind.as_str() {
            "payment_intent.succeeded" => {
                let intent = event.payment_intent()?;
                let Some(order) = self.order_for_intent(&intent).await? else {
                    warn!(intent_id = %intent.id, "No order matches succeeded PaymentIntent");
                    return Ok(WebhookAck { received: true });
                };
                if intent.amount != to_minor_units(order.total_price)? {
                    warn!(
                        order_id = %order.id,
                        intent_amount = intent.amount,
                        order_total = %order.total_price,
                        "PaymentIntent amount differs from order total, not marking paid"
                    );
                    return Ok(WebhookAck { received: true });
                }
                if let MarkPaid::AlreadyPaid(_) = self.orders.mark_paid(order.id, intent.receipt()).await? {
                    debug!(order_id = %order.id, "Webhook for an already paid order");
                }
            }
            "payment_intent.payment_failed" => {
                let intent = event.payment_intent()?;
                if let Some(order) = self.order_for_intent(&intent).await? {
                    let reason = intent.failure_message();
                    let detail = json!({
                        "id": intent.id,
                        "provider": PaymentProvider::Stripe.as_str(),
                        "status": intent.status,
                        "error": reason,
                        "updateTime": Utc::now().to_rfc3339(),
                    });
                    if self.orders.record_payment_failure(order.id, detail).await? {
                        self.events
                            .publish(&StoreEvent::payment_failed(order.id, &reason));
                        warn!(order_id = %order.id, reason = %reason, "Card payment failed");
                    }
                }
            }
            other => debug!(kind = other, "Ignoring Stripe event"),
        }

        Ok(WebhookAck { received: true })
    }

    /// Metadata order id first, then the intent id stored at creation
    async fn order_for_intent(
        &self,
        intent: &PaymentIntent,
    ) -> Result<Option<order::Model>, ServiceError> {
        if let Some(order_id) = intent.order_id() {
            match self.orders.find_model(order_id).await {
                Ok(order) => return Ok(Some(order)),
                Err(ServiceError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.orders.find_by_stripe_intent(&intent.id).await
    }

    /// Confirms a captured PayPal order and marks ours paid
    #[instrument(skip(self, viewer), fields(order_id = %order_id, paypal_order_id = %paypal_order_id))]
    pub async fn verify_paypal(
        &self,
        viewer: &AuthUser,
        order_id: Uuid,
        paypal_order_id: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let paypal = self.paypal()?;
        let order = self.orders.find_owned(order_id, viewer).await?;
        if order.is_paid {
            return Err(ServiceError::BadRequest("Order already paid".to_string()));
        }

        if let Some(other) = self.orders.find_by_paypal_order(paypal_order_id).await? {
            if other.id != order.id {
                warn!(other_order_id = %other.id, "PayPal order already settles another order");
                return Err(ServiceError::BadRequest(
                    "PayPal order already used for another order".to_string(),
                ));
            }
        }

        let remote = paypal.get_order(paypal_order_id).await?;
        if remote.status != "COMPLETED" {
            return Err(ServiceError::PaymentProvider(format!(
                "PayPal order not completed (status {})",
                remote.status
            )));
        }

        let amount = remote.amount().ok_or_else(|| {
            ServiceError::PaymentProvider("PayPal order has no amount".to_string())
        })?;
        if !amount.currency_code.eq_ignore_ascii_case(&self.currency) {
            return Err(ServiceError::BadRequest(format!(
                "Currency mismatch: expected {}, got {}",
                self.currency, amount.currency_code
            )));
        }
        let expected = format_amount(order.total_price);
        if amount.value != expected {
            return Err(ServiceError::BadRequest(format!(
                "Amount mismatch: expected {}, got {}",
                expected, amount.value
            )));
        }

        let receipt = PaymentReceipt {
            provider: PaymentProvider::PayPal,
            reference: remote.id.clone(),
            status: remote.status.clone(),
            payer_email: remote.payer_email(),
        };
        match self.orders.mark_paid(order.id, receipt).await? {
            MarkPaid::Paid(order) => Ok(order),
            MarkPaid::AlreadyPaid(_) => {
                Err(ServiceError::BadRequest("Order already paid".to_string()))
            }
        }
    }
}
