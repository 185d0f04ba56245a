use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::{PaymentProvider, PaymentReceipt};
use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Stripe PaymentIntent, reduced to the fields the checkout flow reads
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Minor units
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub receipt_email: Option<String>,
    #[serde(default)]
    pub last_payment_error: Option<Value>,
}

impl PaymentIntent {
    /// Our order id, from `metadata[orderId]`
    pub fn order_id(&self) -> Option<Uuid> {
        self.metadata
            .get("orderId")
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    pub fn receipt(&self) -> PaymentReceipt {
        PaymentReceipt {
            provider: PaymentProvider::Stripe,
            reference: self.id.clone(),
            status: self.status.clone(),
            payer_email: self.receipt_email.clone(),
        }
    }

    pub fn failure_message(&self) -> String {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Payment failed")
            .to_string()
    }
}

/// Webhook envelope
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

impl StripeEvent {
    pub fn payment_intent(&self) -> Result<PaymentIntent, ServiceError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            ServiceError::BadRequest(format!("Webhook object is not a PaymentIntent: {}", e))
        })
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Thin REST client for the PaymentIntents API
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    webhook_secret: Option<String>,
    tolerance_secs: i64,
}

impl StripeClient {
    pub fn new(
        base_url: &str,
        secret_key: &str,
        webhook_secret: Option<String>,
        tolerance_secs: u64,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            webhook_secret,
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        })
    }

    /// Creates an intent for `amount` minor units tagged with our order id
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        order_id: Uuid,
        idempotency_key: &str,
    ) -> Result<PaymentIntent, ServiceError> {
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("metadata[orderId]", order_id.to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, Some(""))
            .header("Idempotency-Key", idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(provider_unreachable)?;

        parse_response(response).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ServiceError> {
        if !is_stripe_id(intent_id) {
            return Err(ServiceError::BadRequest("Invalid payment intent id".to_string()));
        }

        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{}", self.base_url, intent_id))
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await
            .map_err(provider_unreachable)?;

        parse_response(response).await
    }

    /// Checks `Stripe-Signature` against the configured signing secret
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), ServiceError> {
        let secret = self.webhook_secret.as_deref().ok_or_else(|| {
            ServiceError::BadRequest("Webhook secret not configured".to_string())
        })?;
        verify_signature(secret, payload, signature_header, self.tolerance_secs, now)
    }
}

fn provider_unreachable(err: reqwest::Error) -> ServiceError {
    error!(error = %err, "Stripe request failed");
    ServiceError::PaymentProvider(format!("Stripe request failed: {}", err))
}

async fn parse_response(response: reqwest::Response) -> Result<PaymentIntent, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<PaymentIntent>().await.map_err(|e| {
            ServiceError::PaymentProvider(format!("Unreadable Stripe response: {}", e))
        });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<StripeErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| format!("Stripe returned {}", status));
    warn!(status = status.as_u16(), message = %message, "Stripe API error");
    Err(ServiceError::PaymentProvider(message))
}

fn is_stripe_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, ServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::InternalError(format!("HMAC error: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`, as Stripe signs webhooks
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String, ServiceError> {
    let mac = signed_payload_mac(secret, timestamp, payload)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Validates a `t=...,v1=...` header. Any one matching `v1` is enough, and
/// the timestamp must be within `tolerance_secs` of `now`.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), ServiceError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| ServiceError::BadRequest("Missing timestamp in signature".to_string()))?;
    if signatures.is_empty() {
        return Err(ServiceError::BadRequest(
            "Missing signature in header".to_string(),
        ));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(ServiceError::BadRequest(
            "Timestamp outside tolerance window".to_string(),
        ));
    }

    let mac = signed_payload_mac(secret, timestamp, payload)?;
    let valid = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if valid {
        Ok(())
    } else {
        Err(ServiceError::BadRequest("Invalid webhook signature".to_string()))
    }
}
