use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};

use crate::errors::ServiceError;

/// Tokens are refreshed this long before PayPal says they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
    #[serde(default)]
    pub payer: Option<Payer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    pub currency_code: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payer {
    pub email_address: Option<String>,
}

impl PayPalOrder {
    /// Amount of the first purchase unit
    pub fn amount(&self) -> Option<&Amount> {
        self.purchase_units.first().and_then(|u| u.amount.as_ref())
    }

    pub fn payer_email(&self) -> Option<String> {
        self.payer.as_ref().and_then(|p| p.email_address.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Orders v2 client with a cached client-credentials token
#[derive(Clone)]
pub struct PayPalClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl PayPalClient {
    pub fn new(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    async fn access_token(&self) -> Result<String, ServiceError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                    return Ok(token.value.clone());
                }
            }
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(request_failed)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "PayPal token request rejected");
            return Err(ServiceError::PaymentProvider(format!(
                "PayPal authentication failed ({})",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ServiceError::PaymentProvider(format!("Unreadable PayPal token response: {}", e))
        })?;
        debug!(expires_in = token.expires_in, "PayPal access token refreshed");

        *slot = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(token.access_token)
    }

    /// Fetches `/v2/checkout/orders/{id}`
    #[instrument(skip(self))]
    pub async fn get_order(&self, paypal_order_id: &str) -> Result<PayPalOrder, ServiceError> {
        if !is_paypal_id(paypal_order_id) {
            return Err(ServiceError::BadRequest("Invalid PayPal order id".to_string()));
        }
        let token = self.access_token().await?;

        let response = self
            .http
            .get(format!(
                "{}/v2/checkout/orders/{}",
                self.base_url, paypal_order_id
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("PayPal returned {}", status));
            warn!(status = status.as_u16(), message = %message, "PayPal order lookup failed");
            return Err(ServiceError::PaymentProvider(message));
        }

        response.json::<PayPalOrder>().await.map_err(|e| {
            ServiceError::PaymentProvider(format!("Unreadable PayPal order: {}", e))
        })
    }
}

fn request_failed(err: reqwest::Error) -> ServiceError {
    error!(error = %err, "PayPal request failed");
    ServiceError::PaymentProvider(format!("PayPal request failed: {}", err))
}

fn is_paypal_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completed_order() -> serde_json::Value {
        serde_json::json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{ "amount": { "currency_code": "AED", "value": "40.00" } }],
            "payer": { "email_address": "buyer@example.com" }
        })
    }

    #[tokio::test]
    async fn token_is_fetched_once_and_reused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "A21AA",
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/checkout/orders/5O190127TN364715T"))
            .and(header("authorization", "Bearer A21AA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completed_order()))
            .expect(2)
            .mount(&server)
            .await;

        let client = PayPalClient::new(&server.uri(), "id", "secret", Duration::from_secs(5)).unwrap();
        let first = client.get_order("5O190127TN364715T").await.unwrap();
        let second = client.get_order("5O190127TN364715T").await.unwrap();

        assert_eq!(first.status, "COMPLETED");
        assert_eq!(second.amount().unwrap().value, "40.00");
        assert_eq!(second.payer_email().as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn rejected_credentials_surface_as_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = PayPalClient::new(&server.uri(), "id", "bad", Duration::from_secs(5)).unwrap();
        let err = client.get_order("5O190127TN364715T").await.unwrap_err();
        assert!(matches!(err, ServiceError::PaymentProvider(_)));
    }

    #[test]
    fn order_ids_cannot_escape_the_path() {
        assert!(is_paypal_id("5O190127TN364715T"));
        assert!(!is_paypal_id("../v1/oauth2/token"));
        assert!(!is_paypal_id(""));
    }
}
