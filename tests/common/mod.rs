#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use saria_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{product, user},
    events::{EventBus, InProcessEventBus},
    handlers::AppServices,
    AppState,
};

pub const JWT_SECRET: &str = "integration_test_secret_with_plenty_of_entropy_42";
pub const WEBHOOK_SECRET: &str = "whsec_integration_test";

/// Signed-in account created directly in the database
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Full router over a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub admin: TestUser,
    pub customer: TestUser,
}

impl TestApp {
    /// App with no payment providers and no completion API
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// App whose configuration is adjusted before services are built,
    /// e.g. to point Stripe or PayPal at a mock server.
    pub async fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        // One connection keeps the in-memory database alive and shared
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.provider_timeout_secs = 5;
        configure(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let events: Arc<dyn EventBus> = Arc::new(InProcessEventBus::new(cfg.sse_client_buffer));
        let auth = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration_secs),
        )));
        let services = AppServices::new(&cfg, db_arc.clone(), events.clone(), auth.clone())
            .expect("services build from test config");

        let state = AppState {
            db: db_arc,
            config: cfg,
            events,
            auth,
            services,
        };
        let router = saria_api::app_router(state.clone());

        let admin = create_user(&state, "Store Admin", "admin@saria.test", true).await;
        let customer = create_user(&state, "Layla", "layla@saria.test", false).await;

        Self {
            router,
            state,
            admin,
            customer,
        }
    }

    /// Another non-admin account
    pub async fn create_customer(&self, name: &str, email: &str) -> TestUser {
        create_user(&self.state, name, email, false).await
    }

    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        self.seed_product_in(name, "Skincare", price, stock).await
    }

    pub async fn seed_product_in(
        &self,
        name: &str,
        category: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(format!("{} for everyday care", name)),
            category: Set(category.to_string()),
            image: Set("1.png".to_string()),
            price: Set(price),
            count_in_stock: Set(stock),
            rating: Set(0.0),
            num_reviews: Set(0),
            translations: Set(json!({})),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    /// Sends a request through the full router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("build request")).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.request(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        self.request(Method::PUT, uri, Some(body), token).await
    }

    /// Places `[{product, price, qty}]` for `user` with totals summed from the lines
    pub async fn place_order(&self, user: &TestUser, lines: &[(&product::Model, i32)]) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|(p, qty)| {
                json!({
                    "product": p.id,
                    "name": p.name,
                    "image": p.image,
                    "price": p.price.to_string(),
                    "qty": qty,
                })
            })
            .collect();
        let total: Decimal = lines
            .iter()
            .map(|(p, qty)| p.price * Decimal::from(*qty))
            .sum();

        let response = self
            .post(
                "/api/orders",
                json!({
                    "orderItems": items,
                    "shippingAddress": {
                        "address": "12 Jumeirah Beach Rd",
                        "city": "Dubai",
                        "postalCode": "00000",
                        "country": "AE"
                    },
                    "paymentMethod": "Stripe",
                    "itemsPrice": total.to_string(),
                    "taxPrice": "0",
                    "shippingPrice": "0",
                    "totalPrice": total.to_string(),
                }),
                Some(&user.token),
            )
            .await;
        assert_eq!(response.status(), 201, "order creation failed");
        response_json(response).await
    }
}

async fn create_user(state: &AppState, name: &str, email: &str, is_admin: bool) -> TestUser {
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        is_admin: Set(is_admin),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .expect("seed user");

    let token = state
        .auth
        .issue_token(model.id, &model.name, &model.email, is_admin)
        .expect("issue token");
    TestUser {
        id: model.id,
        email: model.email,
        token,
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// `Stripe-Signature` value for `payload`, signed now
pub fn stripe_signature(payload: &[u8]) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let signature = saria_api::services::payments::stripe::compute_signature(
        WEBHOOK_SECRET,
        timestamp,
        payload,
    )
    .expect("sign payload");
    format!("t={},v1={}", timestamp, signature)
}
