mod common;

use std::time::Duration;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{response_json, stripe_signature, TestApp, WEBHOOK_SECRET};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn stripe_app(server: &MockServer) -> TestApp {
    let base = server.uri();
    TestApp::with_config(move |cfg| {
        cfg.stripe_secret_key = Some("sk_test_saria".to_string());
        cfg.stripe_publishable_key = Some("pk_test_saria".to_string());
        cfg.stripe_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        cfg.stripe_api_base = base;
    })
    .await
}

async fn paypal_app(server: &MockServer) -> TestApp {
    let base = server.uri();
    TestApp::with_config(move |cfg| {
        cfg.paypal_client_id = Some("paypal-client".to_string());
        cfg.paypal_client_secret = Some("paypal-secret".to_string());
        cfg.paypal_api_base = base;
    })
    .await
}

async fn post_webhook(app: &TestApp, event: &Value, signature: Option<String>) -> axum::response::Response {
    let payload = serde_json::to_vec(event).unwrap();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/payment/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("stripe-signature", sig);
    }
    app.send(builder.body(Body::from(payload)).unwrap()).await
}

async fn mount_paypal_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A21AA", "expires_in": 3600
        })))
        .mount(server)
        .await;
}

async fn mount_paypal_order(server: &MockServer, id: &str, status: &str, currency: &str, value: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/checkout/orders/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "status": status,
            "purchase_units": [{ "amount": { "currency_code": currency, "value": value } }]
        })))
        .mount(server)
        .await;
}

async fn fetch_order(app: &TestApp, order_id: &str) -> Value {
    response_json(
        app.get(&format!("/api/orders/{}", order_id), Some(&app.admin.token))
            .await,
    )
    .await
}

/// Reads stream frames until one contains `needle`
async fn read_until(body: &mut Body, needle: &str) -> String {
    let read = async {
        let mut seen = String::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.expect("stream frame");
            if let Some(data) = frame.data_ref() {
                seen.push_str(&String::from_utf8_lossy(data));
                if seen.contains(needle) {
                    return seen;
                }
            }
        }
        panic!("stream ended before {needle:?} arrived; got {seen:?}");
    };
    tokio::time::timeout(Duration::from_secs(5), read)
        .await
        .expect("timed out waiting for event")
}

fn succeeded_event(intent_id: &str, amount: i64, order_id: &str) -> Value {
    json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": intent_id,
            "amount": amount,
            "currency": "aed",
            "status": "succeeded",
            "receipt_email": "layla@saria.test",
            "metadata": { "orderId": order_id }
        }}
    })
}

#[tokio::test]
async fn card_checkout_is_paid_by_signed_webhook() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;

    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap().to_string();
    assert_eq!(order["isPaid"], json!(false));
    assert_eq!(order["totalPrice"].as_f64(), Some(40.0));
    assert_eq!(order["orderItems"][0]["qty"], json!(2));
    assert_eq!(order["orderItems"][0]["price"].as_f64(), Some(20.0));

    let product = response_json(app.get(&format!("/api/products/{}", serum.id), None).await).await;
    assert_eq!(product["countInStock"], json!(8));

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(header("Idempotency-Key", format!("order-{}", order_id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_3Saria",
            "amount": 4000,
            "currency": "aed",
            "status": "requires_payment_method",
            "client_secret": "pi_3Saria_secret_abc",
            "metadata": { "orderId": order_id }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app
        .post(
            "/api/payment/create-payment-intent",
            json!({ "orderId": order_id }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["clientSecret"], "pi_3Saria_secret_abc");

    let event = succeeded_event("pi_3Saria", 4000, &order_id);
    let payload = serde_json::to_vec(&event).unwrap();
    let response = post_webhook(&app, &event, Some(stripe_signature(&payload))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({ "received": true }));

    let paid = response_json(
        app.get(&format!("/api/orders/{}", order_id), Some(&app.customer.token))
            .await,
    )
    .await;
    assert_eq!(paid["isPaid"], json!(true));
    assert!(paid["paidAt"].is_string());
    assert_eq!(paid["paymentResult"]["id"], "pi_3Saria");
    assert_eq!(paid["paymentResult"]["provider"], "stripe");

    let again = app
        .post(
            "/api/payment/create-payment-intent",
            json!({ "orderId": order_id }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(again).await["message"], "Order already paid");
}

#[tokio::test]
async fn webhook_with_bad_signature_changes_nothing() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap();

    let event = succeeded_event("pi_forged", 4000, order_id);
    let forged = format!("t={},v1={}", chrono::Utc::now().timestamp(), "ab".repeat(32));
    let response = post_webhook(&app, &event, Some(forged)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing = post_webhook(&app, &event, None).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(missing).await["message"],
        "Missing Stripe-Signature header"
    );

    let unchanged = response_json(
        app.get(&format!("/api/orders/{}", order_id), Some(&app.customer.token))
            .await,
    )
    .await;
    assert_eq!(unchanged["isPaid"], json!(false));
}

#[tokio::test]
async fn webhook_amount_mismatch_is_acknowledged_but_not_paid() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap();

    let event = succeeded_event("pi_short", 100, order_id);
    let payload = serde_json::to_vec(&event).unwrap();
    let response = post_webhook(&app, &event, Some(stripe_signature(&payload))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = response_json(
        app.get(&format!("/api/orders/{}", order_id), Some(&app.customer.token))
            .await,
    )
    .await;
    assert_eq!(order["isPaid"], json!(false));
}

#[tokio::test]
async fn stripe_confirmation_rechecks_the_intent() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap().to_string();

    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_pending", "amount": 4000, "currency": "aed",
            "status": "processing", "metadata": { "orderId": order_id }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_done", "amount": 4000, "currency": "aed",
            "status": "succeeded", "metadata": { "orderId": order_id }
        })))
        .mount(&server)
        .await;

    let pending = app
        .post(
            "/api/payment/stripe/confirm",
            json!({ "orderId": order_id, "paymentIntentId": "pi_pending" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(pending.status(), StatusCode::BAD_REQUEST);

    let done = app
        .post(
            "/api/payment/stripe/confirm",
            json!({ "orderId": order_id, "paymentIntentId": "pi_done" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(done.status(), StatusCode::OK);
    let body = response_json(done).await;
    assert_eq!(body["isPaid"], json!(true));
    assert_eq!(body["paymentProvider"], "stripe");
}

#[tokio::test]
async fn paypal_verification_checks_status_currency_and_amount() {
    let server = MockServer::start().await;
    let app = paypal_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A21AA", "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/checkout/orders/WRONGAMOUNT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "WRONGAMOUNT1",
            "status": "COMPLETED",
            "purchase_units": [{ "amount": { "currency_code": "AED", "value": "39.00" } }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/checkout/orders/5O190127TN364715T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "purchase_units": [{ "amount": { "currency_code": "AED", "value": "40.00" } }],
            "payer": { "email_address": "layla@saria.test" }
        })))
        .mount(&server)
        .await;

    let mismatch = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": order_id, "paypalOrderId": "WRONGAMOUNT1" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(mismatch).await["message"],
        "Amount mismatch: expected 40.00, got 39.00"
    );

    let verified = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": order_id, "paypalOrderId": "5O190127TN364715T" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(verified.status(), StatusCode::OK);
    let body = response_json(verified).await;
    assert_eq!(body["isPaid"], json!(true));
    assert_eq!(body["paypalOrderId"], "5O190127TN364715T");
    assert_eq!(body["paymentResult"]["emailAddress"], "layla@saria.test");

    let again = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": order_id, "paypalOrderId": "5O190127TN364715T" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(again).await["message"], "Order already paid");
}

#[tokio::test]
async fn payment_config_exposes_only_the_publishable_key() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let body = response_json(app.get("/api/payment/config", None).await).await;
    assert_eq!(body, json!({ "publishableKey": "pk_test_saria" }));
}

#[tokio::test]
async fn providers_without_credentials_are_rejected() {
    let app = TestApp::new().await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 1)]).await;

    let response = app
        .post(
            "/api/payment/create-payment-intent",
            json!({ "orderId": order["_id"] }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["message"], "Stripe is not configured");
}

#[tokio::test]
async fn one_paypal_capture_settles_one_order() {
    let server = MockServer::start().await;
    let app = paypal_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let first = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let second = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let first_id = first["_id"].as_str().unwrap();
    let second_id = second["_id"].as_str().unwrap();

    mount_paypal_token(&server).await;
    mount_paypal_order(&server, "CAPTURE1", "COMPLETED", "AED", "40.00").await;

    let paid = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": first_id, "paypalOrderId": "CAPTURE1" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(paid.status(), StatusCode::OK);

    let reused = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": second_id, "paypalOrderId": "CAPTURE1" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(reused.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(reused).await["message"],
        "PayPal order already used for another order"
    );

    assert_eq!(fetch_order(&app, first_id).await["isPaid"], json!(true));
    let second = fetch_order(&app, second_id).await;
    assert_eq!(second["isPaid"], json!(false));
    assert!(second["paypalOrderId"].is_null());
}

#[tokio::test]
async fn paypal_orders_that_are_not_completed_leave_the_order_unpaid() {
    let server = MockServer::start().await;
    let app = paypal_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap();

    mount_paypal_token(&server).await;
    mount_paypal_order(&server, "APPROVED1", "APPROVED", "AED", "40.00").await;

    let response = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": order_id, "paypalOrderId": "APPROVED1" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["message"],
        "PayPal order not completed (status APPROVED)"
    );
    assert_eq!(fetch_order(&app, order_id).await["isPaid"], json!(false));
}

#[tokio::test]
async fn paypal_orders_in_another_currency_leave_the_order_unpaid() {
    let server = MockServer::start().await;
    let app = paypal_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap();

    mount_paypal_token(&server).await;
    mount_paypal_order(&server, "DOLLARS1", "COMPLETED", "USD", "40.00").await;

    let response = app
        .post(
            "/api/payment/paypal/verify",
            json!({ "orderId": order_id, "paypalOrderId": "DOLLARS1" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await["message"],
        "Currency mismatch: expected AED, got USD"
    );
    assert_eq!(fetch_order(&app, order_id).await["isPaid"], json!(false));
}

#[tokio::test]
async fn failed_card_payment_is_recorded_and_broadcast() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap().to_string();

    let stream = app.get("/api/products/events", None).await;
    assert_eq!(stream.status(), StatusCode::OK);
    let mut body = stream.into_body();
    read_until(&mut body, "retry:").await;

    let event = json!({
        "id": "evt_2",
        "type": "payment_intent.payment_failed",
        "data": { "object": {
            "id": "pi_declined",
            "amount": 4000,
            "currency": "aed",
            "status": "requires_payment_method",
            "metadata": { "orderId": order_id },
            "last_payment_error": { "message": "Your card was declined." }
        }}
    });
    let payload = serde_json::to_vec(&event).unwrap();
    let response = post_webhook(&app, &event, Some(stripe_signature(&payload))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({ "received": true }));

    let frames = read_until(&mut body, "payment_failed").await;
    assert!(frames.contains(&order_id));
    assert!(frames.contains("Your card was declined."));

    let order = fetch_order(&app, &order_id).await;
    assert_eq!(order["isPaid"], json!(false));
    assert_eq!(order["paymentResult"]["id"], "pi_declined");
    assert_eq!(order["paymentResult"]["provider"], "stripe");
    assert_eq!(order["paymentResult"]["status"], "requires_payment_method");
    assert_eq!(order["paymentResult"]["error"], "Your card was declined.");
}

#[tokio::test]
async fn open_payment_intent_is_reused() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(header("Idempotency-Key", format!("order-{}", order_id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_open", "amount": 4000, "currency": "aed",
            "status": "requires_payment_method",
            "client_secret": "pi_open_secret_1",
            "metadata": { "orderId": order_id }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_open", "amount": 4000, "currency": "aed",
            "status": "requires_payment_method",
            "client_secret": "pi_open_secret_1",
            "metadata": { "orderId": order_id }
        })))
        .expect(1)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let body = response_json(
            app.post(
                "/api/payment/create-payment-intent",
                json!({ "orderId": order_id }),
                Some(&app.customer.token),
            )
            .await,
        )
        .await;
        assert_eq!(body["clientSecret"], "pi_open_secret_1");
    }
}

#[tokio::test]
async fn canceled_payment_intent_is_replaced() {
    let server = MockServer::start().await;
    let app = stripe_app(&server).await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let order = app.place_order(&app.customer, &[(&serum, 2)]).await;
    let order_id = order["_id"].as_str().unwrap().to_string();

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(header("Idempotency-Key", format!("order-{}", order_id).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_old", "amount": 4000, "currency": "aed",
            "status": "requires_payment_method",
            "client_secret": "pi_old_secret",
            "metadata": { "orderId": order_id }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payment_intents/pi_old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_old", "amount": 4000, "currency": "aed",
            "status": "canceled",
            "client_secret": "pi_old_secret",
            "metadata": { "orderId": order_id }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(header(
            "Idempotency-Key",
            format!("order-{}-replaces-pi_old", order_id).as_str(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_new", "amount": 4000, "currency": "aed",
            "status": "requires_payment_method",
            "client_secret": "pi_new_secret",
            "metadata": { "orderId": order_id }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let first = response_json(
        app.post(
            "/api/payment/create-payment-intent",
            json!({ "orderId": order_id }),
            Some(&app.customer.token),
        )
        .await,
    )
    .await;
    assert_eq!(first["clientSecret"], "pi_old_secret");

    let replaced = response_json(
        app.post(
            "/api/payment/create-payment-intent",
            json!({ "orderId": order_id }),
            Some(&app.customer.token),
        )
        .await,
    )
    .await;
    assert_eq!(replaced["clientSecret"], "pi_new_secret");
}
