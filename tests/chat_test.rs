mod common;

use axum::http::StatusCode;
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn anonymous_greeting_and_blank_message() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/chat", json!({ "message": "Hello", "sessionId": "web-1" }), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("Hello! Welcome to Saria Beauty"));
    assert_eq!(body["context"]["lastTopic"], "greeting");
    assert!(!body["suggestions"].as_array().unwrap().is_empty());

    let blank = app.post("/api/chat", json!({ "message": "  " }), None).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(blank).await["message"], "Message is required");
}

#[tokio::test]
async fn order_questions_use_the_bearer_identity() {
    let app = TestApp::new().await;
    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    app.place_order(&app.customer, &[(&serum, 1)]).await;

    // A userId in the body is not an identity
    let anonymous = response_json(
        app.post(
            "/api/chat",
            json!({ "message": "where is my order", "userId": app.customer.id }),
            None,
        )
        .await,
    )
    .await;
    assert!(anonymous["response"].as_str().unwrap().starts_with("Please log in"));

    let signed_in = response_json(
        app.post(
            "/api/chat",
            json!({ "message": "where is my order", "sessionId": "web-2" }),
            Some(&app.customer.token),
        )
        .await,
    )
    .await;
    let text = signed_in["response"].as_str().unwrap();
    assert!(text.starts_with("Here are your recent orders"), "{}", text);
    assert!(text.contains("Pending - In Transit"));
}

#[tokio::test]
async fn product_questions_quote_store_prices() {
    let app = TestApp::new().await;
    app.seed_product_in("Argan Hair Oil", "Haircare", dec!(45.00), 5).await;

    let body = response_json(
        app.post("/api/chat", json!({ "message": "do you sell argan oil?" }), None)
            .await,
    )
    .await;
    let text = body["response"].as_str().unwrap();
    assert!(text.contains("Argan Hair Oil (AED 45.00)"), "{}", text);
    assert_eq!(body["context"]["lastTopic"], "products");
}

#[tokio::test]
async fn unmatched_messages_fall_back_to_the_completion_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-saria"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": " Niacinamide helps refine pores. " } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = server.uri();
    let app = TestApp::with_config(move |cfg| {
        cfg.openai_api_key = Some("sk-test-saria".to_string());
        cfg.openai_api_base = base;
    })
    .await;

    let body = response_json(
        app.post(
            "/api/chat",
            json!({ "message": "any tips for pores?", "sessionId": "web-3" }),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["response"], "Niacinamide helps refine pores.");
}

#[tokio::test]
async fn completion_errors_keep_the_default_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let base = server.uri();
    let app = TestApp::with_config(move |cfg| {
        cfg.openai_api_key = Some("sk-test-saria".to_string());
        cfg.openai_api_base = base;
    })
    .await;

    let response = app
        .post("/api/chat", json!({ "message": "what's the weather" }), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("I'm Saria's assistant"));
}
