mod common;

use axum::http::StatusCode;
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn contact_inbox_round_trip() {
    let app = TestApp::new().await;

    let created = app
        .post(
            "/api/contact",
            json!({
                "name": "Layla",
                "email": "layla@saria.test",
                "subject": "Shade help",
                "message": "Which foundation suits olive skin?"
            }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = response_json(created).await;
    assert_eq!(created["success"], json!(true));
    let id = created["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["status"], "new");

    let forbidden = app.get("/api/contact", Some(&app.customer.token)).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let inbox = response_json(app.get("/api/contact", Some(&app.admin.token)).await).await;
    assert_eq!(inbox.as_array().unwrap().len(), 1);

    let read = response_json(
        app.put(&format!("/api/contact/{}/read", id), json!({}), Some(&app.admin.token))
            .await,
    )
    .await;
    assert_eq!(read["status"], "read");

    let replied = response_json(
        app.put(
            &format!("/api/contact/{}/reply", id),
            json!({ "reply": "Try shade 3" }),
            Some(&app.admin.token),
        )
        .await,
    )
    .await;
    assert_eq!(replied["status"], "replied");
    assert_eq!(replied["adminReply"], "Try shade 3");
    assert_eq!(replied["unreadReply"], json!(true));

    let mine = response_json(app.get("/api/contact/mine", Some(&app.customer.token)).await).await;
    assert_eq!(mine[0]["adminReply"], "Try shade 3");

    let stranger = app.create_customer("Omar", "omar@saria.test").await;
    let denied = app
        .put(&format!("/api/contact/{}/seen", id), json!({}), Some(&stranger.token))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let seen = response_json(
        app.put(&format!("/api/contact/{}/seen", id), json!({}), Some(&app.customer.token))
            .await,
    )
    .await;
    assert_eq!(seen["unreadReply"], json!(false));
}

#[tokio::test]
async fn contact_form_validation() {
    let app = TestApp::new().await;
    let missing = app
        .post("/api/contact", json!({ "name": "Layla", "email": "layla@saria.test" }), None)
        .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(missing).await["message"], "Please fill all fields");

    let bad_email = app
        .post(
            "/api/contact",
            json!({ "name": "Layla", "email": "not-an-email", "subject": "Hi", "message": "Hello" }),
            None,
        )
        .await;
    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn newsletter_subscription() {
    let app = TestApp::new().await;
    let ok = app
        .post("/api/newsletter/subscribe", json!({ "email": "fan@example.com" }), None)
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(response_json(ok).await["message"], "Thank you for subscribing!");

    let missing = app.post("/api/newsletter/subscribe", json!({}), None).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pages_are_edited_by_admins() {
    let app = TestApp::new().await;

    let missing = app.get("/api/pages/faq", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(missing).await["message"], "Content not found");

    let page = json!({
        "title": "FAQ",
        "content": "Answers to common questions",
        "sections": [{ "title": "Shipping", "content": "2-4 days across the UAE" }]
    });
    let denied = app.post("/api/pages/faq", page.clone(), Some(&app.customer.token)).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let saved = app.post("/api/pages/faq", page, Some(&app.admin.token)).await;
    assert_eq!(saved.status(), StatusCode::OK);

    let merged = response_json(
        app.post("/api/pages/faq", json!({ "subtitle": "We're here to help" }), Some(&app.admin.token))
            .await,
    )
    .await;
    assert_eq!(merged["title"], "FAQ");
    assert_eq!(merged["subtitle"], "We're here to help");

    let fetched = response_json(app.get("/api/pages/faq", None).await).await;
    assert_eq!(fetched["sections"][0]["title"], "Shipping");

    let bad_slug = app
        .post("/api/pages/Not%20A%20Slug", json!({ "title": "x" }), Some(&app.admin.token))
        .await;
    assert_eq!(bad_slug.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = TestApp::new().await;
    let account = json!({ "name": "Nour", "email": "Nour@Example.com", "password": "rosewater" });

    let registered = app.post("/api/users", account.clone(), None).await;
    assert_eq!(registered.status(), StatusCode::CREATED);
    let registered = response_json(registered).await;
    assert_eq!(registered["email"], "nour@example.com");
    assert_eq!(registered["isAdmin"], json!(false));
    assert!(registered["token"].is_string());

    let duplicate = app.post("/api/users", account, None).await;
    assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(duplicate).await["message"], "User already exists");

    let wrong = app
        .post("/api/users/login", json!({ "email": "nour@example.com", "password": "nope-nope" }), None)
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let login = response_json(
        app.post("/api/users/login", json!({ "email": "nour@example.com", "password": "rosewater" }), None)
            .await,
    )
    .await;
    let token = login["token"].as_str().unwrap();

    let profile = response_json(app.get("/api/users/profile", Some(token)).await).await;
    assert_eq!(profile["name"], "Nour");
    assert!(profile.get("passwordHash").is_none());
}

#[tokio::test]
async fn customers_edit_their_own_profile() {
    let app = TestApp::new().await;
    app.create_customer("Omar", "omar@saria.test").await;

    let anonymous = app
        .put("/api/users/profile", json!({ "name": "Nobody" }), None)
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let taken = app
        .put(
            "/api/users/profile",
            json!({ "email": "Omar@Saria.test" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(taken.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(taken).await["message"], "User already exists");

    let updated = app
        .put(
            "/api/users/profile",
            json!({ "name": "Layla H", "email": "layla.h@saria.test", "password": "orange-blossom" }),
            Some(&app.customer.token),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = response_json(updated).await;
    assert_eq!(updated["name"], "Layla H");
    assert_eq!(updated["email"], "layla.h@saria.test");
    let token = updated["token"].as_str().unwrap();

    let profile = response_json(app.get("/api/users/profile", Some(token)).await).await;
    assert_eq!(profile["email"], "layla.h@saria.test");

    let login = app
        .post(
            "/api/users/login",
            json!({ "email": "layla.h@saria.test", "password": "orange-blossom" }),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn admins_manage_roles_and_see_stats() {
    let app = TestApp::new().await;

    let users = app.get("/api/users", Some(&app.customer.token)).await;
    assert_eq!(users.status(), StatusCode::FORBIDDEN);
    let users = response_json(app.get("/api/users", Some(&app.admin.token)).await).await;
    assert_eq!(users.as_array().unwrap().len(), 2);

    let promoted = response_json(
        app.put(
            &format!("/api/users/{}/admin", app.customer.id),
            json!({ "isAdmin": true }),
            Some(&app.admin.token),
        )
        .await,
    )
    .await;
    assert_eq!(promoted["isAdmin"], json!(true));

    let demote_self = app
        .put(
            &format!("/api/users/{}/admin", app.admin.id),
            json!({ "isAdmin": false }),
            Some(&app.admin.token),
        )
        .await;
    assert_eq!(demote_self.status(), StatusCode::BAD_REQUEST);

    let serum = app.seed_product("Rose Serum", dec!(20.00), 10).await;
    let buyer = app.create_customer("Omar", "omar@saria.test").await;
    app.place_order(&buyer, &[(&serum, 2)]).await;

    let stats = response_json(app.get("/api/admin/stats", Some(&app.admin.token)).await).await;
    assert_eq!(stats["orders"], json!(1));
    assert_eq!(stats["products"], json!(1));
    assert_eq!(stats["customers"], json!(3));
    assert_eq!(stats["totalSales"].as_f64(), Some(0.0));
    assert!(stats.get("totalOrders").is_none());
    let monthly = stats["monthly"].as_array().unwrap();
    assert_eq!(monthly.len(), 6);
    assert_eq!(monthly[5]["orders"], json!(1));
}

#[tokio::test]
async fn health_reports_the_database() {
    let app = TestApp::new().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["details"]["database"]["status"], "up");
    assert_eq!(body["details"]["event_stream_connections"], json!(0));

    let live = response_json(app.get("/health/live", None).await).await;
    assert_eq!(live["status"], "up");
}
