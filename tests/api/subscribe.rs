use alert_subscriptions::domain::Column;
use fake::{
    faker::{internet::en::SafeEmail, name::en::FirstName},
    Fake,
};
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::spawn_app;

#[tokio::test]
async fn subscribe_returns_200_and_stores_a_pending_row() {
    // GIVEN
    let app = spawn_app().await;
    let name: String = FirstName().fake();
    let email: String = SafeEmail().fake();

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // WHEN
    let response = app
        .post_subscribe(&json!({
            "email": email,
            "name": name,
            "districts": ["Pune", "Nashik"],
            "receive_forecasts": false
        }))
        .await;

    // THEN
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "message": "Verification email sent! Please check your inbox."
        })
    );

    let row = app.row_of(&email.to_lowercase());
    assert_eq!(Column::Name.read(&row), name);
    assert_eq!(Column::Districts.read(&row), "Pune,Nashik");
    assert_eq!(Column::ReceiveForecasts.read(&row), "no");
    assert_eq!(Column::Status.read(&row), "pending");
    assert_eq!(Column::VerifiedAt.read(&row), "");
    assert!(!Column::VerificationToken.read(&row).is_empty());
}

#[tokio::test]
async fn subscribe_sends_a_verification_email_with_a_link() {
    // GIVEN
    let app = spawn_app().await;
    app.mock_email_delivery().await;

    // WHEN
    app.post_subscribe(&json!({ "email": "a@x.com", "districts": ["D1"] }))
        .await;

    // THEN
    let email_request = &app.email_server.received_requests().await.unwrap()[0];
    let links = app.get_verification_links(email_request);
    assert_eq!(links.html, links.plain_text);
    assert_eq!(links.html.path(), "/verify");
    let token = app.token_of("a@x.com");
    assert_eq!(links.html.query(), Some(format!("token={}", token).as_str()));
}

#[tokio::test]
async fn emails_are_stored_lowercase() {
    // GIVEN
    let app = spawn_app().await;
    app.mock_email_delivery().await;

    // WHEN
    app.post_subscribe(&json!({ "email": "  Mixed.Case@Example.COM ", "districts": ["D1"] }))
        .await;

    // THEN
    assert_eq!(app.status_of("mixed.case@example.com"), "pending");
}

#[tokio::test]
async fn subscribe_returns_400_for_invalid_bodies() {
    // GIVEN
    let app = spawn_app().await;
    let test_cases = [
        (json!({ "districts": ["D1"] }), "Valid email address is required", "no email"),
        (json!({ "email": "", "districts": ["D1"] }), "Valid email address is required", "empty email"),
        (json!({ "email": "not-an-email", "districts": ["D1"] }), "Valid email address is required", "no @ sign in email"),
        (json!({ "email": "a@x.com" }), "At least one district must be selected", "no districts"),
        (json!({ "email": "a@x.com", "districts": [] }), "At least one district must be selected", "empty districts"),
        (json!({ "email": "a@x.com", "districts": ["", " "] }), "At least one district must be selected", "blank districts"),
    ];

    for (invalid_body, expected_error, why_invalid) in test_cases {
        // WHEN
        let response = app.post_subscribe(&invalid_body).await;

        // THEN
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the body had {why_invalid}"
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "success": false, "error": expected_error }));
    }
    assert!(app.store.snapshot().is_empty());
}

#[tokio::test]
async fn subscribe_returns_400_for_an_invalid_name() {
    // GIVEN
    let app = spawn_app().await;

    // WHEN
    let response = app
        .post_subscribe(&json!({ "email": "a@x.com", "name": "<b>", "districts": ["D1"] }))
        .await;

    // THEN
    assert_eq!(response.status().as_u16(), 400);
    assert!(app.store.snapshot().is_empty());
}

#[tokio::test]
async fn subscribe_returns_400_for_malformed_json() {
    // GIVEN
    let app = spawn_app().await;

    // WHEN
    let response = app.post_raw_subscribe("{\"email\": ").await;

    // THEN
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn subscribing_a_verified_email_again_returns_400_without_a_new_row() {
    // GIVEN
    let app = spawn_app().await;
    let token = app.subscribe("a@x.com").await;
    app.get_verify(&format!("?token={}", token)).await;

    // WHEN
    let response = app
        .post_subscribe(&json!({ "email": "A@x.com", "districts": ["D2"] }))
        .await;

    // THEN
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "error": "This email is already subscribed." })
    );
    assert_eq!(app.store.snapshot().len(), 1);
}

#[tokio::test]
async fn subscribing_a_pending_email_again_resends_the_same_token() {
    // GIVEN
    let app = spawn_app().await;
    let token = app.subscribe("a@x.com").await;

    // WHEN
    let response = app
        .post_subscribe(&json!({ "email": "a@x.com", "districts": ["D1"] }))
        .await;

    // THEN
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Verification email re-sent. Please check your inbox."
    );
    assert_eq!(app.store.snapshot().len(), 1);

    let email_requests = app.email_server.received_requests().await.unwrap();
    assert_eq!(email_requests.len(), 2);
    let resent = app.get_verification_links(&email_requests[1]);
    assert_eq!(resent.html.query(), Some(format!("token={}", token).as_str()));
}

#[tokio::test]
async fn subscribe_returns_500_if_the_email_cannot_be_sent() {
    // GIVEN
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    // WHEN
    let response = app
        .post_subscribe(&json!({ "email": "a@x.com", "districts": ["D1"] }))
        .await;

    // THEN
    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "error": "Failed to process subscription. Please try again." })
    );
}

#[tokio::test]
async fn preflight_requests_are_answered_with_cors_headers() {
    // GIVEN
    let app = spawn_app().await;

    // WHEN
    let response = app
        .api_client
        .request(reqwest::Method::OPTIONS, format!("{}/subscribe", app.address))
        .header("Origin", "https://dashboard.example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("Failed to execute request.");

    // THEN
    assert_eq!(response.status().as_u16(), 200);
    let headers = response.headers();
    assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
    assert_eq!(
        headers.get("Access-Control-Allow-Methods").unwrap(),
        "POST, OPTIONS"
    );
    assert_eq!(
        headers.get("Access-Control-Allow-Headers").unwrap(),
        "Content-Type"
    );
}
