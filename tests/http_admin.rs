//! Superuser operations over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn trainers_cannot_reach_admin_routes() {
    let app = TestApp::new();
    let (token, _) = app.register("sam@example.com").await;
    let (status, body) = app.get("/admin/trainers", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn search_and_bulk_suspend_are_audited() {
    let app = TestApp::new();
    let (sam_token, sam) = app.register("sam@example.com").await;
    app.register("kim@example.com").await;
    let admin = app.superuser_token().await;

    let (status, found) = app.get("/admin/trainers?search=sam%40example.com", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["total"], 1);
    assert_eq!(found["items"][0]["email"], "sam@example.com");
    assert_eq!(found["items"][0]["plan"], "free");

    let sam_id = sam["trainer"]["id"].as_str().unwrap();
    let (status, outcome) = app
        .send(
            Method::POST,
            "/admin/trainers/bulk-action",
            Some(&admin),
            Some(json!({
                "action": "suspend",
                "trainer_ids": [sam_id, "00000000-0000-0000-0000-000000000000"],
                "reason": "chargeback"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", outcome);
    assert_eq!(outcome["success_count"], 1);
    assert_eq!(outcome["failed"].as_array().unwrap().len(), 1);

    // Suspension revokes live sessions.
    let (status, _) = app.get("/users/me", &sam_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, audit) = app.get("/admin/actions", &admin).await;
    assert_eq!(audit["total"], 1);
    assert_eq!(audit["items"][0]["kind"], "suspend_trainer");
    assert_eq!(audit["items"][0]["details"]["reason"], "chargeback");
}

#[tokio::test]
async fn empty_bulk_requests_are_rejected() {
    let app = TestApp::new();
    let admin = app.superuser_token().await;
    let (status, _) = app
        .send(
            Method::POST,
            "/admin/trainers/bulk-action",
            Some(&admin),
            Some(json!({"action": "verify", "trainer_ids": []})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn impersonation_token_acts_as_the_trainer() {
    let app = TestApp::new();
    let (_, sam) = app.register("sam@example.com").await;
    let admin = app.superuser_token().await;
    let sam_id = sam["trainer"]["id"].as_str().unwrap();

    let (status, issued) = app
        .send(
            Method::POST,
            &format!("/admin/trainers/{}/impersonate", sam_id),
            Some(&admin),
            Some(json!({"reason": "support ticket 42"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", issued);
    assert!(issued["expires_at"].is_string());

    let token = issued["token"].as_str().unwrap();
    let (status, trainer) = app.get("/trainers/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trainer["id"], sam_id);

    let (_, audit) = app.get("/admin/actions", &admin).await;
    assert_eq!(audit["items"][0]["kind"], "impersonate");
}

#[tokio::test]
async fn unresolvable_webhooks_can_be_replayed_once_the_trainer_exists() {
    let app = TestApp::new();
    let admin = app.superuser_token().await;
    let event = json!({
        "event_id": "evt_early",
        "event_type": "subscription.created",
        "data": {
            "id": "sub_early",
            "status": "active",
            "items": [{"price": {"id": "pri_business_yearly"}}],
            "custom_data": {"email": "late@example.com"}
        }
    });

    let (status, _) = app.deliver_webhook(&event).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, pending) = app.get("/admin/webhooks?unprocessed=true", &admin).await;
    assert_eq!(pending["total"], 1);
    assert!(pending["items"][0]["error_message"].is_string());

    let (token, _) = app.register("late@example.com").await;
    let (status, ack) = app
        .send(Method::POST, "/admin/webhooks/evt_early/replay", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", ack);
    assert_eq!(ack["status"], "processed");

    let (_, summary) = app.get("/subscriptions/current", &token).await;
    assert_eq!(summary["subscription"]["plan"], "business");

    let (status, _) = app
        .send(Method::POST, "/admin/webhooks/evt_missing/replay", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
