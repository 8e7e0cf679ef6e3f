//! Workflow automation end to end: HTTP configuration, event dispatch and
//! the job runner doing the sends.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

async fn pro_trainer(app: &TestApp) -> String {
    let (token, _) = app.register("sam@example.com").await;
    app.upgrade("sam@example.com", "pri_pro_monthly").await;
    token
}

#[tokio::test]
async fn client_created_workflow_sends_a_rendered_email() {
    let app = TestApp::new();
    let token = pro_trainer(&app).await;

    let (status, template) = app
        .post(
            "/workflows/templates",
            &token,
            json!({
                "template_type": "sms",
                "name": "Welcome text",
                "body": "Hi {{client_name}}!"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", template);

    let (status, workflow) = app
        .post(
            "/workflows/workflows",
            &token,
            json!({
                "name": "Welcome beginners",
                "trigger": {
                    "event_type": "client_created",
                    "conditions": {"fitness_level": "beginner"}
                },
                "actions": [
                    {"action_type": "send_email", "action_data": {
                        "subject": "Welcome {{client_name}}",
                        "body": "See you soon, {{client_name}}."
                    }},
                    {"action_type": "send_sms", "action_data": {"template_id": template["id"]}}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", workflow);
    let first = &workflow["actions"][0];
    assert_eq!(first["action_type"], "send_email");
    assert_eq!(first["action_data"]["subject"], "Welcome {{client_name}}");
    assert_eq!(first["order"], 1);
    assert!(first.get("spec").is_none());

    let (status, _) = app
        .post(
            "/clients",
            &token,
            json!({"name": "Ari Lane", "email": "ari@example.com", "phone": "+15550100", "fitness_level": "beginner"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Does not match the condition.
    app.post(
        "/clients",
        &token,
        json!({"name": "Kim Park", "email": "kim@example.com", "fitness_level": "advanced"}),
    )
    .await;

    let (_, executions) = app.get("/workflows/executions", &token).await;
    assert_eq!(executions["total"], 1);
    assert_eq!(executions["items"][0]["status"], "pending");

    assert_eq!(app.drain_jobs().await, 1);

    let emails = app.email.sent();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].recipient, "ari@example.com");
    assert_eq!(emails[0].subject.as_deref(), Some("Welcome Ari Lane"));
    let texts = app.sms.sent();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].body, "Hi Ari Lane!");

    let (_, executions) = app.get("/workflows/executions?status=completed", &token).await;
    assert_eq!(executions["total"], 1);
    assert_eq!(executions["items"][0]["actions_completed"], 2);

    let (_, log) = app.get("/notifications?channel=email", &token).await;
    assert_eq!(log["total"], 1);
    assert_eq!(log["items"][0]["status"], "sent");
}

#[tokio::test]
async fn toggled_off_workflows_do_not_fire() {
    let app = TestApp::new();
    let token = pro_trainer(&app).await;
    let (_, workflow) = app
        .post(
            "/workflows/workflows",
            &token,
            json!({
                "name": "Note",
                "trigger": {"event_type": "client_created"},
                "actions": [{"action_type": "create_note", "action_data": {"target": "client", "text": "new"}}]
            }),
        )
        .await;
    let id = workflow["id"].as_str().unwrap();

    let (status, toggled) = app
        .send(Method::POST, &format!("/workflows/workflows/{}/toggle", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    app.post("/clients", &token, json!({"name": "Ari", "email": "ari@example.com"})).await;
    let (_, executions) = app.get("/workflows/executions", &token).await;
    assert_eq!(executions["total"], 0);
}

#[tokio::test]
async fn pro_plan_caps_active_workflows() {
    let app = TestApp::new();
    let token = pro_trainer(&app).await;
    let body = |n: u32| {
        json!({
            "name": format!("Workflow {}", n),
            "trigger": {"event_type": "booking_created"},
            "actions": [{"action_type": "create_note", "action_data": {"target": "booking", "text": "x"}}]
        })
    };
    for n in 0..3 {
        let (status, created) = app.post("/workflows/workflows", &token, body(n)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
    }
    let (status, err) = app.post("/workflows/workflows", &token, body(3)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(err["code"], "QUOTA_EXCEEDED");
}

#[tokio::test]
async fn workflows_with_non_trigger_events_are_rejected() {
    let app = TestApp::new();
    let token = pro_trainer(&app).await;
    let (status, _) = app
        .post(
            "/workflows/workflows",
            &token,
            json!({
                "name": "Bad",
                "trigger": {"event_type": "tenant_deleted"},
                "actions": [{"action_type": "create_note", "action_data": {"target": "client", "text": "x"}}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
