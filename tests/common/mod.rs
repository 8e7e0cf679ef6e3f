//! Shared harness for the HTTP integration tests: the full router over the
//! in-memory store, driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use coachdesk::adapters::events::LocalEventBus;
use coachdesk::adapters::health::StaticProbe;
use coachdesk::adapters::http::{api_router, AppState, WebhookSettings};
use coachdesk::adapters::jobs::{JobRunner, JobRunnerConfig};
use coachdesk::adapters::memory::InMemoryStore;
use coachdesk::adapters::notifications::RecordingTransport;
use coachdesk::application::handlers::jobs::JobExecutor;
use coachdesk::application::handlers::notification::{BookingMessenger, NotificationDispatcher};
use coachdesk::application::handlers::workflow::{ExecutionRunner, WorkflowEngine};
use coachdesk::application::Stores;
use coachdesk::domain::billing::signature_header;
use coachdesk::domain::foundation::{DomainError, Timestamp};
use coachdesk::domain::identity::{Principal, PrincipalProfile, TokenIssuer};
use coachdesk::ports::{PasswordHasher, TokenStore};

pub const WEBHOOK_SECRET: &str = "pdl_ntfset_test_secret";
pub const PASSWORD: &str = "correct-horse-9";

/// Reversible stand-in for Argon2 so tests do not pay for key stretching.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        Ok(format!("plain:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash == format!("plain:{}", password)
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub state: AppState,
    pub bus: Arc<LocalEventBus>,
    pub issuer: TokenIssuer,
    pub email: RecordingTransport,
    pub sms: RecordingTransport,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_hasher(Arc::new(PlainHasher))
    }

    pub fn with_hasher(hasher: Arc<dyn PasswordHasher>) -> Self {
        let store = InMemoryStore::new();
        let stores = Stores::from_store(store.clone());
        let bus = Arc::new(LocalEventBus::with_capture());
        Arc::new(WorkflowEngine::new(
            stores.workflows.clone(),
            stores.executions.clone(),
            stores.jobs.clone(),
        ))
        .subscribe_to(bus.as_ref());

        let issuer = TokenIssuer::new("integration-test-secret", Some(24));
        let state = AppState::new(stores, bus.clone(), hasher, issuer.clone())
            .with_webhooks(WebhookSettings {
                secret: Some(WEBHOOK_SECRET.to_string()),
                catalog: Default::default(),
            })
            .with_probes(vec![Arc::new(StaticProbe::healthy("store"))]);

        Self {
            router: api_router(state.clone()),
            store,
            state,
            bus,
            issuer,
            email: RecordingTransport::new(),
            sms: RecordingTransport::new(),
        }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Token {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        read(response).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Signs up a trainer and returns (token, response body).
    pub async fn register(&self, email: &str) -> (String, Value) {
        let (status, body) = self
            .send(
                Method::POST,
                "/users/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "password_confirmation": PASSWORD,
                    "first_name": "Sam",
                    "last_name": "Rivera"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (body["token"].as_str().unwrap().to_string(), body)
    }

    /// Seeds a superuser and a session token for it.
    pub async fn superuser_token(&self) -> String {
        let now = Timestamp::now();
        let mut principal = Principal::new_trainer(
            "ops@coachdesk.test".to_string(),
            "plain:unused".to_string(),
            PrincipalProfile {
                first_name: "Ops".to_string(),
                ..Default::default()
            },
            now,
        );
        principal.is_trainer = false;
        principal.is_superuser = true;
        let id = principal.id;
        self.store.seed_principal(principal).await;

        let (token, record) = self.issuer.issue_session(id, now).unwrap();
        TokenStore::insert(&self.store, &record).await.unwrap();
        token
    }

    /// Delivers a correctly signed Paddle notification.
    pub async fn deliver_webhook(&self, payload: &Value) -> (StatusCode, Value) {
        let raw = payload.to_string();
        let signature = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), raw.as_bytes()).unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/payments/webhooks/paddle")
            .header("content-type", "application/json")
            .header("paddle-signature", signature)
            .body(Body::from(raw))
            .unwrap();
        read(self.router.clone().oneshot(request).await.unwrap()).await
    }

    /// Moves the trainer with `email` onto a paid plan via a webhook.
    pub async fn upgrade(&self, email: &str, price_id: &str) {
        let (status, body) = self
            .deliver_webhook(&json!({
                "event_id": format!("evt_upgrade_{}", email),
                "event_type": "subscription.created",
                "occurred_at": "2025-01-01T00:00:00Z",
                "data": {
                    "id": format!("sub_{}", email),
                    "status": "active",
                    "customer_id": format!("ctm_{}", email),
                    "items": [{"price": {"id": price_id}}],
                    "custom_data": {"email": email}
                }
            }))
            .await;
        assert_eq!(status, StatusCode::OK, "upgrade failed: {}", body);
    }

    /// Runs every due job through the real executor with recording transports.
    pub async fn drain_jobs(&self) -> usize {
        let stores = &self.state.stores;
        let dispatcher = NotificationDispatcher::new(
            stores.notifications.clone(),
            Arc::new(self.email.clone()),
            Arc::new(self.sms.clone()),
        );
        let executor = JobExecutor::new(
            Arc::new(ExecutionRunner::new(
                stores.executions.clone(),
                stores.workflows.clone(),
                stores.templates.clone(),
                stores.bookings.clone(),
                stores.clients.clone(),
                dispatcher.clone(),
            )),
            Arc::new(BookingMessenger::new(
                stores.bookings.clone(),
                stores.clients.clone(),
                stores.trainers.clone(),
                dispatcher.clone(),
            )),
            dispatcher,
            Arc::new(self.state.notification_maintenance()),
        );
        JobRunner::new(stores.jobs.clone(), Arc::new(executor), JobRunnerConfig::default())
            .drain()
            .await
            .unwrap()
    }
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}
