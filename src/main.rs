use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use coachdesk::adapters::auth::Argon2PasswordHasher;
use coachdesk::adapters::events::LocalEventBus;
use coachdesk::adapters::health::{PostgresProbe, RedisProbe, StaticProbe};
use coachdesk::adapters::http::{build_router, AppState, WebhookSettings};
use coachdesk::adapters::jobs::{JobRunner, JobRunnerConfig, PeriodicScheduler};
use coachdesk::adapters::memory::InMemoryStore;
use coachdesk::adapters::notifications::{email_sender_from_config, sms_sender_from_config};
use coachdesk::adapters::postgres::PostgresStore;
use coachdesk::application::handlers::jobs::JobExecutor;
use coachdesk::application::handlers::notification::{BookingMessenger, NotificationDispatcher};
use coachdesk::application::handlers::workflow::{ExecutionRunner, WorkflowEngine};
use coachdesk::application::Stores;
use coachdesk::config::{AppConfig, LogFormat, ServerConfig};
use coachdesk::domain::identity::TokenIssuer;
use coachdesk::ports::HealthProbe;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let (stores, mut probes) = open_stores(&config).await?;
    if config.redis.is_configured() {
        probes.push(Arc::new(RedisProbe::new(&config.redis)?));
    }

    let bus = Arc::new(LocalEventBus::new());
    Arc::new(WorkflowEngine::new(
        stores.workflows.clone(),
        stores.executions.clone(),
        stores.jobs.clone(),
    ))
    .subscribe_to(bus.as_ref());

    let issuer = TokenIssuer::new(
        config.auth.token_secret.expose_secret().as_bytes(),
        config.auth.session_ttl_hours,
    );
    let state = AppState::new(stores.clone(), bus.clone(), Arc::new(Argon2PasswordHasher::new()), issuer)
        .with_webhooks(WebhookSettings {
            secret: config.payment.webhook_secret().map(str::to_string),
            catalog: config.payment.price_catalog(),
        })
        .with_probes(probes)
        .with_webhook_retention_days(config.jobs.webhook_retention_days)
        .with_impersonation_minutes(config.auth.impersonation_ttl_minutes);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = Vec::new();
    if config.jobs.enabled {
        let dispatcher = NotificationDispatcher::new(
            stores.notifications.clone(),
            email_sender_from_config(&config.email)?,
            sms_sender_from_config(&config.sms)?,
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
            Arc::new(state.notification_maintenance()),
        );
        let runner = JobRunner::new(stores.jobs.clone(), Arc::new(executor), JobRunnerConfig::from(&config.jobs));
        let scheduler = PeriodicScheduler::from_config(stores.jobs.clone(), &config.jobs);

        let rx = shutdown_rx.clone();
        workers.push(tokio::spawn(async move { runner.run(rx).await }));
        let rx = shutdown_rx.clone();
        workers.push(tokio::spawn(async move { scheduler.run(rx).await }));
        tracing::info!("job runner and scheduler started");
    } else {
        tracing::warn!("background jobs disabled; reminders and workflow actions will not run");
    }

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "coachdesk listening");

    axum::serve(listener, build_router(state, &config.server))
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "background worker ended abnormally");
        }
    }
    tracing::info!("shutdown complete");
    Ok(())
}

/// `RUST_LOG` overrides the configured level.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level))
        .add_directive("hyper=warn".parse().unwrap_or_else(|_| tracing::Level::WARN.into()))
        .add_directive("sqlx::query=warn".parse().unwrap_or_else(|_| tracing::Level::WARN.into()));

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format() {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}

/// PostgreSQL when a database URL is set, otherwise the in-memory store.
async fn open_stores(config: &AppConfig) -> Result<(Stores, Vec<Arc<dyn HealthProbe>>), BoxError> {
    if !config.database.is_configured() {
        tracing::warn!("no database configured; using the in-memory store");
        let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(StaticProbe::healthy("store"))];
        return Ok((Stores::from_store(InMemoryStore::new()), probes));
    }

    let store = PostgresStore::connect(&config.database).await?;
    if config.database.run_migrations {
        store.migrate().await?;
        tracing::info!("database migrations applied");
    }
    let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(PostgresProbe::new(store.pool().clone()))];
    Ok((Stores::from_store(store), probes))
}

/// Resolves on Ctrl-C or SIGTERM and tells the background workers to stop.
async fn shutdown_signal(shutdown: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
    let _ = shutdown.send(true);
}
