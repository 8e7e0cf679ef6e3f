//! Readiness probes for the store of record and the cache.

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::RedisConfig;
use crate::ports::HealthProbe;

/// Runs `SELECT 1` on the pool.
pub struct PostgresProbe {
    pool: PgPool,
}

impl PostgresProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthProbe for PostgresProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Opens a connection and sends `PING`, bounded by the configured timeout.
pub struct RedisProbe {
    client: redis::Client,
    timeout: Duration,
}

impl RedisProbe {
    pub fn new(config: &RedisConfig) -> Result<Self, String> {
        let url = config.endpoint().ok_or_else(|| "redis URL is not set".to_string())?;
        let client = redis::Client::open(url).map_err(|e| e.to_string())?;
        Ok(Self {
            client,
            timeout: config.probe_timeout(),
        })
    }
}

#[async_trait]
impl HealthProbe for RedisProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self) -> Result<(), String> {
        let ping = async {
            let mut conn = self
                .client
                .get_multiplexed_tokio_connection()
                .await
                .map_err(|e: redis::RedisError| e.to_string())?;
            redis::cmd("PING")
                .query_async::<_, String>(&mut conn)
                .await
                .map(|_| ())
                .map_err(|e: redis::RedisError| e.to_string())
        };
        match tokio::time::timeout(self.timeout, ping).await {
            Ok(result) => result,
            Err(_) => Err(format!("no answer within {}ms", self.timeout.as_millis())),
        }
    }
}

/// Probe with a fixed answer, for in-memory runs and tests.
pub struct StaticProbe {
    name: &'static str,
    result: Result<(), String>,
}

impl StaticProbe {
    pub fn healthy(name: &'static str) -> Self {
        Self { name, result: Ok(()) }
    }

    pub fn failing(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            result: Err(reason.into()),
        }
    }
}

#[async_trait]
impl HealthProbe for StaticProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn check(&self) -> Result<(), String> {
        self.result.clone()
    }
}
