//! PostgreSQL adapters - persistent implementations of every store port.
//!
//! `PostgresStore` wraps one `PgPool`. Writes that must stay consistent
//! under concurrency take locks inside their transaction:
//! - quota-bearing inserts lock the trainer's subscription row
//!   (`SELECT ... FOR UPDATE`) and recount usage before writing
//! - booking writes take `pg_advisory_xact_lock` keyed by the trainer
//! - webhook commits lock the webhook event row and re-check `processed`

mod admin;
mod billing;
mod clients;
mod identity;
mod jobs;
mod notifications;
mod quota;
mod scheduling;
mod workflow;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::fmt::Display;
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

/// PostgreSQL implementation of the store ports.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool with the configured limits.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let url = config
            .connection_url()
            .ok_or_else(|| DomainError::database("No database URL configured"))?;
        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min)
            .max_connections(config.pool.max)
            .acquire_timeout(config.pool.acquire_timeout())
            .idle_timeout(Some(config.pool.idle_timeout()))
            .max_lifetime(Some(config.pool.max_lifetime()))
            .connect(url)
            .await
            .map_err(db_error("Failed to connect to database"))?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Wraps a sqlx error with context.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

/// Name of the violated unique constraint, if that is what failed.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// Parses a text column into a domain enum.
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid {} value '{}': {}", column, raw, e),
        )
    })
}

pub(crate) fn ts(dt: DateTime<Utc>) -> Timestamp {
    Timestamp::from_datetime(dt)
}

pub(crate) fn opt_ts(dt: Option<DateTime<Utc>>) -> Option<Timestamp> {
    dt.map(Timestamp::from_datetime)
}

pub(crate) fn dt(ts: &Timestamp) -> DateTime<Utc> {
    *ts.as_datetime()
}

pub(crate) fn opt_dt(ts: &Option<Timestamp>) -> Option<DateTime<Utc>> {
    ts.as_ref().map(dt)
}

/// Converts a count column to u32, saturating.
pub(crate) fn count_u32(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    const SCHEMA: &str = include_str!("../../../migrations/0001_initial.sql");

    /// `(table, body)` for every `CREATE TABLE` block.
    fn tables() -> Vec<(&'static str, &'static str)> {
        SCHEMA
            .split("CREATE TABLE ")
            .skip(1)
            .filter_map(|chunk| {
                let (name, rest) = chunk.split_once(" (")?;
                let body = rest.split("\n);").next()?;
                Some((name.trim(), body))
            })
            .collect()
    }

    fn has_index(table: &str, columns: &str) -> bool {
        SCHEMA
            .lines()
            .filter(|l| l.starts_with("CREATE INDEX") || l.starts_with("CREATE UNIQUE INDEX"))
            .any(|l| l.contains(&format!(" ON {}({}", table, columns)))
    }

    #[test]
    fn tenant_tables_are_indexed_by_creation_time() {
        let mut checked = 0;
        for (table, body) in tables() {
            let tenant_scoped = body.lines().any(|l| {
                let l = l.trim_start();
                l.starts_with("trainer_id ") && !l.contains("UNIQUE")
            });
            if !tenant_scoped {
                continue;
            }
            let time_column = if body.contains("created_at") { "created_at" } else { "purchased_at" };
            assert!(
                has_index(table, &format!("trainer_id, {}", time_column)),
                "{} lacks a (trainer_id, {}) index",
                table,
                time_column
            );
            checked += 1;
        }
        assert!(checked >= 12, "only {} tenant tables found", checked);
    }

    #[test]
    fn bookings_are_indexed_by_status_and_start() {
        assert!(has_index("bookings", "status, start_at"));
        assert!(has_index("bookings", "trainer_id, start_at"));
    }
}
