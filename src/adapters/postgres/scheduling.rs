use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use super::{db_error, dt, opt_dt, opt_ts, parse_column, ts, unique_violation, PostgresStore};
use crate::domain::foundation::{
    AvailabilityRuleId, BookingId, BreakId, ClientId, DomainError, Page, PageRequest, Timestamp, TrainerId,
};
use crate::domain::scheduling::{AvailabilityRule, Booking, BookingStatus, BreakPeriod};
use crate::ports::{AvailabilityRepository, BookingFilter, BookingRepository, BookingWindow, BookingWrite};

#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: Uuid,
    trainer_id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    is_active: bool,
    is_recurring: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RuleRow> for AvailabilityRule {
    type Error = DomainError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let day_of_week = u8::try_from(row.day_of_week)
            .map_err(|_| DomainError::database(format!("Invalid day_of_week value '{}'", row.day_of_week)))?;
        Ok(AvailabilityRule {
            id: AvailabilityRuleId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            is_active: row.is_active,
            is_recurring: row.is_recurring,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BreakRow {
    id: Uuid,
    trainer_id: Uuid,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BreakRow> for BreakPeriod {
    fn from(row: BreakRow) -> Self {
        BreakPeriod {
            id: BreakId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            start: ts(row.start_at),
            end: ts(row.end_at),
            reason: row.reason,
            created_at: ts(row.created_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    trainer_id: Uuid,
    client_id: Uuid,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    status: String,
    notes: String,
    cancellation_reason: Option<String>,
    location: Option<String>,
    reminder_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DomainError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: BookingId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            client_id: ClientId::from_uuid(row.client_id),
            start: ts(row.start_at),
            end: ts(row.end_at),
            status: parse_column::<BookingStatus>("status", &row.status)?,
            notes: row.notes,
            cancellation_reason: row.cancellation_reason,
            location: row.location,
            reminder_sent_at: opt_ts(row.reminder_sent_at),
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

const RULE_COLUMNS: &str =
    "id, trainer_id, day_of_week, start_time, end_time, is_active, is_recurring, created_at, updated_at";
const BREAK_COLUMNS: &str = "id, trainer_id, start_at, end_at, reason, created_at";
const BOOKING_COLUMNS: &str = "id, trainer_id, client_id, start_at, end_at, status, notes, cancellation_reason, \
     location, reminder_sent_at, created_at, updated_at";

/// Held statuses, matching `BookingStatus::is_held`.
const HELD: &str = "status IN ('pending', 'confirmed')";

fn bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, DomainError> {
    rows.into_iter().map(Booking::try_from).collect()
}

/// Serializes booking writes of one trainer until the transaction ends.
async fn lock_trainer_bookings(tx: &mut Transaction<'_, Postgres>, trainer_id: TrainerId) -> Result<(), DomainError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(trainer_id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to lock trainer bookings"))?;
    Ok(())
}

/// First held booking other than `booking` overlapping its interval.
async fn held_conflict(conn: &mut PgConnection, booking: &Booking) -> Result<Option<BookingId>, DomainError> {
    let sql = format!(
        "SELECT id FROM bookings WHERE trainer_id = $1 AND id <> $2 AND {} \
         AND start_at < $4 AND end_at > $3 ORDER BY start_at LIMIT 1",
        HELD
    );
    let id: Option<Uuid> = sqlx::query_scalar(&sql)
        .bind(booking.trainer_id.as_uuid())
        .bind(booking.id.as_uuid())
        .bind(dt(&booking.start))
        .bind(dt(&booking.end))
        .fetch_optional(conn)
        .await
        .map_err(db_error("Failed to check booking overlap"))?;
    Ok(id.map(BookingId::from_uuid))
}

#[async_trait]
impl AvailabilityRepository for PostgresStore {
    async fn list_rules(&self, trainer_id: TrainerId) -> Result<Vec<AvailabilityRule>, DomainError> {
        let sql = format!(
            "SELECT {} FROM availability_rules WHERE trainer_id = $1 ORDER BY day_of_week, start_time",
            RULE_COLUMNS
        );
        let rows: Vec<RuleRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list availability rules"))?;
        rows.into_iter().map(AvailabilityRule::try_from).collect()
    }

    async fn find_rule(&self, trainer_id: TrainerId, id: AvailabilityRuleId) -> Result<Option<AvailabilityRule>, DomainError> {
        let sql = format!("SELECT {} FROM availability_rules WHERE trainer_id = $1 AND id = $2", RULE_COLUMNS);
        let row: Option<RuleRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find availability rule"))?;
        row.map(AvailabilityRule::try_from).transpose()
    }

    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO availability_rules (
                id, trainer_id, day_of_week, start_time, end_time, is_active, is_recurring, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                day_of_week = EXCLUDED.day_of_week,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                is_active = EXCLUDED.is_active,
                is_recurring = EXCLUDED.is_recurring,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(rule.id.as_uuid())
        .bind(rule.trainer_id.as_uuid())
        .bind(i16::from(rule.day_of_week))
        .bind(rule.start_time)
        .bind(rule.end_time)
        .bind(rule.is_active)
        .bind(rule.is_recurring)
        .bind(dt(&rule.created_at))
        .bind(dt(&rule.updated_at))
        .execute(self.pool())
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => DomainError::conflict("An identical availability rule already exists"),
            None => db_error("Failed to save availability rule")(e),
        })?;
        Ok(())
    }

    async fn delete_rule(&self, trainer_id: TrainerId, id: AvailabilityRuleId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM availability_rules WHERE trainer_id = $1 AND id = $2")
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete availability rule"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_breaks(&self, trainer_id: TrainerId) -> Result<Vec<BreakPeriod>, DomainError> {
        let sql = format!("SELECT {} FROM break_periods WHERE trainer_id = $1 ORDER BY start_at", BREAK_COLUMNS);
        let rows: Vec<BreakRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list breaks"))?;
        Ok(rows.into_iter().map(BreakPeriod::from).collect())
    }

    async fn list_breaks_between(&self, trainer_id: TrainerId, from: Timestamp, to: Timestamp) -> Result<Vec<BreakPeriod>, DomainError> {
        let sql = format!(
            "SELECT {} FROM break_periods WHERE trainer_id = $1 AND start_at < $3 AND end_at > $2 ORDER BY start_at",
            BREAK_COLUMNS
        );
        let rows: Vec<BreakRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(dt(&from))
            .bind(dt(&to))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list breaks"))?;
        Ok(rows.into_iter().map(BreakPeriod::from).collect())
    }

    async fn insert_break(&self, period: &BreakPeriod) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO break_periods (id, trainer_id, start_at, end_at, reason, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(period.id.as_uuid())
        .bind(period.trainer_id.as_uuid())
        .bind(dt(&period.start))
        .bind(dt(&period.end))
        .bind(&period.reason)
        .bind(dt(&period.created_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to insert break"))?;
        Ok(())
    }

    async fn delete_break(&self, trainer_id: TrainerId, id: BreakId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM break_periods WHERE trainer_id = $1 AND id = $2")
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete break"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookingRepository for PostgresStore {
    async fn insert_checked(&self, booking: &Booking) -> Result<BookingWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;
        lock_trainer_bookings(&mut tx, booking.trainer_id).await?;

        if booking.status.is_held() {
            if let Some(existing) = held_conflict(&mut tx, booking).await? {
                return Ok(BookingWrite::Conflict(existing));
            }
        }

        sqlx::query(&format!(
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            BOOKING_COLUMNS
        ))
        .bind(booking.id.as_uuid())
        .bind(booking.trainer_id.as_uuid())
        .bind(booking.client_id.as_uuid())
        .bind(dt(&booking.start))
        .bind(dt(&booking.end))
        .bind(booking.status.as_str())
        .bind(&booking.notes)
        .bind(&booking.cancellation_reason)
        .bind(&booking.location)
        .bind(opt_dt(&booking.reminder_sent_at))
        .bind(dt(&booking.created_at))
        .bind(dt(&booking.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert booking"))?;

        tx.commit().await.map_err(db_error("Failed to commit booking"))?;
        Ok(BookingWrite::Written)
    }

    async fn update(&self, booking: &Booking, check_overlap: bool) -> Result<BookingWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;
        lock_trainer_bookings(&mut tx, booking.trainer_id).await?;

        if check_overlap && booking.status.is_held() {
            if let Some(existing) = held_conflict(&mut tx, booking).await? {
                return Ok(BookingWrite::Conflict(existing));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                start_at = $3, end_at = $4, status = $5, notes = $6, cancellation_reason = $7,
                location = $8, reminder_sent_at = $9, updated_at = $10
            WHERE id = $1 AND trainer_id = $2
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.trainer_id.as_uuid())
        .bind(dt(&booking.start))
        .bind(dt(&booking.end))
        .bind(booking.status.as_str())
        .bind(&booking.notes)
        .bind(&booking.cancellation_reason)
        .bind(&booking.location)
        .bind(opt_dt(&booking.reminder_sent_at))
        .bind(dt(&booking.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to update booking"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Booking"));
        }
        tx.commit().await.map_err(db_error("Failed to commit booking"))?;
        Ok(BookingWrite::Written)
    }

    async fn find(&self, trainer_id: TrainerId, id: BookingId) -> Result<Option<Booking>, DomainError> {
        let sql = format!("SELECT {} FROM bookings WHERE trainer_id = $1 AND id = $2", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find booking"))?;
        row.map(Booking::try_from).transpose()
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find booking"))?;
        row.map(Booking::try_from).transpose()
    }

    async fn list(&self, trainer_id: TrainerId, filter: &BookingFilter, page: PageRequest) -> Result<Page<Booking>, DomainError> {
        let (upcoming, past) = match filter.window {
            BookingWindow::All => (None, None),
            BookingWindow::Upcoming(now) => (Some(dt(&now)), None),
            BookingWindow::Past(now) => (None, Some(dt(&now))),
        };
        let predicate = format!(
            "trainer_id = $1 \
             AND ($2::text IS NULL OR status = $2) \
             AND ($3::uuid IS NULL OR client_id = $3) \
             AND ($4::timestamptz IS NULL OR start_at >= $4) \
             AND ($5::timestamptz IS NULL OR start_at < $5) \
             AND ($6::timestamptz IS NULL OR ({} AND start_at >= $6)) \
             AND ($7::timestamptz IS NULL OR end_at < $7)",
            HELD
        );

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bookings WHERE {}", predicate))
            .bind(trainer_id.as_uuid())
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.client_id.map(|c| *c.as_uuid()))
            .bind(filter.from.as_ref().map(dt))
            .bind(filter.to.as_ref().map(dt))
            .bind(upcoming)
            .bind(past)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count bookings"))?;

        let sql = format!(
            "SELECT {} FROM bookings WHERE {} ORDER BY start_at DESC OFFSET $8 LIMIT $9",
            BOOKING_COLUMNS, predicate
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.client_id.map(|c| *c.as_uuid()))
            .bind(filter.from.as_ref().map(dt))
            .bind(filter.to.as_ref().map(dt))
            .bind(upcoming)
            .bind(past)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list bookings"))?;

        Ok(Page::new(bookings(rows)?, total.max(0) as u64, page))
    }

    async fn list_held_between(&self, trainer_id: TrainerId, from: Timestamp, to: Timestamp) -> Result<Vec<Booking>, DomainError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE trainer_id = $1 AND {} AND start_at < $3 AND end_at > $2 ORDER BY start_at",
            BOOKING_COLUMNS, HELD
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(dt(&from))
            .bind(dt(&to))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list held bookings"))?;
        bookings(rows)
    }

    async fn list_due_for_reminder(&self, from: Timestamp, to: Timestamp, limit: u32) -> Result<Vec<Booking>, DomainError> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE status = 'confirmed' AND reminder_sent_at IS NULL \
             AND start_at >= $1 AND start_at < $2 ORDER BY start_at LIMIT $3",
            BOOKING_COLUMNS
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(dt(&from))
            .bind(dt(&to))
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list bookings due for reminder"))?;
        bookings(rows)
    }
}
