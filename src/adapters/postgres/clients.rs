use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

use super::quota::check_quota;
use super::{db_error, dt, parse_column, ts, unique_violation, PostgresStore};
use crate::domain::clients::{
    Client, ClientPaymentStatus, FitnessLevel, ManualPayment, Package, PackagePurchase, PaymentMethod,
};
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{
    AttributeMap, BookingId, ClientId, DomainError, ManualPaymentId, PackageId, PackagePurchaseId, Page,
    PageRequest, Timestamp, TrainerId,
};
use crate::ports::{
    ClientFilter, ClientRepository, ManualPaymentRepository, PackageRepository, QuotaWrite, SessionUse,
};

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    trainer_id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    fitness_level: String,
    goals: Json<Vec<String>>,
    preferences: Json<AttributeMap>,
    notes: String,
    is_active: bool,
    total_paid_cents: i64,
    last_payment_date: Option<NaiveDate>,
    payment_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = DomainError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        Ok(Client {
            id: ClientId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            fitness_level: parse_column::<FitnessLevel>("fitness_level", &row.fitness_level)?,
            goals: row.goals.0,
            preferences: row.preferences.0,
            notes: row.notes,
            is_active: row.is_active,
            total_paid_cents: row.total_paid_cents,
            last_payment_date: row.last_payment_date,
            payment_status: parse_column::<ClientPaymentStatus>("payment_status", &row.payment_status)?,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

const CLIENT_COLUMNS: &str = "id, trainer_id, name, email, phone, fitness_level, goals, preferences, notes, \
     is_active, total_paid_cents, last_payment_date, payment_status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PackageRow {
    id: Uuid,
    trainer_id: Uuid,
    name: String,
    description: String,
    sessions_count: i32,
    price_cents: i64,
    currency: String,
    validity_days: Option<i32>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: PackageId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            name: row.name,
            description: row.description,
            sessions_count: row.sessions_count.max(0) as u32,
            price_cents: row.price_cents,
            currency: row.currency,
            validity_days: row.validity_days.map(|d| d.max(0) as u32),
            is_active: row.is_active,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        }
    }
}

const PACKAGE_COLUMNS: &str =
    "id, trainer_id, name, description, sessions_count, price_cents, currency, validity_days, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    trainer_id: Uuid,
    client_id: Uuid,
    package_id: Uuid,
    sessions_remaining: i32,
    purchased_at: DateTime<Utc>,
    expiry_date: Option<NaiveDate>,
}

impl From<PurchaseRow> for PackagePurchase {
    fn from(row: PurchaseRow) -> Self {
        PackagePurchase {
            id: PackagePurchaseId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            client_id: ClientId::from_uuid(row.client_id),
            package_id: PackageId::from_uuid(row.package_id),
            sessions_remaining: row.sessions_remaining.max(0) as u32,
            purchased_at: ts(row.purchased_at),
            expiry_date: row.expiry_date,
        }
    }
}

const PURCHASE_COLUMNS: &str = "id, trainer_id, client_id, package_id, sessions_remaining, purchased_at, expiry_date";

#[derive(Debug, sqlx::FromRow)]
struct ManualPaymentRow {
    id: Uuid,
    trainer_id: Uuid,
    client_id: Uuid,
    amount_cents: i64,
    currency: String,
    method: String,
    payment_date: NaiveDate,
    reference_id: Option<String>,
    notes: String,
    package_purchase_id: Option<Uuid>,
    booking_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ManualPaymentRow> for ManualPayment {
    type Error = DomainError;

    fn try_from(row: ManualPaymentRow) -> Result<Self, Self::Error> {
        Ok(ManualPayment {
            id: ManualPaymentId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            client_id: ClientId::from_uuid(row.client_id),
            amount_cents: row.amount_cents,
            currency: row.currency,
            method: parse_column::<PaymentMethod>("method", &row.method)?,
            payment_date: row.payment_date,
            reference_id: row.reference_id,
            notes: row.notes,
            package_purchase_id: row.package_purchase_id.map(PackagePurchaseId::from_uuid),
            booking_id: row.booking_id.map(BookingId::from_uuid),
            created_at: ts(row.created_at),
        })
    }
}

const MANUAL_PAYMENT_COLUMNS: &str = "id, trainer_id, client_id, amount_cents, currency, method, payment_date, \
     reference_id, notes, package_purchase_id, booking_id, created_at";

fn client_conflict(err: sqlx::Error) -> DomainError {
    match unique_violation(&err) {
        Some(_) => DomainError::conflict("A client with this email already exists").with_detail("field", "email"),
        None => db_error("Failed to save client")(err),
    }
}

#[async_trait]
impl ClientRepository for PostgresStore {
    async fn insert(&self, client: &Client, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let decision = check_quota(&mut tx, client.trainer_id, ResourceKind::Clients, enforce_quota && client.is_active).await?;
        if decision != QuotaWrite::Written {
            return Ok(decision);
        }

        sqlx::query(&format!(
            "INSERT INTO clients ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            CLIENT_COLUMNS
        ))
        .bind(client.id.as_uuid())
        .bind(client.trainer_id.as_uuid())
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.fitness_level.as_str())
        .bind(Json(&client.goals))
        .bind(Json(&client.preferences))
        .bind(&client.notes)
        .bind(client.is_active)
        .bind(client.total_paid_cents)
        .bind(client.last_payment_date)
        .bind(client.payment_status.as_str())
        .bind(dt(&client.created_at))
        .bind(dt(&client.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(client_conflict)?;

        tx.commit().await.map_err(db_error("Failed to commit client"))?;
        Ok(QuotaWrite::Written)
    }

    async fn update(&self, client: &Client, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let was_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM clients WHERE id = $1 AND trainer_id = $2 FOR UPDATE")
                .bind(client.id.as_uuid())
                .bind(client.trainer_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock client"))?;
        let was_active = was_active.ok_or_else(|| DomainError::not_found("Client"))?;

        let activating = client.is_active && !was_active;
        let decision = check_quota(&mut tx, client.trainer_id, ResourceKind::Clients, enforce_quota && activating).await?;
        if decision != QuotaWrite::Written {
            return Ok(decision);
        }

        sqlx::query(
            r#"
            UPDATE clients SET
                name = $3, email = $4, phone = $5, fitness_level = $6, goals = $7, preferences = $8,
                notes = $9, is_active = $10, total_paid_cents = $11, last_payment_date = $12,
                payment_status = $13, updated_at = $14
            WHERE id = $1 AND trainer_id = $2
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(client.trainer_id.as_uuid())
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.fitness_level.as_str())
        .bind(Json(&client.goals))
        .bind(Json(&client.preferences))
        .bind(&client.notes)
        .bind(client.is_active)
        .bind(client.total_paid_cents)
        .bind(client.last_payment_date)
        .bind(client.payment_status.as_str())
        .bind(dt(&client.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(client_conflict)?;

        tx.commit().await.map_err(db_error("Failed to commit client"))?;
        Ok(QuotaWrite::Written)
    }

    async fn find(&self, trainer_id: TrainerId, id: ClientId) -> Result<Option<Client>, DomainError> {
        let sql = format!("SELECT {} FROM clients WHERE trainer_id = $1 AND id = $2", CLIENT_COLUMNS);
        let row: Option<ClientRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find client"))?;
        row.map(Client::try_from).transpose()
    }

    async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, DomainError> {
        let sql = format!("SELECT {} FROM clients WHERE id = $1", CLIENT_COLUMNS);
        let row: Option<ClientRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find client"))?;
        row.map(Client::try_from).transpose()
    }

    async fn list(&self, trainer_id: TrainerId, filter: &ClientFilter, page: PageRequest) -> Result<Page<Client>, DomainError> {
        let pattern = filter.search.as_deref().map(|term| format!("%{}%", term.to_lowercase()));
        let predicate = "trainer_id = $1 AND ($2::boolean IS NULL OR is_active = $2) \
             AND ($3::text IS NULL OR LOWER(name) LIKE $3 OR email LIKE $3)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM clients WHERE {}", predicate))
            .bind(trainer_id.as_uuid())
            .bind(filter.is_active)
            .bind(&pattern)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count clients"))?;

        let sql = format!(
            "SELECT {} FROM clients WHERE {} ORDER BY LOWER(name), id OFFSET $4 LIMIT $5",
            CLIENT_COLUMNS, predicate
        );
        let rows: Vec<ClientRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(filter.is_active)
            .bind(&pattern)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list clients"))?;

        let items = rows.into_iter().map(Client::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn delete(&self, trainer_id: TrainerId, id: ClientId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM clients WHERE trainer_id = $1 AND id = $2")
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete client"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PackageRepository for PostgresStore {
    async fn save(&self, package: &Package) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO packages ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, description = EXCLUDED.description, \
                sessions_count = EXCLUDED.sessions_count, price_cents = EXCLUDED.price_cents, \
                currency = EXCLUDED.currency, validity_days = EXCLUDED.validity_days, \
                is_active = EXCLUDED.is_active, updated_at = EXCLUDED.updated_at",
            PACKAGE_COLUMNS
        ))
        .bind(package.id.as_uuid())
        .bind(package.trainer_id.as_uuid())
        .bind(&package.name)
        .bind(&package.description)
        .bind(i32::try_from(package.sessions_count).unwrap_or(i32::MAX))
        .bind(package.price_cents)
        .bind(&package.currency)
        .bind(package.validity_days.map(|d| i32::try_from(d).unwrap_or(i32::MAX)))
        .bind(package.is_active)
        .bind(dt(&package.created_at))
        .bind(dt(&package.updated_at))
        .execute(self.pool())
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => DomainError::conflict("A package with this name already exists").with_detail("field", "name"),
            None => db_error("Failed to save package")(e),
        })?;
        Ok(())
    }

    async fn find(&self, trainer_id: TrainerId, id: PackageId) -> Result<Option<Package>, DomainError> {
        let sql = format!("SELECT {} FROM packages WHERE trainer_id = $1 AND id = $2", PACKAGE_COLUMNS);
        let row: Option<PackageRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find package"))?;
        Ok(row.map(Package::from))
    }

    async fn list(&self, trainer_id: TrainerId, active_only: bool) -> Result<Vec<Package>, DomainError> {
        let sql = format!(
            "SELECT {} FROM packages WHERE trainer_id = $1 AND (NOT $2 OR is_active) ORDER BY name",
            PACKAGE_COLUMNS
        );
        let rows: Vec<PackageRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(active_only)
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list packages"))?;
        Ok(rows.into_iter().map(Package::from).collect())
    }

    async fn insert_purchase(&self, purchase: &PackagePurchase) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO package_purchases ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            PURCHASE_COLUMNS
        ))
        .bind(purchase.id.as_uuid())
        .bind(purchase.trainer_id.as_uuid())
        .bind(purchase.client_id.as_uuid())
        .bind(purchase.package_id.as_uuid())
        .bind(i32::try_from(purchase.sessions_remaining).unwrap_or(i32::MAX))
        .bind(dt(&purchase.purchased_at))
        .bind(purchase.expiry_date)
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to insert package purchase"))?;
        Ok(())
    }

    async fn list_purchases(&self, trainer_id: TrainerId, client_id: Option<ClientId>) -> Result<Vec<PackagePurchase>, DomainError> {
        let sql = format!(
            "SELECT {} FROM package_purchases WHERE trainer_id = $1 AND ($2::uuid IS NULL OR client_id = $2) \
             ORDER BY purchased_at DESC",
            PURCHASE_COLUMNS
        );
        let rows: Vec<PurchaseRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(client_id.map(|c| *c.as_uuid()))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list package purchases"))?;
        Ok(rows.into_iter().map(PackagePurchase::from).collect())
    }

    async fn consume_session(&self, trainer_id: TrainerId, id: PackagePurchaseId, today: NaiveDate) -> Result<SessionUse, DomainError> {
        let consumed: Option<PurchaseRow> = sqlx::query_as(&format!(
            "UPDATE package_purchases SET sessions_remaining = sessions_remaining - 1 \
             WHERE id = $1 AND trainer_id = $2 AND sessions_remaining > 0 \
               AND (expiry_date IS NULL OR expiry_date >= $3) \
             RETURNING {}",
            PURCHASE_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(trainer_id.as_uuid())
        .bind(today)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to consume package session"))?;

        if let Some(row) = consumed {
            return Ok(SessionUse::Consumed(PackagePurchase::from(row)));
        }

        let remaining: Option<i32> =
            sqlx::query_scalar("SELECT sessions_remaining FROM package_purchases WHERE id = $1 AND trainer_id = $2")
                .bind(id.as_uuid())
                .bind(trainer_id.as_uuid())
                .fetch_optional(self.pool())
                .await
                .map_err(db_error("Failed to find package purchase"))?;
        Ok(match remaining {
            None => SessionUse::NotFound,
            Some(0) => SessionUse::Exhausted,
            Some(_) => SessionUse::Expired,
        })
    }
}

#[async_trait]
impl ManualPaymentRepository for PostgresStore {
    async fn record(&self, payment: &ManualPayment) -> Result<Client, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let row: Option<ClientRow> = sqlx::query_as(&format!(
            "SELECT {} FROM clients WHERE id = $1 AND trainer_id = $2 FOR UPDATE",
            CLIENT_COLUMNS
        ))
        .bind(payment.client_id.as_uuid())
        .bind(payment.trainer_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock client"))?;
        let mut client = row
            .map(Client::try_from)
            .transpose()?
            .ok_or_else(|| DomainError::not_found("Client"))?;

        client.record_payment(payment.amount_cents, payment.payment_date, Timestamp::now());

        sqlx::query(&format!(
            "INSERT INTO manual_payments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            MANUAL_PAYMENT_COLUMNS
        ))
        .bind(payment.id.as_uuid())
        .bind(payment.trainer_id.as_uuid())
        .bind(payment.client_id.as_uuid())
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(payment.method.as_str())
        .bind(payment.payment_date)
        .bind(&payment.reference_id)
        .bind(&payment.notes)
        .bind(payment.package_purchase_id.map(|p| *p.as_uuid()))
        .bind(payment.booking_id.map(|b| *b.as_uuid()))
        .bind(dt(&payment.created_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert manual payment"))?;

        sqlx::query(
            "UPDATE clients SET total_paid_cents = $2, last_payment_date = $3, payment_status = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(client.id.as_uuid())
        .bind(client.total_paid_cents)
        .bind(client.last_payment_date)
        .bind(client.payment_status.as_str())
        .bind(dt(&client.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to update client rollups"))?;

        tx.commit().await.map_err(db_error("Failed to commit manual payment"))?;
        Ok(client)
    }

    async fn list_for_client(&self, trainer_id: TrainerId, client_id: ClientId) -> Result<Vec<ManualPayment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM manual_payments WHERE trainer_id = $1 AND client_id = $2 \
             ORDER BY payment_date DESC, created_at DESC",
            MANUAL_PAYMENT_COLUMNS
        );
        let rows: Vec<ManualPaymentRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(client_id.as_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list manual payments"))?;
        rows.into_iter().map(ManualPayment::try_from).collect()
    }

    async fn list(
        &self,
        trainer_id: TrainerId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<(Page<ManualPayment>, i64), DomainError> {
        let predicate = "trainer_id = $1 AND ($2::date IS NULL OR payment_date >= $2) \
             AND ($3::date IS NULL OR payment_date <= $3)";

        let (count, amount): (i64, Option<i64>) = sqlx::query_as(&format!(
            "SELECT COUNT(*), SUM(amount_cents)::BIGINT FROM manual_payments WHERE {}",
            predicate
        ))
        .bind(trainer_id.as_uuid())
        .bind(from)
        .bind(to)
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to total manual payments"))?;

        let sql = format!(
            "SELECT {} FROM manual_payments WHERE {} ORDER BY payment_date DESC, created_at DESC OFFSET $4 LIMIT $5",
            MANUAL_PAYMENT_COLUMNS, predicate
        );
        let rows: Vec<ManualPaymentRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(from)
            .bind(to)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list manual payments"))?;

        let items = rows.into_iter().map(ManualPayment::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok((Page::new(items, count.max(0) as u64, page), amount.unwrap_or(0)))
    }
}
