//! Principals, trainer profiles and auth tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::{db_error, dt, opt_dt, opt_ts, parse_column, ts, unique_violation, PostgresStore};
use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, PrincipalId, Timestamp, TrainerId};
use crate::domain::identity::{parse_timezone, AuthToken, DomainStatus, Principal, TokenKind, Trainer};
use crate::ports::{PrincipalRepository, TokenStore, TrainerRepository};

#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    id: Uuid,
    email: String,
    password_hash: String,
    username: Option<String>,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    is_trainer: bool,
    is_client: bool,
    is_verified: bool,
    is_active: bool,
    is_superuser: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Principal {
            id: PrincipalId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            is_trainer: row.is_trainer,
            is_client: row.is_client,
            is_verified: row.is_verified,
            is_active: row.is_active,
            is_superuser: row.is_superuser,
            last_login_at: opt_ts(row.last_login_at),
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        }
    }
}

const PRINCIPAL_COLUMNS: &str = "id, email, password_hash, username, first_name, last_name, phone, \
     is_trainer, is_client, is_verified, is_active, is_superuser, last_login_at, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TrainerRow {
    id: Uuid,
    principal_id: Uuid,
    business_name: String,
    bio: String,
    expertise: Json<BTreeSet<String>>,
    location: String,
    timezone: String,
    is_verified: bool,
    slug: String,
    billing_customer_id: Option<String>,
    custom_domain: Option<String>,
    custom_domain_status: Option<String>,
    brand_color: Option<String>,
    hide_platform_branding: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TrainerRow> for Trainer {
    type Error = DomainError;

    fn try_from(row: TrainerRow) -> Result<Self, Self::Error> {
        Ok(Trainer {
            id: TrainerId::from_uuid(row.id),
            principal_id: PrincipalId::from_uuid(row.principal_id),
            business_name: row.business_name,
            bio: row.bio,
            expertise: row.expertise.0,
            location: row.location,
            timezone: parse_timezone(&row.timezone).map_err(|e| DomainError::database(e.to_string()))?,
            is_verified: row.is_verified,
            slug: row.slug,
            billing_customer_id: row.billing_customer_id,
            custom_domain: row.custom_domain,
            custom_domain_status: row
                .custom_domain_status
                .as_deref()
                .map(|s| parse_column::<DomainStatus>("custom_domain_status", s))
                .transpose()?,
            brand_color: row.brand_color,
            hide_platform_branding: row.hide_platform_branding,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

pub(super) const TRAINER_COLUMNS: &str = "t.id, t.principal_id, t.business_name, t.bio, t.expertise, t.location, \
     t.timezone, t.is_verified, t.slug, t.billing_customer_id, t.custom_domain, t.custom_domain_status, \
     t.brand_color, t.hide_platform_branding, t.created_at, t.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    token_hash: String,
    principal_id: Uuid,
    kind: String,
    impersonated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl TryFrom<TokenRow> for AuthToken {
    type Error = DomainError;

    fn try_from(row: TokenRow) -> Result<Self, Self::Error> {
        Ok(AuthToken {
            token_hash: row.token_hash,
            principal_id: PrincipalId::from_uuid(row.principal_id),
            kind: parse_column::<TokenKind>("kind", &row.kind)?,
            impersonated_by: row.impersonated_by.map(PrincipalId::from_uuid),
            created_at: ts(row.created_at),
            expires_at: opt_ts(row.expires_at),
            revoked_at: opt_ts(row.revoked_at),
        })
    }
}

fn identity_conflict(err: &sqlx::Error) -> Option<DomainError> {
    let constraint = unique_violation(err)?;
    let (field, message) = if constraint.contains("email") {
        ("email", "A user with this email already exists")
    } else if constraint.contains("username") || constraint.contains("slug") {
        ("slug", "This username is already taken")
    } else if constraint.contains("custom_domain") {
        ("custom_domain", "This domain is already in use")
    } else {
        ("id", "Record already exists")
    };
    Some(DomainError::conflict(message).with_detail("field", field))
}

async fn insert_trainer(conn: &mut sqlx::PgConnection, trainer: &Trainer) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO trainers (
            id, principal_id, business_name, bio, expertise, location, timezone, is_verified, slug,
            billing_customer_id, custom_domain, custom_domain_status, brand_color,
            hide_platform_branding, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(trainer.id.as_uuid())
    .bind(trainer.principal_id.as_uuid())
    .bind(&trainer.business_name)
    .bind(&trainer.bio)
    .bind(Json(&trainer.expertise))
    .bind(&trainer.location)
    .bind(trainer.timezone.name())
    .bind(trainer.is_verified)
    .bind(&trainer.slug)
    .bind(&trainer.billing_customer_id)
    .bind(&trainer.custom_domain)
    .bind(trainer.custom_domain_status.map(|s| s.as_str()))
    .bind(&trainer.brand_color)
    .bind(trainer.hide_platform_branding)
    .bind(dt(&trainer.created_at))
    .bind(dt(&trainer.updated_at))
    .execute(conn)
    .await
    .map(|_| ())
}

pub(super) async fn upsert_subscription(conn: &mut sqlx::PgConnection, s: &Subscription) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (
            id, trainer_id, plan, status, current_period_start, current_period_end,
            cancel_at_period_end, cancelled_at, external_subscription_id, external_customer_id,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (trainer_id) DO UPDATE SET
            plan = EXCLUDED.plan,
            status = EXCLUDED.status,
            current_period_start = EXCLUDED.current_period_start,
            current_period_end = EXCLUDED.current_period_end,
            cancel_at_period_end = EXCLUDED.cancel_at_period_end,
            cancelled_at = EXCLUDED.cancelled_at,
            external_subscription_id = EXCLUDED.external_subscription_id,
            external_customer_id = EXCLUDED.external_customer_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(s.id.as_uuid())
    .bind(s.trainer_id.as_uuid())
    .bind(s.plan.as_str())
    .bind(s.status.as_str())
    .bind(opt_dt(&s.current_period_start))
    .bind(opt_dt(&s.current_period_end))
    .bind(s.cancel_at_period_end)
    .bind(opt_dt(&s.cancelled_at))
    .bind(&s.external_subscription_id)
    .bind(&s.external_customer_id)
    .bind(dt(&s.created_at))
    .bind(dt(&s.updated_at))
    .execute(conn)
    .await
    .map(|_| ())
}

impl PostgresStore {
    async fn find_principal_where(&self, clause: &str, value: &str) -> Result<Option<Principal>, DomainError> {
        let sql = format!("SELECT {} FROM principals WHERE {} = $1", PRINCIPAL_COLUMNS, clause);
        let row: Option<PrincipalRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find principal"))?;
        Ok(row.map(Principal::from))
    }

    async fn find_trainer_where(&self, clause: &str, bind: TrainerKey<'_>) -> Result<Option<Trainer>, DomainError> {
        let sql = format!(
            "SELECT {} FROM trainers t JOIN principals p ON p.id = t.principal_id WHERE {}",
            TRAINER_COLUMNS, clause
        );
        let query = sqlx::query_as::<_, TrainerRow>(&sql);
        let query = match bind {
            TrainerKey::Id(id) => query.bind(id),
            TrainerKey::Text(text) => query.bind(text),
        };
        let row = query
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find trainer"))?;
        row.map(Trainer::try_from).transpose()
    }
}

enum TrainerKey<'a> {
    Id(Uuid),
    Text(&'a str),
}

#[async_trait]
impl PrincipalRepository for PostgresStore {
    async fn create_trainer_account(
        &self,
        principal: &Principal,
        trainer: &Trainer,
        subscription: &Subscription,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO principals ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            PRINCIPAL_COLUMNS
        ))
        .bind(principal.id.as_uuid())
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(&principal.username)
        .bind(&principal.first_name)
        .bind(&principal.last_name)
        .bind(&principal.phone)
        .bind(principal.is_trainer)
        .bind(principal.is_client)
        .bind(principal.is_verified)
        .bind(principal.is_active)
        .bind(principal.is_superuser)
        .bind(opt_dt(&principal.last_login_at))
        .bind(dt(&principal.created_at))
        .bind(dt(&principal.updated_at))
        .execute(&mut *tx)
        .await;

        let result = match inserted {
            Ok(_) => insert_trainer(&mut tx, trainer).await,
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(()) => upsert_subscription(&mut tx, subscription).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            return Err(identity_conflict(&e).unwrap_or_else(|| db_error("Failed to create account")(e)));
        }

        tx.commit().await.map_err(db_error("Failed to commit account"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>, DomainError> {
        let sql = format!("SELECT {} FROM principals WHERE id = $1", PRINCIPAL_COLUMNS);
        let row: Option<PrincipalRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find principal"))?;
        Ok(row.map(Principal::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, DomainError> {
        self.find_principal_where("email", email).await
    }

    async fn update(&self, principal: &Principal) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE principals SET
                email = $2, password_hash = $3, username = $4, first_name = $5, last_name = $6,
                phone = $7, is_verified = $8, is_active = $9, last_login_at = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(&principal.email)
        .bind(&principal.password_hash)
        .bind(&principal.username)
        .bind(&principal.first_name)
        .bind(&principal.last_name)
        .bind(&principal.phone)
        .bind(principal.is_verified)
        .bind(principal.is_active)
        .bind(opt_dt(&principal.last_login_at))
        .bind(dt(&principal.updated_at))
        .execute(self.pool())
        .await
        .map_err(|e| identity_conflict(&e).unwrap_or_else(|| db_error("Failed to update principal")(e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Principal"));
        }
        Ok(())
    }
}

#[async_trait]
impl TrainerRepository for PostgresStore {
    async fn find_by_id(&self, id: TrainerId) -> Result<Option<Trainer>, DomainError> {
        self.find_trainer_where("t.id = $1", TrainerKey::Id(*id.as_uuid())).await
    }

    async fn find_by_principal(&self, principal_id: PrincipalId) -> Result<Option<Trainer>, DomainError> {
        self.find_trainer_where("t.principal_id = $1", TrainerKey::Id(*principal_id.as_uuid()))
            .await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Trainer>, DomainError> {
        self.find_trainer_where("t.slug = $1", TrainerKey::Text(slug)).await
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<Trainer>, DomainError> {
        self.find_trainer_where("t.custom_domain = $1", TrainerKey::Text(domain)).await
    }

    async fn find_by_billing_customer(&self, customer_id: &str) -> Result<Option<Trainer>, DomainError> {
        self.find_trainer_where("t.billing_customer_id = $1", TrainerKey::Text(customer_id))
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Trainer>, DomainError> {
        self.find_trainer_where("p.email = $1", TrainerKey::Text(email)).await
    }

    async fn create_default(&self, trainer: &Trainer, subscription: &Subscription) -> Result<Trainer, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let mut created = trainer.clone();
        let slug_taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM trainers WHERE slug = $1)")
            .bind(&created.slug)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to check slug"))?;
        if slug_taken {
            created.slug = format!("{}-{}", created.slug, &created.id.to_string()[..8]);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO trainers (
                id, principal_id, business_name, bio, expertise, location, timezone, is_verified,
                slug, hide_platform_branding, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (principal_id) DO NOTHING
            "#,
        )
        .bind(created.id.as_uuid())
        .bind(created.principal_id.as_uuid())
        .bind(&created.business_name)
        .bind(&created.bio)
        .bind(Json(&created.expertise))
        .bind(&created.location)
        .bind(created.timezone.name())
        .bind(created.is_verified)
        .bind(&created.slug)
        .bind(created.hide_platform_branding)
        .bind(dt(&created.created_at))
        .bind(dt(&created.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to create trainer"))?;

        if inserted.rows_affected() == 1 {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (id, trainer_id, plan, status, cancel_at_period_end, created_at, updated_at)
                VALUES ($1, $2, $3, $4, FALSE, $5, $6)
                ON CONFLICT (trainer_id) DO NOTHING
                "#,
            )
            .bind(subscription.id.as_uuid())
            .bind(created.id.as_uuid())
            .bind(subscription.plan.as_str())
            .bind(subscription.status.as_str())
            .bind(dt(&subscription.created_at))
            .bind(dt(&subscription.updated_at))
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to create subscription"))?;
        }
        tx.commit().await.map_err(db_error("Failed to commit trainer"))?;

        TrainerRepository::find_by_principal(self, created.principal_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Trainer"))
    }

    async fn update(&self, trainer: &Trainer) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE trainers SET
                business_name = $2, bio = $3, expertise = $4, location = $5, timezone = $6,
                is_verified = $7, slug = $8, billing_customer_id = $9, custom_domain = $10,
                custom_domain_status = $11, brand_color = $12, hide_platform_branding = $13,
                updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(trainer.id.as_uuid())
        .bind(&trainer.business_name)
        .bind(&trainer.bio)
        .bind(Json(&trainer.expertise))
        .bind(&trainer.location)
        .bind(trainer.timezone.name())
        .bind(trainer.is_verified)
        .bind(&trainer.slug)
        .bind(&trainer.billing_customer_id)
        .bind(&trainer.custom_domain)
        .bind(trainer.custom_domain_status.map(|s| s.as_str()))
        .bind(&trainer.brand_color)
        .bind(trainer.hide_platform_branding)
        .bind(dt(&trainer.updated_at))
        .execute(self.pool())
        .await
        .map_err(|e| identity_conflict(&e).unwrap_or_else(|| db_error("Failed to update trainer")(e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Trainer"));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for PostgresStore {
    async fn insert(&self, token: &AuthToken) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token_hash, principal_id, kind, impersonated_by, created_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&token.token_hash)
        .bind(token.principal_id.as_uuid())
        .bind(token.kind.as_str())
        .bind(token.impersonated_by.map(|p| *p.as_uuid()))
        .bind(dt(&token.created_at))
        .bind(opt_dt(&token.expires_at))
        .bind(opt_dt(&token.revoked_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to store token"))?;
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<AuthToken>, DomainError> {
        let row: Option<TokenRow> = sqlx::query_as(
            r#"
            SELECT token_hash, principal_id, kind, impersonated_by, created_at, expires_at, revoked_at
            FROM auth_tokens WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await
        .map_err(db_error("Failed to find token"))?;
        row.map(AuthToken::try_from).transpose()
    }

    async fn revoke(&self, token_hash: &str, at: Timestamp) -> Result<(), DomainError> {
        sqlx::query("UPDATE auth_tokens SET revoked_at = COALESCE(revoked_at, $2) WHERE token_hash = $1")
            .bind(token_hash)
            .bind(dt(&at))
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to revoke token"))?;
        Ok(())
    }

    async fn revoke_all_for(&self, principal_id: PrincipalId, at: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("UPDATE auth_tokens SET revoked_at = $2 WHERE principal_id = $1 AND revoked_at IS NULL")
            .bind(principal_id.as_uuid())
            .bind(dt(&at))
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to revoke tokens"))?;
        Ok(result.rows_affected())
    }
}
