//! Pages, workflows with their action rows, executions and templates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use sqlx::types::Json;
use sqlx::{PgConnection, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::quota::check_quota;
use super::{db_error, dt, opt_dt, opt_ts, parse_column, ts, unique_violation, PostgresStore};
use crate::domain::entitlement::ResourceKind;
use crate::domain::foundation::{
    AttributeMap, DomainError, ExecutionId, Page, PageId, PageRequest, TemplateId, TrainerId,
    WorkflowActionId, WorkflowId,
};
use crate::domain::pages::Page as LandingPage;
use crate::domain::workflow::{
    ActionSpec, Conditions, EventKind, ExecutionStatus, MessageTemplate, TemplateKind, Workflow, WorkflowAction,
    WorkflowExecution, WorkflowTrigger,
};
use crate::ports::{ExecutionRepository, PageRepository, QuotaWrite, TemplateRepository, WorkflowRepository};

#[derive(Debug, sqlx::FromRow)]
struct PageRow {
    id: Uuid,
    trainer_id: Uuid,
    title: String,
    slug: String,
    content: String,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PageRow> for LandingPage {
    fn from(row: PageRow) -> Self {
        LandingPage {
            id: PageId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            title: row.title,
            slug: row.slug,
            content: row.content,
            is_published: row.is_published,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        }
    }
}

const PAGE_COLUMNS: &str = "id, trainer_id, title, slug, content, is_published, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct WorkflowRow {
    id: Uuid,
    trainer_id: Uuid,
    name: String,
    description: String,
    is_active: bool,
    event_type: String,
    conditions: Json<Conditions>,
    delay_minutes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ActionRow {
    id: Uuid,
    workflow_id: Uuid,
    action_type: String,
    action_data: JsonValue,
    action_order: i32,
}

impl TryFrom<ActionRow> for WorkflowAction {
    type Error = DomainError;

    fn try_from(row: ActionRow) -> Result<Self, Self::Error> {
        let spec: ActionSpec = serde_json::from_value(json!({
            "action_type": row.action_type,
            "action_data": row.action_data,
        }))
        .map_err(|e| DomainError::database(format!("Invalid workflow action {}: {}", row.id, e)))?;
        Ok(WorkflowAction {
            id: WorkflowActionId::from_uuid(row.id),
            spec,
            order: row.action_order,
        })
    }
}

const WORKFLOW_COLUMNS: &str =
    "id, trainer_id, name, description, is_active, event_type, conditions, delay_minutes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ExecutionRow {
    id: Uuid,
    workflow_id: Uuid,
    trainer_id: Uuid,
    trigger_event_type: String,
    trigger_data: Json<AttributeMap>,
    status: String,
    error_message: Option<String>,
    scheduled_for: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    actions_completed: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ExecutionRow> for WorkflowExecution {
    type Error = DomainError;

    fn try_from(row: ExecutionRow) -> Result<Self, Self::Error> {
        Ok(WorkflowExecution {
            id: ExecutionId::from_uuid(row.id),
            workflow_id: WorkflowId::from_uuid(row.workflow_id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            trigger_event_type: parse_column::<EventKind>("trigger_event_type", &row.trigger_event_type)?,
            trigger_data: row.trigger_data.0,
            status: parse_column::<ExecutionStatus>("status", &row.status)?,
            error_message: row.error_message,
            scheduled_for: ts(row.scheduled_for),
            started_at: opt_ts(row.started_at),
            finished_at: opt_ts(row.finished_at),
            actions_completed: row.actions_completed.max(0) as u32,
            created_at: ts(row.created_at),
        })
    }
}

const EXECUTION_COLUMNS: &str = "id, workflow_id, trainer_id, trigger_event_type, trigger_data, status, \
     error_message, scheduled_for, started_at, finished_at, actions_completed, created_at";

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    trainer_id: Uuid,
    template_type: String,
    name: String,
    subject: Option<String>,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for MessageTemplate {
    type Error = DomainError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        Ok(MessageTemplate {
            id: TemplateId::from_uuid(row.id),
            trainer_id: TrainerId::from_uuid(row.trainer_id),
            kind: parse_column::<TemplateKind>("template_type", &row.template_type)?,
            name: row.name,
            subject: row.subject,
            body: row.body,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

const TEMPLATE_COLUMNS: &str = "id, trainer_id, template_type, name, subject, body, created_at, updated_at";

/// Splits a tagged action into its stored `action_type` and `action_data`.
fn action_columns(spec: &ActionSpec) -> Result<(String, JsonValue), DomainError> {
    let mut value = serde_json::to_value(spec)
        .map_err(|e| DomainError::internal(format!("Failed to serialize workflow action: {}", e)))?;
    let data = value
        .get_mut("action_data")
        .map(JsonValue::take)
        .unwrap_or_else(|| json!({}));
    Ok((spec.action_type().to_string(), data))
}

async fn write_actions(tx: &mut Transaction<'_, Postgres>, workflow: &Workflow) -> Result<(), DomainError> {
    sqlx::query("DELETE FROM workflow_actions WHERE workflow_id = $1")
        .bind(workflow.id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to clear workflow actions"))?;

    for action in &workflow.actions {
        let (action_type, action_data) = action_columns(&action.spec)?;
        sqlx::query(
            "INSERT INTO workflow_actions (id, workflow_id, action_type, action_data, action_order) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(action.id.as_uuid())
        .bind(workflow.id.as_uuid())
        .bind(action_type)
        .bind(action_data)
        .bind(action.order)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to insert workflow action"))?;
    }
    Ok(())
}

/// Attaches ordered action rows to each workflow row.
async fn assemble(conn: &mut PgConnection, rows: Vec<WorkflowRow>) -> Result<Vec<Workflow>, DomainError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let action_rows: Vec<ActionRow> = sqlx::query_as(
        "SELECT id, workflow_id, action_type, action_data, action_order FROM workflow_actions \
         WHERE workflow_id = ANY($1) ORDER BY action_order, id",
    )
    .bind(&ids)
    .fetch_all(conn)
    .await
    .map_err(db_error("Failed to load workflow actions"))?;

    let mut actions: HashMap<Uuid, Vec<WorkflowAction>> = HashMap::new();
    for row in action_rows {
        let workflow_id = row.workflow_id;
        actions.entry(workflow_id).or_default().push(WorkflowAction::try_from(row)?);
    }

    rows.into_iter()
        .map(|row| {
            Ok(Workflow {
                id: WorkflowId::from_uuid(row.id),
                trainer_id: TrainerId::from_uuid(row.trainer_id),
                name: row.name,
                description: row.description,
                is_active: row.is_active,
                trigger: WorkflowTrigger {
                    event_type: parse_column::<EventKind>("event_type", &row.event_type)?,
                    conditions: row.conditions.0,
                    delay_minutes: row.delay_minutes,
                },
                actions: actions.remove(&row.id).unwrap_or_default(),
                created_at: ts(row.created_at),
                updated_at: ts(row.updated_at),
            })
        })
        .collect()
}

/// Optional filters for loading workflows; `None` matches everything.
#[derive(Default)]
struct WorkflowQuery {
    trainer_id: Option<Uuid>,
    id: Option<Uuid>,
    active_for: Option<EventKind>,
}

impl PostgresStore {
    async fn load_workflows(&self, query: WorkflowQuery, order: &str) -> Result<Vec<Workflow>, DomainError> {
        let sql = format!(
            "SELECT {} FROM workflows \
             WHERE ($1::uuid IS NULL OR trainer_id = $1) \
               AND ($2::uuid IS NULL OR id = $2) \
               AND ($3::text IS NULL OR (is_active AND event_type = $3)) \
             ORDER BY {}",
            WORKFLOW_COLUMNS, order
        );
        let mut conn = self.pool().acquire().await.map_err(db_error("Failed to acquire connection"))?;
        let rows: Vec<WorkflowRow> = sqlx::query_as(&sql)
            .bind(query.trainer_id)
            .bind(query.id)
            .bind(query.active_for.map(|k| k.as_str()))
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to load workflows"))?;
        assemble(&mut conn, rows).await
    }
}

#[async_trait]
impl PageRepository for PostgresStore {
    async fn insert(&self, page: &LandingPage, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let decision = check_quota(&mut tx, page.trainer_id, ResourceKind::Pages, enforce_quota).await?;
        if decision != QuotaWrite::Written {
            return Ok(decision);
        }

        sqlx::query(&format!(
            "INSERT INTO pages ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            PAGE_COLUMNS
        ))
        .bind(page.id.as_uuid())
        .bind(page.trainer_id.as_uuid())
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(page.is_published)
        .bind(dt(&page.created_at))
        .bind(dt(&page.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => DomainError::conflict("A page with this slug already exists").with_detail("field", "slug"),
            None => db_error("Failed to insert page")(e),
        })?;

        tx.commit().await.map_err(db_error("Failed to commit page"))?;
        Ok(QuotaWrite::Written)
    }

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<LandingPage>, DomainError> {
        let sql = format!("SELECT {} FROM pages WHERE trainer_id = $1 ORDER BY created_at DESC", PAGE_COLUMNS);
        let rows: Vec<PageRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list pages"))?;
        Ok(rows.into_iter().map(LandingPage::from).collect())
    }

    async fn find_published(&self, trainer_id: TrainerId, slug: &str) -> Result<Option<LandingPage>, DomainError> {
        let sql = format!(
            "SELECT {} FROM pages WHERE trainer_id = $1 AND slug = $2 AND is_published",
            PAGE_COLUMNS
        );
        let row: Option<PageRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find page"))?;
        Ok(row.map(LandingPage::from))
    }

    async fn delete(&self, trainer_id: TrainerId, id: PageId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM pages WHERE trainer_id = $1 AND id = $2")
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete page"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl WorkflowRepository for PostgresStore {
    async fn insert(&self, workflow: &Workflow, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let decision = check_quota(
            &mut tx,
            workflow.trainer_id,
            ResourceKind::Workflows,
            enforce_quota && workflow.is_active,
        )
        .await?;
        if decision != QuotaWrite::Written {
            return Ok(decision);
        }

        sqlx::query(&format!(
            "INSERT INTO workflows ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            WORKFLOW_COLUMNS
        ))
        .bind(workflow.id.as_uuid())
        .bind(workflow.trainer_id.as_uuid())
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(workflow.is_active)
        .bind(workflow.trigger.event_type.as_str())
        .bind(Json(&workflow.trigger.conditions))
        .bind(workflow.trigger.delay_minutes)
        .bind(dt(&workflow.created_at))
        .bind(dt(&workflow.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert workflow"))?;

        write_actions(&mut tx, workflow).await?;
        tx.commit().await.map_err(db_error("Failed to commit workflow"))?;
        Ok(QuotaWrite::Written)
    }

    async fn update(&self, workflow: &Workflow, enforce_quota: bool) -> Result<QuotaWrite, DomainError> {
        let mut tx = self.pool().begin().await.map_err(db_error("Failed to begin transaction"))?;

        let was_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM workflows WHERE id = $1 AND trainer_id = $2 FOR UPDATE")
                .bind(workflow.id.as_uuid())
                .bind(workflow.trainer_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock workflow"))?;
        let was_active = was_active.ok_or_else(|| DomainError::not_found("Workflow"))?;

        let activating = workflow.is_active && !was_active;
        let decision = check_quota(&mut tx, workflow.trainer_id, ResourceKind::Workflows, enforce_quota && activating).await?;
        if decision != QuotaWrite::Written {
            return Ok(decision);
        }

        sqlx::query(
            r#"
            UPDATE workflows SET
                name = $2, description = $3, is_active = $4, event_type = $5, conditions = $6,
                delay_minutes = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(workflow.id.as_uuid())
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(workflow.is_active)
        .bind(workflow.trigger.event_type.as_str())
        .bind(Json(&workflow.trigger.conditions))
        .bind(workflow.trigger.delay_minutes)
        .bind(dt(&workflow.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to update workflow"))?;

        write_actions(&mut tx, workflow).await?;
        tx.commit().await.map_err(db_error("Failed to commit workflow"))?;
        Ok(QuotaWrite::Written)
    }

    async fn find(&self, trainer_id: TrainerId, id: WorkflowId) -> Result<Option<Workflow>, DomainError> {
        let query = WorkflowQuery {
            trainer_id: Some(*trainer_id.as_uuid()),
            id: Some(*id.as_uuid()),
            ..WorkflowQuery::default()
        };
        Ok(self.load_workflows(query, "created_at").await?.pop())
    }

    async fn find_by_id(&self, id: WorkflowId) -> Result<Option<Workflow>, DomainError> {
        let query = WorkflowQuery {
            id: Some(*id.as_uuid()),
            ..WorkflowQuery::default()
        };
        Ok(self.load_workflows(query, "created_at").await?.pop())
    }

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<Workflow>, DomainError> {
        let query = WorkflowQuery {
            trainer_id: Some(*trainer_id.as_uuid()),
            ..WorkflowQuery::default()
        };
        self.load_workflows(query, "created_at DESC").await
    }

    async fn list_active_for_event(&self, trainer_id: TrainerId, kind: EventKind) -> Result<Vec<Workflow>, DomainError> {
        let query = WorkflowQuery {
            trainer_id: Some(*trainer_id.as_uuid()),
            id: None,
            active_for: Some(kind),
        };
        self.load_workflows(query, "created_at").await
    }

    async fn delete(&self, trainer_id: TrainerId, id: WorkflowId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM workflows WHERE trainer_id = $1 AND id = $2")
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete workflow"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn template_in_use(&self, trainer_id: TrainerId, template_id: TemplateId) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM workflow_actions a
                JOIN workflows w ON w.id = a.workflow_id
                WHERE w.trainer_id = $1 AND a.action_data->>'template_id' = $2
            )
            "#,
        )
        .bind(trainer_id.as_uuid())
        .bind(template_id.to_string())
        .fetch_one(self.pool())
        .await
        .map_err(db_error("Failed to check template usage"))
    }
}

#[async_trait]
impl ExecutionRepository for PostgresStore {
    async fn insert(&self, execution: &WorkflowExecution) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO workflow_executions ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            EXECUTION_COLUMNS
        ))
        .bind(execution.id.as_uuid())
        .bind(execution.workflow_id.as_uuid())
        .bind(execution.trainer_id.as_uuid())
        .bind(execution.trigger_event_type.as_str())
        .bind(Json(&execution.trigger_data))
        .bind(execution.status.as_str())
        .bind(&execution.error_message)
        .bind(dt(&execution.scheduled_for))
        .bind(opt_dt(&execution.started_at))
        .bind(opt_dt(&execution.finished_at))
        .bind(i32::try_from(execution.actions_completed).unwrap_or(i32::MAX))
        .bind(dt(&execution.created_at))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to insert workflow execution"))?;
        Ok(())
    }

    async fn update(&self, execution: &WorkflowExecution) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE workflow_executions SET
                status = $2, error_message = $3, started_at = $4, finished_at = $5, actions_completed = $6
            WHERE id = $1
            "#,
        )
        .bind(execution.id.as_uuid())
        .bind(execution.status.as_str())
        .bind(&execution.error_message)
        .bind(opt_dt(&execution.started_at))
        .bind(opt_dt(&execution.finished_at))
        .bind(i32::try_from(execution.actions_completed).unwrap_or(i32::MAX))
        .execute(self.pool())
        .await
        .map_err(db_error("Failed to update workflow execution"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Workflow execution"));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ExecutionId) -> Result<Option<WorkflowExecution>, DomainError> {
        let sql = format!("SELECT {} FROM workflow_executions WHERE id = $1", EXECUTION_COLUMNS);
        let row: Option<ExecutionRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find workflow execution"))?;
        row.map(WorkflowExecution::try_from).transpose()
    }

    async fn list(
        &self,
        trainer_id: TrainerId,
        workflow_id: Option<WorkflowId>,
        status: Option<ExecutionStatus>,
        page: PageRequest,
    ) -> Result<Page<WorkflowExecution>, DomainError> {
        let predicate = "trainer_id = $1 AND ($2::uuid IS NULL OR workflow_id = $2) AND ($3::text IS NULL OR status = $3)";
        let workflow = workflow_id.map(|w| *w.as_uuid());
        let status = status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM workflow_executions WHERE {}", predicate))
            .bind(trainer_id.as_uuid())
            .bind(workflow)
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(db_error("Failed to count workflow executions"))?;

        let sql = format!(
            "SELECT {} FROM workflow_executions WHERE {} ORDER BY created_at DESC OFFSET $4 LIMIT $5",
            EXECUTION_COLUMNS, predicate
        );
        let rows: Vec<ExecutionRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(workflow)
            .bind(status)
            .bind(i64::from(page.offset))
            .bind(i64::from(page.limit))
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list workflow executions"))?;

        let items = rows
            .into_iter()
            .map(WorkflowExecution::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }
}

#[async_trait]
impl TemplateRepository for PostgresStore {
    async fn save(&self, template: &MessageTemplate) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO message_templates ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, subject = EXCLUDED.subject, body = EXCLUDED.body, \
                updated_at = EXCLUDED.updated_at",
            TEMPLATE_COLUMNS
        ))
        .bind(template.id.as_uuid())
        .bind(template.trainer_id.as_uuid())
        .bind(template.kind.as_str())
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(dt(&template.created_at))
        .bind(dt(&template.updated_at))
        .execute(self.pool())
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => DomainError::conflict("A template with this name already exists").with_detail("field", "name"),
            None => db_error("Failed to save template")(e),
        })?;
        Ok(())
    }

    async fn find(&self, trainer_id: TrainerId, id: TemplateId) -> Result<Option<MessageTemplate>, DomainError> {
        let sql = format!("SELECT {} FROM message_templates WHERE trainer_id = $1 AND id = $2", TEMPLATE_COLUMNS);
        let row: Option<TemplateRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(db_error("Failed to find template"))?;
        row.map(MessageTemplate::try_from).transpose()
    }

    async fn list(&self, trainer_id: TrainerId) -> Result<Vec<MessageTemplate>, DomainError> {
        let sql = format!("SELECT {} FROM message_templates WHERE trainer_id = $1 ORDER BY name", TEMPLATE_COLUMNS);
        let rows: Vec<TemplateRow> = sqlx::query_as(&sql)
            .bind(trainer_id.as_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(db_error("Failed to list templates"))?;
        rows.into_iter().map(MessageTemplate::try_from).collect()
    }

    async fn delete(&self, trainer_id: TrainerId, id: TemplateId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM message_templates WHERE trainer_id = $1 AND id = $2")
            .bind(trainer_id.as_uuid())
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(db_error("Failed to delete template"))?;
        Ok(result.rows_affected() > 0)
    }
}
