//! PostgreSQL-backed batch action store.
//!
//! Updates run in a transaction that locks the row (`SELECT ... FOR UPDATE`),
//! applies [`BatchAction::apply_update`] to the locked copy, and writes the
//! result back, so the status and counter invariants hold even if two writers
//! race on the same job.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::BatchActionStore;
use crate::constants::{BatchActionStatus, BatchActionType};
use crate::error::{BatchActionError, Result};
use crate::models::{BatchAction, BatchActionUpdate, NewBatchAction};

const SELECT_COLUMNS: &str = r#"
    SELECT id, project_id, user_id, action_type, status, query, config,
           total_count, processed_count, failed_count, log, finished_at,
           created_at, updated_at
    FROM batch_actions
"#;

#[derive(Debug, Clone)]
pub struct PgBatchActionStore {
    pool: PgPool,
}

impl PgBatchActionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn from_row(row: &PgRow) -> Result<BatchAction> {
        let action_type: String = row.try_get("action_type")?;
        let status: String = row.try_get("status")?;

        Ok(BatchAction {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            user_id: row.try_get("user_id")?,
            action_type: action_type
                .parse::<BatchActionType>()
                .map_err(BatchActionError::DatabaseError)?,
            status: status
                .parse::<BatchActionStatus>()
                .map_err(BatchActionError::DatabaseError)?,
            query: row.try_get("query")?,
            config: row.try_get("config")?,
            total_count: from_db_count(row.try_get("total_count")?),
            processed_count: from_db_count(row.try_get("processed_count")?),
            failed_count: from_db_count(row.try_get("failed_count")?),
            log: row.try_get("log")?,
            finished_at: row.try_get("finished_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_db_count(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| BatchActionError::ValidationError(format!("count {value} exceeds BIGINT")))
}

#[async_trait]
impl BatchActionStore for PgBatchActionStore {
    async fn find(&self, project_id: &str, batch_action_id: &str) -> Result<Option<BatchAction>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1 AND project_id = $2");
        let row = sqlx::query(&sql)
            .bind(batch_action_id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn create(&self, new_action: NewBatchAction) -> Result<BatchAction> {
        let row = sqlx::query(
            r#"
            INSERT INTO batch_actions (id, project_id, user_id, action_type, status, query, config,
                                       created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING id, project_id, user_id, action_type, status, query, config,
                      total_count, processed_count, failed_count, log, finished_at,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&new_action.project_id)
        .bind(&new_action.user_id)
        .bind(new_action.action_type.as_str())
        .bind(BatchActionStatus::Queued.to_string())
        .bind(&new_action.query)
        .bind(&new_action.config)
        .fetch_one(&self.pool)
        .await?;

        Self::from_row(&row)
    }

    async fn update(
        &self,
        project_id: &str,
        batch_action_id: &str,
        update: BatchActionUpdate,
    ) -> Result<BatchAction> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{SELECT_COLUMNS} WHERE id = $1 AND project_id = $2 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(batch_action_id)
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BatchActionError::NotFound {
                project_id: project_id.to_string(),
                batch_action_id: batch_action_id.to_string(),
            })?;

        let mut action = Self::from_row(&row)?;
        action.apply_update(&update)?;

        sqlx::query(
            r#"
            UPDATE batch_actions
            SET status = $3,
                total_count = $4,
                processed_count = $5,
                failed_count = $6,
                log = $7,
                finished_at = $8,
                updated_at = $9
            WHERE id = $1 AND project_id = $2
            "#,
        )
        .bind(batch_action_id)
        .bind(project_id)
        .bind(action.status.to_string())
        .bind(to_db_count(action.total_count)?)
        .bind(to_db_count(action.processed_count)?)
        .bind(to_db_count(action.failed_count)?)
        .bind(&action.log)
        .bind(action.finished_at)
        .bind(action.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            batch_action_id = %batch_action_id,
            status = %action.status,
            processed = action.processed_count,
            failed = action.failed_count,
            "Persisted batch action update"
        );
        Ok(action)
    }
}
