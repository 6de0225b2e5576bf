//! PostgreSQL job store.
//!
//! Run with a database: `DATABASE_URL=postgresql://... cargo test -- --ignored`

use serde_json::json;
use sqlx::PgPool;

use batch_action_core::constants::{BatchActionStatus, BatchActionType};
use batch_action_core::database::{BatchActionStore, PgBatchActionStore};
use batch_action_core::error::{BatchActionError, Result};
use batch_action_core::models::{BatchActionUpdate, NewBatchAction};

fn new_action() -> NewBatchAction {
    NewBatchAction {
        project_id: "project-1".to_string(),
        user_id: "user-1".to_string(),
        action_type: BatchActionType::AddToDataset,
        query: json!({"filter": []}),
        config: json!({"datasetId": "dataset-1"}),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find(pool: PgPool) -> Result<()> {
    let store = PgBatchActionStore::new(pool);
    let created = store.create(new_action()).await?;
    assert_eq!(created.status, BatchActionStatus::Queued);
    assert_eq!(created.total_count, 0);

    let found = store.find("project-1", &created.id).await?.unwrap();
    assert_eq!(found.action_type, BatchActionType::AddToDataset);
    assert_eq!(found.config, json!({"datasetId": "dataset-1"}));

    assert!(store.find("other-project", &created.id).await?.is_none());
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_lifecycle_and_terminal_lock(pool: PgPool) -> Result<()> {
    let store = PgBatchActionStore::new(pool);
    let action = store.create(new_action()).await?;

    store
        .update("project-1", &action.id, BatchActionUpdate::started(10))
        .await?;
    store
        .update("project-1", &action.id, BatchActionUpdate::progress(10, 6, 1))
        .await?;
    let finished = store
        .update(
            "project-1",
            &action.id,
            BatchActionUpdate::finished(
                BatchActionStatus::Partial,
                10,
                8,
                2,
                Some("2 items failed".to_string()),
            ),
        )
        .await?;
    assert_eq!(finished.status, BatchActionStatus::Partial);
    assert!(finished.finished_at.is_some());

    let err = store
        .update("project-1", &action.id, BatchActionUpdate::started(10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BatchActionError::InvalidStatusTransition { .. }
    ));

    let stored = store.find("project-1", &action.id).await?.unwrap();
    assert_eq!(stored.processed_count, 8);
    assert_eq!(stored.log.as_deref(), Some("2 items failed"));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_update_of_missing_action(pool: PgPool) -> Result<()> {
    let store = PgBatchActionStore::new(pool);
    let err = store
        .update("project-1", "missing", BatchActionUpdate::started(1))
        .await
        .unwrap_err();
    assert!(matches!(err, BatchActionError::NotFound { .. }));
    Ok(())
}
