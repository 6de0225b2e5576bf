//! In-process batch action store.
//!
//! Backs embedded deployments and tests. Every accepted update is also kept in
//! an append-only history so callers can inspect how often and in what order a
//! runner persisted progress.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use super::BatchActionStore;
use crate::constants::BatchActionStatus;
use crate::error::{BatchActionError, Result};
use crate::models::{BatchAction, BatchActionUpdate, NewBatchAction};

type ActionKey = (String, String);

#[derive(Debug, Default)]
pub struct InMemoryBatchActionStore {
    actions: DashMap<ActionKey, BatchAction>,
    history: Mutex<Vec<(String, BatchActionUpdate)>>,
}

impl InMemoryBatchActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, replacing any existing one with the same id
    pub fn insert(&self, action: BatchAction) {
        let key = (action.project_id.clone(), action.id.clone());
        self.actions.insert(key, action);
    }

    pub fn get(&self, project_id: &str, batch_action_id: &str) -> Option<BatchAction> {
        self.actions
            .get(&(project_id.to_string(), batch_action_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Accepted updates for one batch action, oldest first
    pub fn update_history(&self, batch_action_id: &str) -> Vec<BatchActionUpdate> {
        self.history
            .lock()
            .iter()
            .filter(|(id, _)| id == batch_action_id)
            .map(|(_, update)| update.clone())
            .collect()
    }
}

#[async_trait]
impl BatchActionStore for InMemoryBatchActionStore {
    async fn find(&self, project_id: &str, batch_action_id: &str) -> Result<Option<BatchAction>> {
        Ok(self.get(project_id, batch_action_id))
    }

    async fn create(&self, new_action: NewBatchAction) -> Result<BatchAction> {
        let now = Utc::now();
        let action = BatchAction {
            id: Uuid::new_v4().to_string(),
            project_id: new_action.project_id,
            user_id: new_action.user_id,
            action_type: new_action.action_type,
            status: BatchActionStatus::Queued,
            query: new_action.query,
            config: new_action.config,
            total_count: 0,
            processed_count: 0,
            failed_count: 0,
            log: None,
            finished_at: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(action.clone());
        Ok(action)
    }

    async fn update(
        &self,
        project_id: &str,
        batch_action_id: &str,
        update: BatchActionUpdate,
    ) -> Result<BatchAction> {
        let key = (project_id.to_string(), batch_action_id.to_string());
        let mut entry = self
            .actions
            .get_mut(&key)
            .ok_or_else(|| BatchActionError::NotFound {
                project_id: project_id.to_string(),
                batch_action_id: batch_action_id.to_string(),
            })?;

        entry.apply_update(&update)?;
        let updated = entry.value().clone();
        drop(entry);

        self.history
            .lock()
            .push((batch_action_id.to_string(), update));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BatchActionType;
    use serde_json::json;

    fn new_action() -> NewBatchAction {
        NewBatchAction {
            project_id: "project".to_string(),
            user_id: "user".to_string(),
            action_type: BatchActionType::RunEvaluation,
            query: json!({"filter": []}),
            config: json!({"evaluatorIds": ["e1"]}),
        }
    }

    #[tokio::test]
    async fn test_create_find_update() {
        let store = InMemoryBatchActionStore::new();
        let created = store.create(new_action()).await.unwrap();
        assert_eq!(created.status, BatchActionStatus::Queued);

        let found = store.find("project", &created.id).await.unwrap();
        assert_eq!(found.as_ref().map(|a| &a.id), Some(&created.id));

        let updated = store
            .update("project", &created.id, BatchActionUpdate::started(0))
            .await
            .unwrap();
        assert_eq!(updated.status, BatchActionStatus::Processing);
        assert_eq!(store.update_history(&created.id).len(), 1);
    }

    #[tokio::test]
    async fn test_project_scoping_and_missing_records() {
        let store = InMemoryBatchActionStore::new();
        let created = store.create(new_action()).await.unwrap();

        assert!(store.find("other", &created.id).await.unwrap().is_none());
        let err = store
            .update("other", &created.id, BatchActionUpdate::started(0))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchActionError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_rejected_updates_are_not_recorded() {
        let store = InMemoryBatchActionStore::new();
        let created = store.create(new_action()).await.unwrap();
        store
            .update(
                "project",
                &created.id,
                BatchActionUpdate::failed_before_start("no records"),
            )
            .await
            .unwrap();

        let err = store
            .update("project", &created.id, BatchActionUpdate::started(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BatchActionError::InvalidStatusTransition { .. }));
        assert_eq!(store.update_history(&created.id).len(), 1);
    }
}
