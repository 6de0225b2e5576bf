//! # Job Store
//!
//! Persistence of [`BatchAction`] records. The engine reads a job once when it
//! starts and afterwards only writes the fields it owns, through
//! [`BatchActionStore::update`].
//!
//! ## Key Components
//!
//! - [`BatchActionStore`] - the store contract used by the runners
//! - [`pg_store`] - PostgreSQL implementation (SQLx)
//! - [`memory_store`] - in-process implementation for embedding and tests
//! - [`connection`] - pool construction, migrations and health check

pub mod connection;
pub mod memory_store;
pub mod pg_store;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BatchAction, BatchActionUpdate, NewBatchAction};

pub use connection::DatabaseConnection;
pub use memory_store::InMemoryBatchActionStore;
pub use pg_store::PgBatchActionStore;

/// Read/update access to batch action records.
///
/// Implementations must reject updates that regress `status` or leave a
/// terminal status, returning `BatchActionError::InvalidStatusTransition`.
#[async_trait]
pub trait BatchActionStore: Send + Sync {
    async fn find(&self, project_id: &str, batch_action_id: &str) -> Result<Option<BatchAction>>;

    async fn create(&self, new_action: NewBatchAction) -> Result<BatchAction>;

    async fn update(
        &self,
        project_id: &str,
        batch_action_id: &str,
        update: BatchActionUpdate,
    ) -> Result<BatchAction>;
}
