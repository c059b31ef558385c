// Ports the domain expects hosts to provide.

use crate::domain::errors::StoreError;
use crate::domain::state::GameState;
use async_trait::async_trait;

/// Durable snapshot storage, keyed by session id.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<GameState>, StoreError>;

    async fn persist(&self, session_id: &str, state: &GameState) -> Result<(), StoreError>;
}
