// Snapshot store adapters: process-local memory and one JSON file per session.

use crate::domain::GameState;
use crate::domain::errors::StoreError;
use crate::domain::ports::SnapshotStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, GameState>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self, session_id: &str) -> Result<Option<GameState>, StoreError> {
        Ok(self.snapshots.read().await.get(session_id).cloned())
    }

    async fn persist(&self, session_id: &str, state: &GameState) -> Result<(), StoreError> {
        self.snapshots
            .write()
            .await
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }
}

/// Writes `<dir>/<session_id>.json`, replacing the previous snapshot atomically.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    dir: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(session_id)))
    }
}

/// Hex of the id's bytes, so distinct ids never share a file.
fn file_stem(session_id: &str) -> String {
    session_id.bytes().map(|b| format!("{b:02x}")).collect()
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self, session_id: &str) -> Result<Option<GameState>, StoreError> {
        let text = match tokio::fs::read_to_string(self.path_for(session_id)).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn persist(&self, session_id: &str, state: &GameState) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec(state)?;
        let path = self.path_for(session_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
