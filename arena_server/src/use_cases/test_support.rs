use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::GameState;
use crate::domain::errors::StoreError;
use crate::domain::ports::SnapshotStore;

pub(crate) type SnapshotTable = Arc<Mutex<HashMap<String, GameState>>>;

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub load: bool,
    pub persist: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    snapshots: SnapshotTable,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(HashMap::new())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_snapshot(&self, session_id: impl Into<String>, state: GameState) {
        let mut guard = self.snapshots.lock().expect("snapshots mutex poisoned");
        guard.insert(session_id.into(), state);
    }

    pub(crate) fn get_test_snapshot(&self, session_id: &str) -> Option<GameState> {
        let guard = self.snapshots.lock().expect("snapshots mutex poisoned");
        guard.get(session_id).cloned()
    }
}

#[async_trait]
impl SnapshotStore for RecordingStore {
    async fn load(&self, session_id: &str) -> Result<Option<GameState>, StoreError> {
        if self.failures.load {
            return Err(StoreError::Io(std::io::Error::other("load failed")));
        }

        let guard = self.snapshots.lock().expect("snapshots mutex poisoned");
        Ok(guard.get(session_id).cloned())
    }

    async fn persist(&self, session_id: &str, state: &GameState) -> Result<(), StoreError> {
        if self.failures.persist {
            return Err(StoreError::Io(std::io::Error::other("persist failed")));
        }

        let mut guard = self.snapshots.lock().expect("snapshots mutex poisoned");
        guard.insert(session_id.to_string(), state.clone());
        Ok(())
    }
}
