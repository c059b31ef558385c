// Session orchestration: spawning, resuming and tracking session tasks.

use crate::domain::errors::StoreError;
use crate::domain::ports::SnapshotStore;
use crate::domain::tuning::Tuning;
use crate::domain::{Engine, EngineConfig, EngineEvent};
use crate::use_cases::session::{Persistence, SessionOutputs, session_task};
use crate::use_cases::{SessionCommand, SessionStatus, WorldUpdate};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

/// Shared configuration for spawning session tasks.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Capacity for inbound player commands.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Capacity for broadcast engine events.
    pub event_broadcast_capacity: usize,
    /// Tick interval for the session loop; the simulated delta is measured.
    pub tick_interval: Duration,
    /// Persist a snapshot every this many ticks (0 = only at run end).
    pub persist_every_ticks: u64,
    pub tuning: Tuning,
}

/// Errors returned by session registry operations.
#[derive(Debug)]
pub enum SessionError {
    /// Session already exists and cannot be re-created.
    AlreadyExists,
    /// A stored snapshot exists but could not be read.
    Storage(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AlreadyExists => f.write_str("session already exists"),
            SessionError::Storage(err) => write!(f, "session storage error: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Per-session channels.
#[derive(Clone)]
pub struct SessionHandle {
    /// Identifier clients use to target this session.
    pub session_id: Arc<str>,
    /// Sender for commands into the session task.
    pub command_tx: mpsc::Sender<SessionCommand>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    pub status_tx: watch::Sender<SessionStatus>,
    pub event_tx: broadcast::Sender<EngineEvent>,
    shutdown: Arc<Notify>,
}

/// Thread-safe registry for active sessions.
pub struct SessionRegistry {
    settings: SessionSettings,
    store: Arc<dyn SnapshotStore>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(settings: SessionSettings, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            settings,
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a session and spawns its task. A snapshot stored under the same
    /// id is resumed instead of starting a fresh run from `seed`.
    pub async fn create_session(
        &self,
        session_id: String,
        seed: u64,
    ) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyExists);
        }

        let engine = match self
            .store
            .load(&session_id)
            .await
            .map_err(SessionError::Storage)?
        {
            Some(state) => Engine::resume(state, self.settings.tuning),
            None => Engine::new(EngineConfig {
                seed,
                tuning: self.settings.tuning,
            }),
        };

        // Channel wiring for the session loop.
        let (command_tx, command_rx) =
            mpsc::channel::<SessionCommand>(self.settings.command_channel_capacity);
        let (world_tx, _world_rx) =
            broadcast::channel::<WorldUpdate>(self.settings.world_broadcast_capacity);
        let (world_bytes_tx, _world_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.world_broadcast_capacity);
        let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let (status_tx, _status_rx) = watch::channel(SessionStatus::of(engine.state()));
        let (event_tx, _event_rx) =
            broadcast::channel::<EngineEvent>(self.settings.event_broadcast_capacity);
        let shutdown = Arc::new(Notify::new());

        info!(
            session_id = %session_id,
            seed = engine.state().seed,
            tick = engine.state().tick,
            "session created"
        );

        let session_key: Arc<str> = Arc::from(session_id.as_str());
        tokio::spawn(session_task(
            session_key.clone(),
            engine,
            command_rx,
            SessionOutputs {
                world_tx: world_tx.clone(),
                status_tx: status_tx.clone(),
                event_tx: event_tx.clone(),
            },
            Persistence {
                store: self.store.clone(),
                every_ticks: self.settings.persist_every_ticks,
            },
            self.settings.tick_interval,
            shutdown.clone(),
        ));

        let session = SessionHandle {
            session_id: session_key,
            command_tx,
            world_tx,
            world_bytes_tx,
            world_latest_tx,
            status_tx,
            event_tx,
            shutdown,
        };

        sessions.insert(session_id, session.clone());
        Ok(session)
    }

    /// Returns a session handle for the provided id, if it exists.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Stops the session task (which persists its final state) and forgets it.
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(session) => {
                session.shutdown.notify_one();
                info!(session_id, "session removed");
                true
            }
            None => false,
        }
    }
}
