use crate::domain::PlayerId;
use crate::use_cases::SessionRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AppState {
    // Active sessions and the settings new ones are spawned with.
    pub sessions: Arc<SessionRegistry>,
    // Session used when a socket does not name one.
    pub default_session_id: Arc<str>,
    // Accept debug commands from clients.
    pub admin_commands: bool,
    // Player ids are small and sequential so they survive JSON number precision.
    next_player_id: AtomicU64,
}

impl AppState {
    pub fn new(sessions: Arc<SessionRegistry>, default_session_id: &str, admin_commands: bool) -> Self {
        Self {
            sessions,
            default_session_id: Arc::from(default_session_id),
            admin_commands,
            next_player_id: AtomicU64::new(1),
        }
    }

    pub fn next_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }
}
