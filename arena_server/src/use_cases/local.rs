// Single-player host. Drives the same engine synchronously from the caller's
// own frame loop, with the same command handling as the networked session.

use super::session::apply_command;
use super::types::{SessionCommand, SessionStatus};
use crate::domain::errors::StoreError;
use crate::domain::ports::SnapshotStore;
use crate::domain::{Engine, EngineConfig, EngineEvent, GameState, TickOutcome};

#[derive(Debug, Clone)]
pub struct LocalSession {
    session_id: String,
    engine: Engine,
}

impl LocalSession {
    pub fn new(session_id: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            session_id: session_id.into(),
            engine: Engine::new(config),
        }
    }

    /// Resume from `store` if it holds a snapshot for this id.
    pub async fn open(
        session_id: impl Into<String>,
        config: EngineConfig,
        store: &dyn SnapshotStore,
    ) -> Result<Self, StoreError> {
        let session_id = session_id.into();
        let engine = match store.load(&session_id).await? {
            Some(state) => Engine::resume(state, config.tuning),
            None => Engine::new(config),
        };
        Ok(Self { session_id, engine })
    }

    pub fn command(&mut self, command: SessionCommand) -> bool {
        apply_command(&mut self.engine, command)
    }

    pub fn tick(&mut self, delta_ms: f32) -> TickOutcome {
        self.engine.tick(delta_ms)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::of(self.engine.state())
    }

    pub fn snapshot(&self) -> GameState {
        self.engine.snapshot()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.engine.drain_events()
    }

    pub async fn save(&self, store: &dyn SnapshotStore) -> Result<(), StoreError> {
        store.persist(&self.session_id, self.engine.state()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdminCommand, PlayerInput};
    use crate::use_cases::test_support::RecordingStore;

    fn script() -> Vec<SessionCommand> {
        vec![
            SessionCommand::Join {
                player_id: 1,
                name: "solo".to_string(),
                character: "Monkey".to_string(),
            },
            SessionCommand::Input {
                player_id: 1,
                input: PlayerInput {
                    left: true,
                    ..PlayerInput::default()
                },
            },
            SessionCommand::Admin(AdminCommand::LevelUp { player_id: 1 }),
        ]
    }

    #[test]
    fn when_driven_like_a_bare_engine_then_results_are_identical() {
        let config = EngineConfig {
            seed: 21,
            ..EngineConfig::default()
        };
        let mut local = LocalSession::new("solo", config);
        let mut engine = Engine::new(config);

        for command in script() {
            local.command(command.clone());
            apply_command(&mut engine, command);
        }
        for _ in 0..120 {
            assert_eq!(local.tick(16.0), engine.tick(16.0));
        }

        assert_eq!(local.snapshot(), engine.snapshot());
        assert!(matches!(local.status(), SessionStatus::AwaitingUpgrade { player_id: 1 }));
    }

    #[tokio::test]
    async fn when_saved_and_reopened_then_the_run_continues() {
        let store = RecordingStore::new();
        let mut local = LocalSession::new("solo", EngineConfig::default());
        for command in script().into_iter().take(2) {
            local.command(command);
        }
        for _ in 0..30 {
            local.tick(16.0);
        }
        local.save(&store).await.expect("save");

        let reopened = LocalSession::open("solo", EngineConfig::default(), &store)
            .await
            .expect("open");

        assert_eq!(reopened.snapshot(), local.snapshot());
        assert_eq!(reopened.engine().state().tick, 30);
    }
}
