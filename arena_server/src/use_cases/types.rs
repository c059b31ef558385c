// Use-case level inputs/outputs for session hosts.

use crate::domain::{AdminCommand, GameState, GameStatus, PlayerId, PlayerInput};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum SessionCommand {
    Join {
        player_id: PlayerId,
        name: String,
        character: String,
    },
    Leave {
        player_id: PlayerId,
    },
    Input {
        player_id: PlayerId,
        input: PlayerInput,
    },
    SelectUpgrade {
        player_id: PlayerId,
        option_id: u64,
    },
    Admin(AdminCommand),
}

/// Coarse session phase for clients that only need to switch screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No players yet.
    Waiting,
    Running { wave: u32 },
    /// The simulation is paused on this player's upgrade choice.
    AwaitingUpgrade { player_id: PlayerId },
    Won,
    GameOver,
}

impl SessionStatus {
    pub fn of(state: &GameState) -> Self {
        match state.status {
            GameStatus::Won => return SessionStatus::Won,
            GameStatus::GameOver => return SessionStatus::GameOver,
            GameStatus::Playing => {}
        }
        if let Some(choice) = &state.pending_choice {
            return SessionStatus::AwaitingUpgrade {
                player_id: choice.player_id,
            };
        }
        if state.players.is_empty() {
            SessionStatus::Waiting
        } else {
            SessionStatus::Running { wave: state.wave }
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self, SessionStatus::Won | SessionStatus::GameOver)
    }
}

/// Snapshot published after a tick. The state is shared, not copied, per subscriber.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub state: Arc<GameState>,
}
