// Wire protocol DTOs and conversions for public session messages.
// Internal service-to-service DTOs should live outside this module.

use crate::domain::{AdminCommand, EngineEvent, GameState, PlayerId, PlayerInput};
use crate::use_cases::{SessionStatus, WorldUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: PlayerId },
    // Full snapshot of the session for a given tick.
    WorldUpdate(WorldUpdateDto),
    // Coarse session phase (waiting, running, upgrade pause, ended).
    SessionStatus(SessionStatusDto),
    // Engine notifications (milestones, run summaries, unlocks).
    Event(EngineEvent),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message with identity metadata.
    Join(JoinPayload),
    // Held directions, sent whenever they change.
    Input(PlayerInputDto),
    // Pick one of the offers in the current upgrade choice.
    SelectUpgrade { option_id: u64 },
    // Debug commands; only honoured when the server enables them.
    Admin(AdminCommand),
}

/// Payload for the Join handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub display_name: String,
    #[serde(default = "default_character")]
    pub character: String,
}

fn default_character() -> String {
    "Monkey".to_string()
}

/// Directional input payload sent by the client after joining.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlayerInputDto {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl From<PlayerInputDto> for PlayerInput {
    fn from(input: PlayerInputDto) -> Self {
        Self {
            up: input.up,
            down: input.down,
            left: input.left,
            right: input.right,
        }
    }
}

/// Snapshot of the session sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub state: Arc<GameState>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            state: update.state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum SessionStatusDto {
    Waiting,
    Running { wave: u32 },
    AwaitingUpgrade { player_id: PlayerId },
    Won,
    GameOver,
}

impl From<SessionStatus> for SessionStatusDto {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Waiting => SessionStatusDto::Waiting,
            SessionStatus::Running { wave } => SessionStatusDto::Running { wave },
            SessionStatus::AwaitingUpgrade { player_id } => {
                SessionStatusDto::AwaitingUpgrade { player_id }
            }
            SessionStatus::Won => SessionStatusDto::Won,
            SessionStatus::GameOver => SessionStatusDto::GameOver,
        }
    }
}
