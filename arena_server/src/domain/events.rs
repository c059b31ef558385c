// Notifications the engine raises for hosts. They are queued during a tick and
// drained by whoever drives the engine.

use crate::domain::state::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockCriterion {
    /// Survived through extraction.
    Extracted,
    /// Reached the veteran wave before the run ended.
    WaveVeteran,
}

/// End-of-run record for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub player_id: PlayerId,
    pub name: String,
    pub character: String,
    pub outcome: RunOutcome,
    pub wave: u32,
    pub level: u32,
    pub kills: u32,
    pub survival_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineEvent {
    LevelTenReached { player_id: PlayerId },
    RunEnded(RunSummary),
    UnlockCriteriaMet {
        player_id: PlayerId,
        criterion: UnlockCriterion,
    },
}
