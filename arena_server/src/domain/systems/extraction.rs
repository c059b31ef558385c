use crate::domain::events::{EngineEvent, RunOutcome, RunSummary, UnlockCriterion};
use crate::domain::state::{GameState, GameStatus};
use crate::domain::systems::Frame;
use crate::domain::tuning::Tuning;
use tracing::info;

/// Wave a run must reach for the veteran unlock.
pub const VETERAN_WAVE: u32 = 15;

/// Accrue extraction progress and declare victory once every living player
/// has stood in the zone for the full duration at the same time.
pub fn update_extraction(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let Some(zone) = state.extraction else {
        return;
    };

    for player in state.players.iter_mut() {
        if player.alive && zone.contains(player.x, player.y) {
            player.extraction_progress_ms += frame.delta_ms;
        } else {
            player.extraction_progress_ms = 0.0;
        }
    }

    let required = tuning.wave.extraction_duration_ms;
    let extracted = {
        let mut living = state.living_players().peekable();
        living.peek().is_some() && living.all(|p| p.extraction_progress_ms >= required)
    };
    if extracted {
        state.status = GameStatus::Won;
        info!(wave = state.wave, "players extracted");
    }
}

/// Game over when everyone is down; end-of-run bookkeeping runs exactly once
/// per run whichever terminal state was reached.
pub fn check_terminal(state: &mut GameState, events: &mut Vec<EngineEvent>) {
    if state.status == GameStatus::Playing
        && !state.players.is_empty()
        && state.players.iter().all(|p| !p.alive)
    {
        state.status = GameStatus::GameOver;
        info!(wave = state.wave, "all players down");
    }

    if state.status == GameStatus::Playing || state.run_recorded {
        return;
    }
    state.run_recorded = true;

    let outcome = match state.status {
        GameStatus::Won => RunOutcome::Victory,
        _ => RunOutcome::Defeat,
    };
    for player in &state.players {
        events.push(EngineEvent::RunEnded(RunSummary {
            player_id: player.id,
            name: player.name.clone(),
            character: player.character.clone(),
            outcome,
            wave: state.wave,
            level: player.level,
            kills: player.kills,
            survival_time_ms: state.elapsed_ms as u64,
        }));

        if outcome == RunOutcome::Victory && player.alive {
            events.push(EngineEvent::UnlockCriteriaMet {
                player_id: player.id,
                criterion: UnlockCriterion::Extracted,
            });
        }
        if state.wave >= VETERAN_WAVE {
            events.push(EngineEvent::UnlockCriteriaMet {
                player_id: player.id,
                criterion: UnlockCriterion::WaveVeteran,
            });
        }
    }

    info!(
        ?outcome,
        wave = state.wave,
        kills = state.total_kills,
        "run recorded"
    );
}
