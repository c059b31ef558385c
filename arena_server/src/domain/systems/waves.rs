// Wave/round state machine.
//
// `Normal(timer)` advances the wave when the timer runs out. Landing on the
// special cadence enters `Special`, which runs until its budget is spawned and
// killed, then `RewardPending` hands each living player a forced legendary
// choice before the next wave starts.

use crate::domain::rng::GameRng;
use crate::domain::state::{ExtractionZone, GameState, RoundState};
use crate::domain::systems::enemies::{edge_position, spawn_boss};
use crate::domain::systems::{Frame, progression};
use crate::domain::tuning::Tuning;
use crate::domain::tuning::enemy::boss_for_appearance;
use crate::domain::upgrades::Rarity;
use tracing::info;

/// Whether `wave` is a special round for the given cadence.
pub fn is_special_wave(wave: u32, start: u32, interval: u32) -> bool {
    if wave < start {
        return false;
    }
    if interval == 0 {
        return wave == start;
    }
    (wave - start) % interval == 0
}

pub fn advance_waves(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    match &mut state.round {
        RoundState::Normal { timer_ms } => {
            *timer_ms += frame.delta_ms;
            if *timer_ms >= tuning.wave.wave_duration_ms {
                let next = state.wave + 1;
                enter_wave(state, tuning, rng, next);
            }
        }
        RoundState::Special {
            budget,
            spawned,
            killed,
            ..
        } => {
            let exhausted = *spawned >= *budget && *killed >= *spawned;
            if exhausted && state.live_special_count() == 0 {
                let remaining = state.living_players().map(|p| p.id).collect();
                state.round = RoundState::RewardPending { remaining };
                state.round_cleared = true;
                info!(wave = state.wave, "special round cleared");
            }
        }
        RoundState::RewardPending { .. } => grant_rewards(state, tuning, rng),
    }
}

/// Offer the next forced reward, or start the next wave once everyone has one.
fn grant_rewards(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng) {
    if state.is_gated() {
        return;
    }

    let living: Vec<_> = state.living_players().map(|p| p.id).collect();
    let RoundState::RewardPending { remaining } = &mut state.round else {
        return;
    };
    remaining.retain(|id| living.contains(id));
    let next_player = remaining.first().copied();

    match next_player {
        Some(player_id) => progression::open_choice(state, rng, player_id, Some(Rarity::Legendary)),
        None => {
            let next = state.wave + 1;
            enter_wave(state, tuning, rng, next);
        }
    }
}

/// Switch to `wave`, choosing its round kind and any one-off setup.
pub fn enter_wave(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, wave: u32) {
    let cadence = &tuning.wave;
    state.wave = wave;

    if is_special_wave(wave, cadence.special_round_start, cadence.special_round_interval) {
        start_special_round(state, tuning);
    } else {
        state.round = RoundState::Normal { timer_ms: 0.0 };
        state.round_cleared = false;
        if cadence.boss_wave_interval > 0 && wave % cadence.boss_wave_interval == 0 {
            let kind = boss_for_appearance(wave / cadence.boss_wave_interval);
            let edge = rng.range_u32(0, 3);
            let (x, y) = edge_position(rng, &tuning.arena, edge);
            spawn_boss(state, kind, x, y);
        }
    }

    if wave > cadence.win_wave && state.extraction.is_none() {
        let (x, y) = tuning.arena.center();
        state.extraction = Some(ExtractionZone {
            x,
            y,
            radius: cadence.extraction_radius,
        });
        info!(wave, "extraction zone opened");
    }

    info!(wave, special = state.is_special_round(), "wave started");
}

/// Begin a special round at the current wave.
pub fn start_special_round(state: &mut GameState, tuning: &Tuning) {
    state.round = RoundState::Special {
        budget: tuning.wave.special_budget(state.wave),
        spawned: 0,
        killed: 0,
        spawn_timer_ms: 0.0,
    };
    state.round_cleared = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{EnemyKind, GameStatus};
    use crate::domain::systems::fixtures;

    #[test]
    fn special_rounds_follow_the_cadence_and_nothing_else() {
        let special: Vec<u32> = (1..=30).filter(|w| is_special_wave(*w, 5, 5)).collect();
        assert_eq!(special, vec![5, 10, 15, 20, 25, 30]);
    }

    #[test]
    fn when_the_wave_timer_runs_out_then_the_wave_advances() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        let mut rng = GameRng::from_seed(1);
        state.round = RoundState::Normal { timer_ms: 29_900.0 };

        advance_waves(&mut state, &tuning, &mut rng, Frame::new(50.0));
        assert_eq!(state.wave, 1);

        advance_waves(&mut state, &tuning, &mut rng, Frame::new(50.0));
        assert_eq!(state.wave, 2);
        assert_eq!(state.round, RoundState::Normal { timer_ms: 0.0 });
    }

    #[test]
    fn when_advancing_from_wave_one_then_specials_start_exactly_on_cadence_waves() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        let mut rng = GameRng::from_seed(1);
        let mut specials = Vec::new();

        for _ in 0..14 {
            // Skip straight past normal timers and special rounds.
            state.round = RoundState::Normal {
                timer_ms: tuning.wave.wave_duration_ms,
            };
            advance_waves(&mut state, &tuning, &mut rng, Frame::new(0.0));
            if state.is_special_round() {
                specials.push(state.wave);
            }
        }

        assert_eq!(state.wave, 15);
        assert_eq!(specials, vec![5, 10, 15]);
    }

    #[test]
    fn when_a_boss_wave_starts_then_one_boss_spawns() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        enter_wave(&mut state, &tuning, &mut GameRng::from_seed(1), 7);

        let bosses: Vec<_> = state.enemies.iter().filter(|e| e.is_boss()).collect();
        assert_eq!(bosses.len(), 1);
        assert!(matches!(bosses[0].kind, EnemyKind::Boss(_)));
    }

    #[test]
    fn when_special_round_is_exhausted_then_rewards_are_handed_out_one_by_one() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        state.wave = 5;
        state.players.push(fixtures::player(1, 100.0, 100.0));
        state.players.push(fixtures::player(2, 200.0, 100.0));
        state.round = RoundState::Special {
            budget: 4,
            spawned: 4,
            killed: 4,
            spawn_timer_ms: 1000.0,
        };
        let mut rng = GameRng::from_seed(1);

        advance_waves(&mut state, &tuning, &mut rng, Frame::new(16.0));
        assert_eq!(state.round, RoundState::RewardPending { remaining: vec![1, 2] });
        assert!(state.round_cleared);

        for expected in [1, 2] {
            advance_waves(&mut state, &tuning, &mut rng, Frame::new(16.0));
            let pending = state.pending_choice.clone().expect("forced choice");
            assert_eq!(pending.player_id, expected);
            assert!(pending.forced);
            assert!(pending.options.iter().all(|o| o.rarity == Rarity::Legendary));
            let option = pending.options[0].id;
            progression::select_upgrade(&mut state, &tuning, expected, option).expect("select");
        }

        advance_waves(&mut state, &tuning, &mut rng, Frame::new(16.0));
        assert_eq!(state.wave, 6);
        assert_eq!(state.round, RoundState::Normal { timer_ms: 0.0 });
        assert!(!state.round_cleared);
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[test]
    fn when_live_specials_remain_then_the_round_does_not_end() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        state.round = RoundState::Special {
            budget: 2,
            spawned: 2,
            killed: 2,
            spawn_timer_ms: 0.0,
        };
        let e = fixtures::enemy(&mut state, EnemyKind::Elite, 10.0, 10.0);
        state.enemies[e].special = true;

        advance_waves(&mut state, &tuning, &mut GameRng::from_seed(1), Frame::new(16.0));

        assert!(state.is_special_round());
    }

    #[test]
    fn when_the_win_wave_is_passed_then_extraction_opens_once() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        let mut rng = GameRng::from_seed(1);

        enter_wave(&mut state, &tuning, &mut rng, tuning.wave.win_wave);
        assert!(state.extraction.is_none());

        enter_wave(&mut state, &tuning, &mut rng, tuning.wave.win_wave + 1);
        let zone = state.extraction.expect("zone");
        assert_eq!((zone.x, zone.y), tuning.arena.center());

        state.extraction = Some(ExtractionZone { x: 1.0, ..zone });
        enter_wave(&mut state, &tuning, &mut rng, tuning.wave.win_wave + 2);
        assert_eq!(state.extraction.map(|z| z.x), Some(1.0));
    }
}
