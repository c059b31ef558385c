use crate::domain::geometry::distance_sq;
use crate::domain::state::GameState;
use crate::domain::systems::Frame;
use crate::domain::tuning::Tuning;
use tracing::info;

/// Proximity revive: a dead player near any living player accrues progress;
/// losing proximity drops progress straight back to zero.
pub fn update_revives(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let living: Vec<(f32, f32)> = state.living_players().map(|p| (p.x, p.y)).collect();
    let radius_sq = tuning.player.revive_radius * tuning.player.revive_radius;

    for player in state.players.iter_mut().filter(|p| !p.alive) {
        let helped = living
            .iter()
            .any(|(x, y)| distance_sq(player.x, player.y, *x, *y) <= radius_sq);
        if !helped {
            player.revive_progress_ms = 0.0;
            continue;
        }

        player.revive_progress_ms += frame.delta_ms;
        if player.revive_progress_ms >= tuning.player.revive_duration_ms {
            player.alive = true;
            player.health = player.max_health * tuning.player.revive_health_fraction;
            player.revive_progress_ms = 0.0;
            info!(player_id = player.id, "player revived");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::systems::fixtures;

    fn downed_pair() -> GameState {
        let mut state = GameState::new(1);
        state.players.push(fixtures::player(1, 500.0, 500.0));
        state.players.push(fixtures::player(2, 530.0, 500.0));
        state.players[0].kill();
        state
    }

    #[test]
    fn when_ally_stays_close_long_enough_then_player_revives_at_half_health() {
        let tuning = Tuning::default();
        let mut state = downed_pair();

        for _ in 0..12 {
            update_revives(&mut state, &tuning, Frame::new(250.0));
        }

        let player = &state.players[0];
        assert!(player.alive);
        assert_eq!(player.health, 50.0);
        assert_eq!(player.revive_progress_ms, 0.0);
    }

    #[test]
    fn when_ally_walks_away_then_progress_resets_to_exactly_zero() {
        let tuning = Tuning::default();
        let mut state = downed_pair();
        update_revives(&mut state, &tuning, Frame::new(250.0));
        update_revives(&mut state, &tuning, Frame::new(250.0));
        assert_eq!(state.players[0].revive_progress_ms, 500.0);

        state.players[1].x = 900.0;
        update_revives(&mut state, &tuning, Frame::new(16.0));

        assert_eq!(state.players[0].revive_progress_ms, 0.0);
        assert!(!state.players[0].alive);
    }

    #[test]
    fn when_everyone_is_dead_then_nobody_revives() {
        let tuning = Tuning::default();
        let mut state = downed_pair();
        state.players[1].kill();

        for _ in 0..20 {
            update_revives(&mut state, &tuning, Frame::new(250.0));
        }

        assert!(state.players.iter().all(|p| !p.alive));
    }
}
