use crate::domain::state::GameState;
use crate::domain::systems::Frame;
use crate::domain::tuning::Tuning;

/// Move living players along each held axis, keeping them inside the arena.
pub fn move_players(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let margin = tuning.player.radius;
    let (max_x, max_y) = (tuning.arena.width - margin, tuning.arena.height - margin);

    for player in state.players.iter_mut().filter(|p| p.alive) {
        let input = player.input;
        let step = player.stats.speed * frame.time_factor;

        let mut dx = 0.0;
        let mut dy = 0.0;
        if input.left {
            dx -= step;
        }
        if input.right {
            dx += step;
        }
        if input.up {
            dy -= step;
        }
        if input.down {
            dy += step;
        }

        player.x = (player.x + dx).clamp(margin, max_x);
        player.y = (player.y + dy).clamp(margin, max_y);
    }
}

/// Passive regeneration and shield recharge for living players.
pub fn regenerate(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let shield_step = frame.per_second(tuning.player.shield_regen_per_sec);
    for player in state.players.iter_mut().filter(|p| p.alive) {
        player.heal(frame.per_second(player.stats.regeneration));
        if player.stats.shield < player.stats.max_shield {
            player.stats.shield = (player.stats.shield + shield_step).min(player.stats.max_shield);
        }
    }
}
