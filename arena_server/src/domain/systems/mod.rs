// Tick sub-steps. Each module owns one stage of the fixed pipeline the engine
// runs; they share `Frame` timing and the targeting helpers below.

pub mod combat;
pub mod enemies;
pub mod extraction;
pub mod hazards;
pub mod movement;
pub mod pets;
pub mod progression;
pub mod projectiles;
pub mod revive;
pub mod status;
pub mod waves;

use crate::domain::geometry::{BASELINE_FRAME_MS, distance_sq};
use crate::domain::state::{Enemy, EntityId, Player};

/// Upper bound on a single step; longer stalls are simulated as this much time.
pub const MAX_DELTA_MS: f32 = 250.0;

/// Timing for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub delta_ms: f32,
    /// `delta_ms` in 60fps frames; per-frame speeds are multiplied by this.
    pub time_factor: f32,
}

impl Frame {
    pub fn new(delta_ms: f32) -> Self {
        let delta_ms = if delta_ms.is_finite() {
            delta_ms.clamp(0.0, MAX_DELTA_MS)
        } else {
            0.0
        };
        Self {
            delta_ms,
            time_factor: delta_ms / BASELINE_FRAME_MS,
        }
    }

    /// Amount accrued this tick for a per-second `rate`.
    pub fn per_second(&self, rate: f32) -> f32 {
        rate * self.delta_ms / 1000.0
    }
}

/// Index of the nearest living enemy within `max_range` that `skip` does not reject.
pub fn nearest_enemy(
    enemies: &[Enemy],
    x: f32,
    y: f32,
    max_range: f32,
    skip: impl Fn(EntityId) -> bool,
) -> Option<usize> {
    let max_sq = max_range * max_range;
    enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive() && !skip(e.id))
        .map(|(i, e)| (i, distance_sq(x, y, e.x, e.y)))
        .filter(|(_, d)| *d <= max_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Living enemies within `max_range`, nearest first.
pub fn enemies_by_distance(enemies: &[Enemy], x: f32, y: f32, max_range: f32) -> Vec<usize> {
    let max_sq = max_range * max_range;
    let mut found: Vec<(usize, f32)> = enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive())
        .map(|(i, e)| (i, distance_sq(x, y, e.x, e.y)))
        .filter(|(_, d)| *d <= max_sq)
        .collect();
    found.sort_by(|a, b| a.1.total_cmp(&b.1));
    found.into_iter().map(|(i, _)| i).collect()
}

pub fn nearest_living_player(players: &[Player], x: f32, y: f32) -> Option<usize> {
    players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.alive)
        .map(|(i, p)| (i, distance_sq(x, y, p.x, p.y)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::state::{Enemy, EnemyKind, GameState, Player, PlayerId};
    use crate::domain::tuning::Tuning;
    use crate::domain::tuning::enemy::scaled_stats;

    pub(crate) fn player(id: PlayerId, x: f32, y: f32) -> Player {
        Player::new(
            id,
            format!("p{id}"),
            "Monkey".to_string(),
            x,
            y,
            &Tuning::default().player,
        )
    }

    pub(crate) fn enemy(state: &mut GameState, kind: EnemyKind, x: f32, y: f32) -> usize {
        let stats = scaled_stats(kind, 1);
        let id = state.next_entity_id();
        state.enemies.push(Enemy {
            id,
            kind,
            x,
            y,
            health: stats.health,
            max_health: stats.health,
            damage: stats.damage,
            speed: stats.speed,
            radius: stats.radius,
            xp: stats.xp,
            ranged: None,
            status_effects: Vec::new(),
            damage_numbers: Vec::new(),
            special: false,
            last_hit_by: None,
            boss: None,
        });
        state.enemies.len() - 1
    }
}
