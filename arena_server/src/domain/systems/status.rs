use crate::domain::state::GameState;
use crate::domain::systems::Frame;
use crate::domain::systems::combat;

/// Tick every enemy's status effects. Damage-over-time spreads the effect's
/// total damage evenly across its own base duration.
pub fn tick_status_effects(state: &mut GameState, frame: Frame) {
    for enemy in state.enemies.iter_mut() {
        if enemy.status_effects.is_empty() {
            continue;
        }

        let mut dot = Vec::new();
        for effect in enemy.status_effects.iter_mut() {
            if effect.damage > 0.0 && effect.base_duration_ms > 0.0 {
                let active_ms = frame.delta_ms.min(effect.remaining_ms.max(0.0));
                dot.push((effect.damage / effect.base_duration_ms * active_ms, effect.source));
            }
            effect.remaining_ms -= frame.delta_ms;
        }
        enemy.status_effects.retain(|effect| effect.remaining_ms > 0.0);

        for (amount, source) in dot {
            combat::damage_enemy(enemy, amount, source, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{EnemyKind, Owner, StatusEffect, StatusKind};
    use crate::domain::systems::fixtures;

    fn burning(damage: f32, duration: f32) -> StatusEffect {
        StatusEffect {
            kind: StatusKind::Burning,
            remaining_ms: duration,
            base_duration_ms: duration,
            damage,
            speed_multiplier: 1.0,
            source: Some(Owner::Player(7)),
        }
    }

    #[test]
    fn when_burning_for_its_full_duration_then_total_damage_matches_the_effect() {
        let mut state = GameState::new(1);
        let e = fixtures::enemy(&mut state, EnemyKind::Tank, 0.0, 0.0);
        state.enemies[e].status_effects.push(burning(30.0, 3000.0));

        for _ in 0..15 {
            tick_status_effects(&mut state, Frame::new(200.0));
        }

        assert!((state.enemies[e].health - 50.0).abs() < 1e-3);
        assert!(state.enemies[e].status_effects.is_empty());
        assert_eq!(state.enemies[e].last_hit_by, Some(Owner::Player(7)));
    }

    #[test]
    fn when_effect_runs_past_its_end_then_only_the_remaining_slice_deals_damage() {
        let mut state = GameState::new(1);
        let e = fixtures::enemy(&mut state, EnemyKind::Tank, 0.0, 0.0);
        let mut effect = burning(10.0, 1000.0);
        effect.remaining_ms = 100.0;
        state.enemies[e].status_effects.push(effect);

        tick_status_effects(&mut state, Frame::new(200.0));

        assert!((state.enemies[e].health - 79.0).abs() < 1e-4);
    }

    #[test]
    fn when_slow_expires_then_speed_multiplier_returns_to_one() {
        let mut state = GameState::new(1);
        let e = fixtures::enemy(&mut state, EnemyKind::Tank, 0.0, 0.0);
        state.enemies[e].status_effects.push(StatusEffect {
            kind: StatusKind::Slowed,
            remaining_ms: 100.0,
            base_duration_ms: 2000.0,
            damage: 0.0,
            speed_multiplier: 0.4,
            source: None,
        });
        assert_eq!(state.enemies[e].speed_multiplier(), 0.4);

        tick_status_effects(&mut state, Frame::new(150.0));

        assert_eq!(state.enemies[e].speed_multiplier(), 1.0);
        assert_eq!(state.enemies[e].health, 80.0);
    }
}
