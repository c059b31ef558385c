// Persistent area damage (orbitals, fire trails, boss orbs) plus the
// area-effect pass for explosions and short-lived visuals.

use crate::domain::geometry::circles_overlap;
use crate::domain::rng::GameRng;
use crate::domain::state::{EntityId, GameState, Hazard, HazardKind, Owner};
use crate::domain::systems::Frame;
use crate::domain::systems::combat;
use crate::domain::tuning::Tuning;
use crate::domain::tuning::hazard::HazardTuning;
use std::f32::consts::TAU;
use tracing::debug;

/// Hazard update: keep orbitals in sync with their owners, lay fire trails,
/// spin boss orbs, age everything, then apply damage.
pub fn update_hazards(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    sync_orbitals(state, &tuning.hazard);
    lay_fire_trails(state, tuning, frame);
    spin_boss_orbs(state, &tuning.hazard, frame);

    for hazard in state.hazards.iter_mut() {
        if let Some(remaining) = hazard.remaining_ms.as_mut() {
            *remaining -= frame.delta_ms;
        }
    }
    state
        .hazards
        .retain(|h| h.remaining_ms.is_none_or(|remaining| remaining > 0.0));

    apply_hazard_damage(state, tuning, rng, frame);
}

/// One orbital hazard per slot for each living player; positions derive from
/// the session clock so they stay consistent without per-hazard state.
fn sync_orbitals(state: &mut GameState, tuning: &HazardTuning) {
    let owners: Vec<(EntityId, u32, f32, f32)> = state
        .players
        .iter()
        .filter(|p| p.alive && p.stats.orbital_count > 0)
        .map(|p| (p.id, p.stats.orbital_count, p.x, p.y))
        .collect();

    state.hazards.retain(|h| match (h.kind, h.owner) {
        (HazardKind::Orbital { index }, Owner::Player(id)) => owners
            .iter()
            .any(|(owner, count, _, _)| *owner == id && index < *count),
        _ => true,
    });

    let spin = (state.elapsed_ms / 1000.0) as f32 * tuning.orbital_angular_speed;
    for (owner, count, x, y) in owners {
        for index in 0..count {
            let angle = spin + TAU * index as f32 / count as f32;
            let ox = x + angle.cos() * tuning.orbital_distance;
            let oy = y + angle.sin() * tuning.orbital_distance;

            let existing = state.hazards.iter_mut().find(|h| {
                h.owner == Owner::Player(owner) && h.kind == HazardKind::Orbital { index }
            });
            match existing {
                Some(hazard) => {
                    hazard.x = ox;
                    hazard.y = oy;
                }
                None => {
                    let id = state.next_entity_id();
                    state.hazards.push(Hazard {
                        id,
                        owner: Owner::Player(owner),
                        kind: HazardKind::Orbital { index },
                        x: ox,
                        y: oy,
                        radius: tuning.orbital_radius,
                        dps: tuning.orbital_dps,
                        remaining_ms: None,
                    });
                }
            }
        }
    }
}

fn lay_fire_trails(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let hazard = &tuning.hazard;
    let mut patches = Vec::new();
    for player in state.players.iter_mut() {
        if !player.alive || !player.stats.has_fire_trail || !player.input.is_moving() {
            continue;
        }
        player.fire_trail_timer_ms += frame.delta_ms;
        if player.fire_trail_timer_ms >= hazard.fire_trail_interval_ms {
            player.fire_trail_timer_ms = 0.0;
            patches.push((player.id, player.x, player.y));
        }
    }

    for (owner, x, y) in patches {
        // Soft cap: skip the patch rather than evict anything.
        if state.hazards.len() >= hazard.max_hazards {
            debug!(player_id = owner, "hazard cap reached, fire patch skipped");
            continue;
        }
        let id = state.next_entity_id();
        state.hazards.push(Hazard {
            id,
            owner: Owner::Player(owner),
            kind: HazardKind::FireTrail,
            x,
            y,
            radius: hazard.fire_trail_radius,
            dps: hazard.fire_trail_dps,
            remaining_ms: Some(hazard.fire_trail_lifetime_ms),
        });
    }
}

/// Raise `count` orbs evenly spaced around boss `owner`.
pub fn raise_boss_orbs(state: &mut GameState, tuning: &HazardTuning, owner: EntityId, count: u32) {
    let Some((x, y)) = state
        .enemies
        .iter()
        .find(|e| e.id == owner && e.is_alive())
        .map(|e| (e.x, e.y))
    else {
        return;
    };

    for k in 0..count {
        if state.hazards.len() >= tuning.max_hazards {
            break;
        }
        let angle = TAU * k as f32 / count.max(1) as f32;
        let id = state.next_entity_id();
        state.hazards.push(Hazard {
            id,
            owner: Owner::Enemy(owner),
            kind: HazardKind::BossOrb { angle },
            x: x + angle.cos() * tuning.boss_orb_distance,
            y: y + angle.sin() * tuning.boss_orb_distance,
            radius: tuning.boss_orb_radius,
            dps: tuning.boss_orb_dps,
            remaining_ms: Some(tuning.boss_orb_lifetime_ms),
        });
    }
}

fn spin_boss_orbs(state: &mut GameState, tuning: &HazardTuning, frame: Frame) {
    let enemies = &state.enemies;
    state.hazards.retain_mut(|hazard| {
        let HazardKind::BossOrb { angle } = &mut hazard.kind else {
            return true;
        };
        let Owner::Enemy(owner) = hazard.owner else {
            return false;
        };
        let Some(boss) = enemies.iter().find(|e| e.id == owner && e.is_alive()) else {
            return false;
        };

        *angle = (*angle + tuning.boss_orb_angular_speed * frame.delta_ms / 1000.0) % TAU;
        hazard.x = boss.x + angle.cos() * tuning.boss_orb_distance;
        hazard.y = boss.y + angle.sin() * tuning.boss_orb_distance;
        true
    });
}

fn apply_hazard_damage(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    let GameState {
        hazards,
        enemies,
        players,
        ..
    } = &mut *state;

    for hazard in hazards.iter() {
        let amount = frame.per_second(hazard.dps);
        if hazard.owner.is_hostile() {
            for player in players.iter_mut().filter(|p| p.alive) {
                if circles_overlap(hazard.x, hazard.y, hazard.radius, player.x, player.y, tuning.player.radius) {
                    combat::mitigate(player, amount, rng);
                }
            }
        } else {
            for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                if circles_overlap(hazard.x, hazard.y, hazard.radius, enemy.x, enemy.y, enemy.radius) {
                    combat::damage_enemy(enemy, amount, Some(hazard.owner), None);
                }
            }
        }
    }
}

/// Explosions deal their damage once, then linger; chain links and damage
/// numbers age out.
pub fn resolve_area_effects(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let GameState {
        explosions,
        enemies,
        chain_links,
        ..
    } = &mut *state;

    for explosion in explosions.iter_mut() {
        if !explosion.applied {
            for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                if circles_overlap(explosion.x, explosion.y, explosion.radius, enemy.x, enemy.y, enemy.radius) {
                    combat::damage_enemy(
                        enemy,
                        explosion.damage,
                        Some(explosion.owner),
                        Some((false, &tuning.combat)),
                    );
                }
            }
            explosion.applied = true;
        }
        explosion.remaining_ms -= frame.delta_ms;
    }
    explosions.retain(|e| e.remaining_ms > 0.0);

    for link in chain_links.iter_mut() {
        link.remaining_ms -= frame.delta_ms;
    }
    chain_links.retain(|l| l.remaining_ms > 0.0);

    for enemy in enemies.iter_mut() {
        for number in enemy.damage_numbers.iter_mut() {
            number.ttl_ms -= frame.delta_ms;
        }
        enemy.damage_numbers.retain(|n| n.ttl_ms > 0.0);
    }
}
