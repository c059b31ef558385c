// Companion pets: spawned for owners who have the pet upgrade, despawned
// when the owner dies, following the owner and shooting on their own timer.

use crate::domain::geometry::{direction, distance};
use crate::domain::state::{GameState, Owner, Pet, PlayerId, Projectile, ProjectileKind};
use crate::domain::systems::{Frame, nearest_enemy};
use crate::domain::tuning::Tuning;
use crate::domain::tuning::pet::PetTuning;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct OwnerView {
    id: PlayerId,
    x: f32,
    y: f32,
    damage_bonus: f32,
}

pub fn update_pets(state: &mut GameState, tuning: &Tuning, frame: Frame) {
    let owners: Vec<OwnerView> = state
        .players
        .iter()
        .filter(|p| p.alive && p.stats.has_pet)
        .map(|p| OwnerView {
            id: p.id,
            x: p.x,
            y: p.y,
            damage_bonus: p.stats.pet_damage_bonus,
        })
        .collect();

    state.pets.retain(|pet| {
        let keep = owners.iter().any(|o| o.id == pet.owner_id);
        if !keep {
            debug!(pet_id = pet.id, owner_id = pet.owner_id, "pet despawned");
        }
        keep
    });

    for owner in &owners {
        if !state.pets.iter().any(|pet| pet.owner_id == owner.id) {
            let id = state.next_entity_id();
            state.pets.push(Pet {
                id,
                owner_id: owner.id,
                x: owner.x,
                y: owner.y,
                health: tuning.pet.max_health,
                max_health: tuning.pet.max_health,
                level: 1,
                xp: 0,
                xp_to_next_level: tuning.pet.base_xp_to_next_level,
                attack_cooldown_ms: tuning.pet.attack_cooldown_ms,
            });
            debug!(pet_id = id, owner_id = owner.id, "pet spawned");
        }
    }

    let mut shots = Vec::new();
    for pet in state.pets.iter_mut() {
        let Some(owner) = owners.iter().find(|o| o.id == pet.owner_id) else {
            continue;
        };

        let gap = distance(pet.x, pet.y, owner.x, owner.y);
        if gap > tuning.pet.follow_distance {
            let (dx, dy) = direction(pet.x, pet.y, owner.x, owner.y);
            let step = (tuning.pet.speed * frame.time_factor).min(gap - tuning.pet.follow_distance);
            pet.x += dx * step;
            pet.y += dy * step;
        }

        pet.attack_cooldown_ms = (pet.attack_cooldown_ms - frame.delta_ms).max(0.0);
        if pet.attack_cooldown_ms > 0.0 {
            continue;
        }
        let Some(target) = nearest_enemy(&state.enemies, pet.x, pet.y, tuning.pet.attack_range, |_| false)
            .and_then(|i| state.enemies.get(i))
        else {
            continue;
        };

        let damage = pet_damage(pet, &tuning.pet) + owner.damage_bonus;
        shots.push((pet.id, pet.x, pet.y, direction(pet.x, pet.y, target.x, target.y), damage));
        pet.attack_cooldown_ms = tuning.pet.attack_cooldown_ms;
    }

    for (pet_id, x, y, (dx, dy), damage) in shots {
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            owner: Owner::Pet(pet_id),
            x,
            y,
            vx: dx * tuning.pet.projectile_speed,
            vy: dy * tuning.pet.projectile_speed,
            damage,
            crit: false,
            kind: ProjectileKind::Standard,
            radius: tuning.projectile.radius,
            pierce_remaining: 0,
            ricochet_remaining: 0,
            hit: Vec::new(),
        });
    }
}

pub fn pet_damage(pet: &Pet, tuning: &PetTuning) -> f32 {
    tuning.base_damage + tuning.damage_per_level * pet.level.saturating_sub(1) as f32
}

/// Add xp to a pet, levelling it as many times as the xp covers.
pub fn grant_xp(pet: &mut Pet, xp: u32, tuning: &PetTuning) {
    pet.xp += xp;
    while pet.xp_to_next_level > 0 && pet.xp >= pet.xp_to_next_level {
        pet.xp -= pet.xp_to_next_level;
        pet.level += 1;
        pet.xp_to_next_level = (pet.xp_to_next_level as f32 * tuning.xp_growth).ceil() as u32;
        pet.max_health += tuning.health_per_level;
        pet.health = pet.max_health;
        debug!(pet_id = pet.id, level = pet.level, "pet levelled up");
    }
}

/// Share of an orb's value that an owner's pet receives.
pub fn shared_xp(value: u32, tuning: &PetTuning) -> u32 {
    (value as f32 * tuning.xp_share).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::EnemyKind;
    use crate::domain::systems::fixtures;

    fn owner_with_pet(state: &mut GameState) {
        state.players.push(fixtures::player(1, 500.0, 500.0));
        state.players[0].stats.has_pet = true;
    }

    #[test]
    fn when_owner_unlocks_a_pet_then_exactly_one_is_spawned() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        owner_with_pet(&mut state);

        update_pets(&mut state, &tuning, Frame::new(16.0));
        update_pets(&mut state, &tuning, Frame::new(16.0));

        assert_eq!(state.pets.len(), 1);
        assert_eq!(state.pets[0].owner_id, 1);
    }

    #[test]
    fn when_owner_dies_then_the_pet_despawns() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        owner_with_pet(&mut state);
        update_pets(&mut state, &tuning, Frame::new(16.0));

        state.players[0].kill();
        update_pets(&mut state, &tuning, Frame::new(16.0));

        assert!(state.pets.is_empty());
    }

    #[test]
    fn when_owner_moves_away_then_the_pet_follows_up_to_its_distance() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        owner_with_pet(&mut state);
        update_pets(&mut state, &tuning, Frame::new(16.0));

        state.players[0].x = 800.0;
        for _ in 0..200 {
            update_pets(&mut state, &tuning, Frame::new(1000.0 / 60.0));
        }

        let gap = distance(state.pets[0].x, state.pets[0].y, 800.0, 500.0);
        assert!((gap - tuning.pet.follow_distance).abs() < 1e-2);
    }

    #[test]
    fn when_cooldown_is_ready_and_an_enemy_is_in_range_then_the_pet_fires() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        owner_with_pet(&mut state);
        state.players[0].stats.pet_damage_bonus = 3.0;
        fixtures::enemy(&mut state, EnemyKind::Basic, 700.0, 500.0);
        update_pets(&mut state, &tuning, Frame::new(16.0));
        state.pets[0].attack_cooldown_ms = 0.0;

        update_pets(&mut state, &tuning, Frame::new(16.0));

        assert_eq!(state.projectiles.len(), 1);
        let shot = &state.projectiles[0];
        assert_eq!(shot.owner, Owner::Pet(state.pets[0].id));
        assert_eq!(shot.damage, tuning.pet.base_damage + 3.0);
    }

    #[test]
    fn when_pet_gains_enough_xp_then_it_levels_and_hits_harder() {
        let tuning = PetTuning::default();
        let mut pet = Pet {
            id: 1,
            owner_id: 1,
            x: 0.0,
            y: 0.0,
            health: 10.0,
            max_health: tuning.max_health,
            level: 1,
            xp: 0,
            xp_to_next_level: tuning.base_xp_to_next_level,
            attack_cooldown_ms: 0.0,
        };

        grant_xp(&mut pet, tuning.base_xp_to_next_level + 1, &tuning);

        assert_eq!(pet.level, 2);
        assert_eq!(pet.xp, 1);
        assert_eq!(pet.health, pet.max_health);
        assert!(pet_damage(&pet, &tuning) > tuning.base_damage);
    }
}
