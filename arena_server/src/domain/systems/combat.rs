// Damage rules shared by every damage source.
//
// Players take damage through `mitigate` (dodge, then armor, then shield,
// then health). Enemies take damage through `damage_enemy`, and player-side
// hits go through `strike_enemy`, which layers the on-hit modifiers on top.

use crate::domain::geometry::{distance_sq, normalize};
use crate::domain::rng::GameRng;
use crate::domain::state::{
    ChainLink, DamageNumber, Enemy, EntityId, Owner, Player, StatusEffect, StatusKind,
};
use crate::domain::tuning::Tuning;
use crate::domain::tuning::combat::CombatTuning;

/// Result of one damage application against a player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mitigation {
    pub dodged: bool,
    /// Taken by the shield.
    pub absorbed: f32,
    /// Taken by health.
    pub dealt: f32,
    /// Thorns damage owed to the attacker.
    pub reflected: f32,
    pub killed: bool,
}

/// Apply `raw` damage to a player.
pub fn mitigate(player: &mut Player, raw: f32, rng: &mut GameRng) -> Mitigation {
    if !player.alive || raw <= 0.0 || player.stats.invulnerable {
        return Mitigation::default();
    }

    if rng.chance(player.stats.dodge) {
        return Mitigation {
            dodged: true,
            ..Mitigation::default()
        };
    }

    let after_armor = raw * (1.0 - player.stats.armor.clamp(0.0, 1.0));
    let absorbed = after_armor.min(player.stats.shield.max(0.0));
    player.stats.shield -= absorbed;
    let dealt = after_armor - absorbed;
    player.health = (player.health - dealt).max(0.0);

    let killed = player.health <= 0.0;
    if killed {
        player.kill();
    }

    Mitigation {
        dodged: false,
        absorbed,
        dealt,
        reflected: after_armor * player.stats.thorns,
        killed,
    }
}

/// Subtract `amount` from an enemy and attribute the hit. Returns the amount applied.
pub fn damage_enemy(
    enemy: &mut Enemy,
    amount: f32,
    source: Option<Owner>,
    number: Option<(bool, &CombatTuning)>,
) -> f32 {
    if amount <= 0.0 || !enemy.is_alive() {
        return 0.0;
    }
    enemy.health -= amount;
    if source.is_some() {
        enemy.last_hit_by = source;
    }
    if let Some((crit, combat)) = number {
        enemy.damage_numbers.push(DamageNumber {
            amount,
            crit,
            ttl_ms: combat.damage_number_ttl_ms,
        });
    }
    amount
}

/// The combat-relevant part of whoever landed a hit, copied out so the
/// attacker and the target can be borrowed independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attacker {
    pub owner: Owner,
    pub health_fraction: f32,
    pub berserker: bool,
    pub executioner: bool,
    pub life_steal: f32,
    pub knockback: f32,
    pub chain: u32,
    pub burn_damage: f32,
    pub poison_damage: f32,
    pub slow_amount: f32,
    pub omni_glitch: bool,
}

impl Attacker {
    pub fn from_player(player: &Player) -> Self {
        let stats = &player.stats;
        Self {
            owner: Owner::Player(player.id),
            health_fraction: player.health_fraction(),
            berserker: stats.has_berserker,
            executioner: stats.has_executioner,
            life_steal: stats.life_steal,
            knockback: stats.knockback,
            chain: stats.chain,
            burn_damage: stats.burn_damage,
            poison_damage: stats.poison_damage,
            slow_amount: stats.slow_amount,
            omni_glitch: stats.has_omni_glitch,
        }
    }

    /// An owner with no modifiers (pets, or a player who has since left).
    pub fn detached(owner: Owner) -> Self {
        Self {
            owner,
            health_fraction: 1.0,
            berserker: false,
            executioner: false,
            life_steal: 0.0,
            knockback: 0.0,
            chain: 0,
            burn_damage: 0.0,
            poison_damage: 0.0,
            slow_amount: 0.0,
            omni_glitch: false,
        }
    }
}

/// Damage for one hit after berserker and executioner.
pub fn hit_damage(attacker: &Attacker, base: f32, target: &Enemy, combat: &CombatTuning) -> f32 {
    let mut damage = base;
    if attacker.berserker && attacker.health_fraction < combat.berserker_threshold {
        damage *= 1.0 + combat.berserker_bonus;
    }
    if attacker.executioner
        && target.is_alive()
        && target.health < target.max_health * combat.executioner_threshold
    {
        damage = target.health;
    }
    damage
}

/// Totals from one [`strike_enemy`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrikeOutcome {
    /// Damage dealt to the primary target.
    pub dealt: f32,
    /// Life steal owed to the attacker.
    pub heal: f32,
    pub chained: u32,
}

/// A single landed hit before on-hit modifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub damage: f32,
    pub crit: bool,
    /// Direction the target is pushed by knockback.
    pub push: (f32, f32),
}

/// Resolve a player-side hit on `enemies[target]`: damage, knockback, status
/// effects and chain lightning.
pub fn strike_enemy(
    enemies: &mut [Enemy],
    target: usize,
    hit: Hit,
    attacker: &Attacker,
    tuning: &Tuning,
    chain_links: &mut Vec<ChainLink>,
) -> StrikeOutcome {
    let combat = &tuning.combat;
    let Some(enemy) = enemies.get_mut(target) else {
        return StrikeOutcome::default();
    };
    if !enemy.is_alive() {
        return StrikeOutcome::default();
    }

    let damage = hit_damage(attacker, hit.damage, enemy, combat);
    let dealt = damage_enemy(enemy, damage, Some(attacker.owner), Some((hit.crit, combat)));

    if attacker.knockback > 0.0 {
        let (dx, dy) = normalize(hit.push.0, hit.push.1);
        let force = if enemy.is_boss() {
            attacker.knockback * combat.boss_knockback_factor
        } else {
            attacker.knockback
        };
        enemy.x = (enemy.x + dx * force).clamp(0.0, tuning.arena.width);
        enemy.y = (enemy.y + dy * force).clamp(0.0, tuning.arena.height);
    }

    apply_elemental(enemy, attacker, combat);

    let origin_id = enemy.id;
    let chained = chain_lightning(enemies, origin_id, dealt, attacker, tuning, chain_links);

    StrikeOutcome {
        dealt,
        heal: dealt * attacker.life_steal,
        chained,
    }
}

/// Jump from `origin` to up to `attacker.chain` fresh enemies, each jump
/// carrying `chain_falloff` of the previous one.
fn chain_lightning(
    enemies: &mut [Enemy],
    origin: EntityId,
    damage: f32,
    attacker: &Attacker,
    tuning: &Tuning,
    chain_links: &mut Vec<ChainLink>,
) -> u32 {
    let combat = &tuning.combat;
    if attacker.chain == 0 || damage <= 0.0 {
        return 0;
    }
    let Some(start) = enemies.iter().find(|e| e.id == origin) else {
        return 0;
    };

    let mut visited = vec![origin];
    let (mut from_x, mut from_y) = (start.x, start.y);
    let mut jump_damage = damage * combat.chain_falloff;
    let radius_sq = combat.chain_radius * combat.chain_radius;
    let mut jumps = 0;

    for _ in 0..attacker.chain {
        let next = enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_alive() && !visited.contains(&e.id))
            .map(|(i, e)| (i, distance_sq(from_x, from_y, e.x, e.y)))
            .filter(|(_, d)| *d <= radius_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        let Some(index) = next else {
            break;
        };
        let Some(enemy) = enemies.get_mut(index) else {
            break;
        };

        damage_enemy(enemy, jump_damage, Some(attacker.owner), Some((false, combat)));
        chain_links.push(ChainLink {
            from_x,
            from_y,
            to_x: enemy.x,
            to_y: enemy.y,
            remaining_ms: tuning.hazard.chain_link_ttl_ms,
        });
        visited.push(enemy.id);
        from_x = enemy.x;
        from_y = enemy.y;
        jump_damage *= combat.chain_falloff;
        jumps += 1;
    }
    jumps
}

fn apply_elemental(enemy: &mut Enemy, attacker: &Attacker, combat: &CombatTuning) {
    let omni = attacker.omni_glitch;
    let burn = attacker.burn_damage + if omni { combat.omni_burn_damage } else { 0.0 };
    let poison = attacker.poison_damage + if omni { combat.omni_poison_damage } else { 0.0 };
    let slow = (attacker.slow_amount + if omni { combat.omni_slow_amount } else { 0.0 })
        .min(combat.slow_cap);
    let source = Some(attacker.owner);

    if burn > 0.0 {
        apply_status(
            enemy,
            StatusEffect {
                kind: StatusKind::Burning,
                remaining_ms: combat.burn_duration_ms,
                base_duration_ms: combat.burn_duration_ms,
                damage: burn,
                speed_multiplier: 1.0,
                source,
            },
        );
    }
    if poison > 0.0 {
        apply_status(
            enemy,
            StatusEffect {
                kind: StatusKind::Poisoned,
                remaining_ms: combat.poison_duration_ms,
                base_duration_ms: combat.poison_duration_ms,
                damage: poison,
                speed_multiplier: 1.0,
                source,
            },
        );
    }
    if slow > 0.0 {
        apply_status(
            enemy,
            StatusEffect {
                kind: StatusKind::Slowed,
                remaining_ms: combat.slow_duration_ms,
                base_duration_ms: combat.slow_duration_ms,
                damage: 0.0,
                speed_multiplier: 1.0 - slow,
                source,
            },
        );
    }
}

/// Add an effect; an existing effect of the same kind is refreshed instead.
pub fn apply_status(enemy: &mut Enemy, effect: StatusEffect) {
    match enemy
        .status_effects
        .iter_mut()
        .find(|existing| existing.kind == effect.kind)
    {
        Some(existing) => {
            existing.remaining_ms = effect.base_duration_ms;
            existing.base_duration_ms = effect.base_duration_ms;
            existing.damage = existing.damage.max(effect.damage);
            existing.speed_multiplier = existing.speed_multiplier.min(effect.speed_multiplier);
            existing.source = effect.source;
        }
        None => enemy.status_effects.push(effect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::{EnemyKind, GameState};
    use crate::domain::systems::fixtures;

    fn rng() -> GameRng {
        GameRng::from_seed(1)
    }

    fn hit(damage: f32) -> Hit {
        Hit {
            damage,
            crit: false,
            push: (1.0, 0.0),
        }
    }

    #[test]
    fn when_dodge_succeeds_then_no_damage_lands_regardless_of_armor_and_shield() {
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.dodge = 1.0;
        player.stats.armor = 0.5;
        player.stats.shield = 10.0;
        player.stats.max_shield = 10.0;

        let result = mitigate(&mut player, 80.0, &mut rng());

        assert!(result.dodged);
        assert_eq!(result.dealt, 0.0);
        assert_eq!(result.absorbed, 0.0);
        assert_eq!(player.health, 100.0);
        assert_eq!(player.stats.shield, 10.0);
    }

    #[test]
    fn when_shield_is_smaller_than_the_hit_then_shield_drains_and_health_takes_the_rest() {
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.shield = 30.0;
        player.stats.max_shield = 30.0;

        let result = mitigate(&mut player, 50.0, &mut rng());

        assert_eq!(result.absorbed, 30.0);
        assert_eq!(player.stats.shield, 0.0);
        assert_eq!(result.dealt, 20.0);
        assert_eq!(player.health, 80.0);
    }

    #[test]
    fn when_armored_then_damage_is_reduced_before_the_shield() {
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.armor = 0.5;
        player.stats.shield = 10.0;
        player.stats.thorns = 0.5;

        let result = mitigate(&mut player, 40.0, &mut rng());

        assert_eq!(result.absorbed, 10.0);
        assert_eq!(result.dealt, 10.0);
        assert_eq!(result.reflected, 10.0);
        assert_eq!(player.health, 90.0);
    }

    #[test]
    fn when_damage_exceeds_health_then_player_dies_at_zero() {
        let mut player = fixtures::player(1, 0.0, 0.0);
        let result = mitigate(&mut player, 500.0, &mut rng());

        assert!(result.killed);
        assert!(!player.alive);
        assert_eq!(player.health, 0.0);
    }

    #[test]
    fn when_invulnerable_then_nothing_is_taken() {
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.invulnerable = true;
        mitigate(&mut player, 500.0, &mut rng());
        assert_eq!(player.health, 100.0);
    }

    #[test]
    fn when_target_is_below_executioner_threshold_then_hit_takes_all_remaining_health() {
        let mut state = GameState::new(1);
        let i = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        state.enemies[i].health = state.enemies[i].max_health * 0.10;

        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.has_executioner = true;
        let attacker = Attacker::from_player(&player);
        let mut links = Vec::new();

        strike_enemy(
            &mut state.enemies,
            i,
            hit(0.5),
            &attacker,
            &Tuning::default(),
            &mut links,
        );

        assert!(state.enemies[i].health <= 0.0);
    }

    #[test]
    fn when_executioner_is_not_unlocked_then_low_targets_take_normal_damage() {
        let mut state = GameState::new(1);
        let i = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        state.enemies[i].health = 8.0;
        let attacker = Attacker::from_player(&fixtures::player(1, 0.0, 0.0));

        let dealt = hit_damage(&attacker, 1.0, &state.enemies[i], &CombatTuning::default());

        assert_eq!(dealt, 1.0);
    }

    #[test]
    fn when_berserker_owner_is_low_then_damage_gets_the_bonus() {
        let mut state = GameState::new(1);
        let i = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.has_berserker = true;
        player.health = 20.0;

        let dealt = hit_damage(
            &Attacker::from_player(&player),
            10.0,
            &state.enemies[i],
            &CombatTuning::default(),
        );

        assert!((dealt - 15.0).abs() < 1e-5);
    }

    #[test]
    fn when_chain_is_set_then_nearby_enemies_take_falloff_damage_and_links_are_drawn() {
        let mut state = GameState::new(1);
        let a = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        let b = fixtures::enemy(&mut state, EnemyKind::Tank, 150.0, 100.0);
        let c = fixtures::enemy(&mut state, EnemyKind::Tank, 200.0, 100.0);
        let far = fixtures::enemy(&mut state, EnemyKind::Tank, 900.0, 900.0);

        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.chain = 3;
        let mut links = Vec::new();
        let outcome = strike_enemy(
            &mut state.enemies,
            a,
            hit(10.0),
            &Attacker::from_player(&player),
            &Tuning::default(),
            &mut links,
        );

        let max = state.enemies[a].max_health;
        assert_eq!(outcome.chained, 2);
        assert_eq!(links.len(), 2);
        assert!((max - state.enemies[b].health - 7.0).abs() < 1e-4);
        assert!((max - state.enemies[c].health - 4.9).abs() < 1e-4);
        assert_eq!(state.enemies[far].health, max);
    }

    #[test]
    fn when_status_is_reapplied_then_duration_refreshes_instead_of_stacking() {
        let mut state = GameState::new(1);
        let i = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.burn_damage = 10.0;
        let attacker = Attacker::from_player(&player);
        let tuning = Tuning::default();
        let mut links = Vec::new();

        strike_enemy(&mut state.enemies, i, hit(1.0), &attacker, &tuning, &mut links);
        state.enemies[i].status_effects[0].remaining_ms = 100.0;
        strike_enemy(&mut state.enemies, i, hit(1.0), &attacker, &tuning, &mut links);

        let effects = &state.enemies[i].status_effects;
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].remaining_ms, tuning.combat.burn_duration_ms);
    }

    #[test]
    fn when_owner_has_life_steal_then_outcome_carries_the_heal() {
        let mut state = GameState::new(1);
        let i = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.life_steal = 0.5;
        let mut links = Vec::new();

        let outcome = strike_enemy(
            &mut state.enemies,
            i,
            hit(10.0),
            &Attacker::from_player(&player),
            &Tuning::default(),
            &mut links,
        );

        assert_eq!(outcome.heal, 5.0);
        assert_eq!(state.enemies[i].damage_numbers.len(), 1);
        assert_eq!(state.enemies[i].last_hit_by, Some(Owner::Player(1)));
    }

    #[test]
    fn when_knockback_lands_then_enemies_are_pushed_and_bosses_resist() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        let grunt = fixtures::enemy(&mut state, EnemyKind::Tank, 100.0, 100.0);
        crate::domain::systems::enemies::spawn_boss(
            &mut state,
            crate::domain::state::BossKind::Brute,
            500.0,
            500.0,
        );
        let boss = state.enemies.len() - 1;

        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.knockback = 20.0;
        let attacker = Attacker::from_player(&player);
        let mut links = Vec::new();

        strike_enemy(&mut state.enemies, grunt, hit(1.0), &attacker, &tuning, &mut links);
        strike_enemy(&mut state.enemies, boss, hit(1.0), &attacker, &tuning, &mut links);

        assert!((state.enemies[grunt].x - 120.0).abs() < 1e-4);
        assert_eq!(state.enemies[grunt].y, 100.0);
        let boss_push = 20.0 * tuning.combat.boss_knockback_factor;
        assert!((state.enemies[boss].x - (500.0 + boss_push)).abs() < 1e-4);
    }

    #[test]
    fn when_knockback_would_leave_the_arena_then_the_enemy_stops_at_the_edge() {
        let tuning = Tuning::default();
        let mut state = GameState::new(1);
        let i = fixtures::enemy(&mut state, EnemyKind::Tank, tuning.arena.width - 5.0, 100.0);
        let mut player = fixtures::player(1, 0.0, 0.0);
        player.stats.knockback = 50.0;
        let mut links = Vec::new();

        strike_enemy(
            &mut state.enemies,
            i,
            hit(1.0),
            &Attacker::from_player(&player),
            &tuning,
            &mut links,
        );

        assert_eq!(state.enemies[i].x, tuning.arena.width);
    }
}
