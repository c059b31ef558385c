// Enemy lifecycle: spawning policy, per-tick AI (including boss brains) and
// the death pass that turns dead enemies into orbs, splits and explosions.

use crate::domain::geometry::{direction, distance};
use crate::domain::rng::GameRng;
use crate::domain::state::{
    BossAction, BossBrain, BossKind, BossPhase, Enemy, EnemyKind, EntityId, Explosion, GameState,
    Owner, Projectile, ProjectileKind, RangedAttack, RoundState, XpOrb,
};
use crate::domain::systems::combat;
use crate::domain::systems::{Frame, hazards, nearest_living_player, pets};
use crate::domain::tuning::enemy::{
    BRUTE_CHARGE_DAMAGE_FACTOR, BRUTE_CHARGE_MS, BRUTE_CHARGE_SPEED_FACTOR, BRUTE_TELEGRAPH_MS,
    ENRAGE_COOLDOWN_FACTOR, ENRAGE_SPEED_FACTOR, SPLIT_COUNT, SUMMONER_MINIONS,
    SUMMONER_PORTAL_DISTANCE, WARDEN_ORBS, boss_stats, eligible_spawns, scaled_stats,
};
use crate::domain::tuning::{ArenaTuning, Tuning};
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Spawn a regular enemy scaled to the current wave.
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind, x: f32, y: f32, special: bool) -> EntityId {
    if let EnemyKind::Boss(boss) = kind {
        return spawn_boss(state, boss, x, y);
    }

    let stats = scaled_stats(kind, state.wave);
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
        ranged: stats.ranged.map(|r| RangedAttack {
            range: r.range,
            cooldown_ms: r.cooldown_ms,
            timer_ms: r.cooldown_ms,
            projectile_speed: r.projectile_speed,
        }),
        status_effects: Vec::new(),
        damage_numbers: Vec::new(),
        special,
        last_hit_by: None,
        boss: None,
    });
    id
}

pub fn spawn_boss(state: &mut GameState, kind: BossKind, x: f32, y: f32) -> EntityId {
    let stats = boss_stats(kind, state.wave);
    let id = state.next_entity_id();
    state.enemies.push(Enemy {
        id,
        kind: EnemyKind::Boss(kind),
        x,
        y,
        health: stats.base.health,
        max_health: stats.base.health,
        damage: stats.base.damage,
        speed: stats.base.speed,
        radius: stats.base.radius,
        xp: stats.base.xp,
        ranged: None,
        status_effects: Vec::new(),
        damage_numbers: Vec::new(),
        special: false,
        last_hit_by: None,
        boss: Some(BossBrain {
            phase: BossPhase::Normal,
            attack_cooldown_ms: stats.attack_cooldown_ms,
            attack_timer_ms: stats.attack_cooldown_ms,
            enrage_threshold: stats.enrage_threshold,
            action: BossAction::Idle,
        }),
    });
    info!(boss_id = id, ?kind, wave = state.wave, "boss spawned");
    id
}

/// Random point on arena edge `edge` (0 top, 1 right, 2 bottom, 3 left).
pub fn edge_position(rng: &mut GameRng, arena: &ArenaTuning, edge: u32) -> (f32, f32) {
    match edge % 4 {
        0 => (rng.range_f32(0.0, arena.width), 0.0),
        1 => (arena.width, rng.range_f32(0.0, arena.height)),
        2 => (rng.range_f32(0.0, arena.width), arena.height),
        _ => (0.0, rng.range_f32(0.0, arena.height)),
    }
}

/// Spawning for the current round regime.
pub fn spawn_enemies(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    let living = state.living_players().count();
    if living == 0 {
        return;
    }

    match state.round {
        RoundState::Normal { .. } => spawn_normal(state, tuning, rng, frame, living),
        RoundState::Special { .. } => spawn_special_pack(state, tuning, rng, frame),
        RoundState::RewardPending { .. } => {}
    }
}

fn spawn_normal(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame, living: usize) {
    let cap = tuning.wave.enemies_per_player * living;
    if state.enemies.len() >= cap {
        return;
    }
    if !rng.chance(tuning.wave.spawn_chance(state.wave) * frame.time_factor) {
        return;
    }

    let rules: Vec<_> = eligible_spawns(state.wave).collect();
    let weights: Vec<u32> = rules.iter().map(|rule| rule.weight).collect();
    let Some(rule) = rng.pick_weighted(&weights).and_then(|i| rules.get(i)) else {
        return;
    };
    let edge = rng.range_u32(0, 3);
    let (x, y) = edge_position(rng, &tuning.arena, edge);
    spawn_enemy(state, rule.kind, x, y, false);
}

fn spawn_special_pack(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    let RoundState::Special {
        budget,
        spawned,
        spawn_timer_ms,
        ..
    } = &mut state.round
    else {
        return;
    };

    *spawn_timer_ms -= frame.delta_ms;
    if *spawn_timer_ms > 0.0 || *spawned >= *budget {
        return;
    }

    let pack = rng
        .range_u32(tuning.wave.pack_min, tuning.wave.pack_max)
        .min(*budget - *spawned);
    *spawned += pack;
    *spawn_timer_ms = rng.range_f32(tuning.wave.pack_interval_min_ms, tuning.wave.pack_interval_max_ms);

    let edge = rng.range_u32(0, 3);
    let (ax, ay) = edge_position(rng, &tuning.arena, edge);
    for _ in 0..pack {
        let offset = rng.range_f32(-60.0, 60.0);
        let (x, y) = if edge % 2 == 0 {
            ((ax + offset).clamp(0.0, tuning.arena.width), ay)
        } else {
            (ax, (ay + offset).clamp(0.0, tuning.arena.height))
        };
        spawn_enemy(state, EnemyKind::Elite, x, y, true);
    }
    debug!(pack, wave = state.wave, "special pack spawned");
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Movement {
    Chase,
    Hold,
    Charge(f32, f32),
}

/// Work that needs `GameState` as a whole, deferred until the AI pass ends.
#[derive(Debug, Clone, Copy)]
enum Intent {
    Shoot {
        owner: EntityId,
        x: f32,
        y: f32,
        dir: (f32, f32),
        speed: f32,
        damage: f32,
    },
    Summon {
        x: f32,
        y: f32,
        count: u32,
    },
    RaiseOrbs {
        owner: EntityId,
        count: u32,
    },
}

/// Enemy AI: target the nearest living player, shoot, hit or advance.
pub fn update_enemies(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    let mut intents = Vec::new();
    let player_radius = tuning.player.radius;

    let GameState {
        enemies, players, ..
    } = &mut *state;

    for enemy in enemies.iter_mut() {
        if !enemy.is_alive() {
            continue;
        }
        let Some(target) = nearest_living_player(players, enemy.x, enemy.y)
            .and_then(|i| players.get_mut(i))
        else {
            continue;
        };

        let dist = distance(enemy.x, enemy.y, target.x, target.y);
        let mut movement = if enemy.is_boss() {
            boss_step(enemy, (target.x, target.y), frame, &mut intents)
        } else {
            Movement::Chase
        };

        if let Some(ranged) = enemy.ranged.as_mut() {
            ranged.timer_ms = (ranged.timer_ms - frame.delta_ms).max(0.0);
            if dist <= ranged.range {
                if ranged.timer_ms <= 0.0 {
                    intents.push(Intent::Shoot {
                        owner: enemy.id,
                        x: enemy.x,
                        y: enemy.y,
                        dir: direction(enemy.x, enemy.y, target.x, target.y),
                        speed: ranged.projectile_speed,
                        damage: enemy.damage,
                    });
                    ranged.timer_ms = ranged.cooldown_ms;
                }
                if movement == Movement::Chase {
                    movement = Movement::Hold;
                }
            }
        }

        if dist <= enemy.radius + player_radius {
            let factor = if matches!(movement, Movement::Charge(..)) {
                BRUTE_CHARGE_DAMAGE_FACTOR
            } else {
                1.0
            };
            let result = combat::mitigate(target, frame.per_second(enemy.damage * factor), rng);
            if result.reflected > 0.0 {
                combat::damage_enemy(enemy, result.reflected, Some(Owner::Player(target.id)), None);
            }
            if result.killed {
                debug!(player_id = target.id, enemy_id = enemy.id, "player killed in melee");
            }
            if movement == Movement::Chase {
                movement = Movement::Hold;
            }
        }

        let speed = enemy.speed * enemy.speed_multiplier();
        match movement {
            Movement::Chase => {
                let (dx, dy) = direction(enemy.x, enemy.y, target.x, target.y);
                let step = (speed * frame.time_factor).min(dist);
                enemy.x += dx * step;
                enemy.y += dy * step;
            }
            Movement::Charge(dx, dy) => {
                let step = speed * BRUTE_CHARGE_SPEED_FACTOR * frame.time_factor;
                enemy.x = (enemy.x + dx * step).clamp(0.0, tuning.arena.width);
                enemy.y = (enemy.y + dy * step).clamp(0.0, tuning.arena.height);
            }
            Movement::Hold => {}
        }
    }

    for intent in intents {
        apply_intent(state, tuning, intent);
    }
}

/// Advance a boss brain one tick and decide how the boss moves.
fn boss_step(enemy: &mut Enemy, target: (f32, f32), frame: Frame, intents: &mut Vec<Intent>) -> Movement {
    let EnemyKind::Boss(kind) = enemy.kind else {
        return Movement::Chase;
    };
    let Some(brain) = enemy.boss.as_mut() else {
        return Movement::Chase;
    };

    if brain.phase == BossPhase::Normal && enemy.health <= enemy.max_health * brain.enrage_threshold {
        brain.phase = BossPhase::Enraged;
        brain.attack_cooldown_ms *= ENRAGE_COOLDOWN_FACTOR;
        brain.attack_timer_ms = brain.attack_timer_ms.min(brain.attack_cooldown_ms);
        enemy.speed *= ENRAGE_SPEED_FACTOR;
        info!(boss_id = enemy.id, ?kind, "boss enraged");
    }

    let enraged = brain.phase == BossPhase::Enraged;
    brain.attack_timer_ms -= frame.delta_ms;
    let ready = brain.attack_timer_ms <= 0.0;

    match kind {
        BossKind::Brute => match brain.action {
            BossAction::Idle => {
                if !ready {
                    return Movement::Chase;
                }
                let (dir_x, dir_y) = direction(enemy.x, enemy.y, target.0, target.1);
                brain.action = BossAction::Telegraph {
                    remaining_ms: BRUTE_TELEGRAPH_MS,
                    dir_x,
                    dir_y,
                };
                brain.attack_timer_ms = brain.attack_cooldown_ms;
                Movement::Hold
            }
            BossAction::Telegraph {
                remaining_ms,
                dir_x,
                dir_y,
            } => {
                let remaining_ms = remaining_ms - frame.delta_ms;
                brain.action = if remaining_ms <= 0.0 {
                    BossAction::Charging {
                        remaining_ms: BRUTE_CHARGE_MS,
                        dir_x,
                        dir_y,
                    }
                } else {
                    BossAction::Telegraph {
                        remaining_ms,
                        dir_x,
                        dir_y,
                    }
                };
                Movement::Hold
            }
            BossAction::Charging {
                remaining_ms,
                dir_x,
                dir_y,
            } => {
                let remaining_ms = remaining_ms - frame.delta_ms;
                brain.action = if remaining_ms <= 0.0 {
                    BossAction::Idle
                } else {
                    BossAction::Charging {
                        remaining_ms,
                        dir_x,
                        dir_y,
                    }
                };
                Movement::Charge(dir_x, dir_y)
            }
        },
        BossKind::Summoner => {
            if ready {
                let count = if enraged { SUMMONER_MINIONS.1 } else { SUMMONER_MINIONS.0 };
                intents.push(Intent::Summon {
                    x: enemy.x,
                    y: enemy.y,
                    count,
                });
                brain.attack_timer_ms = brain.attack_cooldown_ms;
            }
            Movement::Chase
        }
        BossKind::Warden => {
            if ready {
                let count = if enraged { WARDEN_ORBS.1 } else { WARDEN_ORBS.0 };
                intents.push(Intent::RaiseOrbs {
                    owner: enemy.id,
                    count,
                });
                brain.attack_timer_ms = brain.attack_cooldown_ms;
            }
            Movement::Chase
        }
    }
}

fn apply_intent(state: &mut GameState, tuning: &Tuning, intent: Intent) {
    match intent {
        Intent::Shoot {
            owner,
            x,
            y,
            dir,
            speed,
            damage,
        } => {
            let id = state.next_entity_id();
            state.projectiles.push(Projectile {
                id,
                owner: Owner::Enemy(owner),
                x,
                y,
                vx: dir.0 * speed,
                vy: dir.1 * speed,
                damage,
                crit: false,
                kind: ProjectileKind::Standard,
                radius: tuning.projectile.enemy_radius,
                pierce_remaining: 0,
                ricochet_remaining: 0,
                hit: Vec::new(),
            });
        }
        Intent::Summon { x, y, count } => {
            for k in 0..count {
                let angle = TAU * k as f32 / count.max(1) as f32;
                let sx = (x + angle.cos() * SUMMONER_PORTAL_DISTANCE).clamp(0.0, tuning.arena.width);
                let sy = (y + angle.sin() * SUMMONER_PORTAL_DISTANCE).clamp(0.0, tuning.arena.height);
                spawn_enemy(state, EnemyKind::Basic, sx, sy, false);
            }
        }
        Intent::RaiseOrbs { owner, count } => {
            hazards::raise_boss_orbs(state, &tuning.hazard, owner, count);
        }
    }
}

/// Remove dead enemies and emit everything their deaths cause.
pub fn reap_dead_enemies(state: &mut GameState, tuning: &Tuning) {
    if state.enemies.iter().all(Enemy::is_alive) {
        return;
    }

    let (dead, alive): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut state.enemies)
        .into_iter()
        .partition(|e| !e.is_alive());
    state.enemies = alive;

    for enemy in dead {
        on_enemy_death(state, tuning, enemy);
    }
}

fn on_enemy_death(state: &mut GameState, tuning: &Tuning, enemy: Enemy) {
    let orb_id = state.next_entity_id();
    state.orbs.push(XpOrb {
        id: orb_id,
        x: enemy.x,
        y: enemy.y,
        value: enemy.xp,
    });
    state.total_kills += 1;

    let killer = match enemy.last_hit_by {
        Some(Owner::Player(id)) => Some(id),
        Some(Owner::Pet(pet_id)) => state.pets.iter_mut().find(|p| p.id == pet_id).map(|pet| {
            pets::grant_xp(pet, enemy.xp, &tuning.pet);
            pet.owner_id
        }),
        _ => None,
    };

    if let Some(player) = killer.and_then(|id| state.player_mut(id)) {
        player.kills += 1;
        let (radius, damage) = (player.stats.explosion_radius, player.stats.explosion_damage);
        let owner = Owner::Player(player.id);
        if radius > 0.0 && damage > 0.0 {
            let id = state.next_entity_id();
            state.explosions.push(Explosion {
                id,
                owner,
                x: enemy.x,
                y: enemy.y,
                radius,
                damage,
                remaining_ms: tuning.hazard.explosion_lifetime_ms,
                applied: false,
            });
        }
    }

    if enemy.is_boss() {
        state.bosses_killed += 1;
        state.hazards.retain(|h| h.owner != Owner::Enemy(enemy.id));
        info!(boss_id = enemy.id, wave = state.wave, "boss defeated");
    }

    if enemy.kind == EnemyKind::Splitter {
        for k in 0..SPLIT_COUNT {
            let side = if k % 2 == 0 { -1.0 } else { 1.0 };
            let offset = side * enemy.radius * 0.5;
            let x = (enemy.x + offset).clamp(0.0, tuning.arena.width);
            spawn_enemy(state, EnemyKind::Splitling, x, enemy.y, false);
        }
    }

    if enemy.special {
        if let RoundState::Special { killed, .. } = &mut state.round {
            *killed += 1;
        }
    }
}
