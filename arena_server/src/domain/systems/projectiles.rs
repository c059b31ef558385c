use crate::domain::geometry::{circles_overlap, direction, distance, normalize, rotate};
use crate::domain::rng::GameRng;
use crate::domain::state::{
    BoomerangPhase, GameState, Owner, Player, Projectile, ProjectileKind,
};
use crate::domain::systems::combat::{self, Attacker, Hit};
use crate::domain::systems::{Frame, enemies_by_distance, nearest_enemy};
use crate::domain::tuning::Tuning;
use tracing::debug;

/// Player attack generation: every living player whose cooldown has run out
/// fires at the nearest enemy in range.
pub fn fire_player_attacks(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    for index in 0..state.players.len() {
        let Some(player) = state.players.get_mut(index) else {
            continue;
        };
        if !player.alive {
            continue;
        }
        player.attack_cooldown_ms = (player.attack_cooldown_ms - frame.delta_ms).max(0.0);
        if player.attack_cooldown_ms > 0.0 {
            continue;
        }

        let (px, py) = (player.x, player.y);
        let targets = enemies_by_distance(&state.enemies, px, py, tuning.player.attack_range);
        if targets.is_empty() {
            continue;
        }

        let Some(player) = state.players.get(index).cloned() else {
            continue;
        };
        let mut shots = Vec::new();
        let aim = |slot: usize| {
            let target = targets.get(slot).or(targets.first()).copied();
            target
                .and_then(|t| state.enemies.get(t))
                .map(|e| direction(px, py, e.x, e.y))
        };

        if let Some(dir) = aim(0) {
            standard_fan(&player, dir, tuning, rng, &mut shots);
            if player.stats.has_bananarang && player.stats.bananarangs_per_shot > 0 {
                boomerang_fan(&player, dir, tuning, rng, &mut shots);
            }
        }
        // Each shadow clone fires its own fan at the next target down the list.
        for clone in 1..=player.stats.clone_count as usize {
            if let Some(dir) = aim(clone) {
                standard_fan(&player, dir, tuning, rng, &mut shots);
            }
        }

        for mut shot in shots {
            shot.id = state.next_entity_id();
            state.projectiles.push(shot);
        }
        if let Some(player) = state.players.get_mut(index) {
            player.attack_cooldown_ms =
                tuning.player.base_attack_cooldown_ms / player.stats.attack_speed.max(0.1);
        }
    }
}

fn roll_damage(player: &Player, rng: &mut GameRng) -> (f32, bool) {
    let crit = rng.chance(player.stats.crit_chance);
    let base = player.stats.projectile_damage;
    if crit {
        (base * player.stats.crit_multiplier, true)
    } else {
        (base, false)
    }
}

fn fan_angle(slot: u32, count: u32, spread: f32) -> f32 {
    (slot as f32 - (count as f32 - 1.0) / 2.0) * spread
}

fn standard_fan(
    player: &Player,
    dir: (f32, f32),
    tuning: &Tuning,
    rng: &mut GameRng,
    out: &mut Vec<Projectile>,
) {
    let count = player.stats.projectiles_per_shot.max(1);
    let speed = player.stats.projectile_speed;
    for slot in 0..count {
        let (dx, dy) = rotate(dir.0, dir.1, fan_angle(slot, count, tuning.projectile.spread));
        let (damage, crit) = roll_damage(player, rng);
        out.push(Projectile {
            id: 0,
            owner: Owner::Player(player.id),
            x: player.x,
            y: player.y,
            vx: dx * speed,
            vy: dy * speed,
            damage,
            crit,
            kind: ProjectileKind::Standard,
            radius: tuning.projectile.radius,
            pierce_remaining: player.stats.pierce,
            ricochet_remaining: player.stats.ricochet,
            hit: Vec::new(),
        });
    }
}

fn boomerang_fan(
    player: &Player,
    dir: (f32, f32),
    tuning: &Tuning,
    rng: &mut GameRng,
    out: &mut Vec<Projectile>,
) {
    let count = player.stats.bananarangs_per_shot;
    let speed = tuning.projectile.boomerang_speed;
    for slot in 0..count {
        let (dx, dy) = rotate(dir.0, dir.1, fan_angle(slot, count, tuning.projectile.spread));
        let (damage, crit) = roll_damage(player, rng);
        out.push(Projectile {
            id: 0,
            owner: Owner::Player(player.id),
            x: player.x,
            y: player.y,
            vx: dx * speed,
            vy: dy * speed,
            damage,
            crit,
            kind: ProjectileKind::Boomerang {
                phase: BoomerangPhase::Outbound,
                origin_x: player.x,
                origin_y: player.y,
            },
            radius: tuning.projectile.boomerang_radius,
            pierce_remaining: 0,
            ricochet_remaining: 0,
            hit: Vec::new(),
        });
    }
}

/// Move every projectile and resolve its collisions. Projectiles are taken
/// out of the state while they resolve so hits can mutate the other collections.
pub fn update_projectiles(state: &mut GameState, tuning: &Tuning, rng: &mut GameRng, frame: Frame) {
    let mut projectiles = std::mem::take(&mut state.projectiles);
    projectiles.retain_mut(|p| step_projectile(state, p, tuning, rng, frame));

    let spawned = std::mem::replace(&mut state.projectiles, projectiles);
    state.projectiles.extend(spawned);
}

/// Returns `false` when the projectile should be removed.
fn step_projectile(
    state: &mut GameState,
    p: &mut Projectile,
    tuning: &Tuning,
    rng: &mut GameRng,
    frame: Frame,
) -> bool {
    let owner_player = match p.owner {
        Owner::Player(id) => state.player(id).cloned(),
        _ => None,
    };

    // Steering.
    match p.kind {
        ProjectileKind::Boomerang {
            phase: BoomerangPhase::Returning,
            ..
        } => {
            let Some(owner) = owner_player.as_ref() else {
                return false;
            };
            let speed = tuning.projectile.boomerang_speed * tuning.projectile.boomerang_return_multiplier;
            let (dx, dy) = direction(p.x, p.y, owner.x, owner.y);
            p.vx = dx * speed;
            p.vy = dy * speed;
        }
        ProjectileKind::Standard => {
            if owner_player.as_ref().is_some_and(|o| o.stats.homing) {
                steer_homing(state, p, tuning, frame);
            }
        }
        ProjectileKind::Boomerang { .. } => {}
    }

    p.x += p.vx * frame.time_factor;
    p.y += p.vy * frame.time_factor;

    if let ProjectileKind::Boomerang {
        phase,
        origin_x,
        origin_y,
    } = &mut p.kind
    {
        match phase {
            BoomerangPhase::Outbound => {
                if distance(*origin_x, *origin_y, p.x, p.y) >= tuning.projectile.boomerang_range {
                    *phase = BoomerangPhase::Returning;
                    p.hit.clear();
                }
            }
            BoomerangPhase::Returning => {
                if let Some(owner) = owner_player.as_ref() {
                    if circles_overlap(p.x, p.y, p.radius, owner.x, owner.y, tuning.player.radius) {
                        return false;
                    }
                }
            }
        }
    } else if out_of_bounds(p, tuning) {
        return false;
    }

    if p.owner.is_hostile() {
        resolve_hostile(state, p, tuning, rng)
    } else {
        resolve_friendly(state, p, owner_player.as_ref(), tuning)
    }
}

fn out_of_bounds(p: &Projectile, tuning: &Tuning) -> bool {
    let margin = tuning.projectile.out_of_bounds_margin;
    p.x < -margin
        || p.y < -margin
        || p.x > tuning.arena.width + margin
        || p.y > tuning.arena.height + margin
}

/// Bend velocity toward the nearest enemy in range, keeping the speed. The
/// per-frame blend compounds over `time_factor` frames.
fn steer_homing(state: &GameState, p: &mut Projectile, tuning: &Tuning, frame: Frame) {
    let Some(target) = nearest_enemy(&state.enemies, p.x, p.y, tuning.projectile.homing_radius, |id| {
        p.hit.contains(&id)
    })
    .and_then(|i| state.enemies.get(i)) else {
        return;
    };

    let speed = p.speed();
    let (cx, cy) = normalize(p.vx, p.vy);
    let (tx, ty) = direction(p.x, p.y, target.x, target.y);
    let per_frame = tuning.projectile.homing_strength.clamp(0.0, 1.0);
    let strength = (1.0 - (1.0 - per_frame).powf(frame.time_factor)).min(1.0);
    let (nx, ny) = normalize(cx + (tx - cx) * strength, cy + (ty - cy) * strength);
    if nx == 0.0 && ny == 0.0 {
        return;
    }
    p.vx = nx * speed;
    p.vy = ny * speed;
}

/// Enemy shot against players: the first overlapping living player takes it.
fn resolve_hostile(state: &mut GameState, p: &Projectile, tuning: &Tuning, rng: &mut GameRng) -> bool {
    let radius = tuning.player.radius;
    let Some(player) = state
        .players
        .iter_mut()
        .find(|pl| pl.alive && circles_overlap(p.x, p.y, p.radius, pl.x, pl.y, radius))
    else {
        return true;
    };

    let result = combat::mitigate(player, p.damage, rng);
    if result.killed {
        debug!(player_id = player.id, projectile_id = p.id, "player killed by projectile");
    }
    false
}

/// Player or pet shot against enemies.
fn resolve_friendly(
    state: &mut GameState,
    p: &mut Projectile,
    owner: Option<&Player>,
    tuning: &Tuning,
) -> bool {
    let attacker = owner
        .map(Attacker::from_player)
        .unwrap_or_else(|| Attacker::detached(p.owner));

    loop {
        let target = state.enemies.iter().position(|e| {
            e.is_alive()
                && !p.hit.contains(&e.id)
                && circles_overlap(p.x, p.y, p.radius, e.x, e.y, e.radius)
        });
        let Some(target) = target else {
            return true;
        };

        let hit = Hit {
            damage: p.damage,
            crit: p.crit,
            push: (p.vx, p.vy),
        };
        let target_id = state.enemies[target].id;
        let outcome = combat::strike_enemy(
            &mut state.enemies,
            target,
            hit,
            &attacker,
            tuning,
            &mut state.chain_links,
        );
        p.hit.push(target_id);

        if outcome.heal > 0.0 {
            if let Some(owner) = owner.and_then(|o| state.player_mut(o.id)) {
                owner.heal(outcome.heal);
            }
        }

        // Boomerangs keep going and may hit everything they overlap.
        if p.is_boomerang() {
            continue;
        }

        if p.ricochet_remaining > 0 {
            let next = nearest_enemy(
                &state.enemies,
                p.x,
                p.y,
                tuning.projectile.ricochet_radius,
                |id| p.hit.contains(&id),
            )
            .and_then(|i| state.enemies.get(i));
            if let Some(next) = next {
                let speed = p.speed();
                let (dx, dy) = direction(p.x, p.y, next.x, next.y);
                p.vx = dx * speed;
                p.vy = dy * speed;
                p.ricochet_remaining -= 1;
                return true;
            }
        }

        if p.pierce_remaining > 0 {
            p.pierce_remaining -= 1;
            return true;
        }

        return false;
    }
}
