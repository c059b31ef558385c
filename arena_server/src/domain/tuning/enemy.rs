// Entity configs: base stat tables per enemy archetype and the wave scaling
// applied on spawn. Everything here is a pure function of kind and wave.

use crate::domain::state::{BossKind, EnemyKind};

/// Ranged attack profile for enemies that shoot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedStats {
    pub range: f32,
    pub cooldown_ms: f32,
    /// Per 60fps frame.
    pub projectile_speed: f32,
}

/// Stats an enemy is spawned with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    /// Contact damage per second, and per-shot damage for ranged kinds.
    pub damage: f32,
    /// Movement per 60fps frame.
    pub speed: f32,
    pub radius: f32,
    pub xp: u32,
    pub ranged: Option<RangedStats>,
}

/// Boss archetype stats on top of the shared enemy block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossStats {
    pub base: EnemyStats,
    pub attack_cooldown_ms: f32,
    /// Health fraction at which the boss enrages.
    pub enrage_threshold: f32,
}

/// Normal-wave spawn eligibility for one kind.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRule {
    pub kind: EnemyKind,
    pub min_wave: u32,
    pub weight: u32,
}

pub const SPAWN_TABLE: [SpawnRule; 5] = [
    SpawnRule { kind: EnemyKind::Basic, min_wave: 1, weight: 50 },
    SpawnRule { kind: EnemyKind::Fast, min_wave: 2, weight: 25 },
    SpawnRule { kind: EnemyKind::Ranged, min_wave: 3, weight: 20 },
    SpawnRule { kind: EnemyKind::Splitter, min_wave: 4, weight: 10 },
    SpawnRule { kind: EnemyKind::Tank, min_wave: 6, weight: 8 },
];

/// Splitters break into this many splitlings on death.
pub const SPLIT_COUNT: u32 = 2;

/// Cooldown multiplier applied when a boss enrages.
pub const ENRAGE_COOLDOWN_FACTOR: f32 = 0.6;
/// Speed multiplier applied when a boss enrages.
pub const ENRAGE_SPEED_FACTOR: f32 = 1.3;

// Brute: stand still and show the line, then charge along it.
pub const BRUTE_TELEGRAPH_MS: f32 = 800.0;
pub const BRUTE_CHARGE_MS: f32 = 700.0;
pub const BRUTE_CHARGE_SPEED_FACTOR: f32 = 4.0;
/// Contact damage multiplier while charging.
pub const BRUTE_CHARGE_DAMAGE_FACTOR: f32 = 2.0;

/// Basic enemies released per summon, normal and enraged.
pub const SUMMONER_MINIONS: (u32, u32) = (3, 5);
pub const SUMMONER_PORTAL_DISTANCE: f32 = 60.0;

/// Orbs raised per Warden cast, normal and enraged.
pub const WARDEN_ORBS: (u32, u32) = (4, 6);

/// Boss archetype that appears on the `n`th boss wave (1-based).
pub fn boss_for_appearance(n: u32) -> BossKind {
    match n.saturating_sub(1) % 3 {
        0 => BossKind::Brute,
        1 => BossKind::Summoner,
        _ => BossKind::Warden,
    }
}

/// Kinds that may spawn during a normal wave, with their weights.
pub fn eligible_spawns(wave: u32) -> impl Iterator<Item = &'static SpawnRule> {
    SPAWN_TABLE.iter().filter(move |rule| wave >= rule.min_wave)
}

pub fn base_stats(kind: EnemyKind) -> EnemyStats {
    match kind {
        EnemyKind::Basic => melee(20.0, 10.0, 1.5, 14.0, 1),
        EnemyKind::Fast => melee(12.0, 6.0, 3.0, 10.0, 1),
        EnemyKind::Ranged => EnemyStats {
            ranged: Some(RangedStats {
                range: 300.0,
                cooldown_ms: 2000.0,
                projectile_speed: 5.0,
            }),
            ..melee(16.0, 8.0, 1.2, 12.0, 2)
        },
        EnemyKind::Splitter => melee(40.0, 10.0, 1.2, 18.0, 3),
        EnemyKind::Splitling => melee(10.0, 5.0, 2.2, 9.0, 1),
        EnemyKind::Tank => melee(80.0, 20.0, 0.8, 24.0, 5),
        EnemyKind::Elite => melee(60.0, 15.0, 2.0, 16.0, 5),
        EnemyKind::Boss(boss) => boss_base(boss).base,
    }
}

/// Stats for `kind` spawned during `wave` (1-based).
pub fn scaled_stats(kind: EnemyKind, wave: u32) -> EnemyStats {
    if let EnemyKind::Boss(boss) = kind {
        return boss_stats(boss, wave).base;
    }

    let base = base_stats(kind);
    let steps = wave.saturating_sub(1) as f32;
    EnemyStats {
        health: base.health * (1.0 + 0.15 * steps),
        damage: base.damage * (1.0 + 0.08 * steps),
        speed: base.speed * (1.0 + 0.02 * steps).min(1.5),
        xp: base.xp + wave.saturating_sub(1) / 5,
        ..base
    }
}

pub fn boss_stats(kind: BossKind, wave: u32) -> BossStats {
    let base = boss_base(kind);
    let steps = wave.saturating_sub(1) as f32;
    BossStats {
        base: EnemyStats {
            health: base.base.health * (1.0 + 0.25 * steps),
            damage: base.base.damage * (1.0 + 0.1 * steps),
            ..base.base
        },
        ..base
    }
}

fn boss_base(kind: BossKind) -> BossStats {
    match kind {
        BossKind::Brute => BossStats {
            base: melee(800.0, 30.0, 1.4, 40.0, 50),
            attack_cooldown_ms: 4000.0,
            enrage_threshold: 0.5,
        },
        BossKind::Summoner => BossStats {
            base: melee(600.0, 20.0, 1.0, 36.0, 50),
            attack_cooldown_ms: 5000.0,
            enrage_threshold: 0.5,
        },
        BossKind::Warden => BossStats {
            base: melee(700.0, 25.0, 1.1, 38.0, 50),
            attack_cooldown_ms: 7000.0,
            enrage_threshold: 0.5,
        },
    }
}

const fn melee(health: f32, damage: f32, speed: f32, radius: f32, xp: u32) -> EnemyStats {
    EnemyStats {
        health,
        damage,
        speed,
        radius,
        xp,
        ranged: None,
    }
}
