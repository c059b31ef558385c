// Domain-level simulation entities. `GameState` is the single aggregate the
// engine mutates; cloning it yields the per-tick snapshot handed to hosts.

use crate::domain::tuning::player::PlayerTuning;
use crate::domain::upgrades::{UpgradeKind, UpgradeOption};
use serde::{Deserialize, Serialize};

pub type PlayerId = u64;
pub type EntityId = u64;

/// Directional key state sampled once per tick (last write wins).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl PlayerInput {
    pub fn is_moving(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    GameOver,
    Won,
}

/// Open-ended capability record. Every field defaults to "not unlocked", so new
/// modifiers can be added without touching existing saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    /// Multiplier on the base attack rate.
    pub attack_speed: f32,
    pub projectile_damage: f32,
    /// Per 60fps frame.
    pub projectile_speed: f32,
    pub projectiles_per_shot: u32,
    /// Per 60fps frame.
    pub speed: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Fraction of dealt damage healed.
    pub life_steal: f32,
    /// Multiplicative damage reduction in `0..=armor_cap`.
    pub armor: f32,
    pub dodge: f32,
    /// Health per second.
    pub regeneration: f32,
    /// Fraction of post-mitigation melee damage reflected.
    pub thorns: f32,
    pub shield: f32,
    pub max_shield: f32,

    // Elemental taps.
    pub burn_damage: f32,
    pub poison_damage: f32,
    pub slow_amount: f32,

    // Projectile modifiers.
    pub pierce: u32,
    pub chain: u32,
    pub ricochet: u32,
    pub homing: bool,
    pub knockback: f32,
    pub explosion_radius: f32,
    pub explosion_damage: f32,

    pub pickup_radius: f32,

    // Feature flags and per-feature counters.
    pub has_bananarang: bool,
    pub bananarangs_per_shot: u32,
    pub has_pet: bool,
    pub pet_damage_bonus: f32,
    pub orbital_count: u32,
    pub has_fire_trail: bool,
    pub has_omni_glitch: bool,
    pub clone_count: u32,
    pub has_berserker: bool,
    pub has_executioner: bool,

    /// Debug override: all incoming damage is ignored.
    pub invulnerable: bool,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            attack_speed: 1.0,
            projectile_damage: 10.0,
            projectile_speed: 10.0,
            projectiles_per_shot: 1,
            speed: 4.0,
            crit_chance: 0.05,
            crit_multiplier: 2.0,
            life_steal: 0.0,
            armor: 0.0,
            dodge: 0.0,
            regeneration: 0.0,
            thorns: 0.0,
            shield: 0.0,
            max_shield: 0.0,
            burn_damage: 0.0,
            poison_damage: 0.0,
            slow_amount: 0.0,
            pierce: 0,
            chain: 0,
            ricochet: 0,
            homing: false,
            knockback: 0.0,
            explosion_radius: 0.0,
            explosion_damage: 0.0,
            pickup_radius: 50.0,
            has_bananarang: false,
            bananarangs_per_shot: 0,
            has_pet: false,
            pet_damage_bonus: 0.0,
            orbital_count: 0,
            has_fire_trail: false,
            has_omni_glitch: false,
            clone_count: 0,
            has_berserker: false,
            has_executioner: false,
            invulnerable: false,
        }
    }
}

/// How many times an upgrade type has been taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTally {
    pub kind: UpgradeKind,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub character: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub stats: PlayerStats,
    pub alive: bool,
    pub revive_progress_ms: f32,
    pub extraction_progress_ms: f32,
    pub upgrades: Vec<UpgradeTally>,
    pub kills: u32,
    pub reached_level_ten: bool,

    // Simulation-only state.
    pub input: PlayerInput,
    pub attack_cooldown_ms: f32,
    pub fire_trail_timer_ms: f32,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: String,
        character: String,
        x: f32,
        y: f32,
        tuning: &PlayerTuning,
    ) -> Self {
        Self {
            id,
            name,
            character,
            x,
            y,
            health: tuning.base_max_health,
            max_health: tuning.base_max_health,
            level: 1,
            xp: 0,
            xp_to_next_level: tuning.base_xp_to_next_level,
            stats: PlayerStats {
                speed: tuning.base_speed,
                pickup_radius: tuning.base_pickup_radius,
                ..PlayerStats::default()
            },
            alive: true,
            revive_progress_ms: 0.0,
            extraction_progress_ms: 0.0,
            upgrades: Vec::new(),
            kills: 0,
            reached_level_ten: false,
            input: PlayerInput::default(),
            attack_cooldown_ms: 0.0,
            fire_trail_timer_ms: 0.0,
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    /// Heals living players, never above max health.
    pub fn heal(&mut self, amount: f32) {
        if self.alive && amount > 0.0 {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    /// Re-establishes `0 <= health <= max_health` after max health changes.
    /// Dead players stay at 0.
    pub fn clamp_health(&mut self) {
        self.max_health = self.max_health.max(1.0);
        self.health = if self.alive {
            self.health.clamp(0.0, self.max_health)
        } else {
            0.0
        };
    }

    pub fn kill(&mut self) {
        self.health = 0.0;
        self.alive = false;
        self.revive_progress_ms = 0.0;
        self.extraction_progress_ms = 0.0;
        self.stats.shield = 0.0;
    }

    pub fn record_upgrade(&mut self, kind: UpgradeKind) {
        match self.upgrades.iter_mut().find(|tally| tally.kind == kind) {
            Some(tally) => tally.count += 1,
            None => self.upgrades.push(UpgradeTally { kind, count: 1 }),
        }
    }

    pub fn upgrade_count(&self, kind: UpgradeKind) -> u32 {
        self.upgrades
            .iter()
            .find(|tally| tally.kind == kind)
            .map(|tally| tally.count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossKind {
    /// Telegraphs, then charges in a straight line.
    Brute,
    /// Opens portals that release basic enemies.
    Summoner,
    /// Surrounds itself with rotating damage orbs.
    Warden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Fast,
    Ranged,
    Splitter,
    /// Spawned by a dying splitter.
    Splitling,
    Tank,
    /// Special-round pack enemy.
    Elite,
    Boss(BossKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangedAttack {
    pub range: f32,
    pub cooldown_ms: f32,
    pub timer_ms: f32,
    pub projectile_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Burning,
    Poisoned,
    Slowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub remaining_ms: f32,
    pub base_duration_ms: f32,
    /// Total damage spread over `base_duration_ms`; zero for pure slows.
    pub damage: f32,
    /// Movement multiplier while active; 1.0 for damage-only effects.
    pub speed_multiplier: f32,
    pub source: Option<Owner>,
}

/// Transient display annotation attached to the damaged enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageNumber {
    pub amount: f32,
    pub crit: bool,
    pub ttl_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    Normal,
    Enraged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossAction {
    Idle,
    /// Standing still, showing where the charge will go.
    Telegraph { remaining_ms: f32, dir_x: f32, dir_y: f32 },
    Charging { remaining_ms: f32, dir_x: f32, dir_y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BossBrain {
    pub phase: BossPhase,
    pub attack_cooldown_ms: f32,
    pub attack_timer_ms: f32,
    pub enrage_threshold: f32,
    pub action: BossAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub damage: f32,
    pub speed: f32,
    pub radius: f32,
    pub xp: u32,
    pub ranged: Option<RangedAttack>,
    pub status_effects: Vec<StatusEffect>,
    pub damage_numbers: Vec<DamageNumber>,
    /// Spawned by a special round and counted against its budget.
    pub special: bool,
    pub last_hit_by: Option<Owner>,
    pub boss: Option<BossBrain>,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_boss(&self) -> bool {
        self.boss.is_some()
    }

    /// Slowest active slow wins; slows do not multiply together.
    pub fn speed_multiplier(&self) -> f32 {
        self.status_effects
            .iter()
            .map(|effect| effect.speed_multiplier)
            .fold(1.0, f32::min)
    }
}

/// Who fired a projectile or owns a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player(PlayerId),
    Pet(EntityId),
    Enemy(EntityId),
}

impl Owner {
    pub fn is_hostile(&self) -> bool {
        matches!(self, Owner::Enemy(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoomerangPhase {
    Outbound,
    Returning,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Standard,
    Boomerang {
        phase: BoomerangPhase,
        origin_x: f32,
        origin_y: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub owner: Owner,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub damage: f32,
    pub crit: bool,
    pub kind: ProjectileKind,
    pub radius: f32,
    pub pierce_remaining: u32,
    pub ricochet_remaining: u32,
    /// Enemies already damaged by this projectile.
    pub hit: Vec<EntityId>,
}

impl Projectile {
    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn is_boomerang(&self) -> bool {
        matches!(self.kind, ProjectileKind::Boomerang { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XpOrb {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub attack_cooldown_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    /// Patch of fire left behind a moving player.
    FireTrail,
    /// Blade circling its owner; slot `index` of the owner's orbital count.
    Orbital { index: u32 },
    /// Boss-owned orb circling the boss.
    BossOrb { angle: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: EntityId,
    pub owner: Owner,
    pub kind: HazardKind,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// Damage per second to everything of the opposing side inside the radius.
    pub dps: f32,
    /// `None` for hazards that live as long as their owner.
    pub remaining_ms: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub id: EntityId,
    pub owner: Owner,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub damage: f32,
    pub remaining_ms: f32,
    /// Damage is dealt once; the explosion then lingers for display.
    pub applied: bool,
}

/// Visual link between two chain-lightning targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub remaining_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionZone {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl ExtractionZone {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoundState {
    Normal {
        timer_ms: f32,
    },
    /// Pack-spawning elite round with a fixed budget.
    Special {
        budget: u32,
        spawned: u32,
        killed: u32,
        spawn_timer_ms: f32,
    },
    /// Special round cleared; forced rewards still owed to these players.
    RewardPending {
        remaining: Vec<PlayerId>,
    },
}

/// The upgrade gate: at most one player chooses at a time and the whole
/// simulation waits for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChoice {
    pub player_id: PlayerId,
    pub options: Vec<UpgradeOption>,
    /// Special-round reward rather than a level-up.
    pub forced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub seed: u64,
    pub tick: u64,
    pub elapsed_ms: f64,
    pub wave: u32,
    pub status: GameStatus,
    pub round: RoundState,
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub orbs: Vec<XpOrb>,
    pub pets: Vec<Pet>,
    pub hazards: Vec<Hazard>,
    pub explosions: Vec<Explosion>,
    pub chain_links: Vec<ChainLink>,
    pub extraction: Option<ExtractionZone>,
    pub pending_choice: Option<PendingChoice>,
    /// Set when the most recent special round was cleared.
    pub round_cleared: bool,
    pub total_kills: u32,
    pub bosses_killed: u32,
    /// End-of-run recording already happened.
    pub run_recorded: bool,
    next_id: EntityId,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            tick: 0,
            elapsed_ms: 0.0,
            wave: 1,
            status: GameStatus::Playing,
            round: RoundState::Normal { timer_ms: 0.0 },
            players: Vec::new(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            orbs: Vec::new(),
            pets: Vec::new(),
            hazards: Vec::new(),
            explosions: Vec::new(),
            chain_links: Vec::new(),
            extraction: None,
            pending_choice: None,
            round_cleared: false,
            total_kills: 0,
            bosses_killed: 0,
            run_recorded: false,
            next_id: 1,
        }
    }

    /// Allocate a new entity id.
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    pub fn is_gated(&self) -> bool {
        self.pending_choice.is_some()
    }

    pub fn is_special_round(&self) -> bool {
        matches!(self.round, RoundState::Special { .. })
    }

    pub fn live_special_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.special && e.is_alive()).count()
    }
}
