/// Gameplay tuning for players.

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// World-space collision radius.
    pub radius: f32,

    /// Health a fresh player starts with.
    pub base_max_health: f32,

    /// Movement per 60fps frame for each held input axis.
    pub base_speed: f32,

    /// Milliseconds between volleys at attack speed 1.0.
    pub base_attack_cooldown_ms: f32,

    /// Enemies farther than this are never auto-targeted.
    pub attack_range: f32,

    /// Orbs within this distance (plus the player radius) are collected.
    pub base_pickup_radius: f32,

    /// Shield points restored per second, independent of regeneration.
    pub shield_regen_per_sec: f32,

    /// A dead player within this distance of a living one accrues revive progress.
    pub revive_radius: f32,
    pub revive_duration_ms: f32,
    /// Fraction of max health restored on revive.
    pub revive_health_fraction: f32,

    /// XP required for the first level-up.
    pub base_xp_to_next_level: u32,
    /// Multiplier applied to the requirement after each level-up (rounded up).
    pub xp_growth: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 20.0,
            base_max_health: 100.0,
            base_speed: 4.0,
            base_attack_cooldown_ms: 500.0,
            attack_range: 600.0,
            base_pickup_radius: 50.0,
            shield_regen_per_sec: 5.0,
            revive_radius: 60.0,
            revive_duration_ms: 3000.0,
            revive_health_fraction: 0.5,
            base_xp_to_next_level: 10,
            xp_growth: 1.25,
        }
    }
}
