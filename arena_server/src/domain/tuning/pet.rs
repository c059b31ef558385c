/// Gameplay tuning for companions.

#[derive(Debug, Clone, Copy)]
pub struct PetTuning {
    /// The pet idles once it is this close to its owner.
    pub follow_distance: f32,
    /// Movement per 60fps frame.
    pub speed: f32,
    pub max_health: f32,
    pub attack_cooldown_ms: f32,
    pub attack_range: f32,
    pub base_damage: f32,
    pub damage_per_level: f32,
    pub projectile_speed: f32,
    pub base_xp_to_next_level: u32,
    pub xp_growth: f32,
    pub health_per_level: f32,
    /// Share of each orb the owner picks up that also goes to the pet.
    pub xp_share: f32,
}

impl Default for PetTuning {
    fn default() -> Self {
        Self {
            follow_distance: 60.0,
            speed: 4.5,
            max_health: 50.0,
            attack_cooldown_ms: 1000.0,
            attack_range: 400.0,
            base_damage: 6.0,
            damage_per_level: 3.0,
            projectile_speed: 9.0,
            base_xp_to_next_level: 5,
            xp_growth: 1.25,
            health_per_level: 10.0,
            xp_share: 0.5,
        }
    }
}
