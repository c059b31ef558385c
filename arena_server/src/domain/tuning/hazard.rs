/// Gameplay tuning for area effects: orbitals, fire trails, explosions and boss orbs.

#[derive(Debug, Clone, Copy)]
pub struct HazardTuning {
    /// Distance of orbitals from their owner.
    pub orbital_distance: f32,
    pub orbital_radius: f32,
    pub orbital_dps: f32,
    /// Radians per second.
    pub orbital_angular_speed: f32,

    pub fire_trail_interval_ms: f32,
    pub fire_trail_radius: f32,
    pub fire_trail_dps: f32,
    pub fire_trail_lifetime_ms: f32,

    /// Soft cap on live hazards; spawns past it are skipped.
    pub max_hazards: usize,

    pub explosion_lifetime_ms: f32,
    pub chain_link_ttl_ms: f32,

    pub boss_orb_distance: f32,
    pub boss_orb_radius: f32,
    pub boss_orb_dps: f32,
    pub boss_orb_angular_speed: f32,
    pub boss_orb_lifetime_ms: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            orbital_distance: 70.0,
            orbital_radius: 14.0,
            orbital_dps: 30.0,
            orbital_angular_speed: 3.0,
            fire_trail_interval_ms: 250.0,
            fire_trail_radius: 25.0,
            fire_trail_dps: 15.0,
            fire_trail_lifetime_ms: 2000.0,
            max_hazards: 200,
            explosion_lifetime_ms: 300.0,
            chain_link_ttl_ms: 150.0,
            boss_orb_distance: 120.0,
            boss_orb_radius: 18.0,
            boss_orb_dps: 20.0,
            boss_orb_angular_speed: 1.5,
            boss_orb_lifetime_ms: 6000.0,
        }
    }
}
