/// Gameplay tuning for projectiles.

#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Collision radius of player bullets.
    pub radius: f32,

    /// Collision radius of enemy bullets.
    pub enemy_radius: f32,

    /// Angle in radians between neighbouring shots of a fan.
    pub spread: f32,

    /// Boomerang outbound speed per 60fps frame.
    pub boomerang_speed: f32,
    pub boomerang_radius: f32,
    /// Distance from the spawn origin at which a boomerang turns back.
    pub boomerang_range: f32,
    /// Speed multiplier while returning to the owner.
    pub boomerang_return_multiplier: f32,

    /// Homing projectiles only steer toward enemies inside this radius.
    pub homing_radius: f32,
    /// Blend factor of the target direction per 60fps frame.
    pub homing_strength: f32,

    /// Ricochets only retarget enemies inside this radius.
    pub ricochet_radius: f32,

    /// Projectiles this far outside the arena are despawned.
    pub out_of_bounds_margin: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            radius: 5.0,
            enemy_radius: 6.0,
            spread: 0.15,
            boomerang_speed: 8.0,
            boomerang_radius: 12.0,
            boomerang_range: 350.0,
            boomerang_return_multiplier: 1.5,
            homing_radius: 250.0,
            homing_strength: 0.15,
            ricochet_radius: 300.0,
            out_of_bounds_margin: 50.0,
        }
    }
}
