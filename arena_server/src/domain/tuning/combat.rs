/// Damage rules shared by every hit in the arena.

#[derive(Debug, Clone, Copy)]
pub struct CombatTuning {
    /// Owner health fraction below which berserker bonus applies.
    pub berserker_threshold: f32,
    /// Extra damage fraction granted by berserker.
    pub berserker_bonus: f32,
    /// Target health fraction below which executioner finishes the target.
    pub executioner_threshold: f32,

    /// Each chain-lightning jump deals this fraction of the previous jump.
    pub chain_falloff: f32,
    pub chain_radius: f32,

    pub burn_duration_ms: f32,
    pub poison_duration_ms: f32,
    pub slow_duration_ms: f32,

    /// Payloads used by omni glitch when the matching stat is still zero.
    pub omni_burn_damage: f32,
    pub omni_poison_damage: f32,
    pub omni_slow_amount: f32,

    /// Upper bounds for the percentage stats.
    pub armor_cap: f32,
    pub dodge_cap: f32,
    pub slow_cap: f32,

    /// Bosses only take this fraction of knockback.
    pub boss_knockback_factor: f32,

    pub damage_number_ttl_ms: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            berserker_threshold: 0.3,
            berserker_bonus: 0.5,
            executioner_threshold: 0.15,
            chain_falloff: 0.7,
            chain_radius: 150.0,
            burn_duration_ms: 3000.0,
            poison_duration_ms: 5000.0,
            slow_duration_ms: 2000.0,
            omni_burn_damage: 10.0,
            omni_poison_damage: 15.0,
            omni_slow_amount: 0.3,
            armor_cap: 0.8,
            dodge_cap: 0.6,
            slow_cap: 0.7,
            boss_knockback_factor: 0.25,
            damage_number_ttl_ms: 600.0,
        }
    }
}
