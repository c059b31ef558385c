/// Gameplay tuning for wave pacing, special rounds and extraction.

#[derive(Debug, Clone, Copy)]
pub struct WaveTuning {
    pub wave_duration_ms: f32,

    /// First wave that is a special round.
    pub special_round_start: u32,
    /// Waves between special rounds after the first.
    pub special_round_interval: u32,

    /// Normal waves that are a multiple of this spawn a boss.
    pub boss_wave_interval: u32,

    /// Once the wave number exceeds this, the extraction zone opens.
    pub win_wave: u32,

    /// Live enemy ceiling per living player.
    pub enemies_per_player: usize,

    /// Spawn probability per 60fps frame is `base + per_wave * wave`, capped.
    pub base_spawn_chance: f32,
    pub spawn_chance_per_wave: f32,
    pub max_spawn_chance: f32,

    pub pack_min: u32,
    pub pack_max: u32,
    pub pack_interval_min_ms: f32,
    pub pack_interval_max_ms: f32,
    /// Special round budget is `base + per_wave * wave`.
    pub special_budget_base: u32,
    pub special_budget_per_wave: u32,

    pub extraction_radius: f32,
    pub extraction_duration_ms: f32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            wave_duration_ms: 30_000.0,
            special_round_start: 5,
            special_round_interval: 5,
            boss_wave_interval: 7,
            win_wave: 20,
            enemies_per_player: 25,
            base_spawn_chance: 0.02,
            spawn_chance_per_wave: 0.01,
            max_spawn_chance: 0.5,
            pack_min: 3,
            pack_max: 6,
            pack_interval_min_ms: 1500.0,
            pack_interval_max_ms: 3000.0,
            special_budget_base: 10,
            special_budget_per_wave: 2,
            extraction_radius: 100.0,
            extraction_duration_ms: 5000.0,
        }
    }
}

impl WaveTuning {
    /// Total enemies a special round starting at `wave` will spawn.
    pub fn special_budget(&self, wave: u32) -> u32 {
        self.special_budget_base + self.special_budget_per_wave * wave
    }

    /// Per-frame spawn probability for a normal wave.
    pub fn spawn_chance(&self, wave: u32) -> f32 {
        (self.base_spawn_chance + self.spawn_chance_per_wave * wave as f32)
            .min(self.max_spawn_chance)
    }
}
