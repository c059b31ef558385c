// Gameplay tuning tables. Keep these separate from runtime/server configuration
// (tick rates, channel sizes, ports) which lives in `frameworks::config`.

pub mod combat;
pub mod enemy;
pub mod hazard;
pub mod pet;
pub mod player;
pub mod projectile;
pub mod wave;

use combat::CombatTuning;
use hazard::HazardTuning;
use pet::PetTuning;
use player::PlayerTuning;
use projectile::ProjectileTuning;
use wave::WaveTuning;

/// Playable area in world units. Origin is the top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1200.0,
        }
    }
}

impl ArenaTuning {
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Every gameplay knob the engine reads, grouped by concern.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub combat: CombatTuning,
    pub wave: WaveTuning,
    pub hazard: HazardTuning,
    pub pet: PetTuning,
}
