// The simulation engine. One `Engine` owns one session's `GameState` and is
// the only thing that mutates it; hosts feed it commands and elapsed time
// and read back snapshots and events.
//
// A tick runs the systems in a fixed order. Nothing in the pipeline looks at
// wall-clock time, so a seed plus the sequence of commands and deltas always
// reproduces the same run.

use crate::domain::errors::CommandError;
use crate::domain::events::EngineEvent;
use crate::domain::rng::GameRng;
use crate::domain::state::{
    BossKind, EnemyKind, GameState, GameStatus, Owner, Player, PlayerId, PlayerInput, RoundState,
};
use crate::domain::systems::{
    Frame, enemies, extraction, hazards, movement, pets, progression, projectiles, revive, status,
    waves,
};
use crate::domain::tuning::Tuning;
use crate::domain::upgrades::{UpgradeKind, UpgradeOption, apply_upgrade};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Distance from the arena center at which joining players are placed.
const SPAWN_RING_RADIUS: f32 = 80.0;
/// Slots on the spawn ring before positions start to repeat.
const SPAWN_RING_SLOTS: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    pub seed: u64,
    pub tuning: Tuning,
}

/// What a call to [`Engine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The pipeline ran.
    Advanced,
    /// A player holds the upgrade gate; nothing moved.
    Frozen,
    /// The run is over (won or lost).
    Halted,
    /// Nobody has joined yet.
    Idle,
}

/// Debug commands. Hosts decide whether to accept them at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AdminCommand {
    /// Missing coordinates pick a random arena edge.
    SpawnEnemy {
        kind: EnemyKind,
        #[serde(default)]
        x: Option<f32>,
        #[serde(default)]
        y: Option<f32>,
    },
    SpawnBoss {
        kind: BossKind,
    },
    TriggerSpecialRound,
    GrantUpgrade {
        player_id: PlayerId,
        kind: UpgradeKind,
    },
    SetInvulnerable {
        player_id: PlayerId,
        enabled: bool,
    },
    /// Fill the player's XP bar so the next tick levels them up.
    LevelUp {
        player_id: PlayerId,
    },
}

#[derive(Debug, Clone)]
pub struct Engine {
    state: GameState,
    tuning: Tuning,
    rng: GameRng,
    events: Vec<EngineEvent>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: GameState::new(config.seed),
            tuning: config.tuning,
            rng: GameRng::from_seed(config.seed),
            events: Vec::new(),
        }
    }

    /// Continue a previously persisted run. The random stream is re-derived
    /// from the seed and the tick the state was saved at.
    pub fn resume(state: GameState, tuning: Tuning) -> Self {
        let rng = GameRng::from_seed(state.seed ^ state.tick);
        info!(seed = state.seed, tick = state.tick, wave = state.wave, "engine resumed");
        Self {
            state,
            tuning,
            rng,
            events: Vec::new(),
        }
    }

    /// Add a player on the spawn ring. Joining again with a known id is a
    /// no-op so reconnecting clients keep their character.
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        name: String,
        character: String,
    ) -> Result<(), CommandError> {
        if self.state.status != GameStatus::Playing {
            return Err(CommandError::SessionOver);
        }
        if self.state.player(player_id).is_some() {
            debug!(player_id, "player already in session");
            return Ok(());
        }

        let slot = self.state.players.len() % SPAWN_RING_SLOTS;
        let angle = TAU * slot as f32 / SPAWN_RING_SLOTS as f32;
        let (cx, cy) = self.tuning.arena.center();
        let player = Player::new(
            player_id,
            name,
            character,
            cx + angle.cos() * SPAWN_RING_RADIUS,
            cy + angle.sin() * SPAWN_RING_RADIUS,
            &self.tuning.player,
        );
        info!(player_id, name = %player.name, character = %player.character, "player joined");
        self.state.players.push(player);
        Ok(())
    }

    /// Drop a player and everything they own. A gate they hold is released.
    pub fn remove_player(&mut self, player_id: PlayerId) {
        let before = self.state.players.len();
        self.state.players.retain(|p| p.id != player_id);
        if self.state.players.len() == before {
            return;
        }

        let owner = Owner::Player(player_id);
        self.state.pets.retain(|pet| pet.owner_id != player_id);
        self.state.hazards.retain(|h| h.owner != owner);
        self.state.projectiles.retain(|p| p.owner != owner);

        if self
            .state
            .pending_choice
            .as_ref()
            .is_some_and(|choice| choice.player_id == player_id)
        {
            self.state.pending_choice = None;
        }
        if let RoundState::RewardPending { remaining } = &mut self.state.round {
            remaining.retain(|id| *id != player_id);
        }
        info!(player_id, "player left");
    }

    /// Latest input wins; it is read by the next tick that runs.
    pub fn set_input(&mut self, player_id: PlayerId, input: PlayerInput) -> Result<(), CommandError> {
        let player = self
            .state
            .player_mut(player_id)
            .ok_or(CommandError::UnknownPlayer)?;
        player.input = input;
        Ok(())
    }

    pub fn select_upgrade(
        &mut self,
        player_id: PlayerId,
        option_id: u64,
    ) -> Result<UpgradeKind, CommandError> {
        progression::select_upgrade(&mut self.state, &self.tuning, player_id, option_id)
    }

    pub fn apply_admin(&mut self, command: AdminCommand) -> Result<(), CommandError> {
        if self.state.status != GameStatus::Playing {
            return Err(CommandError::SessionOver);
        }
        debug!(?command, "admin command");

        match command {
            AdminCommand::SpawnEnemy { kind, x, y } => {
                let (ex, ey) = self.random_edge();
                enemies::spawn_enemy(&mut self.state, kind, x.unwrap_or(ex), y.unwrap_or(ey), false);
            }
            AdminCommand::SpawnBoss { kind } => {
                let (x, y) = self.random_edge();
                enemies::spawn_boss(&mut self.state, kind, x, y);
            }
            AdminCommand::TriggerSpecialRound => {
                waves::start_special_round(&mut self.state, &self.tuning);
            }
            AdminCommand::GrantUpgrade { player_id, kind } => {
                let player = self
                    .state
                    .player_mut(player_id)
                    .ok_or(CommandError::UnknownPlayer)?;
                apply_upgrade(player, kind, &self.tuning.combat);
            }
            AdminCommand::SetInvulnerable { player_id, enabled } => {
                let player = self
                    .state
                    .player_mut(player_id)
                    .ok_or(CommandError::UnknownPlayer)?;
                player.stats.invulnerable = enabled;
            }
            AdminCommand::LevelUp { player_id } => {
                let player = self
                    .state
                    .player_mut(player_id)
                    .ok_or(CommandError::UnknownPlayer)?;
                player.xp = player.xp.max(player.xp_to_next_level);
            }
        }
        Ok(())
    }

    /// Advance the simulation by `delta_ms` of measured time.
    pub fn tick(&mut self, delta_ms: f32) -> TickOutcome {
        if self.state.status != GameStatus::Playing {
            return TickOutcome::Halted;
        }
        if self.state.is_gated() {
            return TickOutcome::Frozen;
        }
        if self.state.players.is_empty() {
            return TickOutcome::Idle;
        }

        let frame = Frame::new(delta_ms);
        let Self {
            state,
            tuning,
            rng,
            events,
        } = self;
        state.tick += 1;
        state.elapsed_ms += f64::from(frame.delta_ms);

        movement::move_players(state, tuning, frame);
        movement::regenerate(state, tuning, frame);
        revive::update_revives(state, tuning, frame);
        pets::update_pets(state, tuning, frame);
        hazards::update_hazards(state, tuning, rng, frame);

        enemies::spawn_enemies(state, tuning, rng, frame);
        enemies::update_enemies(state, tuning, rng, frame);

        projectiles::fire_player_attacks(state, tuning, rng, frame);
        projectiles::update_projectiles(state, tuning, rng, frame);
        enemies::reap_dead_enemies(state, tuning);

        status::tick_status_effects(state, frame);
        enemies::reap_dead_enemies(state, tuning);

        hazards::resolve_area_effects(state, tuning, frame);
        enemies::reap_dead_enemies(state, tuning);

        progression::collect_orbs(state, tuning);
        progression::check_level_ups(state, tuning, rng, events);

        extraction::update_extraction(state, tuning, frame);
        waves::advance_waves(state, tuning, rng, frame);
        extraction::check_terminal(state, events);

        TickOutcome::Advanced
    }

    /// Deep copy of the current state for broadcasting or persistence.
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// The offers waiting on `player_id`, if they hold the gate.
    pub fn pending_upgrade_options(&self, player_id: PlayerId) -> Option<&[UpgradeOption]> {
        self.state
            .pending_choice
            .as_ref()
            .filter(|choice| choice.player_id == player_id)
            .map(|choice| choice.options.as_slice())
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    fn random_edge(&mut self) -> (f32, f32) {
        let edge = self.rng.range_u32(0, 3);
        enemies::edge_position(&mut self.rng, &self.tuning.arena, edge)
    }
}
