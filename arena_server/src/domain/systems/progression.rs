// XP pickup, leveling and the upgrade-choice gate.
//
// While `GameState::pending_choice` is set the engine does not tick, so a
// level-up is a synchronization point for the whole session. Only one
// player holds the gate at a time; anyone else who levelled is picked up on
// the first tick after the current choice resolves.

use crate::domain::errors::CommandError;
use crate::domain::events::EngineEvent;
use crate::domain::geometry::distance_sq;
use crate::domain::rng::GameRng;
use crate::domain::state::{GameState, GameStatus, PendingChoice, PlayerId, RoundState};
use crate::domain::systems::pets;
use crate::domain::tuning::Tuning;
use crate::domain::upgrades::{Rarity, UpgradeKind, apply_upgrade, draw_offers};
use tracing::info;

/// Level at which `LevelTenReached` fires.
pub const MILESTONE_LEVEL: u32 = 10;

/// Living players pick up orbs inside their pickup radius; the nearest wins.
pub fn collect_orbs(state: &mut GameState, tuning: &Tuning) {
    if state.orbs.is_empty() {
        return;
    }

    let orbs = std::mem::take(&mut state.orbs);
    for orb in orbs {
        let collector = state
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alive)
            .map(|(i, p)| (i, p.stats.pickup_radius, distance_sq(p.x, p.y, orb.x, orb.y)))
            .filter(|(_, radius, d)| *d <= radius * radius)
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(i, _, _)| i);

        let Some(player) = collector.and_then(|i| state.players.get_mut(i)) else {
            state.orbs.push(orb);
            continue;
        };
        player.xp += orb.value;
        let owner = player.id;

        if let Some(pet) = state.pets.iter_mut().find(|pet| pet.owner_id == owner) {
            pets::grant_xp(pet, pets::shared_xp(orb.value, &tuning.pet), &tuning.pet);
        }
    }
}

/// Level up the first eligible player and open the gate for them.
pub fn check_level_ups(
    state: &mut GameState,
    tuning: &Tuning,
    rng: &mut GameRng,
    events: &mut Vec<EngineEvent>,
) {
    if state.is_gated() {
        return;
    }

    let Some(player) = state
        .players
        .iter_mut()
        .find(|p| p.alive && p.xp >= p.xp_to_next_level)
    else {
        return;
    };

    player.xp -= player.xp_to_next_level;
    player.level += 1;
    player.xp_to_next_level =
        (player.xp_to_next_level as f32 * tuning.player.xp_growth).ceil() as u32;
    let (player_id, level) = (player.id, player.level);

    if level >= MILESTONE_LEVEL && !player.reached_level_ten {
        player.reached_level_ten = true;
        events.push(EngineEvent::LevelTenReached { player_id });
    }

    info!(player_id, level, "player levelled up");
    open_choice(state, rng, player_id, None);
}

/// Put `player_id` on the gate with three fresh offers.
pub fn open_choice(state: &mut GameState, rng: &mut GameRng, player_id: PlayerId, forced: Option<Rarity>) {
    let options = draw_offers(rng, forced, || state.next_entity_id());
    state.pending_choice = Some(PendingChoice {
        player_id,
        options,
        forced: forced.is_some(),
    });
}

/// Resolve the gate with one of its offers.
pub fn select_upgrade(
    state: &mut GameState,
    tuning: &Tuning,
    player_id: PlayerId,
    option_id: u64,
) -> Result<UpgradeKind, CommandError> {
    if state.status != GameStatus::Playing {
        return Err(CommandError::SessionOver);
    }
    if state.player(player_id).is_none() {
        return Err(CommandError::UnknownPlayer);
    }
    let pending = state
        .pending_choice
        .as_ref()
        .ok_or(CommandError::NoPendingChoice)?;
    if pending.player_id != player_id {
        return Err(CommandError::NotYourChoice);
    }
    let kind = pending
        .options
        .iter()
        .find(|option| option.id == option_id)
        .map(|option| option.kind)
        .ok_or(CommandError::InvalidOption)?;

    let forced = pending.forced;
    state.pending_choice = None;

    if let Some(player) = state.player_mut(player_id) {
        apply_upgrade(player, kind, &tuning.combat);
    }
    if forced {
        if let RoundState::RewardPending { remaining } = &mut state.round {
            remaining.retain(|id| *id != player_id);
        }
    }

    info!(player_id, ?kind, forced, "upgrade selected");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::XpOrb;
    use crate::domain::systems::fixtures;

    fn state_with_player() -> GameState {
        let mut state = GameState::new(1);
        state.players.push(fixtures::player(1, 500.0, 500.0));
        state
    }

    #[test]
    fn when_orb_is_inside_pickup_radius_then_xp_is_collected() {
        let tuning = Tuning::default();
        let mut state = state_with_player();
        state.orbs.push(XpOrb { id: 90, x: 530.0, y: 500.0, value: 3 });
        state.orbs.push(XpOrb { id: 91, x: 900.0, y: 900.0, value: 3 });

        collect_orbs(&mut state, &tuning);

        assert_eq!(state.players[0].xp, 3);
        assert_eq!(state.orbs.len(), 1);
        assert_eq!(state.orbs[0].id, 91);
    }

    #[test]
    fn when_xp_crosses_the_threshold_then_the_gate_opens_with_three_offers() {
        let tuning = Tuning::default();
        let mut state = state_with_player();
        state.players[0].xp = 12;
        let mut events = Vec::new();

        check_level_ups(&mut state, &tuning, &mut GameRng::from_seed(1), &mut events);

        let player = &state.players[0];
        assert_eq!(player.level, 2);
        assert_eq!(player.xp, 2);
        assert_eq!(player.xp_to_next_level, 13);
        let pending = state.pending_choice.as_ref().map(|p| (p.player_id, p.options.len(), p.forced));
        assert_eq!(pending, Some((1, 3, false)));
        assert!(events.is_empty());
    }

    #[test]
    fn when_level_ten_is_reached_then_the_event_fires_once() {
        let tuning = Tuning::default();
        let mut state = state_with_player();
        state.players[0].level = 9;
        let mut events = Vec::new();
        let mut rng = GameRng::from_seed(1);

        for _ in 0..2 {
            state.pending_choice = None;
            state.players[0].xp = state.players[0].xp_to_next_level;
            check_level_ups(&mut state, &tuning, &mut rng, &mut events);
        }

        assert_eq!(state.players[0].level, 11);
        assert_eq!(events, vec![EngineEvent::LevelTenReached { player_id: 1 }]);
    }

    #[test]
    fn when_a_valid_option_is_selected_then_it_is_applied_and_the_gate_clears() {
        let tuning = Tuning::default();
        let mut state = state_with_player();
        open_choice(&mut state, &mut GameRng::from_seed(4), 1, None);
        let (option_id, kind) = state
            .pending_choice
            .as_ref()
            .and_then(|p| p.options.first())
            .map(|o| (o.id, o.kind))
            .expect("offers");

        let selected = select_upgrade(&mut state, &tuning, 1, option_id);

        assert_eq!(selected, Ok(kind));
        assert!(state.pending_choice.is_none());
        assert_eq!(state.players[0].upgrade_count(kind), 1);
    }

    #[test]
    fn when_command_is_invalid_then_nothing_changes() {
        let tuning = Tuning::default();
        let mut state = state_with_player();
        state.players.push(fixtures::player(2, 100.0, 100.0));

        assert_eq!(select_upgrade(&mut state, &tuning, 1, 5), Err(CommandError::NoPendingChoice));

        open_choice(&mut state, &mut GameRng::from_seed(4), 1, None);
        let before = state.clone();

        assert_eq!(select_upgrade(&mut state, &tuning, 2, 5), Err(CommandError::NotYourChoice));
        assert_eq!(select_upgrade(&mut state, &tuning, 1, 999_999), Err(CommandError::InvalidOption));
        assert_eq!(select_upgrade(&mut state, &tuning, 42, 5), Err(CommandError::UnknownPlayer));
        assert_eq!(state, before);
    }

    #[test]
    fn when_forced_reward_is_taken_then_the_player_leaves_the_reward_queue() {
        let tuning = Tuning::default();
        let mut state = state_with_player();
        state.round = RoundState::RewardPending { remaining: vec![1, 2] };
        open_choice(&mut state, &mut GameRng::from_seed(4), 1, Some(Rarity::Legendary));
        let option_id = state
            .pending_choice
            .as_ref()
            .and_then(|p| p.options.first())
            .map(|o| o.id)
            .expect("offers");

        select_upgrade(&mut state, &tuning, 1, option_id).expect("valid selection");

        assert_eq!(state.round, RoundState::RewardPending { remaining: vec![2] });
    }
}
