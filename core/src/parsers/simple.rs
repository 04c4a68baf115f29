//! One-line fact parsers. Each returns true when it claims the line.

use std::sync::LazyLock;

use hearthwatch_types::{Side, UNKNOWN_PLAYER_NAME};
use regex::Regex;

use crate::events::GameSignal;
use crate::game_data::{GAME_ENTITY, tag, zone};
use crate::log::{
    ENTITIES_CHOSEN, ENTITY_CHOICES, Entity, GAME_STATE_GAME, GAME_STATE_POWER, ZONE_CHANGE,
    line_body, parse_entity,
};
use crate::state::{Discovery, GameState, Player, PlayerStatus};

static PLAYER_JOINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PlayerID=(\d+), PlayerName=(.+)$").unwrap());

static TAG_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^TAG_CHANGE Entity=(.*?) tag=(\S+) value=(\S*)").unwrap()
});

static ENTITY_CHOICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^id=(\d+) Player=(.*?) TaskList=\S* ChoiceType=(\S+)").unwrap()
});

static ENTITIES_CHOSEN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^id=(\d+) Player=(.*?) EntitiesCount=\d+").unwrap());

static ZONE_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^id=\d+ local=\S+ (\[.*\]) zone from (.*?) -> (.*)$").unwrap()
});

/// Authoritative `TAG_CHANGE` as (entity, tag, value).
fn tag_change(line: &str) -> Option<(&str, &str, &str)> {
    let body = line_body(line, GAME_STATE_POWER)?;
    let caps = TAG_CHANGE.captures(body)?;
    Some((
        caps.get(1)?.as_str().trim(),
        caps.get(2)?.as_str(),
        caps.get(3)?.as_str(),
    ))
}

pub fn game_start(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    if line_body(line, GAME_STATE_POWER) != Some("CREATE_GAME") {
        return false;
    }
    tracing::info!("new game detected");
    state.reset();
    signals.push(GameSignal::GameStart);
    true
}

/// The opponent is first announced under a placeholder name and sits on
/// top; otherwise the first real name is the local player.
pub fn player_joined(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    let Some(caps) = line_body(line, GAME_STATE_GAME).and_then(|b| PLAYER_JOINED.captures(b)) else {
        return false;
    };
    let Ok(id) = caps[1].parse::<u32>() else {
        return false;
    };
    let name = caps[2].trim();

    let position = if name == UNKNOWN_PLAYER_NAME
        || state
            .players()
            .iter()
            .any(|p| p.id != id && !p.has_placeholder_name())
    {
        Side::Top
    } else {
        Side::Bottom
    };

    let player = state.add_player(Player::new(id, name, position));
    tracing::info!(id, name = %player.name, position = ?player.position, "player joined");
    signals.push(GameSignal::PlayerJoined {
        id,
        name: player.name.clone(),
    });
    true
}

pub fn turn_change(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    let Some((entity, key, value)) = tag_change(line) else {
        return false;
    };
    if key != tag::CURRENT_PLAYER || value != "1" {
        return false;
    }
    for player in state.players_mut() {
        player.turn = player.name == entity;
    }
    signals.push(GameSignal::TurnChange {
        player: entity.to_string(),
    });
    true
}

pub fn game_over(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    let Some((entity, key, value)) = tag_change(line) else {
        return false;
    };

    if key == tag::PLAYSTATE {
        let Some(status) = PlayerStatus::from_playstate(value) else {
            return false;
        };
        if let Some(player) = state.player_by_name_mut(entity) {
            player.status = status;
        }
        return true;
    }

    if entity == GAME_ENTITY && key == tag::STATE && value == "COMPLETE" {
        tracing::info!(entries = state.match_log().len(), "game over");
        signals.push(GameSignal::GameOver);
        return true;
    }
    false
}

pub fn mulligan(line: &str, _state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    let Some((entity, key, value)) = tag_change(line) else {
        return false;
    };
    if key != tag::MULLIGAN_STATE {
        return false;
    }
    let player = entity.to_string();
    match value {
        "INPUT" => signals.push(GameSignal::MulliganStart { player }),
        "DONE" => signals.push(GameSignal::MulliganResult { player }),
        _ => return false,
    }
    true
}

pub fn choices(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    if let Some(caps) = line_body(line, ENTITY_CHOICES).and_then(|b| ENTITY_CHOICE.captures(b)) {
        let Ok(choice_id) = caps[1].parse::<u32>() else {
            return false;
        };
        let player = caps[2].to_string();
        signals.push(GameSignal::ChoiceId {
            player: player.clone(),
            choice_id,
        });
        if &caps[3] == "GENERAL" {
            if let Some(p) = state.player_by_name_mut(&player) {
                p.discovery = Discovery {
                    enabled: true,
                    choice_id: Some(choice_id),
                };
            }
            signals.push(GameSignal::DiscoveryStart { player, choice_id });
        }
        return true;
    }

    if let Some(caps) = line_body(line, ENTITIES_CHOSEN).and_then(|b| ENTITIES_CHOSEN_LINE.captures(b)) {
        let Ok(choice_id) = caps[1].parse::<u32>() else {
            return false;
        };
        let player = caps[2].to_string();
        if let Some(p) = state.player_by_name_mut(&player)
            && p.discovery.choice_id == Some(choice_id)
        {
            p.discovery = Discovery::default();
            signals.push(GameSignal::DiscoveryEnd { player, choice_id });
        }
        return true;
    }
    false
}

/// Keeps hand counts and the secret/quest lists current.
pub fn zone_change(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    let Some(caps) = line_body(line, ZONE_CHANGE).and_then(|b| ZONE_MOVE.captures(b)) else {
        return false;
    };
    let Some(Entity::Card(card)) = parse_entity(&caps[1], state) else {
        return false;
    };
    let from = caps[2].trim().to_string();
    let to = caps[3].trim().to_string();

    state.resolve_entity(&card);
    let is_quest = state
        .entity(card.id)
        .is_some_and(|c| c.has_tag(tag::QUEST, "1"));
    let props = card.props();

    if let Some(player) = state.player_by_side_mut(card.side()) {
        if to.ends_with(zone::HAND) {
            player.card_count += 1;
        }
        if from.ends_with(zone::HAND) {
            player.card_count = player.card_count.saturating_sub(1);
        }
        if from.ends_with(zone::SECRET) {
            player.remove_secret(card.id);
        }
        if to.ends_with(zone::SECRET) {
            if is_quest {
                player.quests.push(props.clone());
            } else {
                player.secrets.push(props.clone());
            }
        }
    }

    signals.push(GameSignal::ZoneChange {
        entity_id: card.id,
        card_name: props.card_name,
        side: props.side,
        from,
        to,
    });
    true
}

/// Catch-all for authoritative tag changes.
pub fn tag_change_fact(line: &str, state: &mut GameState, signals: &mut Vec<GameSignal>) -> bool {
    let Some((entity, key, value)) = tag_change(line) else {
        return false;
    };

    match parse_entity(entity, state) {
        Some(Entity::Card(mut card)) => {
            card.set_tag(key, value);
            state.resolve_entity(&card);
        }
        Some(Entity::Player { .. }) if key == tag::TIMEOUT => {
            if let Some(player) = state.player_by_name_mut(entity) {
                player.timeout = value.parse().unwrap_or(player.timeout);
            }
        }
        _ => {}
    }

    signals.push(GameSignal::TagChange {
        entity: entity.to_string(),
        tag: key.to_string(),
        value: value.to_string(),
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(body: &str) -> String {
        format!("D 20:01:02.0000000 {GAME_STATE_POWER} {body}")
    }

    fn game(body: &str) -> String {
        format!("D 20:01:02.0000000 {GAME_STATE_GAME} {body}")
    }

    fn joined(state: &mut GameState, id: u32, name: &str) {
        let mut signals = Vec::new();
        assert!(player_joined(&game(&format!("PlayerID={id}, PlayerName={name}")), state, &mut signals));
    }

    #[test]
    fn heuristic_player_positions() {
        let mut state = GameState::new();
        joined(&mut state, 2, UNKNOWN_PLAYER_NAME);
        joined(&mut state, 1, "Me#1111");
        assert_eq!(state.player_by_id(1).unwrap().position, Side::Bottom);
        assert_eq!(state.player_by_id(2).unwrap().position, Side::Top);

        // The opponent's reveal keeps their seat.
        joined(&mut state, 2, "Them#2222");
        let them = state.player_by_id(2).unwrap();
        assert_eq!(them.name, "Them#2222");
        assert_eq!(them.position, Side::Top);
    }

    #[test]
    fn heuristic_second_real_name_sits_on_top() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        joined(&mut state, 2, "Them#2222");
        assert_eq!(state.player_by_id(2).unwrap().position, Side::Top);
    }

    #[test]
    fn create_game_resets_state() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        let mut signals = Vec::new();
        assert!(game_start(&power("CREATE_GAME"), &mut state, &mut signals));
        assert!(state.players().is_empty());
        assert_eq!(signals, vec![GameSignal::GameStart]);
    }

    #[test]
    fn turn_change_flags_only_the_current_player() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        joined(&mut state, 2, "Them#2222");
        let mut signals = Vec::new();
        assert!(turn_change(
            &power("TAG_CHANGE Entity=Them#2222 tag=CURRENT_PLAYER value=1 "),
            &mut state,
            &mut signals
        ));
        assert!(!state.player_by_id(1).unwrap().turn);
        assert!(state.player_by_id(2).unwrap().turn);
        assert!(!turn_change(
            &power("TAG_CHANGE Entity=Me#1111 tag=CURRENT_PLAYER value=0 "),
            &mut state,
            &mut signals
        ));
    }

    #[test]
    fn playstate_sets_status_and_state_complete_ends_game() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        let mut signals = Vec::new();
        assert!(game_over(&power("TAG_CHANGE Entity=Me#1111 tag=PLAYSTATE value=WON "), &mut state, &mut signals));
        assert_eq!(state.player_by_id(1).unwrap().status, PlayerStatus::Won);
        assert!(signals.is_empty());

        assert!(!game_over(&power("TAG_CHANGE Entity=Me#1111 tag=PLAYSTATE value=PLAYING "), &mut state, &mut signals));
        assert!(game_over(&power("TAG_CHANGE Entity=GameEntity tag=STATE value=COMPLETE "), &mut state, &mut signals));
        assert_eq!(signals, vec![GameSignal::GameOver]);
    }

    #[test]
    fn mulligan_states() {
        let mut state = GameState::new();
        let mut signals = Vec::new();
        assert!(mulligan(&power("TAG_CHANGE Entity=Me#1111 tag=MULLIGAN_STATE value=INPUT "), &mut state, &mut signals));
        assert!(mulligan(&power("TAG_CHANGE Entity=Me#1111 tag=MULLIGAN_STATE value=DONE "), &mut state, &mut signals));
        assert!(!mulligan(&power("TAG_CHANGE Entity=Me#1111 tag=MULLIGAN_STATE value=DEALING "), &mut state, &mut signals));
        let names: Vec<_> = signals.iter().map(GameSignal::name).collect();
        assert_eq!(names, vec!["mulligan-start", "mulligan-result"]);
    }

    #[test]
    fn discovery_opens_and_closes_on_matching_choice() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        let mut signals = Vec::new();

        let offered = format!("{ENTITY_CHOICES} id=7 Player=Me#1111 TaskList=12 ChoiceType=GENERAL CountMin=1 CountMax=1");
        assert!(choices(&offered, &mut state, &mut signals));
        assert_eq!(state.player_by_id(1).unwrap().discovery.choice_id, Some(7));

        let chosen = format!("{ENTITIES_CHOSEN} id=7 Player=Me#1111 EntitiesCount=1");
        assert!(choices(&chosen, &mut state, &mut signals));
        assert!(!state.player_by_id(1).unwrap().discovery.enabled);

        let names: Vec<_> = signals.iter().map(GameSignal::name).collect();
        assert_eq!(names, vec!["choice-id", "discovery-start", "discovery-end"]);
    }

    #[test]
    fn mulligan_choice_is_not_a_discovery() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        let mut signals = Vec::new();
        let offered = format!("{ENTITY_CHOICES} id=1 Player=Me#1111 TaskList= ChoiceType=MULLIGAN CountMin=0 CountMax=3");
        assert!(choices(&offered, &mut state, &mut signals));
        assert!(!state.player_by_id(1).unwrap().discovery.enabled);
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn zone_changes_track_hand_and_secrets() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        let mut signals = Vec::new();

        let draw = format!("{ZONE_CHANGE} id=3 local=False [entityName=Snake Trap id=30 zone=HAND zonePos=4 cardId=EX1_554 player=1] zone from FRIENDLY DECK -> FRIENDLY HAND");
        assert!(zone_change(&draw, &mut state, &mut signals));
        assert_eq!(state.player_by_id(1).unwrap().card_count, 1);

        let play = format!("{ZONE_CHANGE} id=4 local=False [entityName=Snake Trap id=30 zone=SECRET zonePos=0 cardId=EX1_554 player=1] zone from FRIENDLY HAND -> FRIENDLY SECRET");
        assert!(zone_change(&play, &mut state, &mut signals));
        let me = state.player_by_id(1).unwrap();
        assert_eq!(me.card_count, 0);
        assert_eq!(me.secrets.len(), 1);
        assert_eq!(me.secrets[0].card_name, "Snake Trap");

        let reveal = format!("{ZONE_CHANGE} id=9 local=False [entityName=Snake Trap id=30 zone=GRAVEYARD zonePos=0 cardId=EX1_554 player=1] zone from FRIENDLY SECRET -> FRIENDLY GRAVEYARD");
        assert!(zone_change(&reveal, &mut state, &mut signals));
        assert!(state.player_by_id(1).unwrap().secrets.is_empty());
        assert_eq!(signals.len(), 3);
    }

    #[test]
    fn tag_changes_update_cache_and_timeout() {
        let mut state = GameState::new();
        joined(&mut state, 1, "Me#1111");
        let mut signals = Vec::new();

        assert!(tag_change_fact(&power("TAG_CHANGE Entity=[entityName=Wisp id=9 zone=PLAY zonePos=1 cardId=CS2_231 player=1] tag=ATK value=2 "), &mut state, &mut signals));
        assert_eq!(state.entity(9).unwrap().tag("ATK"), Some("2"));

        assert!(tag_change_fact(&power("TAG_CHANGE Entity=Me#1111 tag=TIMEOUT value=75 "), &mut state, &mut signals));
        assert_eq!(state.player_by_id(1).unwrap().timeout, 75);
        assert_eq!(signals.len(), 2);
    }
}
