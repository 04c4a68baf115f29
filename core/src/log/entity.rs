//! Entity-string resolution.
//!
//! The client refers to entities in four ways:
//! - `GameEntity`
//! - a player's display name
//! - a bare numeric id
//! - `[entityName=Fireball id=25 zone=HAND zonePos=3 cardId=CS2_029 player=1]`

use std::sync::LazyLock;

use hearthwatch_types::{EntityId, Side, is_unresolved_name};
use regex::Regex;

use super::block::{Card, Entity};
use crate::game_data::GAME_ENTITY;
use crate::state::GameState;

static BRACKET_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(?:entityName|name)=(.*?) id=(\d+)(?: zone=\S*)?(?: zonePos=\d+)?(?: cardId=(\S*))?(?: player=(\d+))?\]$",
    )
    .unwrap()
});

/// Resolve an entity string against the current game state.
pub fn parse_entity(text: &str, state: &GameState) -> Option<Entity> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text == GAME_ENTITY {
        return Some(Entity::Game);
    }
    if let Some(player) = state.player_by_name(text) {
        return Some(Entity::Player {
            side: player.position,
        });
    }
    if let Some(id) = parse_numeric_id(text) {
        // No controller information here; the side stays undetermined.
        return Some(Entity::Card(Card::new(id)));
    }
    parse_bracket_entity(text, state).map(Entity::Card)
}

/// `Some(id)` when the string is purely numeric.
pub fn parse_numeric_id(text: &str) -> Option<EntityId> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_bracket_entity(text: &str, state: &GameState) -> Option<Card> {
    let caps = BRACKET_ENTITY.captures(text)?;
    let id = caps.get(2)?.as_str().parse().ok()?;

    let mut card = Card::new(id);
    let name = caps.get(1).map_or("", |m| m.as_str());
    if !is_unresolved_name(name) {
        card.name = name.to_string();
    }
    card.card_id = caps
        .get(3)
        .map_or(String::new(), |m| m.as_str().to_string());
    card.side = caps
        .get(4)
        .and_then(|m| m.as_str().parse().ok())
        .and_then(|index| side_for_player_index(index, state));
    Some(card)
}

/// Best-effort side for a 1-based player index.
///
/// A registered player answers directly. If that player is not registered
/// yet but exactly one other player is, the index must belong to the other
/// side. Anything else is undetermined (`None`, which reads as `Bottom`).
pub fn side_for_player_index(index: u32, state: &GameState) -> Option<Side> {
    if let Some(player) = state.player_by_id(index) {
        return Some(player.position);
    }
    match state.players() {
        [only] => Some(only.position.opposite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Player;
    use hearthwatch_types::{UNKNOWN_ENTITY_NAME, UNKNOWN_PLAYER_NAME};

    fn two_players() -> GameState {
        let mut state = GameState::new();
        state.add_player(Player::new(1, "Me#1111", Side::Bottom));
        state.add_player(Player::new(2, UNKNOWN_PLAYER_NAME, Side::Top));
        state
    }

    #[test]
    fn game_token_resolves_to_game() {
        assert_eq!(
            parse_entity("GameEntity", &GameState::new()),
            Some(Entity::Game)
        );
    }

    #[test]
    fn player_names_resolve_to_their_side() {
        let state = two_players();
        assert_eq!(
            parse_entity("Me#1111", &state),
            Some(Entity::Player { side: Side::Bottom })
        );
        assert_eq!(
            parse_entity(UNKNOWN_PLAYER_NAME, &state),
            Some(Entity::Player { side: Side::Top })
        );
    }

    #[test]
    fn numeric_ids_become_blank_cards_on_the_bottom() {
        let entity = parse_entity("73", &two_players()).unwrap();
        let card = entity.as_card().unwrap();
        assert_eq!(card.id, 73);
        assert!(card.name.is_empty());
        assert!(card.tags.is_empty());
        assert_eq!(card.side(), Side::Bottom);
    }

    #[test]
    fn bracket_syntax_parses_name_id_card_and_side() {
        let state = two_players();
        let entity = parse_entity(
            "[entityName=Boulderfist Ogre id=40 zone=PLAY zonePos=1 cardId=CS2_200 player=2]",
            &state,
        )
        .unwrap();
        let card = entity.as_card().unwrap();
        assert_eq!(card.name, "Boulderfist Ogre");
        assert_eq!(card.id, 40);
        assert_eq!(card.card_id, "CS2_200");
        assert_eq!(card.side, Some(Side::Top));
    }

    #[test]
    fn unknown_entity_sentinel_is_normalized_to_blank() {
        let text = format!("[entityName={UNKNOWN_ENTITY_NAME} id=71 zone=DECK zonePos=0 cardId= player=2]");
        let entity = parse_entity(&text, &two_players()).unwrap();
        let card = entity.as_card().unwrap();
        assert_eq!(card.id, 71);
        assert!(card.name.is_empty());
        assert!(card.card_id.is_empty());
    }

    #[test]
    fn unparseable_strings_resolve_to_nothing() {
        let state = two_players();
        assert_eq!(parse_entity("", &state), None);
        assert_eq!(parse_entity("Stranger#9", &state), None);
        assert_eq!(parse_entity("[garbage]", &state), None);
    }

    #[test]
    fn heuristic_single_player_infers_other_side() {
        let mut state = GameState::new();
        state.add_player(Player::new(1, "Me#1111", Side::Bottom));
        assert_eq!(side_for_player_index(1, &state), Some(Side::Bottom));
        assert_eq!(side_for_player_index(2, &state), Some(Side::Top));
    }

    #[test]
    fn heuristic_unknown_players_default_to_bottom() {
        let state = GameState::new();
        assert_eq!(side_for_player_index(2, &state), None);
        let entity = parse_entity(
            "[entityName=Wisp id=9 zone=HAND zonePos=1 cardId=CS2_231 player=2]",
            &state,
        )
        .unwrap();
        assert_eq!(entity.as_card().unwrap().side(), Side::Bottom);
    }
}
