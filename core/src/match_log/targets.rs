//! Which entries of a block represent an effect on some entity.
//!
//! Rules are tried in order and the first match wins:
//! 1. a created embedded entity with a zone position (draw, discover, summon)
//! 2. an updated embedded entity gaining a zone position with no creation
//!    record in the same scope (repositioning)
//! 3. a zone-position change paired with a zone assignment other than
//!    "removed from game"
//! 4. an enchantment entering play created by the block's source; the
//!    enchanted entity is the target
//! 5. a spawn-count bump on a known, attached enchantment (stacking buff);
//!    the enchanted entity is the target
//! 6. a fixed allow-list of single tag/value signals

use hearthwatch_types::EntityId;

use super::MatchLogError;
use super::context::BlockContext;
use crate::game_data::{SIGNAL_TAG_VALUES, card_type, tag, zone};
use crate::log::{Card, EmbeddedAction, Entry, TagChange};
use crate::state::GameState;

pub fn detect_target(
    ctx: &BlockContext<'_>,
    entry: &Entry,
    state: &GameState,
) -> Result<Option<Card>, MatchLogError> {
    match entry {
        Entry::Embedded(embedded) => {
            let card = &embedded.entity;
            let positioned = card.tags.contains_key(tag::ZONE_POSITION);
            match embedded.action {
                EmbeddedAction::Creating if positioned => Ok(Some(ctx.latest(card.id, state))),
                EmbeddedAction::Updating if positioned && !created_in_scope(ctx, card.id) => {
                    Ok(Some(ctx.latest(card.id, state)))
                }
                _ if card.has_tag(tag::ZONE, zone::PLAY) => {
                    attached_by_source(ctx, card.id, state)
                }
                _ => Ok(None),
            }
        }
        Entry::Tag(change) => detect_tag_target(ctx, change, state),
        _ => Ok(None),
    }
}

fn detect_tag_target(
    ctx: &BlockContext<'_>,
    change: &TagChange,
    state: &GameState,
) -> Result<Option<Card>, MatchLogError> {
    let Some(card) = change.card() else {
        return Ok(None);
    };

    if change.tag == tag::ZONE_POSITION {
        let moved = zone_assignment(ctx, card.id)
            .is_some_and(|zone| zone != zone::REMOVED_FROM_GAME);
        if moved {
            return Ok(Some(ctx.latest(card.id, state)));
        }
    }

    if change.tag == tag::ZONE && change.value == zone::PLAY {
        if let Some(target) = attached_by_source(ctx, card.id, state)? {
            return Ok(Some(target));
        }
    }

    if change.tag == tag::SPAWN_TIME_COUNT {
        let latest = ctx.latest(card.id, state);
        if latest.has_tag(tag::CARDTYPE, card_type::ENCHANTMENT) {
            if let Some(attached) = tag_id(&latest, tag::ATTACHED)? {
                return Ok(Some(ctx.latest(attached, state)));
            }
        }
    }

    let signalled = SIGNAL_TAG_VALUES
        .get(change.tag.as_str())
        .is_some_and(|value| *value == change.value);
    Ok(signalled.then(|| ctx.latest(card.id, state)))
}

/// Enchantment `id` created by this block's source: the entity it enchants.
fn attached_by_source(
    ctx: &BlockContext<'_>,
    id: EntityId,
    state: &GameState,
) -> Result<Option<Card>, MatchLogError> {
    let Some(source_id) = ctx.block().source_card().map(|c| c.id) else {
        return Ok(None);
    };
    let enchantment = ctx.latest(id, state);
    if !enchantment.has_tag(tag::CARDTYPE, card_type::ENCHANTMENT)
        || tag_id(&enchantment, tag::CREATOR)? != Some(source_id)
    {
        return Ok(None);
    }
    Ok(tag_id(&enchantment, tag::ATTACHED)?.map(|attached| ctx.latest(attached, state)))
}

fn created_in_scope(ctx: &BlockContext<'_>, id: EntityId) -> bool {
    ctx.flattened_entries().iter().any(|entry| {
        matches!(entry, Entry::Embedded(e) if e.action == EmbeddedAction::Creating && e.entity.id == id)
    })
}

/// Last zone assigned to `id` within this scope.
fn zone_assignment<'b>(ctx: &BlockContext<'b>, id: EntityId) -> Option<&'b str> {
    ctx.flattened_entries()
        .iter()
        .rev()
        .find_map(|entry| match *entry {
            Entry::Tag(change)
                if change.tag == tag::ZONE && change.card().is_some_and(|c| c.id == id) =>
            {
                Some(change.value.as_str())
            }
            Entry::Embedded(embedded) if embedded.entity.id == id => embedded.entity.tag(tag::ZONE),
            _ => None,
        })
}

/// Numeric entity-id tag; absent or zero means "none".
pub(super) fn tag_id(card: &Card, key: &str) -> Result<Option<EntityId>, MatchLogError> {
    match card.tag(key) {
        None => Ok(None),
        Some(value) => match value.parse::<EntityId>() {
            Ok(0) => Ok(None),
            Ok(id) => Ok(Some(id)),
            Err(_) => Err(MatchLogError::InvalidTagValue {
                tag: key.to_string(),
                value: value.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{Block, EmbeddedEntity, Entity};

    fn card(id: EntityId, tags: &[(&str, &str)]) -> Card {
        let mut card = Card::new(id);
        for (k, v) in tags {
            card.set_tag(*k, *v);
        }
        card
    }

    fn tag_entry(id: EntityId, key: &str, value: &str) -> Entry {
        Entry::Tag(TagChange {
            entity: Some(Entity::Card(Card::new(id))),
            tag: key.to_string(),
            value: value.to_string(),
        })
    }

    fn embedded(action: EmbeddedAction, card: Card) -> Entry {
        Entry::Embedded(EmbeddedEntity { action, entity: card })
    }

    fn play_block(source: EntityId, entries: Vec<Entry>) -> Block {
        Block {
            block_type: "PLAY".to_string(),
            source: Some(Entity::Card(Card::new(source))),
            entries,
            ..Default::default()
        }
    }

    /// Run detection over every entry and collect matched ids.
    fn targets_of(block: &Block) -> Vec<EntityId> {
        let ctx = BlockContext::new(block);
        let state = GameState::new();
        block
            .entries
            .iter()
            .filter_map(|e| detect_target(&ctx, e, &state).unwrap())
            .map(|c| c.id)
            .collect()
    }

    #[test]
    fn created_entity_with_position_is_a_target() {
        let block = play_block(
            1,
            vec![embedded(EmbeddedAction::Creating, card(70, &[("ZONE_POSITION", "2")]))],
        );
        assert_eq!(targets_of(&block), vec![70]);
    }

    #[test]
    fn update_without_creation_is_a_reposition() {
        let block = play_block(
            1,
            vec![embedded(EmbeddedAction::Updating, card(33, &[("ZONE_POSITION", "4")]))],
        );
        assert_eq!(targets_of(&block), vec![33]);
    }

    #[test]
    fn update_after_creation_in_scope_is_not_double_counted() {
        let block = play_block(
            1,
            vec![
                embedded(EmbeddedAction::Creating, card(70, &[("ZONE_POSITION", "2")])),
                embedded(EmbeddedAction::Updating, card(70, &[("ZONE_POSITION", "3")])),
            ],
        );
        assert_eq!(targets_of(&block), vec![70]);
    }

    #[test]
    fn zone_position_needs_a_visible_zone() {
        let moved = play_block(
            1,
            vec![tag_entry(12, "ZONE", "HAND"), tag_entry(12, "ZONE_POSITION", "5")],
        );
        assert_eq!(targets_of(&moved), vec![12]);

        let removed = play_block(
            1,
            vec![
                tag_entry(12, "ZONE", "REMOVEDFROMGAME"),
                tag_entry(12, "ZONE_POSITION", "0"),
            ],
        );
        assert!(targets_of(&removed).is_empty());

        let unpaired = play_block(1, vec![tag_entry(12, "ZONE_POSITION", "5")]);
        assert!(targets_of(&unpaired).is_empty());
    }

    #[test]
    fn enchantment_from_source_targets_the_enchanted_entity() {
        let buff = card(
            80,
            &[("CARDTYPE", "ENCHANTMENT"), ("CREATOR", "1"), ("ATTACHED", "40"), ("ZONE", "PLAY")],
        );
        let block = play_block(1, vec![embedded(EmbeddedAction::Creating, buff)]);
        assert_eq!(targets_of(&block), vec![40]);
    }

    #[test]
    fn enchantment_from_someone_else_is_ignored() {
        let buff = card(
            80,
            &[("CARDTYPE", "ENCHANTMENT"), ("CREATOR", "99"), ("ATTACHED", "40"), ("ZONE", "PLAY")],
        );
        let block = play_block(1, vec![embedded(EmbeddedAction::Creating, buff)]);
        assert!(targets_of(&block).is_empty());
    }

    #[test]
    fn spawn_count_on_attached_enchantment_targets_the_enchanted_entity() {
        let mut state = GameState::new();
        state.resolve_entity(&card(81, &[("CARDTYPE", "ENCHANTMENT"), ("ATTACHED", "41")]));
        let block = play_block(1, vec![tag_entry(81, "SPAWN_TIME_COUNT", "2")]);
        let ctx = BlockContext::new(&block);
        let found = detect_target(&ctx, &block.entries[0], &state).unwrap();
        assert_eq!(found.map(|c| c.id), Some(41));
    }

    #[test]
    fn allow_listed_signals_are_targets() {
        let block = play_block(
            1,
            vec![
                tag_entry(20, "SILENCED", "1"),
                tag_entry(21, "CANT_PLAY", "0"),
                tag_entry(22, "ZONE", "SECRET"),
                tag_entry(23, "ATK", "5"),
            ],
        );
        assert_eq!(targets_of(&block), vec![20, 22]);
    }

    #[test]
    fn malformed_creator_is_an_error() {
        let buff = card(80, &[("CARDTYPE", "ENCHANTMENT"), ("CREATOR", "x"), ("ZONE", "PLAY")]);
        let block = play_block(1, vec![embedded(EmbeddedAction::Creating, buff)]);
        let ctx = BlockContext::new(&block);
        assert!(detect_target(&ctx, &block.entries[0], &GameState::new()).is_err());
    }
}
