use std::collections::BTreeMap;

use hearthwatch_types::{EntityId, EntityProps, Side, is_unresolved_name};

/// A resolved entity reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Game,
    Player { side: Side },
    Card(Card),
}

impl Entity {
    pub fn as_card(&self) -> Option<&Card> {
        match self {
            Entity::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn card_entity_id(&self) -> Option<EntityId> {
        self.as_card().map(|c| c.id)
    }
}

/// Snapshot of a card-like game object. Heroes, hero powers and
/// enchantments are all cards as far as the log is concerned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Card {
    pub id: EntityId,
    pub name: String,
    pub card_id: String,
    /// `None` when the line did not say who controls the card.
    pub side: Option<Side>,
    pub tags: BTreeMap<String, String>,
}

impl Card {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Effective side; undetermined cards count as `Bottom`.
    pub fn side(&self) -> Side {
        self.side.unwrap_or_default()
    }

    pub fn has_resolved_name(&self) -> bool {
        !is_unresolved_name(&self.name)
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.tag(key) == Some(value)
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Fold a later sighting into this snapshot. Later values win field by
    /// field, but a resolved name is never replaced by a blank one and a
    /// known side is never replaced by an undetermined one.
    pub fn merge(&mut self, other: &Card) {
        if other.has_resolved_name() || !self.has_resolved_name() {
            self.name = other.name.clone();
        }
        if !other.card_id.is_empty() {
            self.card_id = other.card_id.clone();
        }
        if other.side.is_some() {
            self.side = other.side;
        }
        for (k, v) in &other.tags {
            self.tags.insert(k.clone(), v.clone());
        }
    }

    pub fn props(&self) -> EntityProps {
        EntityProps::new(self.id, self.name.clone(), self.card_id.clone(), self.side())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedAction {
    Creating,
    Updating,
}

/// Full snapshot announced inline by a `FULL_ENTITY`/`SHOW_ENTITY`/`CHANGE_ENTITY` run.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedEntity {
    pub action: EmbeddedAction,
    pub entity: Card,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagChange {
    /// Absent when the entity string could not be resolved.
    pub entity: Option<Entity>,
    pub tag: String,
    pub value: String,
}

impl TagChange {
    pub fn card(&self) -> Option<&Card> {
        self.entity.as_ref().and_then(Entity::as_card)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaData {
    pub key: String,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Block(Block),
    SubSpell(SubSpell),
    Tag(TagChange),
    Meta(MetaData),
    Embedded(EmbeddedEntity),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub block_type: String,
    pub trigger_keyword: Option<String>,
    pub source: Option<Entity>,
    pub target: Option<Entity>,
    pub entries: Vec<Entry>,
}

impl Block {
    pub fn is(&self, block_type: &str) -> bool {
        self.block_type == block_type
    }

    pub fn source_card(&self) -> Option<&Card> {
        self.source.as_ref().and_then(Entity::as_card)
    }

    pub fn target_card(&self) -> Option<&Card> {
        self.target.as_ref().and_then(Entity::as_card)
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        fn entity(e: Option<&Entity>) -> String {
            match e {
                None => "-".to_string(),
                Some(Entity::Game) => "GameEntity".to_string(),
                Some(Entity::Player { side }) => format!("player({side:?})"),
                Some(Entity::Card(c)) => format!("{}#{}", c.name, c.id),
            }
        }
        format!(
            "{} source={} target={}",
            self.block_type,
            entity(self.source.as_ref()),
            entity(self.target.as_ref())
        )
    }
}

/// Unlabeled nested scope; inlined into its parent when analyzed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubSpell {
    pub entries: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_resolved_name_and_known_side() {
        let mut card = Card::new(12);
        card.name = "Wisp".into();
        card.side = Some(Side::Top);

        let mut later = Card::new(12);
        later.set_tag("ZONE", "PLAY");
        card.merge(&later);

        assert_eq!(card.name, "Wisp");
        assert_eq!(card.side, Some(Side::Top));
        assert_eq!(card.tag("ZONE"), Some("PLAY"));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut partial = Card::new(3);
        partial.name = "Ogre".into();
        partial.card_id = "CS2_200".into();
        partial.set_tag("ZONE", "HAND");

        let mut once = Card::new(3);
        once.merge(&partial);
        let mut twice = once.clone();
        twice.merge(&partial);
        assert_eq!(once, twice);
    }
}
