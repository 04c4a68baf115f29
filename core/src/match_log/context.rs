//! Analytical view over one completed block.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;
use hearthwatch_types::EntityId;

use crate::game_data::{meta, tag};
use crate::log::{Block, Card, Entry};
use crate::state::GameState;

/// Entities sighted anywhere in a top-level block, merged by id.
#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: HashMap<EntityId, Card>,
    /// First-sighting order, so commits replay deterministically.
    order: Vec<EntityId>,
}

impl EntityCollection {
    pub fn get(&self, id: EntityId) -> Option<&Card> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    fn merge(&mut self, sighting: &Card) -> &mut Card {
        let id = sighting.id;
        if !self.entities.contains_key(&id) {
            self.order.push(id);
        }
        let card = self.entities.entry(id).or_insert_with(|| Card::new(id));
        card.merge(sighting);
        card
    }

    /// Fold a block's own source and target, then its entries.
    fn absorb_block(&mut self, block: &Block) {
        for card in [block.source_card(), block.target_card()].into_iter().flatten() {
            self.merge(card);
        }
        self.absorb(&block.entries);
    }

    /// Fold every sighting in `entries` (recursively) into the collection.
    fn absorb(&mut self, entries: &[Entry]) {
        for entry in entries {
            match entry {
                Entry::Embedded(embedded) => {
                    self.merge(&embedded.entity);
                }
                Entry::Tag(change) => {
                    if let Some(card) = change.card() {
                        self.merge(card).set_tag(change.tag.as_str(), change.value.as_str());
                    }
                }
                Entry::Block(block) => self.absorb_block(block),
                Entry::SubSpell(sub) => self.absorb(&sub.entries),
                Entry::Meta(_) => {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthKind {
    Damage,
    Healing,
}

/// Amount of damage or healing attributed to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthChange {
    pub entity_id: EntityId,
    pub kind: HealthKind,
    pub amount: i32,
}

/// Per-block view. Child contexts share the parent's entity collection, so
/// everything learned anywhere in a top-level block is visible at every depth.
#[derive(Debug)]
pub struct BlockContext<'b> {
    block: &'b Block,
    entities: Rc<RefCell<EntityCollection>>,
    flattened: Vec<&'b Entry>,
    /// Entity most recently tagged with a nonzero PREDAMAGE/PREHEALING.
    pending_health: Cell<Option<EntityId>>,
}

impl<'b> BlockContext<'b> {
    /// Context for a top-level block. Every sighting in the whole tree,
    /// block sources and targets included, is merged up front.
    pub fn new(block: &'b Block) -> Self {
        let mut collection = EntityCollection::default();
        collection.absorb_block(block);
        Self::with_entities(block, Rc::new(RefCell::new(collection)))
    }

    /// Context for a nested block, sharing this context's entities.
    pub fn child(&self, block: &'b Block) -> BlockContext<'b> {
        Self::with_entities(block, Rc::clone(&self.entities))
    }

    fn with_entities(block: &'b Block, entities: Rc<RefCell<EntityCollection>>) -> Self {
        let mut flattened = Vec::new();
        flatten_into(&block.entries, &mut flattened);
        Self {
            block,
            entities,
            flattened,
            pending_health: Cell::new(None),
        }
    }

    pub fn block(&self) -> &'b Block {
        self.block
    }

    /// Entries with sub-spell boundaries inlined.
    pub fn flattened_entries(&self) -> &[&'b Entry] {
        &self.flattened
    }

    /// Child blocks of this scope, including those inside sub-spells.
    pub fn blocks(&self) -> impl Iterator<Item = &'b Block> + '_ {
        self.flattened.iter().filter_map(|entry| match *entry {
            Entry::Block(block) => Some(block),
            _ => None,
        })
    }

    /// Every embedded snapshot of `id` in this scope, folded in encounter order.
    pub fn merged_entity(&self, id: EntityId) -> Option<Card> {
        let mut merged: Option<Card> = None;
        for entry in &self.flattened {
            if let Entry::Embedded(embedded) = entry
                && embedded.entity.id == id
            {
                merged
                    .get_or_insert_with(|| Card::new(id))
                    .merge(&embedded.entity);
            }
        }
        merged
    }

    /// Latest known state of `id`: the durable cache overlaid with everything
    /// this block has revealed.
    pub fn latest(&self, id: EntityId, state: &GameState) -> Card {
        let mut card = state.entity(id).cloned().unwrap_or_else(|| Card::new(id));
        if let Some(seen) = self.entities.borrow().get(id) {
            card.merge(seen);
        }
        card
    }

    pub fn entity_count(&self) -> usize {
        self.entities.borrow().len()
    }

    /// Correlate `PREDAMAGE`/`PREHEALING` tags with the following
    /// `DAMAGE`/`HEALING` meta data. Must be fed every entry in order.
    pub fn detect_health_change(&self, entry: &Entry) -> Option<HealthChange> {
        match entry {
            Entry::Tag(change) if change.tag == tag::PREDAMAGE || change.tag == tag::PREHEALING => {
                let nonzero = change.value.parse::<i32>().is_ok_and(|v| v != 0);
                if nonzero && let Some(card) = change.card() {
                    self.pending_health.set(Some(card.id));
                }
                None
            }
            Entry::Meta(data) if data.value != 0 => {
                let kind = match data.key.as_str() {
                    meta::DAMAGE => HealthKind::Damage,
                    meta::HEALING => HealthKind::Healing,
                    _ => return None,
                };
                self.pending_health.get().map(|entity_id| HealthChange {
                    entity_id,
                    kind,
                    amount: data.value,
                })
            }
            _ => None,
        }
    }

    /// Write every entity known to the shared collection into the cache.
    pub fn commit_to_state(&self, state: &mut GameState) {
        for card in self.entities.borrow().iter() {
            state.resolve_entity(card);
        }
    }
}

fn flatten_into<'b>(entries: &'b [Entry], out: &mut Vec<&'b Entry>) {
    for entry in entries {
        match entry {
            Entry::SubSpell(sub) => flatten_into(&sub.entries, out),
            other => out.push(other),
        }
    }
}
