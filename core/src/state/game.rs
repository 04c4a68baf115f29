use hashbrown::{HashMap, HashSet};
use hearthwatch_types::{EntityId, MatchLogEntry, Side};

use super::player::Player;
use crate::log::Card;

/// Durable per-game aggregate: players, the match log, and the entity cache.
///
/// Everything is discarded together by [`GameState::reset`]; nothing
/// survives a game boundary.
#[derive(Debug, Default)]
pub struct GameState {
    players: Vec<Player>,
    match_log: Vec<MatchLogEntry>,
    /// Last-known-good snapshot of every entity seen this game
    entities: HashMap<EntityId, Card>,
    /// Ids that appear in the match log without a real name yet
    unresolved: HashSet<EntityId>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.players.clear();
        self.match_log.clear();
        self.entities.clear();
        self.unresolved.clear();
    }

    // --- Players ---

    /// Upsert by id. A registration that still carries the placeholder name
    /// only has its name replaced; any other existing registration wins.
    pub fn add_player(&mut self, player: Player) -> &mut Player {
        if let Some(idx) = self.players.iter().position(|p| p.id == player.id) {
            let existing = &mut self.players[idx];
            if existing.has_placeholder_name() {
                existing.name = player.name;
            }
            return existing;
        }

        if self.players.len() >= 2 {
            tracing::warn!(id = player.id, name = %player.name, "more than two players registered");
        }
        self.players.push(player);
        let last = self.players.len() - 1;
        &mut self.players[last]
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_by_id(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_by_name_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn player_by_side(&self, side: Side) -> Option<&Player> {
        self.players.iter().find(|p| p.position == side)
    }

    pub fn player_by_side_mut(&mut self, side: Side) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.position == side)
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    // --- Match log ---

    pub fn match_log(&self) -> &[MatchLogEntry] {
        &self.match_log
    }

    /// Entries may be patched in place but never removed.
    pub fn match_log_mut(&mut self) -> &mut [MatchLogEntry] {
        &mut self.match_log
    }

    pub fn add_match_log_entries(&mut self, entries: impl IntoIterator<Item = MatchLogEntry>) {
        for entry in entries {
            for props in entry.participants() {
                if !props.has_resolved_name() {
                    self.unresolved.insert(props.entity_id);
                }
            }
            self.match_log.push(entry);
        }
    }

    // --- Entity cache ---

    pub fn entity(&self, id: EntityId) -> Option<&Card> {
        self.entities.get(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_unresolved(&self, id: EntityId) -> bool {
        self.unresolved.contains(&id)
    }

    /// Merge a partial sighting into the cache. Once an id flagged as
    /// unresolved gains a real name, every match-log entry mentioning it is
    /// patched with the resolved name and card id.
    pub fn resolve_entity(&mut self, partial: &Card) {
        let card = self
            .entities
            .entry(partial.id)
            .or_insert_with(|| Card::new(partial.id));
        card.merge(partial);

        if !card.has_resolved_name() || !self.unresolved.remove(&partial.id) {
            return;
        }

        tracing::debug!(id = card.id, name = %card.name, "patching match log with resolved name");
        for entry in &mut self.match_log {
            for props in entry.participants_mut() {
                if props.entity_id == card.id && !props.has_resolved_name() {
                    props.card_name = card.name.clone();
                    if !card.card_id.is_empty() {
                        props.card_id = card.card_id.clone();
                    }
                }
            }
        }
    }
}
