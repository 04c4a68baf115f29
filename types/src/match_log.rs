//! Match-log entries: one per game-meaningful action (play, attack, trigger).

use serde::{Deserialize, Serialize};

use crate::{EntityId, Side, is_unresolved_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLogType {
    Play,
    Attack,
    Trigger,
}

/// Snapshot of one participant of a match-log entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProps {
    pub card_name: String,
    pub card_id: String,
    pub entity_id: EntityId,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healing: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead: Option<bool>,
}

impl EntityProps {
    pub fn new(
        entity_id: EntityId,
        card_name: impl Into<String>,
        card_id: impl Into<String>,
        side: Side,
    ) -> Self {
        Self {
            card_name: card_name.into(),
            card_id: card_id.into(),
            entity_id,
            side,
            ..Default::default()
        }
    }

    pub fn has_resolved_name(&self) -> bool {
        !is_unresolved_name(&self.card_name)
    }

    pub fn is_dead(&self) -> bool {
        self.dead == Some(true)
    }

    pub fn add_damage(&mut self, amount: i32) {
        self.damage = Some(self.damage.unwrap_or(0) + amount);
    }

    pub fn add_healing(&mut self, amount: i32) {
        self.healing = Some(self.healing.unwrap_or(0) + amount);
    }

    /// Fold a later sighting of the same entity into this one.
    /// A resolved name is never replaced by a placeholder.
    fn absorb(&mut self, other: EntityProps) {
        if other.has_resolved_name() || !self.has_resolved_name() {
            self.card_name = other.card_name;
        }
        if !other.card_id.is_empty() {
            self.card_id = other.card_id;
        }
        self.side = other.side;
        if other.damage.is_some() {
            self.damage = other.damage;
        }
        if other.healing.is_some() {
            self.healing = other.healing;
        }
        if other.dead.is_some() {
            self.dead = other.dead;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLogEntry {
    #[serde(rename = "type")]
    pub entry_type: MatchLogType,
    pub mana_spent: i32,
    pub source: EntityProps,
    pub targets: Vec<EntityProps>,
}

impl MatchLogEntry {
    pub fn new(entry_type: MatchLogType, source: EntityProps) -> Self {
        Self {
            entry_type,
            mana_spent: 0,
            source,
            targets: Vec::new(),
        }
    }

    /// Add a target, merging into an existing target with the same id.
    pub fn add_target(&mut self, target: EntityProps) -> &mut EntityProps {
        match self
            .targets
            .iter()
            .position(|t| t.entity_id == target.entity_id)
        {
            Some(idx) => {
                self.targets[idx].absorb(target);
                &mut self.targets[idx]
            }
            None => {
                self.targets.push(target);
                let last = self.targets.len() - 1;
                &mut self.targets[last]
            }
        }
    }

    pub fn remove_target(&mut self, entity_id: EntityId) -> Option<EntityProps> {
        let idx = self.targets.iter().position(|t| t.entity_id == entity_id)?;
        Some(self.targets.remove(idx))
    }

    pub fn has_target(&self, entity_id: EntityId) -> bool {
        self.targets.iter().any(|t| t.entity_id == entity_id)
    }

    /// Source or target carrying this id.
    pub fn participant_mut(&mut self, entity_id: EntityId) -> Option<&mut EntityProps> {
        if self.source.entity_id == entity_id {
            return Some(&mut self.source);
        }
        self.targets.iter_mut().find(|t| t.entity_id == entity_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = &EntityProps> {
        std::iter::once(&self.source).chain(self.targets.iter())
    }

    pub fn participants_mut(&mut self) -> impl Iterator<Item = &mut EntityProps> {
        std::iter::once(&mut self.source).chain(self.targets.iter_mut())
    }

    /// Every participant has already been marked dead.
    pub fn is_fully_resolved(&self) -> bool {
        self.participants().all(EntityProps::is_dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(id: EntityId, name: &str) -> EntityProps {
        EntityProps::new(id, name, "", Side::Bottom)
    }

    #[test]
    fn add_target_never_duplicates_ids() {
        let mut entry = MatchLogEntry::new(MatchLogType::Play, props(1, "Fireball"));
        entry.add_target(props(7, ""));
        entry.add_target(props(8, "Wisp"));
        entry.add_target(props(7, "Boulderfist Ogre"));
        entry.add_target(props(8, ""));
        entry.add_target(props(7, ""));

        let ids: Vec<_> = entry.targets.iter().map(|t| t.entity_id).collect();
        assert_eq!(ids, vec![7, 8]);
        assert_eq!(entry.targets[0].card_name, "Boulderfist Ogre");
        assert_eq!(entry.targets[1].card_name, "Wisp");
    }

    #[test]
    fn add_target_keeps_existing_damage_unless_replaced() {
        let mut entry = MatchLogEntry::new(MatchLogType::Attack, props(1, "Wolfrider"));
        entry.add_target(props(2, "Yeti")).add_damage(3);
        entry.add_target(props(2, "Yeti"));
        assert_eq!(entry.targets[0].damage, Some(3));
    }

    #[test]
    fn fully_resolved_requires_every_participant_dead() {
        let mut entry = MatchLogEntry::new(MatchLogType::Attack, props(1, "A"));
        entry.add_target(props(2, "B"));
        assert!(!entry.is_fully_resolved());
        entry.participant_mut(2).unwrap().dead = Some(true);
        assert!(!entry.is_fully_resolved());
        entry.participant_mut(1).unwrap().dead = Some(true);
        assert!(entry.is_fully_resolved());
    }

    #[test]
    fn serializes_with_camel_case_and_type_tag() {
        let mut entry = MatchLogEntry::new(MatchLogType::Trigger, props(4, "Knife Juggler"));
        entry.add_target(props(9, "Jaina")).add_damage(1);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "trigger");
        assert_eq!(json["manaSpent"], 0);
        assert_eq!(json["source"]["cardName"], "Knife Juggler");
        assert_eq!(json["targets"][0]["entityId"], 9);
        assert_eq!(json["targets"][0]["damage"], 1);
        assert!(json["targets"][0].get("healing").is_none());
    }
}
