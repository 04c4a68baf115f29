use hearthwatch_types::{EntityId, MatchLogEntry, MatchLogType, Side};
use serde::Serialize;

/// Facts announced by the parser, in the order the log revealed them.
/// Block-derived signals carry the match-log entry they announce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GameSignal {
    // Game lifecycle
    GameStart,
    GameOver,
    PlayerJoined {
        id: u32,
        name: String,
    },
    TurnChange {
        player: String,
    },
    ZoneChange {
        entity_id: EntityId,
        card_name: String,
        side: Side,
        from: String,
        to: String,
    },
    TagChange {
        entity: String,
        tag: String,
        value: String,
    },

    // Choices
    MulliganStart {
        player: String,
    },
    MulliganResult {
        player: String,
    },
    DiscoveryStart {
        player: String,
        choice_id: u32,
    },
    DiscoveryEnd {
        player: String,
        choice_id: u32,
    },
    ChoiceId {
        player: String,
        choice_id: u32,
    },

    // Match log
    CardPlayed(MatchLogEntry),
    Attack(MatchLogEntry),
    Trigger(MatchLogEntry),
}

impl GameSignal {
    /// Wrap a match-log entry in the signal matching its type.
    pub fn from_entry(entry: MatchLogEntry) -> Self {
        match entry.entry_type {
            MatchLogType::Play => GameSignal::CardPlayed(entry),
            MatchLogType::Attack => GameSignal::Attack(entry),
            MatchLogType::Trigger => GameSignal::Trigger(entry),
        }
    }

    /// Event name subscribers register for.
    pub fn name(&self) -> &'static str {
        match self {
            GameSignal::GameStart => "game-start",
            GameSignal::GameOver => "game-over",
            GameSignal::PlayerJoined { .. } => "player-joined",
            GameSignal::TurnChange { .. } => "turn-change",
            GameSignal::ZoneChange { .. } => "zone-change",
            GameSignal::TagChange { .. } => "tag-change",
            GameSignal::MulliganStart { .. } => "mulligan-start",
            GameSignal::MulliganResult { .. } => "mulligan-result",
            GameSignal::DiscoveryStart { .. } => "discovery-start",
            GameSignal::DiscoveryEnd { .. } => "discovery-end",
            GameSignal::ChoiceId { .. } => "choice-id",
            GameSignal::CardPlayed(_) => "card-played",
            GameSignal::Attack(_) => "attack",
            GameSignal::Trigger(_) => "trigger",
        }
    }

    pub fn match_log_entry(&self) -> Option<&MatchLogEntry> {
        match self {
            GameSignal::CardPlayed(entry) | GameSignal::Attack(entry) | GameSignal::Trigger(entry) => {
                Some(entry)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearthwatch_types::EntityProps;

    #[test]
    fn entries_map_to_their_event_names() {
        let source = EntityProps::new(4, "Wolfrider", "CS2_124", Side::Bottom);
        let attack = GameSignal::from_entry(MatchLogEntry::new(MatchLogType::Attack, source.clone()));
        assert_eq!(attack.name(), "attack");
        assert_eq!(attack.match_log_entry().unwrap().source, source);

        let play = GameSignal::from_entry(MatchLogEntry::new(MatchLogType::Play, source));
        assert_eq!(play.name(), "card-played");
        assert!(GameSignal::GameStart.match_log_entry().is_none());
    }
}
