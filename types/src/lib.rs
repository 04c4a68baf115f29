//! Value types shared between the hearthwatch parser and its consumers.
//!
//! Overlays and deck trackers only need these to render what the parser
//! announces; they never depend on `hearthwatch-core` itself.

pub mod formatting;
pub mod match_log;

pub use match_log::{EntityProps, MatchLogEntry, MatchLogType};

use serde::{Deserialize, Serialize};

/// Entity ids are unique within one game and never reused across a reset.
pub type EntityId = u32;

/// Name the client prints for a card whose identity is still hidden.
pub const UNKNOWN_ENTITY_NAME: &str = "UNKNOWN ENTITY [cardType=INVALID]";

/// Name the client prints for the opposing player before it is revealed.
pub const UNKNOWN_PLAYER_NAME: &str = "UNKNOWN HUMAN PLAYER";

/// True when a card name is blank or one of the client's hidden-card sentinels.
pub fn is_unresolved_name(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.starts_with("UNKNOWN ENTITY")
}

/// Which half of the board a player (and everything they control) sits on.
/// The local player is `Bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    #[default]
    Bottom,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
        }
    }
}
