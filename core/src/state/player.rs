use hearthwatch_types::{EntityId, EntityProps, Side, UNKNOWN_PLAYER_NAME};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Playing,
    Won,
    Lost,
    Tied,
    Conceded,
}

impl PlayerStatus {
    /// Map a final `PLAYSTATE` value; intermediate states return `None`.
    pub fn from_playstate(value: &str) -> Option<Self> {
        match value {
            "WON" => Some(Self::Won),
            "LOST" => Some(Self::Lost),
            "TIED" => Some(Self::Tied),
            "CONCEDED" => Some(Self::Conceded),
            _ => None,
        }
    }
}

/// Open "choose one of three" prompt for a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub enabled: bool,
    pub choice_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub status: PlayerStatus,
    pub turn: bool,
    pub position: Side,
    pub quests: Vec<EntityProps>,
    pub secrets: Vec<EntityProps>,
    pub discovery: Discovery,
    /// Last seen value of the player's cumulative resource counter.
    pub mana_spent: i32,
    pub card_count: u32,
    pub timeout: u32,
}

impl Player {
    pub fn new(id: u32, name: impl Into<String>, position: Side) -> Self {
        Self {
            id,
            name: name.into(),
            status: PlayerStatus::default(),
            turn: false,
            position,
            quests: Vec::new(),
            secrets: Vec::new(),
            discovery: Discovery::default(),
            mana_spent: 0,
            card_count: 0,
            timeout: 0,
        }
    }

    pub fn has_placeholder_name(&self) -> bool {
        self.name.is_empty() || self.name == UNKNOWN_PLAYER_NAME
    }

    pub fn remove_secret(&mut self, entity_id: EntityId) {
        self.secrets.retain(|s| s.entity_id != entity_id);
        self.quests.retain(|q| q.entity_id != entity_id);
    }
}
