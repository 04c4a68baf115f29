//! Fixed tokens the client prints in `Power.log`.

/// Tag names that the parser reasons about.
pub mod tag {
    pub const ZONE: &str = "ZONE";
    pub const ZONE_POSITION: &str = "ZONE_POSITION";
    pub const CONTROLLER: &str = "CONTROLLER";
    pub const CREATOR: &str = "CREATOR";
    pub const ATTACHED: &str = "ATTACHED";
    pub const CARDTYPE: &str = "CARDTYPE";
    pub const SPAWN_TIME_COUNT: &str = "SPAWN_TIME_COUNT";
    pub const PREDAMAGE: &str = "PREDAMAGE";
    pub const PREHEALING: &str = "PREHEALING";
    pub const PROPOSED_DEFENDER: &str = "PROPOSED_DEFENDER";
    /// Running total per player; the log never prints a per-play cost.
    pub const NUM_RESOURCES_SPENT_THIS_GAME: &str = "NUM_RESOURCES_SPENT_THIS_GAME";
    pub const CANT_PLAY: &str = "CANT_PLAY";
    pub const SILENCED: &str = "SILENCED";
    pub const REVEALED: &str = "REVEALED";
    pub const QUEST: &str = "QUEST";
    pub const CURRENT_PLAYER: &str = "CURRENT_PLAYER";
    pub const PLAYSTATE: &str = "PLAYSTATE";
    pub const STATE: &str = "STATE";
    pub const MULLIGAN_STATE: &str = "MULLIGAN_STATE";
    pub const TIMEOUT: &str = "TIMEOUT";
}

pub mod zone {
    pub const PLAY: &str = "PLAY";
    pub const HAND: &str = "HAND";
    pub const GRAVEYARD: &str = "GRAVEYARD";
    pub const SECRET: &str = "SECRET";
    pub const REMOVED_FROM_GAME: &str = "REMOVEDFROMGAME";
}

pub mod card_type {
    pub const ENCHANTMENT: &str = "ENCHANTMENT";
    pub const HERO_POWER: &str = "HERO_POWER";
}

pub mod meta {
    pub const DAMAGE: &str = "DAMAGE";
    pub const HEALING: &str = "HEALING";
}

pub mod block_type {
    pub const PLAY: &str = "PLAY";
    pub const ATTACK: &str = "ATTACK";
    pub const TRIGGER: &str = "TRIGGER";
    pub const POWER: &str = "POWER";
    pub const DEATHS: &str = "DEATHS";
}

/// Token the client uses for the game entity in entity strings.
pub const GAME_ENTITY: &str = "GameEntity";

/// Trigger keywords whose TRIGGER blocks become match-log entries.
pub static LOGGED_TRIGGER_KEYWORDS: phf::Set<&'static str> = phf::phf_set! {
    "DEATHRATTLE",
    "SECRET",
    "TRIGGER_VISUAL",
    "INSPIRE",
    "SPELLBURST",
    "FRENZY",
    "OVERKILL",
    "HONORABLE_KILL",
    "OUTCAST",
    "COMBO",
    "LIFESTEAL",
};

/// Single tag/value pairs that mark an entity as affected by the block.
pub static SIGNAL_TAG_VALUES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "CANT_PLAY" => "1",
    "SILENCED" => "1",
    "REVEALED" => "1",
    "ZONE" => "SECRET",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_lists_hold_expected_tokens() {
        assert!(LOGGED_TRIGGER_KEYWORDS.contains("DEATHRATTLE"));
        assert!(!LOGGED_TRIGGER_KEYWORDS.contains("TAG_NOT_SET"));
        assert_eq!(SIGNAL_TAG_VALUES.get(tag::ZONE), Some(&zone::SECRET));
    }
}
