//! Line-level reading of the client's `Power.log`: entity strings, embedded
//! entity runs, and the block stack machine.

pub mod block;
pub mod block_reader;
pub mod embedded;
pub mod entity;


pub use block::{
    Block, Card, EmbeddedAction, EmbeddedEntity, Entity, Entry, MetaData, SubSpell, TagChange,
};
pub use block_reader::{BlockReader, is_structural};
pub use embedded::{EmbeddedEntityReader, EmbeddedOutcome};
pub use entity::{parse_entity, parse_numeric_id, side_for_player_index};

use memchr::memmem;

/// Authoritative power stream.
pub const GAME_STATE_POWER: &str = "GameState.DebugPrintPower() -";
/// Replay of the power stream used only to learn names.
pub const POWER_TASK_LIST: &str = "PowerTaskList.DebugPrintPower() -";
pub const GAME_STATE_GAME: &str = "GameState.DebugPrintGame() -";
pub const ENTITY_CHOICES: &str = "GameState.DebugPrintEntityChoices() -";
pub const ENTITIES_CHOSEN: &str = "GameState.DebugPrintEntitiesChosen() -";
pub const ZONE_CHANGE: &str = "ZoneChangeList.ProcessChanges() -";

/// Text after `prefix` with indentation removed, or `None` when the line
/// belongs to another family.
pub fn line_body<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let start = memmem::find(line.as_bytes(), prefix.as_bytes())?;
    Some(line[start + prefix.len()..].trim())
}
