//! Embedded-entity runs (`FULL_ENTITY`, `SHOW_ENTITY`, `CHANGE_ENTITY`).
//!
//! A run is a header line followed by any number of `tag=K value=V` lines.
//! The format has no terminator: a run ends only when a line arrives that is
//! neither a tag line nor another header. That line is reported unhandled so
//! the caller can offer it elsewhere.

use std::sync::LazyLock;

use regex::Regex;

use super::block::{EmbeddedAction, EmbeddedEntity, Entity};
use super::entity::{parse_entity, side_for_player_index};
use crate::game_data::tag;
use crate::state::GameState;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:FULL_ENTITY|SHOW_ENTITY|CHANGE_ENTITY) - (Creating|Updating) (?:ID=|Entity=)?(.*?) CardID=(\S*)\s*$",
    )
    .unwrap()
});

static TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tag=(\S+) value=(.*)$").unwrap());

#[derive(Debug, Default, PartialEq)]
pub struct EmbeddedOutcome {
    pub handled: bool,
    pub result: Option<EmbeddedEntity>,
}

#[derive(Debug, Default)]
pub struct EmbeddedEntityReader {
    current: Option<EmbeddedEntity>,
}

impl EmbeddedEntityReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_progress(&self) -> Option<&EmbeddedEntity> {
        self.current.as_ref()
    }

    /// Offer one line body (prefix already stripped).
    pub fn handle_line(&mut self, body: &str, state: &GameState) -> EmbeddedOutcome {
        if let Some(header) = parse_header(body, state) {
            return EmbeddedOutcome {
                handled: true,
                result: self.current.replace(header),
            };
        }

        let Some(current) = self.current.as_mut() else {
            return EmbeddedOutcome::default();
        };

        if let Some(caps) = TAG_LINE.captures(body) {
            let key = &caps[1];
            let value = caps[2].trim();
            if key == tag::CONTROLLER {
                if let Some(side) = value
                    .parse()
                    .ok()
                    .and_then(|index| side_for_player_index(index, state))
                {
                    current.entity.side = Some(side);
                }
            }
            current.entity.set_tag(key, value);
            return EmbeddedOutcome {
                handled: true,
                result: None,
            };
        }

        EmbeddedOutcome {
            handled: false,
            result: self.current.take(),
        }
    }

    /// Drop any in-progress entity.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

fn parse_header(body: &str, state: &GameState) -> Option<EmbeddedEntity> {
    let caps = HEADER.captures(body)?;
    let action = match &caps[1] {
        "Creating" => EmbeddedAction::Creating,
        _ => EmbeddedAction::Updating,
    };
    let Entity::Card(mut card) = parse_entity(&caps[2], state)? else {
        return None;
    };
    let card_id = &caps[3];
    if !card_id.is_empty() {
        card.card_id = card_id.to_string();
    }
    Some(EmbeddedEntity {
        action,
        entity: card,
    })
}
