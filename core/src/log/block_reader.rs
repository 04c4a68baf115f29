//! Stack machine that rebuilds nested block trees from flat prefixed lines.
//!
//! ```text
//! BLOCK_START BlockType=ATTACK Entity=[...] ... Target=[...]   push Block
//!     TAG_CHANGE Entity=[...] tag=PREDAMAGE value=3            Tag entry
//!     SUB_SPELL_START - ...                                     push SubSpell
//!         FULL_ENTITY - Creating ID=70 CardID=...               Embedded entry
//!             tag=ZONE value=PLAY
//!     SUB_SPELL_END                                             pop into parent
//!     META_DATA - Meta=DAMAGE Data=3 InfoCount=1                Meta entry
//! BLOCK_END                                                     pop, yield Block
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::block::{Block, EmbeddedEntity, Entity, Entry, MetaData, SubSpell, TagChange};
use super::embedded::EmbeddedEntityReader;
use super::entity::{parse_entity, parse_numeric_id};
use super::line_body;
use crate::state::GameState;

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^BLOCK_START BlockType=(\S+) Entity=(.*?)(?: EffectCardId=.*?)?(?: EffectIndex=\S+)? Target=(.*?) SubOption=\S+(?: TriggerKeyword=(\S+))?",
    )
    .unwrap()
});

/// Fallback for `BLOCK_START` lines missing the optional trailing fields.
static BLOCK_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BLOCK_START BlockType=(\S+)").unwrap());

static HIDE_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^HIDE_ENTITY - Entity=(.*?) tag=(\S+) value=(\S*)").unwrap()
});

static TAG_CHANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^TAG_CHANGE Entity=(.*?) tag=(\S+) value=(\S*)").unwrap()
});

static META_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^META_DATA - Meta=(\S+) Data=(-?\d+)").unwrap());

/// Body prefixes the reader treats as its own productions.
const STRUCTURAL_PREFIXES: &[&str] = &[
    "BLOCK_START",
    "BLOCK_END",
    "SUB_SPELL_START",
    "SUB_SPELL_END",
    "META_DATA",
    "Info[",
    "FULL_ENTITY",
    "SHOW_ENTITY",
    "CHANGE_ENTITY",
    "HIDE_ENTITY",
    "tag=",
];

/// True when a line body belongs to the block grammar rather than being a
/// standalone fact. `TAG_CHANGE` is deliberately absent: tag changes are
/// recorded into the open block but remain visible to fact parsers.
pub fn is_structural(body: &str) -> bool {
    STRUCTURAL_PREFIXES.iter().any(|p| body.starts_with(p))
}

#[derive(Debug)]
enum Frame {
    Block(Block),
    SubSpell(SubSpell),
}

impl Frame {
    fn entries(&self) -> &[Entry] {
        match self {
            Frame::Block(b) => &b.entries,
            Frame::SubSpell(s) => &s.entries,
        }
    }

    fn entries_mut(&mut self) -> &mut Vec<Entry> {
        match self {
            Frame::Block(b) => &mut b.entries,
            Frame::SubSpell(s) => &mut s.entries,
        }
    }

    fn into_entry(self) -> Entry {
        match self {
            Frame::Block(b) => Entry::Block(b),
            Frame::SubSpell(s) => Entry::SubSpell(s),
        }
    }
}

/// Reads one line family (identified by its prefix) into block trees.
#[derive(Debug)]
pub struct BlockReader {
    prefix: &'static str,
    stack: Vec<Frame>,
    embedded: EmbeddedEntityReader,
}

impl BlockReader {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            stack: Vec::new(),
            embedded: EmbeddedEntityReader::new(),
        }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// True when the line carries this reader's prefix and is one of its
    /// structural productions.
    pub fn recognizes(&self, line: &str) -> bool {
        line_body(line, self.prefix).is_some_and(is_structural)
    }

    /// True for this stream's `CREATE_GAME` line.
    pub fn is_create_game(&self, line: &str) -> bool {
        line_body(line, self.prefix) == Some("CREATE_GAME")
    }

    /// Abandon any unfinished block.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.embedded.reset();
    }

    /// Feed one raw line. Returns a block only when a top-level block closes.
    pub fn read_line(&mut self, line: &str, state: &mut GameState) -> Option<Block> {
        let body = line_body(line, self.prefix)?;

        let outcome = self.embedded.handle_line(body, state);
        if let Some(embedded) = outcome.result {
            self.push_embedded(embedded, state);
        }
        if outcome.handled {
            return None;
        }

        if body.starts_with("BLOCK_START") {
            self.start_block(body, state);
            return None;
        }
        if body.starts_with("BLOCK_END") || body.starts_with("SUB_SPELL_END") {
            return self.end_frame();
        }
        if let Some(caps) = HIDE_ENTITY.captures(body) {
            self.hide_entity(&caps, state);
            return None;
        }
        if self.stack.is_empty() {
            return None;
        }
        if body.starts_with("SUB_SPELL_START") {
            self.stack.push(Frame::SubSpell(SubSpell::default()));
            return None;
        }
        if let Some(caps) = TAG_CHANGE.captures(body) {
            let entity = self.resolve_tag_entity(&caps[1], state);
            self.push_entry(Entry::Tag(TagChange {
                entity,
                tag: caps[2].to_string(),
                value: caps[3].to_string(),
            }));
            return None;
        }
        if let Some(caps) = META_DATA.captures(body) {
            if let Ok(value) = caps[2].parse() {
                self.push_entry(Entry::Meta(MetaData {
                    key: caps[1].to_string(),
                    value,
                }));
                return None;
            }
        }

        tracing::debug!(
            prefix = self.prefix,
            line = body,
            "dropping unrecognized line inside block"
        );
        None
    }

    fn start_block(&mut self, body: &str, state: &GameState) {
        let Some(caps) = BLOCK_START.captures(body) else {
            // Still open a frame so the matching BLOCK_END stays balanced.
            tracing::debug!(line = body, "malformed BLOCK_START");
            let block_type = BLOCK_TYPE
                .captures(body)
                .map(|caps| caps[1].to_string())
                .unwrap_or_default();
            self.stack.push(Frame::Block(Block {
                block_type,
                ..Block::default()
            }));
            return;
        };
        let target = caps.get(3).map_or("", |m| m.as_str()).trim();
        let block = Block {
            block_type: caps[1].to_string(),
            trigger_keyword: caps.get(4).map(|m| m.as_str().to_string()),
            source: parse_entity(&caps[2], state),
            target: if target == "0" {
                None
            } else {
                parse_entity(target, state)
            },
            entries: Vec::new(),
        };
        self.stack.push(Frame::Block(block));
    }

    /// A card leaving view, e.g. shuffled back into the deck. Inside a block
    /// it is recorded as a tag change; outside one it goes straight to the cache.
    fn hide_entity(&mut self, caps: &regex::Captures<'_>, state: &mut GameState) {
        let change = TagChange {
            entity: self.resolve_tag_entity(&caps[1], state),
            tag: caps[2].to_string(),
            value: caps[3].to_string(),
        };
        if !self.stack.is_empty() {
            self.push_entry(Entry::Tag(change));
            return;
        }
        if let Some(card) = change.card() {
            let mut card = card.clone();
            card.set_tag(change.tag.as_str(), change.value.as_str());
            state.resolve_entity(&card);
        }
    }

    fn end_frame(&mut self) -> Option<Block> {
        // An END with nothing open comes from a truncated log; ignore it.
        let frame = self.stack.pop()?;
        match self.stack.last_mut() {
            Some(parent) => {
                parent.entries_mut().push(frame.into_entry());
                None
            }
            None => match frame {
                Frame::Block(block) => Some(block),
                Frame::SubSpell(_) => None,
            },
        }
    }

    /// Numeric ids already announced by an embedded entity in this frame keep
    /// that richer snapshot; everything else goes through the resolver.
    fn resolve_tag_entity(&self, text: &str, state: &GameState) -> Option<Entity> {
        if let Some(id) = parse_numeric_id(text.trim()) {
            let known = self.stack.last().and_then(|frame| {
                frame.entries().iter().rev().find_map(|entry| match entry {
                    Entry::Embedded(e) if e.entity.id == id => Some(e.entity.clone()),
                    _ => None,
                })
            });
            if let Some(card) = known {
                return Some(Entity::Card(card));
            }
        }
        parse_entity(text, state)
    }

    fn push_entry(&mut self, entry: Entry) {
        if let Some(frame) = self.stack.last_mut() {
            frame.entries_mut().push(entry);
        }
    }

    fn push_embedded(&mut self, embedded: EmbeddedEntity, state: &mut GameState) {
        match self.stack.last_mut() {
            Some(frame) => frame.entries_mut().push(Entry::Embedded(embedded)),
            // Game setup announces entities outside any block.
            None => state.resolve_entity(&embedded.entity),
        }
    }
}
