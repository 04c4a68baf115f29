//! Line dispatch. Every line is offered to the registered parsers in order;
//! the first one to claim it stops dispatch for that line.

pub mod simple;

use memchr::memmem;

use crate::events::GameSignal;
use crate::match_log::MatchLogParser;
use crate::state::GameState;

#[cfg(windows)]
pub const DEFAULT_LINE_TERMINATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const DEFAULT_LINE_TERMINATOR: &str = "\n";

/// The fixed parser registry.
#[derive(Debug)]
pub enum LineParser {
    MatchLog(MatchLogParser),
    GameStart,
    PlayerJoined,
    TurnChange,
    GameOver,
    Mulligan,
    Choices,
    ZoneChange,
    TagChange,
}

impl LineParser {
    /// Registration order matters: block structure first, the catch-all
    /// tag parser last.
    pub fn registry() -> Vec<LineParser> {
        vec![
            LineParser::MatchLog(MatchLogParser::new()),
            LineParser::GameStart,
            LineParser::PlayerJoined,
            LineParser::TurnChange,
            LineParser::GameOver,
            LineParser::Mulligan,
            LineParser::Choices,
            LineParser::ZoneChange,
            LineParser::TagChange,
        ]
    }

    pub fn handle_line(
        &mut self,
        line: &str,
        state: &mut GameState,
        signals: &mut Vec<GameSignal>,
    ) -> bool {
        match self {
            LineParser::MatchLog(parser) => parser.handle_line(line, state, signals),
            LineParser::GameStart => simple::game_start(line, state, signals),
            LineParser::PlayerJoined => simple::player_joined(line, state, signals),
            LineParser::TurnChange => simple::turn_change(line, state, signals),
            LineParser::GameOver => simple::game_over(line, state, signals),
            LineParser::Mulligan => simple::mulligan(line, state, signals),
            LineParser::Choices => simple::choices(line, state, signals),
            LineParser::ZoneChange => simple::zone_change(line, state, signals),
            LineParser::TagChange => simple::tag_change_fact(line, state, signals),
        }
    }

    fn reset(&mut self) {
        if let LineParser::MatchLog(parser) = self {
            parser.reset();
        }
    }
}

/// Splits byte ranges into lines and dispatches them.
#[derive(Debug)]
pub struct LogParser {
    parsers: Vec<LineParser>,
    terminator: Vec<u8>,
    /// Trailing bytes of the last buffer that did not end in a terminator.
    pending: Vec<u8>,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser {
    pub fn new() -> Self {
        Self::with_terminator(DEFAULT_LINE_TERMINATOR)
    }

    /// An empty terminator falls back to `\n`.
    pub fn with_terminator(terminator: &str) -> Self {
        let terminator = if terminator.is_empty() { "\n" } else { terminator };
        Self {
            parsers: LineParser::registry(),
            terminator: terminator.as_bytes().to_vec(),
            pending: Vec::new(),
        }
    }

    /// Process a freshly read byte range. A trailing partial line is kept
    /// until the rest of it arrives.
    pub fn parse_buffer(&mut self, bytes: &[u8], state: &mut GameState) -> Vec<GameSignal> {
        self.pending.extend_from_slice(bytes);
        let mut signals = Vec::new();

        let buffer = std::mem::take(&mut self.pending);
        let mut start = 0;
        while let Some(offset) = memmem::find(&buffer[start..], &self.terminator) {
            let end = start + offset;
            self.dispatch(&buffer[start..end], state, &mut signals);
            start = end + self.terminator.len();
        }
        self.pending = buffer[start..].to_vec();

        signals
    }

    /// Dispatch whatever is left as a final line (end of a replayed file).
    pub fn finish(&mut self, state: &mut GameState) -> Vec<GameSignal> {
        let mut signals = Vec::new();
        let rest = std::mem::take(&mut self.pending);
        if !rest.is_empty() {
            self.dispatch(&rest, state, &mut signals);
        }
        signals
    }

    /// Drop buffered bytes and any unfinished blocks.
    pub fn reset(&mut self) {
        self.pending.clear();
        for parser in &mut self.parsers {
            parser.reset();
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn dispatch(&mut self, raw: &[u8], state: &mut GameState, signals: &mut Vec<GameSignal>) {
        let text = String::from_utf8_lossy(raw);
        let line = text.strip_suffix('\r').unwrap_or(&*text);
        if line.trim().is_empty() {
            return;
        }
        for parser in &mut self.parsers {
            if parser.handle_line(line, state, signals) {
                break;
            }
        }
    }
}
