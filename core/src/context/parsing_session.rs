use hashbrown::HashMap;

use crate::context::AppConfig;
use crate::events::{GameSignal, SignalHandler};
use crate::parsers::LogParser;
use crate::state::GameState;

type Subscriber = Box<dyn FnMut(&GameSignal) + Send>;

/// Owns the parser and game state for one log, and fans signals out to
/// handlers and per-signal subscribers.
#[derive(Default)]
pub struct ParsingSession {
    parser: LogParser,
    state: GameState,
    signal_handlers: Vec<Box<dyn SignalHandler + Send + Sync>>,
    subscribers: HashMap<String, Vec<Subscriber>>,
}

impl ParsingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(parser: LogParser) -> Self {
        Self {
            parser,
            ..Self::default()
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_parser(config.log_parser())
    }

    /// Register a signal handler to receive every signal
    pub fn add_signal_handler(&mut self, handler: Box<dyn SignalHandler + Send + Sync>) {
        self.signal_handlers.push(handler);
    }

    /// Subscribe to one signal by name, e.g. `"card-played"`.
    pub fn on(&mut self, name: impl Into<String>, callback: impl FnMut(&GameSignal) + Send + 'static) {
        self.subscribers
            .entry(name.into())
            .or_default()
            .push(Box::new(callback));
    }

    /// Parse a freshly read byte range and dispatch what it produced.
    pub fn process_bytes(&mut self, bytes: &[u8]) -> Vec<GameSignal> {
        let signals = self.parser.parse_buffer(bytes, &mut self.state);
        self.dispatch_signals(&signals);
        signals
    }

    /// Flush an unterminated final line.
    pub fn finish(&mut self) -> Vec<GameSignal> {
        let signals = self.parser.finish(&mut self.state);
        self.dispatch_signals(&signals);
        signals
    }

    /// Forget buffered input, e.g. after the log was truncated. Game state
    /// is kept; the next `CREATE_GAME` resets it.
    pub fn reset_parser(&mut self) {
        self.parser.reset();
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    fn dispatch_signals(&mut self, signals: &[GameSignal]) {
        if signals.is_empty() {
            return;
        }
        for handler in &mut self.signal_handlers {
            handler.handle_signals(signals);
        }
        for signal in signals {
            if let Some(subscribers) = self.subscribers.get_mut(signal.name()) {
                for subscriber in subscribers {
                    subscriber(signal);
                }
            }
        }
    }
}
