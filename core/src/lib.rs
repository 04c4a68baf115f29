pub mod context;
pub mod events;
pub mod game_data;
pub mod log;
pub mod log_watcher;
pub mod match_log;
pub mod parsers;
pub mod state;

// Re-exports for convenience
pub use context::{AppConfig, ParsingSession};
pub use events::{GameSignal, SignalHandler};
pub use log_watcher::{LogChunk, LogWatcher, WatchError};
pub use parsers::LogParser;
pub use state::GameState;
