use hearthwatch_core::{GameSignal, SignalHandler};
use hearthwatch_types::formatting::describe_entry;

/// Writes every signal to stdout.
pub struct SignalPrinter {
    json: bool,
}

impl SignalPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl SignalHandler for SignalPrinter {
    fn handle_signal(&mut self, signal: &GameSignal) {
        if self.json {
            match serde_json::to_string(signal) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!(error = %err, signal = signal.name(), "failed to serialize signal"),
            }
            return;
        }
        println!("{}", describe_signal(signal));
    }
}

fn describe_signal(signal: &GameSignal) -> String {
    if let Some(entry) = signal.match_log_entry() {
        return describe_entry(entry);
    }
    match signal {
        GameSignal::GameStart => "game started".to_string(),
        GameSignal::GameOver => "game over".to_string(),
        GameSignal::PlayerJoined { id, name } => format!("player {id} joined: {name}"),
        GameSignal::TurnChange { player } => format!("turn: {player}"),
        GameSignal::ZoneChange { entity_id, card_name, side, from, to } => {
            format!("[{entity_id}] {card_name} ({side:?}) {from} -> {to}")
        }
        GameSignal::MulliganStart { player } => format!("mulligan: {player}"),
        GameSignal::MulliganResult { player } => format!("mulligan done: {player}"),
        other => other.name().to_string(),
    }
}
