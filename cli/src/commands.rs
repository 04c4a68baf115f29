use std::path::{Path, PathBuf};

use hearthwatch_core::context::ensure_log_config;
use hearthwatch_core::{AppConfig, LogWatcher, ParsingSession};

use crate::printer::SignalPrinter;
use crate::tail;

fn load_config() -> Result<AppConfig, String> {
    AppConfig::load().map_err(|e| e.to_string())
}

fn session(config: &AppConfig, json: bool) -> ParsingSession {
    let mut session = ParsingSession::from_config(config);
    session.add_signal_handler(Box::new(SignalPrinter::new(json)));
    session
}

pub fn replay(path: &Path, json: bool) -> Result<(), String> {
    let config = load_config()?;
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;

    let mut session = session(&config, json);
    let mut count = session.process_bytes(&bytes).len();
    count += session.finish().len();

    let state = session.state();
    tracing::info!(
        signals = count,
        match_log = state.match_log().len(),
        entities = state.entity_count(),
        "replay complete"
    );
    Ok(())
}

pub async fn watch(path: Option<PathBuf>, from_start: bool, json: bool) -> Result<(), String> {
    let config = load_config()?;
    let path = path.unwrap_or_else(|| config.log_file.clone());

    let mut watcher = LogWatcher::new(path, config.debounce()).map_err(|e| e.to_string())?;
    if from_start {
        watcher.start_at_beginning();
    } else {
        watcher.start_at_end().await.map_err(|e| e.to_string())?;
    }

    tail::follow(watcher, session(&config, json)).await;
    Ok(())
}

pub fn setup() -> Result<(), String> {
    let config = load_config()?;
    let added = ensure_log_config(&config.client_config_file).map_err(|e| e.to_string())?;
    if added.is_empty() {
        println!("{} already enables every log section", config.client_config_file.display());
    } else {
        println!(
            "Enabled {} in {}; restart the client for it to take effect",
            added.join(", "),
            config.client_config_file.display()
        );
    }
    Ok(())
}

pub fn show_config() -> Result<(), String> {
    let config = load_config()?;
    let location = AppConfig::location().map_err(|e| e.to_string())?;
    println!("config file:        {}", location.display());
    println!("log file:           {}", config.log_file.display());
    println!("client config file: {}", config.client_config_file.display());
    println!("line terminator:    {:?}", config.line_terminator());
    println!("debounce:           {} ms", config.debounce_ms);
    Ok(())
}
