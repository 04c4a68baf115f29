mod app_config;
pub mod client_config;
mod parsing_session;

pub use app_config::{
    APP_NAME, AppConfig, ConfigError, default_client_config_file, default_log_file,
};
pub use client_config::ensure_log_config;
pub use parsing_session::ParsingSession;
