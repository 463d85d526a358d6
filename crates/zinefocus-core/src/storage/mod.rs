mod config;
pub mod database;
mod timer_store;

pub use config::{Config, LoggingConfig, TimerConfig};
pub use database::Database;
pub use timer_store::{KvStore, TimerStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/zinefocus[-dev]/` based on ZINEFOCUS_ENV.
///
/// Set ZINEFOCUS_ENV=dev to use the development data directory, or
/// ZINEFOCUS_DATA_DIR to use an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("ZINEFOCUS_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ZINEFOCUS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("zinefocus-dev")
            } else {
                base_dir.join("zinefocus")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
