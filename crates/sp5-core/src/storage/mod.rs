mod config;
pub mod database;

pub use config::{Config, GoalConfig, NotificationsConfig};
pub use database::{Database, RECORD_KEY};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the data directory, creating it if needed.
///
/// `SP5_DATA_DIR` wins when set. Otherwise `~/.config/sp5[-dev]/`, with
/// `SP5_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("SP5_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SP5_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("sp5-dev")
            } else {
                base_dir.join("sp5")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
