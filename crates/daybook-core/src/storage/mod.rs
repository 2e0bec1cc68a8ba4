mod config;
pub mod database;
pub mod store;

pub use config::{BackupConfig, Config, FocusConfig};
pub use database::Database;
pub use store::FeatureStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Daybook data directory, creating it if needed.
///
/// `DAYBOOK_DATA_DIR` wins when set. Otherwise the directory is
/// `~/.config/daybook[-dev]/`, with `DAYBOOK_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DAYBOOK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DAYBOOK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("daybook-dev")
            } else {
                base_dir.join("daybook")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
