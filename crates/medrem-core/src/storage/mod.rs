mod config;
mod persistence;
mod store;

pub use config::{Config, NotificationsConfig, PollingConfig, StorageConfig};
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};
#[cfg(test)]
pub(crate) use persistence::testing::FlakyPersistence;
pub use store::ReminderStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the medrem data directory, creating it if needed.
///
/// `MEDREM_DATA_DIR` wins when set. Otherwise this is `~/.config/medrem/`,
/// or `~/.config/medrem-dev/` with `MEDREM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("MEDREM_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MEDREM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("medrem-dev")
            } else {
                base_dir.join("medrem")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
