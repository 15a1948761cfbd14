//! Persistence collaborators: preset/state documents and app configuration.

mod config;
mod json;
mod seed;

pub use config::{Config, CountdownConfig, HapticsConfig};
pub use json::JsonTimerStore;
pub use seed::seed_default_presets;

use std::path::PathBuf;

use crate::error::StorageError;
use crate::model::{Preset, TimerState};

/// Key-value persistence contract for presets and the last engine snapshot.
///
/// Read paths degrade to empty data on missing or malformed payloads and are
/// never fatal; only writes surface errors. Persisted state must round-trip
/// every [`TimerState`] field, including the optional ones.
pub trait TimerStore: Send + Sync {
    /// All stored presets; empty when none exist.
    fn load_presets(&self) -> Vec<Preset>;

    /// Replace the stored preset list.
    fn save_presets(&self, presets: &[Preset]) -> Result<(), StorageError>;

    /// Add or update a single preset.
    fn save_preset(&self, preset: &Preset) -> Result<(), StorageError>;

    /// Delete a preset by id. Clears the default if it pointed there.
    fn delete_preset(&self, preset_id: &str) -> Result<(), StorageError>;

    /// The default preset id, if one is set.
    fn default_preset_id(&self) -> Option<String>;

    /// Set or clear the default preset id.
    fn set_default_preset_id(&self, preset_id: Option<&str>) -> Result<(), StorageError>;

    /// Last persisted engine snapshot, if any survives.
    fn load_last_state(&self) -> Option<TimerState>;

    /// Persist or clear the engine snapshot for restart recovery.
    fn save_state(&self, state: Option<&TimerState>) -> Result<(), StorageError>;

    /// Remove all stored data.
    fn clear_all(&self) -> Result<(), StorageError>;
}

/// Returns `~/.config/stagetimer[-dev]/` based on STAGETIMER_ENV.
///
/// Set STAGETIMER_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STAGETIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("stagetimer-dev")
    } else {
        base_dir.join("stagetimer")
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
