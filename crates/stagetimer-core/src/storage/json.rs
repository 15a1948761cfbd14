//! JSON-document store for presets and the last timer snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::model::{Preset, TimerState};

use super::TimerStore;

const PRESETS_FILE: &str = "presets.json";
const STATE_FILE: &str = "timer_state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PresetDocument {
    #[serde(default)]
    presets: Vec<Preset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_preset_id: Option<String>,
}

/// File-backed [`TimerStore`] keeping two small JSON documents under the app
/// data directory.
pub struct JsonTimerStore {
    dir: PathBuf,
}

impl JsonTimerStore {
    /// Open the store in the default data directory.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self {
            dir: super::data_dir()?,
        })
    }

    /// Open the store in an explicit directory (tests, embedders).
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn presets_path(&self) -> PathBuf {
        self.dir.join(PRESETS_FILE)
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn read_presets(&self) -> PresetDocument {
        read_document(&self.presets_path()).unwrap_or_default()
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to read store document");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), %err, "malformed store document; treating as empty");
            None
        }
    }
}

fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| StorageError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::WriteFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl TimerStore for JsonTimerStore {
    fn load_presets(&self) -> Vec<Preset> {
        self.read_presets().presets
    }

    fn save_presets(&self, presets: &[Preset]) -> Result<(), StorageError> {
        let mut doc = self.read_presets();
        doc.presets = presets.to_vec();
        write_document(&self.presets_path(), &doc)
    }

    fn save_preset(&self, preset: &Preset) -> Result<(), StorageError> {
        let mut doc = self.read_presets();
        match doc.presets.iter_mut().find(|p| p.id() == preset.id()) {
            Some(slot) => *slot = preset.clone(),
            None => doc.presets.push(preset.clone()),
        }
        write_document(&self.presets_path(), &doc)
    }

    fn delete_preset(&self, preset_id: &str) -> Result<(), StorageError> {
        let mut doc = self.read_presets();
        doc.presets.retain(|p| p.id() != preset_id);
        if doc.default_preset_id.as_deref() == Some(preset_id) {
            doc.default_preset_id = None;
        }
        write_document(&self.presets_path(), &doc)
    }

    fn default_preset_id(&self) -> Option<String> {
        self.read_presets().default_preset_id
    }

    fn set_default_preset_id(&self, preset_id: Option<&str>) -> Result<(), StorageError> {
        let mut doc = self.read_presets();
        let previous = doc.default_preset_id.clone();
        doc.default_preset_id = preset_id.map(str::to_owned);
        write_document(&self.presets_path(), &doc)?;
        if previous.as_deref() != preset_id {
            info!(
                previous = previous.as_deref().unwrap_or("none"),
                next = preset_id.unwrap_or("none"),
                "default preset changed"
            );
        }
        Ok(())
    }

    fn load_last_state(&self) -> Option<TimerState> {
        read_document(&self.state_path())
    }

    fn save_state(&self, state: Option<&TimerState>) -> Result<(), StorageError> {
        match state {
            Some(state) => write_document(&self.state_path(), state),
            None => remove_if_present(&self.state_path()),
        }
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        remove_if_present(&self.presets_path())?;
        remove_if_present(&self.state_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RunStatus, Segment, SegmentDurations};

    fn store() -> (tempfile::TempDir, JsonTimerStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTimerStore::at(dir.path());
        (dir, store)
    }

    fn preset(id: &str) -> Preset {
        Preset::new(id, "Talk", 300, 1200, 300, true, false).unwrap()
    }

    #[test]
    fn empty_store_reads_as_empty() {
        let (_dir, store) = store();
        assert!(store.load_presets().is_empty());
        assert!(store.default_preset_id().is_none());
        assert!(store.load_last_state().is_none());
    }

    #[test]
    fn presets_round_trip() {
        let (_dir, store) = store();
        store.save_presets(&[preset("a"), preset("b")]).unwrap();
        let loaded = store.load_presets();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id(), "a");
    }

    #[test]
    fn save_preset_upserts() {
        let (_dir, store) = store();
        store.save_preset(&preset("a")).unwrap();
        store.save_preset(&preset("a")).unwrap();
        store.save_preset(&preset("b")).unwrap();
        assert_eq!(store.load_presets().len(), 2);
    }

    #[test]
    fn deleting_the_default_preset_clears_the_default() {
        let (_dir, store) = store();
        store.save_presets(&[preset("a"), preset("b")]).unwrap();
        store.set_default_preset_id(Some("a")).unwrap();
        assert_eq!(store.default_preset_id().as_deref(), Some("a"));

        store.delete_preset("a").unwrap();
        assert!(store.default_preset_id().is_none());
        assert_eq!(store.load_presets().len(), 1);
    }

    #[test]
    fn state_round_trips_including_optionals() {
        let (_dir, store) = store();
        let meta = preset("a").to_meta();
        let state = TimerState::new(
            RunStatus::Paused,
            Segment::Main,
            1000,
            500,
            SegmentDurations::new(300, 1200, 300),
            None,
            Some(meta),
        )
        .unwrap();
        store.save_state(Some(&state)).unwrap();
        assert_eq!(store.load_last_state(), Some(state));

        store.save_state(None).unwrap();
        assert!(store.load_last_state().is_none());
    }

    #[test]
    fn malformed_documents_read_as_empty() {
        let (dir, store) = store();
        std::fs::write(dir.path().join(PRESETS_FILE), "{not json").unwrap();
        std::fs::write(dir.path().join(STATE_FILE), "[]").unwrap();
        assert!(store.load_presets().is_empty());
        assert!(store.load_last_state().is_none());
    }

    #[test]
    fn invariant_violating_state_reads_as_empty() {
        let (dir, store) = store();
        // Running without an anchor is rejected by the model.
        std::fs::write(
            dir.path().join(STATE_FILE),
            r#"{
                "status": "running",
                "segment": "intro",
                "remaining_in_segment_sec": 300,
                "elapsed_total_sec": 0,
                "durations": { "intro_sec": 300, "main_sec": 1200, "outro_sec": 300 }
            }"#,
        )
        .unwrap();
        assert!(store.load_last_state().is_none());
    }

    #[test]
    fn clear_all_removes_everything() {
        let (_dir, store) = store();
        store.save_presets(&[preset("a")]).unwrap();
        store
            .save_state(Some(&TimerState::idle(SegmentDurations::zero())))
            .unwrap();
        store.clear_all().unwrap();
        assert!(store.load_presets().is_empty());
        assert!(store.load_last_state().is_none());
    }
}
