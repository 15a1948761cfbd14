//! First-run preset seeding.

use tracing::info;

use crate::error::{Result, ValidationError};
use crate::model::Preset;

use super::TimerStore;

/// Seeds the built-in presets when the store has none and marks the first as
/// the default. A store that already holds presets is left untouched.
pub fn seed_default_presets(store: &dyn TimerStore) -> Result<()> {
    if !store.load_presets().is_empty() {
        return Ok(());
    }
    let presets = default_presets()?;
    store.save_presets(&presets)?;
    store.set_default_preset_id(Some(presets[0].id()))?;
    info!(count = presets.len(), "seeded default presets");
    Ok(())
}

fn default_presets() -> Result<Vec<Preset>, ValidationError> {
    Ok(vec![
        Preset::new("talk-7-20-8", "Talk 7-20-8", 420, 1200, 480, true, false)?,
        Preset::new(
            "workshop-15-20-15",
            "Workshop 15-20-15",
            900,
            1200,
            900,
            true,
            false,
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonTimerStore;

    #[test]
    fn seeds_an_empty_store_and_sets_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTimerStore::at(dir.path());

        seed_default_presets(&store).unwrap();

        let presets = store.load_presets();
        assert_eq!(presets.len(), 2);
        assert_eq!(store.default_preset_id().as_deref(), Some("talk-7-20-8"));
    }

    #[test]
    fn leaves_existing_presets_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTimerStore::at(dir.path());
        let custom = Preset::new("mine", "Mine", 60, 600, 60, true, false).unwrap();
        store.save_presets(&[custom]).unwrap();

        seed_default_presets(&store).unwrap();

        let presets = store.load_presets();
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].id(), "mine");
        assert!(store.default_preset_id().is_none());
    }
}
