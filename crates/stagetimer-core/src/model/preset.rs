use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::SegmentDurations;

/// Immutable named configuration for the three sequential segments.
///
/// Construction is validated; deserialization routes through the same checks
/// so malformed documents are rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPreset")]
pub struct Preset {
    id: String,
    title: String,
    intro_sec: u32,
    main_sec: u32,
    outro_sec: u32,
    allow_skip: bool,
    sound_enabled: bool,
}

#[derive(Deserialize)]
struct RawPreset {
    id: String,
    title: String,
    intro_sec: u32,
    main_sec: u32,
    outro_sec: u32,
    #[serde(default = "default_allow_skip")]
    allow_skip: bool,
    #[serde(default)]
    sound_enabled: bool,
}

fn default_allow_skip() -> bool {
    true
}

impl TryFrom<RawPreset> for Preset {
    type Error = ValidationError;

    fn try_from(raw: RawPreset) -> Result<Self, Self::Error> {
        Preset::new(
            raw.id,
            raw.title,
            raw.intro_sec,
            raw.main_sec,
            raw.outro_sec,
            raw.allow_skip,
            raw.sound_enabled,
        )
    }
}

impl Preset {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        intro_sec: u32,
        main_sec: u32,
        outro_sec: u32,
        allow_skip: bool,
        sound_enabled: bool,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let title = title.into();
        if id.trim().is_empty() {
            return Err(ValidationError::Blank { field: "preset id" });
        }
        if title.trim().is_empty() {
            return Err(ValidationError::Blank {
                field: "preset title",
            });
        }
        Ok(Self {
            id,
            title,
            intro_sec,
            main_sec,
            outro_sec,
            allow_skip,
            sound_enabled,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn intro_sec(&self) -> u32 {
        self.intro_sec
    }

    pub fn main_sec(&self) -> u32 {
        self.main_sec
    }

    pub fn outro_sec(&self) -> u32 {
        self.outro_sec
    }

    pub fn allow_skip(&self) -> bool {
        self.allow_skip
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn durations(&self) -> SegmentDurations {
        SegmentDurations::new(self.intro_sec, self.main_sec, self.outro_sec)
    }

    pub fn total_sec(&self) -> u32 {
        self.durations().total_sec()
    }

    /// Minimal runtime snapshot the engine needs; decouples the engine from
    /// full preset records.
    pub fn to_meta(&self) -> ActivePresetMeta {
        ActivePresetMeta {
            id: self.id.clone(),
            durations: self.durations(),
            allow_skip: self.allow_skip,
            sound_enabled: self.sound_enabled,
        }
    }
}

/// Minimal preset details required by the timer engine at runtime.
/// Kept lightweight so it can be persisted alongside the timer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePresetMeta {
    pub id: String,
    pub durations: SegmentDurations,
    pub allow_skip: bool,
    pub sound_enabled: bool,
}
