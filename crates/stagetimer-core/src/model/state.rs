use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::{ActivePresetMeta, Segment, SegmentDurations};

/// Lifecycle status of the timer, orthogonal to the active segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Done,
}

/// Snapshot of the timer engine suitable for persistence and observers.
///
/// Every public construction path (including deserialization) validates the
/// state invariants; the reducer builds values internally and preserves them
/// by construction. Fields are private so a validated snapshot stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimerState")]
pub struct TimerState {
    pub(crate) status: RunStatus,
    pub(crate) segment: Segment,
    pub(crate) remaining_in_segment_sec: u32,
    pub(crate) elapsed_total_sec: u32,
    pub(crate) durations: SegmentDurations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) started_at_monotonic_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) active_preset: Option<ActivePresetMeta>,
}

#[derive(Deserialize)]
struct RawTimerState {
    status: RunStatus,
    segment: Segment,
    remaining_in_segment_sec: u32,
    elapsed_total_sec: u32,
    durations: SegmentDurations,
    #[serde(default)]
    started_at_monotonic_ms: Option<i64>,
    #[serde(default)]
    active_preset: Option<ActivePresetMeta>,
}

impl TryFrom<RawTimerState> for TimerState {
    type Error = ValidationError;

    fn try_from(raw: RawTimerState) -> Result<Self, Self::Error> {
        TimerState::new(
            raw.status,
            raw.segment,
            raw.remaining_in_segment_sec,
            raw.elapsed_total_sec,
            raw.durations,
            raw.started_at_monotonic_ms,
            raw.active_preset,
        )
    }
}

impl TimerState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        status: RunStatus,
        segment: Segment,
        remaining_in_segment_sec: u32,
        elapsed_total_sec: u32,
        durations: SegmentDurations,
        started_at_monotonic_ms: Option<i64>,
        active_preset: Option<ActivePresetMeta>,
    ) -> Result<Self, ValidationError> {
        let state = Self {
            status,
            segment,
            remaining_in_segment_sec,
            elapsed_total_sec,
            durations,
            started_at_monotonic_ms,
            active_preset,
        };
        state.validate()?;
        Ok(state)
    }

    /// The canonical idle snapshot for a set of durations.
    pub fn idle(durations: SegmentDurations) -> Self {
        Self {
            status: RunStatus::Idle,
            segment: Segment::Intro,
            remaining_in_segment_sec: durations.intro_sec,
            elapsed_total_sec: 0,
            durations,
            started_at_monotonic_ms: None,
            active_preset: None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let max_for_segment = self.durations.duration_for(self.segment);
        if self.remaining_in_segment_sec > max_for_segment {
            return Err(ValidationError::RemainingOutOfRange {
                remaining: self.remaining_in_segment_sec,
                max: max_for_segment,
            });
        }
        let total = self.durations.total_sec();
        if self.elapsed_total_sec > total {
            return Err(ValidationError::ElapsedOutOfRange {
                elapsed: self.elapsed_total_sec,
                total,
            });
        }
        match (self.status, self.started_at_monotonic_ms) {
            (RunStatus::Running, None) => return Err(ValidationError::MissingStartReference),
            (RunStatus::Running, Some(_)) => {}
            (_, Some(_)) => return Err(ValidationError::StrayStartReference),
            (_, None) => {}
        }
        if matches!(self.status, RunStatus::Running | RunStatus::Paused) {
            let meta = self
                .active_preset
                .as_ref()
                .ok_or(ValidationError::MissingActivePreset)?;
            if meta.durations != self.durations {
                return Err(ValidationError::PresetDurationsMismatch);
            }
        }
        if self.status == RunStatus::Idle && self.segment != Segment::Intro {
            return Err(ValidationError::IdleSegmentMismatch);
        }
        if (self.segment == Segment::Done) != (self.status == RunStatus::Done) {
            return Err(ValidationError::DoneMismatch);
        }
        if self.segment == Segment::Done {
            if self.remaining_in_segment_sec != 0 || self.elapsed_total_sec != total {
                return Err(ValidationError::IncompleteDone);
            }
            if self.active_preset.is_none() {
                return Err(ValidationError::MissingActivePreset);
            }
        }
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn remaining_in_segment_sec(&self) -> u32 {
        self.remaining_in_segment_sec
    }

    pub fn elapsed_total_sec(&self) -> u32 {
        self.elapsed_total_sec
    }

    pub fn durations(&self) -> SegmentDurations {
        self.durations
    }

    pub fn started_at_monotonic_ms(&self) -> Option<i64> {
        self.started_at_monotonic_ms
    }

    pub fn active_preset(&self) -> Option<&ActivePresetMeta> {
        self.active_preset.as_ref()
    }

    pub fn total_sec(&self) -> u32 {
        self.durations.total_sec()
    }

    pub fn is_active(&self) -> bool {
        self.status == RunStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Preset;

    fn meta() -> ActivePresetMeta {
        Preset::new("talk", "Talk", 300, 1200, 300, true, false)
            .unwrap()
            .to_meta()
    }

    fn durations() -> SegmentDurations {
        SegmentDurations::new(300, 1200, 300)
    }

    #[test]
    fn idle_snapshot_is_valid() {
        let state = TimerState::idle(durations());
        assert_eq!(state.status(), RunStatus::Idle);
        assert_eq!(state.segment(), Segment::Intro);
        assert_eq!(state.remaining_in_segment_sec(), 300);
        assert_eq!(state.elapsed_total_sec(), 0);
        assert!(state.started_at_monotonic_ms().is_none());
        assert!(state.active_preset().is_none());
    }

    #[test]
    fn running_requires_anchor_and_preset() {
        let err = TimerState::new(
            RunStatus::Running,
            Segment::Intro,
            300,
            0,
            durations(),
            None,
            Some(meta()),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingStartReference);

        let err = TimerState::new(
            RunStatus::Running,
            Segment::Intro,
            300,
            0,
            durations(),
            Some(1_000),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingActivePreset);
    }

    #[test]
    fn anchor_outside_running_is_rejected() {
        let err = TimerState::new(
            RunStatus::Paused,
            Segment::Intro,
            250,
            50,
            durations(),
            Some(1_000),
            Some(meta()),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::StrayStartReference);
    }

    #[test]
    fn remaining_capped_by_segment_duration() {
        let err = TimerState::new(
            RunStatus::Running,
            Segment::Intro,
            301,
            0,
            durations(),
            Some(1_000),
            Some(meta()),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::RemainingOutOfRange {
                remaining: 301,
                max: 300
            }
        );
    }

    #[test]
    fn preset_durations_must_match() {
        let mut mismatched = meta();
        mismatched.durations = SegmentDurations::new(1, 2, 3);
        let err = TimerState::new(
            RunStatus::Running,
            Segment::Intro,
            300,
            0,
            durations(),
            Some(1_000),
            Some(mismatched),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::PresetDurationsMismatch);
    }

    #[test]
    fn done_requires_full_elapsed_and_preset() {
        let err = TimerState::new(
            RunStatus::Done,
            Segment::Done,
            0,
            100,
            durations(),
            None,
            Some(meta()),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::IncompleteDone);

        let err = TimerState::new(
            RunStatus::Done,
            Segment::Done,
            0,
            1800,
            durations(),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingActivePreset);

        let state = TimerState::new(
            RunStatus::Done,
            Segment::Done,
            0,
            1800,
            durations(),
            None,
            Some(meta()),
        )
        .unwrap();
        assert_eq!(state.segment(), Segment::Done);
    }

    #[test]
    fn done_segment_and_status_must_coincide() {
        let err = TimerState::new(
            RunStatus::Running,
            Segment::Done,
            0,
            1800,
            durations(),
            Some(1_000),
            Some(meta()),
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::DoneMismatch);
    }

    #[test]
    fn serde_round_trips_every_field() {
        let state = TimerState::new(
            RunStatus::Paused,
            Segment::Main,
            1000,
            500,
            durations(),
            None,
            Some(meta()),
        )
        .unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let back: TimerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn serde_omits_absent_optionals() {
        let json = serde_json::to_string(&TimerState::idle(durations())).unwrap();
        assert!(!json.contains("started_at_monotonic_ms"));
        assert!(!json.contains("active_preset"));
    }

    #[test]
    fn deserialize_rejects_invariant_violations() {
        // Running without an anchor.
        let json = r#"{
            "status": "running",
            "segment": "intro",
            "remaining_in_segment_sec": 300,
            "elapsed_total_sec": 0,
            "durations": { "intro_sec": 300, "main_sec": 1200, "outro_sec": 300 }
        }"#;
        assert!(serde_json::from_str::<TimerState>(json).is_err());
    }
}
