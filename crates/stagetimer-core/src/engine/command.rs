use crate::model::{Preset, Segment};

/// User or system intent that mutates the timer engine state.
///
/// Every time value arrives as an explicit monotonic millisecond argument;
/// the reducer never reads a clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Start {
        preset: Preset,
        now_ms: i64,
    },

    Pause {
        now_ms: i64,
    },

    Resume {
        now_ms: i64,
    },

    /// Skip the current segment if policy permits.
    SkipSegment {
        now_ms: i64,
    },

    /// Stop the timer and reset to idle.
    Stop,

    /// Periodic monotonic tick; the engine recomputes remaining time from the
    /// absolute delta, so missed or delayed ticks self-correct.
    Tick {
        now_ms: i64,
    },

    /// Segment boundary reached via a deferred wake-up.
    SegmentBoundary {
        segment: Segment,
        at_ms: i64,
    },

    /// Reserved for cancelling automatic transitions; currently inert.
    Cancel,
}
