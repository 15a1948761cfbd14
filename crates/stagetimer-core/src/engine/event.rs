use serde::{Deserialize, Serialize};

use crate::model::Segment;

/// Discrete signal emitted by the timer engine that outer layers
/// (notifications, haptics, tiles) react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    /// Fired as soon as a boundary is crossed.
    BoundaryReached { completed: Segment, next: Segment },

    /// Fired whenever the timer transitions into a paused state.
    Paused {
        segment: Segment,
        remaining_in_segment_sec: u32,
    },

    /// Fired when the timer resumes from a paused state.
    Resumed { segment: Segment },

    /// Fired when the timer transitions to done.
    Completed,

    /// Fired when the timer is fully stopped and reset.
    Stopped,

    /// Skip was ignored because the active preset disallows it.
    SkipRejected,
}
