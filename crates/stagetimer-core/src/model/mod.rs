mod durations;
mod preset;
mod segment;
mod state;

pub use durations::{SegmentDurations, SegmentProgress};
pub use preset::{ActivePresetMeta, Preset};
pub use segment::Segment;
pub use state::{RunStatus, TimerState};
