//! # Stagetimer Core Library
//!
//! Core library for Stagetimer, a three-segment countdown timer
//! (intro -> main -> outro) that survives process suspension, clock drift,
//! and device sleep while staying driven by a single monotonic clock.
//!
//! ## Architecture
//!
//! - **Model**: immutable, invariant-validated value types ([`TimerState`],
//!   [`Preset`], [`SegmentDurations`])
//! - **Reducer**: a pure transition function over time- and user-driven
//!   commands; all boundary math lives here
//! - **Engine**: an actor-style wrapper that serializes commands through a
//!   single processing loop and republishes state and events
//! - **Scheduler**: reconstructs precise wake-ups from a coarse periodic
//!   tick plus deferred alarms, with a best-effort in-process fallback
//! - **Host**: wires the engine to persistence, the per-second ticker, and
//!   the countdown scheduler
//! - **Storage**: JSON documents for presets/state and TOML configuration
//!
//! ## Key Components
//!
//! - [`reduce`]: the pure timer transition function
//! - [`TimerEngine`]: serialized command processing and state publication
//! - [`TimerHost`]: the hosting loop, with explicit dependency injection
//! - [`CountdownScheduler`]: lead-window wake-ups before segment boundaries
//! - [`JsonTimerStore`]: preset and snapshot persistence
//! - [`Config`]: application configuration management

pub mod engine;
pub mod error;
pub mod format;
pub mod host;
pub mod model;
pub mod scheduler;
pub mod storage;
pub mod time;

pub use engine::{reduce, Reduction, TimerCommand, TimerEngine, TimerEvent};
pub use error::{AlarmError, ConfigError, CoreError, StorageError, ValidationError};
pub use host::{CountdownPulse, TimerHost};
pub use model::{
    ActivePresetMeta, Preset, RunStatus, Segment, SegmentDurations, SegmentProgress, TimerState,
};
pub use scheduler::{AlarmCapability, CountdownScheduler, WakeAlarm};
pub use storage::{Config, JsonTimerStore, TimerStore};
pub use time::{ManualClock, MonotonicClock, SystemClock};
