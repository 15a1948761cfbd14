//! Core error types for stagetimer-core.
//!
//! Construction-time invariant violations are surfaced as [`ValidationError`]
//! so malformed input is rejected at the boundary and never reaches the
//! reducer. The reducer itself is total and has no error type.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stagetimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A preset id that resolves to nothing
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Model invariant violations, one variant per invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Blank identifier or title
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    /// Remaining time exceeds the current segment's duration
    #[error("remaining in segment ({remaining}s) exceeds segment duration ({max}s)")]
    RemainingOutOfRange { remaining: u32, max: u32 },

    /// Elapsed time exceeds the total duration
    #[error("elapsed total ({elapsed}s) exceeds total duration ({total}s)")]
    ElapsedOutOfRange { elapsed: u32, total: u32 },

    /// Running state without a monotonic anchor
    #[error("running timer requires a monotonic start reference")]
    MissingStartReference,

    /// Monotonic anchor present outside the running state
    #[error("only a running timer may carry a monotonic start reference")]
    StrayStartReference,

    /// Running/paused/done state without preset metadata
    #[error("active preset metadata is required while the timer is engaged")]
    MissingActivePreset,

    /// Preset metadata durations diverge from the state durations
    #[error("active preset durations must match state durations")]
    PresetDurationsMismatch,

    /// Idle state reporting a segment other than intro
    #[error("idle timer must report the intro segment")]
    IdleSegmentMismatch,

    /// Done segment and done status must coincide
    #[error("done segment and done status must coincide")]
    DoneMismatch,

    /// Done state with partial progress
    #[error("done timer must report zero remaining and full elapsed")]
    IncompleteDone,
}

/// Storage-specific errors. Read paths never produce these; missing or
/// malformed documents degrade to empty data.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create the data directory
    #[error("Failed to create data directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a document
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a document
    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config directory could not be resolved
    #[error("Failed to resolve config directory: {0}")]
    DirUnavailable(String),

    /// Failed to save configuration
    #[error("Failed to save configuration to {}: {message}", path.display())]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Platform wake-alarm errors. These degrade the scheduler to its in-process
/// fallback; they are never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlarmError {
    /// Exact-alarm privilege revoked or never granted
    #[error("exact alarm permission denied")]
    PermissionDenied,

    /// Alarm backend unavailable for another reason
    #[error("exact alarm unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
