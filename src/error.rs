//! Error types.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SynthError>;

/// Error type.
#[derive(Error, Debug)]
pub enum SynthError {
    /// Invalid generation parameters or malformed input data.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A script event names an instrument or sound the bank doesn't have.
    #[error("Event {event}: no sound '{sound}' for instrument '{instrument}' in the sound bank")]
    Lookup {
        event: usize,
        instrument: String,
        sound: String,
    },

    /// A script event would run past the end of the render buffer.
    #[error(
        "Event {event} ({instrument}/{sound}) ends at sample {end_sample}, past the render buffer of {capacity} samples"
    )]
    Overflow {
        event: usize,
        instrument: String,
        sound: String,
        end_sample: usize,
        capacity: usize,
    },

    /// A live-session operation was attempted from the wrong state.
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Audio output device failure.
    #[error("Audio device error: {0}")]
    Audio(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sound bank cache encoding error.
    #[error("Cache error: {0}")]
    Cache(#[from] bincode::Error),

    /// WAV encoding error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl SynthError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SynthError::Configuration(msg.into())
    }
}
