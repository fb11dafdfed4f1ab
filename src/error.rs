//! Error type shared by the servo pipeline, its collaborators and the CLI.

use thiserror::Error;

/// Errors surfaced by the library.
///
/// Per-frame anomalies (detector errors, tracker init failure or loss, actuator
/// write failures) are not errors at this level; they are folded into status
/// values by the pipeline. Only setup failures and a broken frame source reach the caller.
#[derive(Debug, Error)]
pub enum ServoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("scenario line {line}: {source}")]
    Scenario {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("frame source failed: {0}")]
    FrameSource(String),

    #[error("actuator link unavailable: {0}")]
    Actuator(String),

    #[error("innovation covariance is singular")]
    SingularCovariance,
}

pub type Result<T> = std::result::Result<T, ServoError>;
