//! Error types for the dino-mdp crate

use thiserror::Error;

/// Main error type for the dino-mdp crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown obstacle type '{name}' (expected CACTUS_SMALL, CACTUS_LARGE or PTERODACTYL)")]
    UnknownObstacleType { name: String },

    #[error("observation field '{field}' is not finite: {value}")]
    NonFiniteObservation { field: &'static str, value: f64 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("state index {index} is out of range (model has {num_states} states)")]
    StateOutOfRange { index: usize, num_states: usize },

    #[error(
        "value iteration did not converge after {sweeps} sweeps (residual {residual}, tolerance {tolerance})"
    )]
    ValueIterationDidNotConverge {
        sweeps: usize,
        residual: f64,
        tolerance: f64,
    },

    #[error("unsupported save format version {found} (expected {expected})")]
    UnsupportedSaveVersion { found: u32, expected: u32 },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
