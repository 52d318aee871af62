//! Error types for the workout_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a single message could not be turned into a record.
///
/// Every variant is terminal for that one message: the engine never returns a
/// partial record alongside one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Message did not start with a `/log` or `/note` command
    #[error("Message must start with /log or /note")]
    InvalidPrefix,

    /// Date modifier was present but could not be resolved
    #[error("Could not parse date: \"{0}\"")]
    InvalidDateModifier(String),

    /// Exercise name is not in the catalog
    #[error("Unknown exercise: \"{0}\". Could not normalize.")]
    UnknownExercise(String),

    /// None of the set grammars matched the payload
    #[error(
        "Could not parse format: \"{0}\". Try formats like \"225x3x5\", \"20,20,25\", or \"405 2,1,x\""
    )]
    UnparseableSetFormat(String),

    /// Nothing left after the prefix and date modifier
    #[error("No exercise specified")]
    MissingExercise,

    /// A `/note` command without any text
    #[error("Note text is empty")]
    MissingNote,
}

/// Core error type for workout_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Message parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Deduplication state error
    #[error("State error: {0}")]
    State(String),

    /// Git commit or push failed
    #[error("Git error: {0}")]
    Versioning(String),

    /// Stored records no longer match what their raw text parses to
    #[error("Verification found {count} mismatched record(s)")]
    RecordMismatch { count: usize },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
