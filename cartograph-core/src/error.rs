/// Top-level Cartograph error type.
///
/// All fallible operations in `cartograph-core` return
/// [`Result<T, CartographError>`](Result). Per-file problems never surface
/// here — they degrade into diagnostics; only run-level failures (an
/// inaccessible repository root, cancellation, output I/O) abort.
#[derive(thiserror::Error, Debug)]
pub enum CartographError {
    /// The repository root does not exist or cannot be read.
    #[error("Repository root not accessible: {0}")]
    RepoRoot(String),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization of the graph failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem I/O error writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled; partial results were discarded.
    #[error("Run cancelled before completion")]
    Cancelled,
}

/// Errors in configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for `Result<T, CartographError>`.
pub type Result<T> = std::result::Result<T, CartographError>;
