//! Error types for nar-pack

use std::path::PathBuf;
use thiserror::Error;

/// Result type for nar build operations
pub type NarResult<T> = Result<T, NarError>;

/// Errors that can occur while building a nar archive
#[derive(Error, Debug)]
pub enum NarError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Project descriptor error
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Unrecognized archive format identifier
    #[error("Unrecognized archive format: {0}")]
    UnknownFormat(String),

    /// Invalid inclusion or exclusion pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Two different source files mapped to the same archive path
    #[error("Archive path collision at {archive_path}: {first} and {second}")]
    PathCollision {
        /// Archive-relative path both sources resolved to
        archive_path: String,
        /// Source selected first
        first: PathBuf,
        /// Conflicting source
        second: PathBuf,
    },

    /// Invalid dynamic metadata pattern
    #[error("Invalid substitution pattern: {0}")]
    Substitution(#[from] regex::Error),

    /// External command failed or could not be spawned
    #[error("External command `{command}` failed: {detail}")]
    ExternalCommand {
        /// Command that was invoked
        command: String,
        /// Exit status and captured stderr, or the spawn error
        detail: String,
    },

    /// Zip serialization error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
