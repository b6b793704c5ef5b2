use thiserror::Error;

/// Errors produced by the archive codec.  All of them are fatal to the
/// enclosing operation: an unreadable or unrecognized container is never
/// parsed best-effort.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Filesystem failure while staging, compressing or extracting.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in the manifest or an entity file.
    #[error("Corrupt archive payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The container held no manifest at all.
    #[error("Archive has no manifest.json")]
    MissingManifest,

    /// The manifest declares a format this build does not understand.
    #[error("Unsupported archive format version {found} (this build supports {supported})")]
    VersionMismatch { found: u32, supported: u32 },

    /// The manifest lists an entity file that is absent from the container.
    #[error("Archive entry missing: {0}")]
    MissingEntry(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;
