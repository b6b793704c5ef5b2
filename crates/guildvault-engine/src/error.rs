use thiserror::Error;

use guildvault_archive::CodecError;

/// Error returned by a [`PlatformClient`](crate::platform::PlatformClient)
/// call.  The engine does not retry: a rate-limited call that ultimately
/// errors is treated like any other per-entity failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Permission denied: {0}")]
    Denied(String),

    #[error("Platform API error: {0}")]
    Api(String),
}

/// Entity class whose enumeration failed fatally during capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Roles,
    Channels,
}

impl std::fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStage::Roles => write!(f, "roles"),
            CaptureStage::Channels => write!(f, "channels"),
        }
    }
}

/// Fatal capture failure.  Per-channel message fetch problems are not
/// errors; they surface as warnings in the capture result instead.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Enumerating a required entity class failed.  Roles are required
    /// for overwrite resolution, channels for everything else.
    #[error("Capture failed at {stage} stage: {source}")]
    Stage {
        stage: CaptureStage,
        source: PlatformError,
    },

    #[error("Capture cancelled")]
    Cancelled,
}

/// Fatal restore failure.  Individual entity creation problems never
/// raise; only unreadable input or cancellation does.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The extraction directory or an entity file inside it is
    /// unreadable or unparseable.
    #[error("Restore input unreadable: {0}")]
    Codec(#[from] CodecError),

    #[error("Restore cancelled")]
    Cancelled,
}

/// Top-level operation error returned by the coordinator.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Restore(#[from] RestoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
