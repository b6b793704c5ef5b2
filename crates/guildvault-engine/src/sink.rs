//! Structured event reporting capability.

use tracing::{error, info, warn};

/// Event categories used by the engine.
pub mod category {
    pub const BACKUP: &str = "backup";
    pub const RESTORE: &str = "restore";
    pub const ERROR: &str = "error";
}

/// Receives warnings, operation summaries and fatal errors.  No transport
/// is assumed; implementations may forward to a log channel, a file, or
/// anything else.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: &str, category: &str, data: serde_json::Value);
}

/// Default sink that forwards every event to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: &str, category: &str, data: serde_json::Value) {
        match category {
            category::ERROR => error!(event, category, data = %data),
            category::RESTORE | category::BACKUP => info!(event, category, data = %data),
            _ => warn!(event, category, data = %data),
        }
    }
}
