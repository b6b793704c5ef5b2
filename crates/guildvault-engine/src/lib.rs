//! # guildvault-engine
//!
//! Captures a point-in-time snapshot of a guild's structure (roles,
//! channels, messages, audit history) into a portable archive, and
//! rebuilds that structure on a live target guild.
//!
//! The engine talks to the outside world through two injected
//! capabilities: a [`PlatformClient`] for every live-platform call and a
//! [`LogSink`] for structured event reporting.  No module-level clients,
//! no process-wide state — the [`Coordinator`] receives both per
//! instance.
//!
//! Failure model: fatal errors (role enumeration, unreadable archive)
//! abort an operation and leave no partial artifact in the published
//! location; per-entity problems are logged, counted in the final
//! report, and never interrupt the remaining work.

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod platform;
pub mod restore;
pub mod sink;

#[cfg(test)]
pub(crate) mod testutil;

pub use capture::{capture, CaptureOptions};
pub use config::EngineConfig;
pub use coordinator::{ArchiveInfo, Coordinator};
pub use error::{CaptureError, CaptureStage, EngineError, PlatformError, RestoreError};
pub use platform::{ChannelSpec, OverwriteSpec, PlatformClient, RoleSpec};
pub use restore::{restore, RestoreOptions};
pub use sink::{LogSink, TracingSink};
