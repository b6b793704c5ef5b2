//! # guildvault-archive
//!
//! Packs a [`Snapshot`](guildvault_model::Snapshot) into a single
//! compressed container and unpacks it back into a scoped extraction
//! directory.
//!
//! Container layout: a gzip-compressed tar holding `manifest.json` plus
//! one JSON file per entity class.  Packing stages into a temporary
//! directory and publishes the finished container atomically, so a crash
//! mid-pack never leaves a partial archive in the final location.

pub mod error;
pub mod manifest;
pub mod pack;
pub mod unpack;

pub use error::CodecError;
pub use manifest::{Manifest, FORMAT_VERSION};
pub use pack::{archive_file_name, pack, PackedArchive};
pub use unpack::{unpack, unpack_in, Extraction};

/// Entity file names inside the container.
pub(crate) const ROLES_FILE: &str = "roles.json";
pub(crate) const CHANNELS_FILE: &str = "channels.json";
pub(crate) const MESSAGES_FILE: &str = "messages.json";
pub(crate) const AUDIT_FILE: &str = "auditEntries.json";
pub(crate) const MANIFEST_FILE: &str = "manifest.json";
