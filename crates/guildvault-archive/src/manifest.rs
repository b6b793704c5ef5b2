use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use guildvault_model::GuildId;

use crate::error::{CodecError, Result};

/// Current archive format version.
pub const FORMAT_VERSION: u32 = 1;

/// Archive table of contents, written as `manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub format_version: u32,
    pub captured_at: DateTime<Utc>,
    pub source_guild_id: GuildId,
    /// Entity files present in the container, in pack order.
    pub files: Vec<String>,
}

impl Manifest {
    /// Fail loudly on a format this build does not understand; a silent
    /// best-effort parse of a future format is worse than an error.
    pub fn check_version(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(CodecError::VersionMismatch {
                found: self.format_version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}
