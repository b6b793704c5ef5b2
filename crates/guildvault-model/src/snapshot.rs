use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::GuildId;
use crate::models::{AuditEntry, Channel, ChannelMessages, Role};

/// Point-in-time aggregate of everything captured from one guild.
///
/// Created fresh on every capture and treated as immutable once handed to
/// the archive codec.  Destroyed only by deleting the archive it was
/// written to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub captured_at: DateTime<Utc>,
    pub source_guild_id: GuildId,
    pub roles: Vec<Role>,
    pub channels: Vec<Channel>,
    /// Messages grouped by channel, most recent first within a channel.
    pub messages: Vec<ChannelMessages>,
    pub audit_entries: Vec<AuditEntry>,
}

impl Snapshot {
    /// An empty snapshot for the given guild, stamped now.
    pub fn new(source_guild_id: GuildId) -> Self {
        Self {
            captured_at: Utc::now(),
            source_guild_id,
            roles: Vec::new(),
            channels: Vec::new(),
            messages: Vec::new(),
            audit_entries: Vec::new(),
        }
    }

    /// Total number of captured messages across all channels.
    pub fn message_count(&self) -> usize {
        self.messages.iter().map(|c| c.messages.len()).sum()
    }
}
