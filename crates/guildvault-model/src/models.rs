//! Entity records captured from a guild.
//!
//! Field names follow the archive wire format (`camelCase`); permission
//! masks round-trip as decimal strings via [`crate::mask`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, GuildId, MessageId, RoleId, UserId};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A guild role.  Roles are restored before anything that can reference
/// them, so channel overwrites can resolve their subjects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    /// Display name; empty names are a capture artifact and are skipped on
    /// restore.
    pub name: String,
    /// Packed RGB color.
    pub color: u32,
    /// Whether the role is shown separately in the member list.
    pub hoist: bool,
    /// Render order within the guild.
    pub position: i64,
    /// 64-bit permission bitfield, decimal string on the wire.
    #[serde(with = "crate::mask")]
    pub permission_mask: u64,
    pub mentionable: bool,
}

// ---------------------------------------------------------------------------
// PermissionOverwrite
// ---------------------------------------------------------------------------

/// Who a channel permission overwrite applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteSubject {
    Role,
    User,
}

/// A per-channel permission overwrite.  Belongs to exactly one channel and
/// is never restored standalone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOverwrite {
    /// Role or user id, depending on `subject_type`.
    pub subject_id: String,
    pub subject_type: OverwriteSubject,
    #[serde(with = "crate::mask")]
    pub allow_mask: u64,
    #[serde(with = "crate::mask")]
    pub deny_mask: u64,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Kind of a channel.  Unknown kinds captured from a newer platform
/// version deserialize as `Unknown` instead of failing the whole archive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
    Category,
    #[serde(other)]
    Unknown,
}

impl ChannelKind {
    /// Whether messages can be fetched from / replayed into this channel.
    pub fn is_text_capable(&self) -> bool {
        matches!(self, ChannelKind::Text)
    }
}

/// A guild channel, with its permission overwrites inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    /// Display name; empty names are skipped on restore, not fatal.
    pub name: String,
    pub kind: ChannelKind,
    /// Render order within the parent group.
    pub position: i64,
    /// Parent category, if any.  Restored only after the parent exists,
    /// or dropped if the parent could not be restored.
    pub parent_id: Option<ChannelId>,
    pub overwrites: Vec<PermissionOverwrite>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A captured message.  On replay only `content` is reconstructed; author
/// and original timestamp stay in the archive as provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Messages of one channel, most recent first as captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessages {
    pub channel_id: ChannelId,
    pub messages: Vec<Message>,
}

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// A guild audit log entry.  Read-only historical record: captured for
/// archival reference, never replayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub guild_id: GuildId,
    pub action_type: String,
    pub executor_id: UserId,
    pub target_id: Option<String>,
    /// Raw change set as reported by the platform.
    pub changes: serde_json::Value,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}
