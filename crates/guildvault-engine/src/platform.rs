//! The live-platform capability the engine is injected with.
//!
//! The engine assumes nothing about the transport behind these calls —
//! only that they may block on network I/O, are rate limited by the
//! platform, and that the platform assigns every id itself (client-chosen
//! ids are rejected, so restore always allocates new ones).

use async_trait::async_trait;

use guildvault_model::{
    AuditEntry, Channel, ChannelId, ChannelKind, GuildId, Message, MessageId, OverwriteSubject,
    Role, RoleId,
};

use crate::error::PlatformError;

/// Creation request for a role.  Carries everything a [`Role`] does
/// except the id, which the platform assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub position: i64,
    pub permission_mask: u64,
    pub mentionable: bool,
}

impl From<&Role> for RoleSpec {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            color: role.color,
            hoist: role.hoist,
            position: role.position,
            permission_mask: role.permission_mask,
            mentionable: role.mentionable,
        }
    }
}

/// A permission overwrite within a channel creation request.  Subject ids
/// here are already remapped to the target guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteSpec {
    pub subject_id: String,
    pub subject_type: OverwriteSubject,
    pub allow_mask: u64,
    pub deny_mask: u64,
}

/// Creation request for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub kind: ChannelKind,
    pub position: i64,
    /// Already-remapped parent category on the target, if resolvable.
    pub parent_id: Option<ChannelId>,
    pub overwrites: Vec<OverwriteSpec>,
}

/// Client capability for one community platform.
///
/// Listing calls are used by the capturer, creation calls by the
/// restorer.  Channel listing includes each channel's permission
/// overwrites inline; no separate round trip is implied.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn list_roles(&self, guild_id: &GuildId) -> Result<Vec<Role>, PlatformError>;

    async fn list_channels(&self, guild_id: &GuildId) -> Result<Vec<Channel>, PlatformError>;

    /// Up to `page_size` most recent messages of one channel, newest
    /// first.
    async fn list_messages(
        &self,
        channel_id: &ChannelId,
        page_size: usize,
    ) -> Result<Vec<Message>, PlatformError>;

    /// Up to `page_size` most recent audit log entries of the guild.
    async fn list_audit_entries(
        &self,
        guild_id: &GuildId,
        page_size: usize,
    ) -> Result<Vec<AuditEntry>, PlatformError>;

    async fn create_role(
        &self,
        guild_id: &GuildId,
        spec: &RoleSpec,
    ) -> Result<RoleId, PlatformError>;

    async fn create_channel(
        &self,
        guild_id: &GuildId,
        spec: &ChannelSpec,
    ) -> Result<ChannelId, PlatformError>;

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError>;
}
