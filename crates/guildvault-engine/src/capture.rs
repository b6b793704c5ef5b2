//! Walks the live platform and assembles a [`Snapshot`].

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use guildvault_model::{
    CaptureWarning, ChannelId, ChannelMessages, GuildId, Message, Snapshot,
};

use crate::config::EngineConfig;
use crate::error::{CaptureError, CaptureStage, PlatformError};
use crate::platform::PlatformClient;
use crate::sink::{category, LogSink};

/// What a capture run includes and how hard it fetches.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub include_messages: bool,
    /// Most-recent messages fetched per text channel.
    pub message_page_size: usize,
    pub include_audit_logs: bool,
    /// Most-recent audit entries fetched for the guild.
    pub audit_page_size: usize,
    /// Worker pool size for message fetches across channels.  Fetching
    /// within one channel stays sequential to preserve recency order.
    pub fetch_concurrency: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            include_messages: true,
            message_page_size: 100,
            include_audit_logs: true,
            audit_page_size: 100,
            fetch_concurrency: 4,
        }
    }
}

impl CaptureOptions {
    /// Options seeded from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            message_page_size: config.message_page_size,
            audit_page_size: config.audit_page_size,
            fetch_concurrency: config.fetch_concurrency,
            ..Self::default()
        }
    }
}

/// Capture the full structural state of `guild_id`.
///
/// Role and channel enumeration failures are fatal: without roles no
/// overwrite can be resolved later, and without channels there is nothing
/// to snapshot.  Everything after that degrades gracefully — a channel
/// whose messages cannot be fetched becomes a warning, not an abort.
pub async fn capture(
    platform: &dyn PlatformClient,
    guild_id: &GuildId,
    options: &CaptureOptions,
    cancel: &CancellationToken,
    sink: &dyn LogSink,
) -> Result<(Snapshot, Vec<CaptureWarning>), CaptureError> {
    if cancel.is_cancelled() {
        return Err(CaptureError::Cancelled);
    }

    let mut snapshot = Snapshot::new(guild_id.clone());
    let mut warnings = Vec::new();

    snapshot.roles = platform
        .list_roles(guild_id)
        .await
        .map_err(|source| CaptureError::Stage {
            stage: CaptureStage::Roles,
            source,
        })?;
    debug!(guild = %guild_id, roles = snapshot.roles.len(), "Captured roles");

    if cancel.is_cancelled() {
        return Err(CaptureError::Cancelled);
    }

    snapshot.channels = platform
        .list_channels(guild_id)
        .await
        .map_err(|source| CaptureError::Stage {
            stage: CaptureStage::Channels,
            source,
        })?;
    debug!(guild = %guild_id, channels = snapshot.channels.len(), "Captured channels");

    if cancel.is_cancelled() {
        return Err(CaptureError::Cancelled);
    }

    if options.include_messages {
        let groups =
            fetch_messages(platform, &snapshot, options, cancel, sink, &mut warnings).await?;
        snapshot.messages = groups;
    }

    if cancel.is_cancelled() {
        return Err(CaptureError::Cancelled);
    }

    if options.include_audit_logs {
        match platform
            .list_audit_entries(guild_id, options.audit_page_size)
            .await
        {
            Ok(entries) => snapshot.audit_entries = entries,
            Err(e) => record_warning(
                sink,
                &mut warnings,
                "auditLog",
                guild_id.as_str(),
                &e.to_string(),
            ),
        }
    }

    Ok((snapshot, warnings))
}

/// Fetch the most recent page of messages for every text-capable channel
/// with a bounded worker pool.  Unlimited parallelism is disallowed: the
/// platform rate-limits per route.
async fn fetch_messages(
    platform: &dyn PlatformClient,
    snapshot: &Snapshot,
    options: &CaptureOptions,
    cancel: &CancellationToken,
    sink: &dyn LogSink,
    warnings: &mut Vec<CaptureWarning>,
) -> Result<Vec<ChannelMessages>, CaptureError> {
    let text_channels: Vec<ChannelId> = snapshot
        .channels
        .iter()
        .filter(|c| c.kind.is_text_capable())
        .map(|c| c.id.clone())
        .collect();

    let page_size = options.message_page_size;
    let concurrency = options.fetch_concurrency.max(1);

    type Fetched = (ChannelId, Option<Result<Vec<Message>, PlatformError>>);
    let fetched: Vec<Fetched> = stream::iter(text_channels)
        .map(|id| async move {
            // Checked between individual channel fetches.
            if cancel.is_cancelled() {
                return (id, None);
            }
            let result = platform.list_messages(&id, page_size).await;
            (id, Some(result))
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    if cancel.is_cancelled() {
        return Err(CaptureError::Cancelled);
    }

    let mut by_channel: HashMap<ChannelId, Vec<Message>> = HashMap::new();
    for (id, outcome) in fetched {
        match outcome {
            Some(Ok(messages)) => {
                by_channel.insert(id, messages);
            }
            Some(Err(e)) => record_warning(
                sink,
                warnings,
                "channel",
                id.as_str(),
                &format!("messages unavailable: {e}"),
            ),
            // Cancelled before this channel's fetch started; the run
            // aborts above anyway.
            None => {}
        }
    }

    // Group in channel-listing order so repeated captures of the same
    // state serialize identically.
    let mut groups = Vec::new();
    for channel in &snapshot.channels {
        if let Some(messages) = by_channel.remove(&channel.id) {
            groups.push(ChannelMessages {
                channel_id: channel.id.clone(),
                messages,
            });
        }
    }
    Ok(groups)
}

fn record_warning(
    sink: &dyn LogSink,
    warnings: &mut Vec<CaptureWarning>,
    entity: &str,
    id: &str,
    reason: &str,
) {
    warn!(entity, id, reason, "Partial capture");
    sink.emit(
        "CaptureWarning",
        category::BACKUP,
        json!({ "entity": entity, "id": id, "reason": reason }),
    );
    warnings.push(CaptureWarning {
        entity: entity.to_string(),
        id: id.to_string(),
        reason: reason.to_string(),
    });
}
