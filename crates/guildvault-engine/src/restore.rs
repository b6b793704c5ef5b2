//! Rebuilds live guild objects from an extracted archive.
//!
//! Entity classes run as a strict phase sequence: roles, then channels,
//! then messages.  Later phases reference earlier ones by archived id
//! through a running remap table.  No per-entity problem ever aborts the
//! run; only unreadable input or cancellation does.

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use guildvault_archive::Extraction;
use guildvault_model::{
    Channel, ChannelKind, GuildId, IdRemap, OverwriteSubject, RestoreReport, RoleId,
};

use crate::error::RestoreError;
use crate::platform::{ChannelSpec, OverwriteSpec, PlatformClient, RoleSpec};
use crate::sink::{category, LogSink};

/// What a restore run replays.
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Replay captured message content into the restored channels.
    /// Authorship and original timestamps cannot be reconstructed; they
    /// remain in the archive as provenance.
    pub restore_messages: bool,
}

/// Restore the archive in `extraction` onto `target_guild_id`.
///
/// The target is assumed empty or disposable: no collision detection is
/// performed and every object is created fresh with a platform-assigned
/// id.
pub async fn restore(
    platform: &dyn PlatformClient,
    target_guild_id: &GuildId,
    extraction: &Extraction,
    options: &RestoreOptions,
    cancel: &CancellationToken,
    sink: &dyn LogSink,
) -> Result<RestoreReport, RestoreError> {
    let mut report = RestoreReport::default();

    if cancel.is_cancelled() {
        return Err(RestoreError::Cancelled);
    }
    restore_roles(platform, target_guild_id, extraction, sink, &mut report).await?;

    if cancel.is_cancelled() {
        return Err(RestoreError::Cancelled);
    }
    restore_channels(platform, target_guild_id, extraction, sink, &mut report).await?;

    if cancel.is_cancelled() {
        return Err(RestoreError::Cancelled);
    }
    if options.restore_messages {
        restore_messages(platform, extraction, sink, &mut report).await?;
    }

    // Audit entries are read-only history; they stay in the archive.
    Ok(report)
}

/// Phase 1: roles.  Everything that can reference a role comes later, so
/// the remap table is complete before channels need it.
async fn restore_roles(
    platform: &dyn PlatformClient,
    guild_id: &GuildId,
    extraction: &Extraction,
    sink: &dyn LogSink,
    report: &mut RestoreReport,
) -> Result<(), RestoreError> {
    for role in extraction.roles()? {
        if role.name.trim().is_empty() {
            report.roles.skipped += 1;
            sink.emit(
                "RoleSkipped",
                category::RESTORE,
                json!({ "oldId": role.id, "reason": "empty name" }),
            );
            continue;
        }

        match platform.create_role(guild_id, &RoleSpec::from(&role)).await {
            Ok(new_id) => {
                debug!(old = %role.id, new = %new_id, name = %role.name, "Role restored");
                report.remap.roles.insert(role.id.clone(), new_id);
                report.roles.created += 1;
            }
            Err(e) => {
                warn!(old = %role.id, name = %role.name, error = %e, "Role restore failed");
                sink.emit(
                    "RoleRestoreFailed",
                    category::RESTORE,
                    json!({ "oldId": role.id, "name": role.name, "reason": e.to_string() }),
                );
                report.roles.failed += 1;
            }
        }
    }
    Ok(())
}

/// Phase 2: channels.  Categories go first so that a child's `parentId`
/// remap entry exists before it is needed; within one parent group the
/// ascending capture position is preserved.
async fn restore_channels(
    platform: &dyn PlatformClient,
    guild_id: &GuildId,
    extraction: &Extraction,
    sink: &dyn LogSink,
    report: &mut RestoreReport,
) -> Result<(), RestoreError> {
    let channels = extraction.channels()?;

    let mut categories: Vec<&Channel> = channels
        .iter()
        .filter(|c| c.kind == ChannelKind::Category)
        .collect();
    categories.sort_by_key(|c| c.position);

    let mut children: Vec<&Channel> = channels
        .iter()
        .filter(|c| c.kind != ChannelKind::Category)
        .collect();
    children.sort_by(|a, b| {
        let pa = a.parent_id.as_ref().map(|p| p.as_str()).unwrap_or("");
        let pb = b.parent_id.as_ref().map(|p| p.as_str()).unwrap_or("");
        pa.cmp(pb).then(a.position.cmp(&b.position))
    });

    for channel in categories.into_iter().chain(children) {
        if channel.name.trim().is_empty() {
            report.channels.skipped += 1;
            sink.emit(
                "ChannelSkipped",
                category::RESTORE,
                json!({ "oldId": channel.id, "reason": "empty name" }),
            );
            continue;
        }

        let parent_id = match &channel.parent_id {
            None => None,
            Some(old_parent) => match report.remap.resolve_channel(old_parent) {
                Some(new_parent) => Some(new_parent.clone()),
                None => {
                    // Parent was not restored; create without it rather
                    // than failing the channel.
                    warn!(
                        old = %channel.id,
                        parent = %old_parent,
                        "Parent unresolved, dropping reference"
                    );
                    sink.emit(
                        "ChannelParentDropped",
                        category::RESTORE,
                        json!({ "oldId": channel.id, "parentId": old_parent }),
                    );
                    None
                }
            },
        };

        let (overwrites, applied) =
            resolve_overwrites(channel, &report.remap, sink, &mut report.overwrites.skipped);

        let spec = ChannelSpec {
            name: channel.name.clone(),
            kind: channel.kind,
            position: channel.position,
            parent_id,
            overwrites,
        };

        match platform.create_channel(guild_id, &spec).await {
            Ok(new_id) => {
                debug!(old = %channel.id, new = %new_id, name = %channel.name, "Channel restored");
                report.remap.channels.insert(channel.id.clone(), new_id);
                report.channels.created += 1;
                report.overwrites.created += applied;
            }
            Err(e) => {
                warn!(old = %channel.id, name = %channel.name, error = %e, "Channel restore failed");
                sink.emit(
                    "ChannelRestoreFailed",
                    category::RESTORE,
                    json!({ "oldId": channel.id, "name": channel.name, "reason": e.to_string() }),
                );
                report.channels.failed += 1;
            }
        }
    }
    Ok(())
}

/// Remap a channel's overwrites.  Role subjects resolve through the remap
/// table; user ids are not guild-scoped and pass through unchanged.  An
/// unresolvable subject drops that overwrite, never the channel.
fn resolve_overwrites(
    channel: &Channel,
    remap: &IdRemap,
    sink: &dyn LogSink,
    dropped: &mut usize,
) -> (Vec<OverwriteSpec>, usize) {
    let mut specs = Vec::with_capacity(channel.overwrites.len());
    for ow in &channel.overwrites {
        let subject_id = match ow.subject_type {
            OverwriteSubject::User => Some(ow.subject_id.clone()),
            OverwriteSubject::Role => remap
                .resolve_role(&RoleId::from(ow.subject_id.as_str()))
                .map(|id| id.as_str().to_string()),
        };
        match subject_id {
            Some(subject_id) => specs.push(OverwriteSpec {
                subject_id,
                subject_type: ow.subject_type,
                allow_mask: ow.allow_mask,
                deny_mask: ow.deny_mask,
            }),
            None => {
                *dropped += 1;
                sink.emit(
                    "OverwriteDropped",
                    category::RESTORE,
                    json!({ "channelId": channel.id, "subjectId": ow.subject_id }),
                );
            }
        }
    }
    let applied = specs.len();
    (specs, applied)
}

/// Phase 3: messages.  Replayed oldest first so the restored channel
/// reads chronologically, into channels that were actually created.
async fn restore_messages(
    platform: &dyn PlatformClient,
    extraction: &Extraction,
    sink: &dyn LogSink,
    report: &mut RestoreReport,
) -> Result<(), RestoreError> {
    for group in extraction.messages()? {
        let Some(new_channel) = report.remap.resolve_channel(&group.channel_id).cloned() else {
            report.messages.skipped += group.messages.len();
            continue;
        };

        let mut messages = group.messages;
        messages.sort_by_key(|m| m.created_at);

        for message in messages {
            if message.content.trim().is_empty() {
                // Platforms reject empty bodies; nothing to replay.
                report.messages.skipped += 1;
                continue;
            }
            match platform.send_message(&new_channel, &message.content).await {
                Ok(_) => report.messages.created += 1,
                Err(e) => {
                    warn!(
                        channel = %new_channel,
                        message = %message.id,
                        error = %e,
                        "Message replay failed"
                    );
                    sink.emit(
                        "MessageReplayFailed",
                        category::RESTORE,
                        json!({
                            "channelId": group.channel_id,
                            "messageId": message.id,
                            "reason": e.to_string(),
                        }),
                    );
                    report.messages.failed += 1;
                }
            }
        }
    }
    Ok(())
}
