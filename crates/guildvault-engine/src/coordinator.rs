//! Orchestrates capture and restore as single cancellable operations.
//!
//! The coordinator owns nothing between runs: it receives a platform
//! client and a log sink at construction, serializes operations per
//! guild, guarantees staging/extraction cleanup on every exit path, and
//! always ends a run with either a fatal error or a summary event.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use guildvault_archive::{archive_file_name, pack, unpack_in};
use guildvault_model::{CaptureSummary, GuildId, RestoreReport};

use crate::capture::{capture, CaptureOptions};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::platform::PlatformClient;
use crate::restore::{restore, RestoreOptions};
use crate::sink::{category, LogSink};

/// One published archive on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInfo {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Runs capture and restore operations against one platform client.
pub struct Coordinator {
    platform: Arc<dyn PlatformClient>,
    sink: Arc<dyn LogSink>,
    config: EngineConfig,
    /// Per-guild operation locks.  Concurrent captures of one guild risk
    /// inconsistent pagination; concurrent restores risk duplicate
    /// creation.  A second operation queues behind the first.  Entries
    /// are evicted once no operation holds or awaits them, so the map
    /// stays bounded by the number of in-flight guilds.
    guild_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Coordinator {
    pub fn new(
        platform: Arc<dyn PlatformClient>,
        sink: Arc<dyn LogSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            platform,
            sink,
            config,
            guild_locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_for(&self, guild_id: &GuildId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.guild_locks.lock().expect("guild lock map poisoned");
        locks
            .entry(guild_id.as_str().to_string())
            .or_default()
            .clone()
    }

    /// Drop the guild's lock entry once nothing holds or awaits it.
    /// Caller must have released its own `Arc` clone first; a strong
    /// count above one means another operation is queued on the lock.
    fn evict_lock(&self, guild_id: &GuildId) {
        let mut locks = self.guild_locks.lock().expect("guild lock map poisoned");
        if let Some(lock) = locks.get(guild_id.as_str()) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(guild_id.as_str());
            }
        }
    }

    /// Capture `guild_id` into a timestamped archive under the configured
    /// backup directory.
    ///
    /// Staging never touches the final location: the codec packs into a
    /// temp path and publishes atomically, so a fatal failure leaves no
    /// partial archive behind.
    pub async fn run_capture(
        &self,
        guild_id: &GuildId,
        options: CaptureOptions,
        cancel: &CancellationToken,
    ) -> Result<CaptureSummary, EngineError> {
        let lock = self.lock_for(guild_id);
        let guard = lock.lock().await;
        debug!(guild = %guild_id, "Starting capture");

        let result = self.capture_inner(guild_id, options, cancel).await;
        match &result {
            Ok(summary) => {
                info!(
                    guild = %guild_id,
                    path = %summary.archive_path,
                    bytes = summary.archive_bytes,
                    warnings = summary.warnings.len(),
                    "Backup complete"
                );
                self.sink.emit(
                    "BackupComplete",
                    category::BACKUP,
                    serde_json::to_value(summary).unwrap_or_default(),
                );
                if self.config.keep_archives > 0 {
                    if let Err(e) = self.prune_archives(self.config.keep_archives).await {
                        tracing::warn!(error = %e, "Archive pruning failed");
                    }
                }
            }
            Err(e) => {
                self.sink.emit(
                    "BackupFailed",
                    category::ERROR,
                    json!({ "guildId": guild_id, "reason": e.to_string() }),
                );
            }
        }

        drop(guard);
        drop(lock);
        self.evict_lock(guild_id);
        result
    }

    async fn capture_inner(
        &self,
        guild_id: &GuildId,
        options: CaptureOptions,
        cancel: &CancellationToken,
    ) -> Result<CaptureSummary, EngineError> {
        let (snapshot, warnings) = capture(
            self.platform.as_ref(),
            guild_id,
            &options,
            cancel,
            self.sink.as_ref(),
        )
        .await?;

        let file_name = archive_file_name(guild_id, snapshot.captured_at, options.include_messages);
        let dest = self.config.backup_dir.join(file_name);

        let roles = snapshot.roles.len();
        let channels = snapshot.channels.len();
        let messages = snapshot.message_count();
        let audit_entries = snapshot.audit_entries.len();

        let packed =
            tokio::task::spawn_blocking(move || pack(&snapshot, &dest)).await??;

        Ok(CaptureSummary {
            archive_path: packed.path.display().to_string(),
            archive_bytes: packed.bytes,
            roles,
            channels,
            messages,
            audit_entries,
            warnings,
        })
    }

    /// Restore `archive` onto `target_guild_id`.
    ///
    /// The archive is extracted into a scoped directory under the backup
    /// directory; it is removed on success, partial failure, fatal error
    /// and cancellation alike.
    pub async fn run_restore(
        &self,
        target_guild_id: &GuildId,
        archive: &Path,
        options: RestoreOptions,
        cancel: &CancellationToken,
    ) -> Result<RestoreReport, EngineError> {
        let lock = self.lock_for(target_guild_id);
        let guard = lock.lock().await;
        debug!(guild = %target_guild_id, archive = %archive.display(), "Starting restore");

        let result = self
            .restore_inner(target_guild_id, archive, options, cancel)
            .await;
        match &result {
            Ok(report) => {
                info!(
                    guild = %target_guild_id,
                    roles = report.roles.created,
                    channels = report.channels.created,
                    messages = report.messages.created,
                    "Restore complete"
                );
                self.sink.emit(
                    "RestoreComplete",
                    category::RESTORE,
                    serde_json::to_value(report).unwrap_or_default(),
                );
            }
            Err(e) => {
                self.sink.emit(
                    "RestoreFailed",
                    category::ERROR,
                    json!({ "guildId": target_guild_id, "reason": e.to_string() }),
                );
            }
        }

        drop(guard);
        drop(lock);
        self.evict_lock(target_guild_id);
        result
    }

    async fn restore_inner(
        &self,
        target_guild_id: &GuildId,
        archive: &Path,
        options: RestoreOptions,
        cancel: &CancellationToken,
    ) -> Result<RestoreReport, EngineError> {
        let archive = archive.to_path_buf();
        let work_dir = self.config.backup_dir.clone();
        let extraction =
            tokio::task::spawn_blocking(move || unpack_in(&archive, &work_dir)).await??;

        let report = restore(
            self.platform.as_ref(),
            target_guild_id,
            &extraction,
            &options,
            cancel,
            self.sink.as_ref(),
        )
        .await?;

        // Extraction drops here, removing its directory.
        Ok(report)
    }

    /// Archives in the backup directory, newest first.
    pub async fn list_archives(&self) -> Result<Vec<ArchiveInfo>, EngineError> {
        if !self.config.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.config.backup_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !file_name.ends_with(".tar.gz") {
                continue;
            }
            let meta = entry.metadata().await?;
            let modified: DateTime<Utc> = meta.modified().map(Into::into).unwrap_or_default();
            entries.push(ArchiveInfo {
                file_name,
                path: entry.path(),
                size_bytes: meta.len(),
                modified,
            });
        }

        // Timestamp-qualified names make the tie-break deterministic.
        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then(b.file_name.cmp(&a.file_name))
        });
        Ok(entries)
    }

    /// Remove all but the `keep` most recent archives (0 keeps
    /// everything).  Returns how many files were deleted.
    pub async fn prune_archives(&self, keep: usize) -> Result<usize, EngineError> {
        if keep == 0 {
            return Ok(0);
        }

        let mut removed = 0;
        for info in self.list_archives().await?.iter().skip(keep) {
            tokio::fs::remove_file(&info.path).await?;
            debug!(path = %info.path.display(), "Pruned archive");
            removed += 1;
        }
        Ok(removed)
    }
}
