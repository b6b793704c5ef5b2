//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults so the engine runs with zero configuration
//! in development.

use std::path::PathBuf;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory where published archives live.
    /// Env: `GUILDVAULT_BACKUP_DIR`
    /// Default: `./backups`
    pub backup_dir: PathBuf,

    /// Worker pool size for message fetches during capture.  Unlimited
    /// parallel fetch would trip the platform's per-route rate limits.
    /// Env: `GUILDVAULT_FETCH_CONCURRENCY`
    /// Default: `4`
    pub fetch_concurrency: usize,

    /// Most-recent messages captured per text channel.
    /// Env: `GUILDVAULT_MESSAGE_PAGE_SIZE`
    /// Default: `100`
    pub message_page_size: usize,

    /// Most-recent audit entries captured per guild.
    /// Env: `GUILDVAULT_AUDIT_PAGE_SIZE`
    /// Default: `100`
    pub audit_page_size: usize,

    /// How many archives `prune_archives` keeps by default (0 = keep all).
    /// Env: `GUILDVAULT_KEEP_ARCHIVES`
    /// Default: `10`
    pub keep_archives: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from("./backups"),
            fetch_concurrency: 4,
            message_page_size: 100,
            audit_page_size: 100,
            keep_archives: 10,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("GUILDVAULT_BACKUP_DIR") {
            config.backup_dir = PathBuf::from(dir);
        }

        if let Ok(val) = std::env::var("GUILDVAULT_FETCH_CONCURRENCY") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.fetch_concurrency = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid GUILDVAULT_FETCH_CONCURRENCY, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("GUILDVAULT_MESSAGE_PAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.message_page_size = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid GUILDVAULT_MESSAGE_PAGE_SIZE, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("GUILDVAULT_AUDIT_PAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.audit_page_size = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid GUILDVAULT_AUDIT_PAGE_SIZE, using default"
                ),
            }
        }

        if let Ok(val) = std::env::var("GUILDVAULT_KEEP_ARCHIVES") {
            if let Ok(n) = val.parse::<usize>() {
                config.keep_archives = n;
            }
        }

        config
    }
}
