//! In-memory `PlatformClient` double and test fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use guildvault_archive::{pack, unpack, Extraction};
use guildvault_model::{
    AuditEntry, Channel, ChannelId, ChannelKind, ChannelMessages, GuildId, Message, MessageId,
    OverwriteSubject, PermissionOverwrite, Role, RoleId, Snapshot, UserId,
};

use crate::error::PlatformError;
use crate::platform::{ChannelSpec, PlatformClient, RoleSpec};
use crate::sink::LogSink;

/// Live-guild contents served by a [`MemoryPlatform`].
#[derive(Debug, Default, Clone)]
pub struct GuildState {
    pub roles: Vec<Role>,
    pub channels: Vec<Channel>,
    pub messages: HashMap<ChannelId, Vec<Message>>,
    pub audit_entries: Vec<AuditEntry>,
}

#[derive(Debug, Default)]
struct Failures {
    role_listing: bool,
    message_channels: HashSet<ChannelId>,
    role_names: HashSet<String>,
    channel_names: HashSet<String>,
    message_substrings: Vec<String>,
    fail_nth_channel_create: Option<usize>,
}

/// In-memory platform: serves a seeded guild for capture and records
/// everything a restore creates.  Failures are injected per entity.
#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<GuildState>,
    failures: Mutex<Failures>,
    created_roles: Mutex<Vec<(RoleId, RoleSpec)>>,
    created_channels: Mutex<Vec<(ChannelId, ChannelSpec)>>,
    sent: Mutex<HashMap<ChannelId, Vec<String>>>,
    channel_creates_seen: AtomicUsize,
}

impl MemoryPlatform {
    pub fn with_state(state: GuildState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fail_role_listing(&self) {
        self.failures.lock().unwrap().role_listing = true;
    }

    pub fn fail_messages_for(&self, channel: &ChannelId) {
        self.failures
            .lock()
            .unwrap()
            .message_channels
            .insert(channel.clone());
    }

    pub fn fail_role_named(&self, name: &str) {
        self.failures
            .lock()
            .unwrap()
            .role_names
            .insert(name.to_string());
    }

    pub fn fail_channel_named(&self, name: &str) {
        self.failures
            .lock()
            .unwrap()
            .channel_names
            .insert(name.to_string());
    }

    /// Fail the `n`th `create_channel` call (1-based).
    pub fn fail_nth_channel_create(&self, n: usize) {
        self.failures.lock().unwrap().fail_nth_channel_create = Some(n);
    }

    pub fn fail_message_containing(&self, substring: &str) {
        self.failures
            .lock()
            .unwrap()
            .message_substrings
            .push(substring.to_string());
    }

    pub fn created_roles(&self) -> Vec<(RoleId, RoleSpec)> {
        self.created_roles.lock().unwrap().clone()
    }

    pub fn created_channels(&self) -> Vec<(ChannelId, ChannelSpec)> {
        self.created_channels.lock().unwrap().clone()
    }

    pub fn sent_messages(&self, channel: &ChannelId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(prefix: &str) -> String {
        format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
    }
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
    async fn list_roles(&self, _guild_id: &GuildId) -> Result<Vec<Role>, PlatformError> {
        if self.failures.lock().unwrap().role_listing {
            return Err(PlatformError::Api("role listing unavailable".into()));
        }
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn list_channels(&self, _guild_id: &GuildId) -> Result<Vec<Channel>, PlatformError> {
        Ok(self.state.lock().unwrap().channels.clone())
    }

    async fn list_messages(
        &self,
        channel_id: &ChannelId,
        page_size: usize,
    ) -> Result<Vec<Message>, PlatformError> {
        if self
            .failures
            .lock()
            .unwrap()
            .message_channels
            .contains(channel_id)
        {
            return Err(PlatformError::RateLimited("route exhausted".into()));
        }
        let state = self.state.lock().unwrap();
        let messages = state
            .messages
            .get(channel_id)
            .map(|m| m.iter().take(page_size).cloned().collect())
            .unwrap_or_default();
        Ok(messages)
    }

    async fn list_audit_entries(
        &self,
        _guild_id: &GuildId,
        page_size: usize,
    ) -> Result<Vec<AuditEntry>, PlatformError> {
        let state = self.state.lock().unwrap();
        Ok(state.audit_entries.iter().take(page_size).cloned().collect())
    }

    async fn create_role(
        &self,
        _guild_id: &GuildId,
        spec: &RoleSpec,
    ) -> Result<RoleId, PlatformError> {
        if self.failures.lock().unwrap().role_names.contains(&spec.name) {
            return Err(PlatformError::Denied(format!(
                "cannot create role '{}'",
                spec.name
            )));
        }
        let id = RoleId::new(Self::next_id("role"));
        self.created_roles
            .lock()
            .unwrap()
            .push((id.clone(), spec.clone()));
        Ok(id)
    }

    async fn create_channel(
        &self,
        _guild_id: &GuildId,
        spec: &ChannelSpec,
    ) -> Result<ChannelId, PlatformError> {
        let seen = self.channel_creates_seen.fetch_add(1, Ordering::SeqCst) + 1;
        let failures = self.failures.lock().unwrap();
        if failures.fail_nth_channel_create == Some(seen)
            || failures.channel_names.contains(&spec.name)
        {
            return Err(PlatformError::Api(format!(
                "cannot create channel '{}'",
                spec.name
            )));
        }
        drop(failures);

        let id = ChannelId::new(Self::next_id("channel"));
        self.created_channels
            .lock()
            .unwrap()
            .push((id.clone(), spec.clone()));
        Ok(id)
    }

    async fn send_message(
        &self,
        channel_id: &ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        let blocked = self
            .failures
            .lock()
            .unwrap()
            .message_substrings
            .iter()
            .any(|s| content.contains(s.as_str()));
        if blocked {
            return Err(PlatformError::Api("message rejected".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .entry(channel_id.clone())
            .or_default()
            .push(content.to_string());
        Ok(MessageId::new(Self::next_id("message")))
    }
}

/// Sink that records every emitted event for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, String, serde_json::Value)>>,
}

impl RecordingSink {
    pub fn saw_event(&self, name: &str) -> bool {
        self.events.lock().unwrap().iter().any(|(e, _, _)| e == name)
    }

    pub fn events_named(&self, name: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _, _)| e == name)
            .map(|(_, _, d)| d.clone())
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn emit(&self, event: &str, category: &str, data: serde_json::Value) {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), category.to_string(), data));
    }
}

/// Install a fmt subscriber for test output; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two roles, one category with a text child carrying a `Member`
/// overwrite, two messages in the child, one audit entry.
pub fn sample_guild() -> GuildState {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 5, 0).unwrap();

    let child = ChannelId::new("c-child");
    let older = Message {
        id: MessageId::new("m-older"),
        channel_id: child.clone(),
        author_id: UserId::new("u1"),
        content: "hello".into(),
        created_at: t0,
    };
    let newer = Message {
        id: MessageId::new("m-newer"),
        channel_id: child.clone(),
        author_id: UserId::new("u2"),
        content: "world".into(),
        created_at: t1,
    };

    GuildState {
        roles: vec![
            Role {
                id: RoleId::new("r-admin"),
                name: "Admin".into(),
                color: 0xE74C3C,
                hoist: true,
                position: 2,
                permission_mask: 8,
                mentionable: false,
            },
            Role {
                id: RoleId::new("r-member"),
                name: "Member".into(),
                color: 0x2ECC71,
                hoist: false,
                position: 1,
                permission_mask: (1u64 << 60) | 1024 | 2048,
                mentionable: true,
            },
        ],
        channels: vec![
            Channel {
                id: ChannelId::new("c-cat"),
                name: "General".into(),
                kind: ChannelKind::Category,
                position: 0,
                parent_id: None,
                overwrites: Vec::new(),
            },
            Channel {
                id: child.clone(),
                name: "general-chat".into(),
                kind: ChannelKind::Text,
                position: 0,
                parent_id: Some(ChannelId::new("c-cat")),
                overwrites: vec![PermissionOverwrite {
                    subject_id: "r-member".into(),
                    subject_type: OverwriteSubject::Role,
                    allow_mask: 1024 | 2048,
                    deny_mask: 0,
                }],
            },
        ],
        // Most recent first, as the platform returns them.
        messages: HashMap::from([(child, vec![newer, older])]),
        audit_entries: vec![AuditEntry {
            id: "a1".into(),
            guild_id: GuildId::new("g1"),
            action_type: "MEMBER_BAN_ADD".into(),
            executor_id: UserId::new("u1"),
            target_id: Some("u3".into()),
            changes: serde_json::json!([]),
            reason: Some("spam".into()),
            timestamp: t1,
        }],
    }
}

/// Snapshot equivalent of [`sample_guild`], for restore-side tests.
pub fn sample_snapshot() -> Snapshot {
    let state = sample_guild();
    let mut snapshot = Snapshot::new(GuildId::new("g1"));
    snapshot.roles = state.roles;
    snapshot.channels = state.channels;
    snapshot.messages = state
        .messages
        .into_iter()
        .map(|(channel_id, messages)| ChannelMessages {
            channel_id,
            messages,
        })
        .collect();
    snapshot.audit_entries = state.audit_entries;
    snapshot
}

/// Pack `snapshot` into a throwaway archive and hand back its extraction.
pub fn extraction_for(snapshot: &Snapshot) -> Extraction {
    let dir = tempfile::TempDir::new().unwrap();
    let dest = dir.path().join("fixture.tar.gz");
    pack(snapshot, &dest).unwrap();
    unpack(&dest).unwrap()
}
