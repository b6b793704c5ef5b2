//! Operation outcome reporting.
//!
//! Per-entity problems never abort an operation; they are tallied here so
//! every run ends with either a fatal error or an explicit count of what
//! was created, skipped and failed — never a silent partial success.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ChannelId, RoleId};

/// Created / skipped / failed counts for one entity class.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityTally {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl EntityTally {
    pub fn total(&self) -> usize {
        self.created + self.skipped + self.failed
    }
}

/// Run-scoped mapping from archived ids to the ids newly assigned on the
/// restore target.  Returned to operators for cross-referencing.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdRemap {
    pub roles: HashMap<RoleId, RoleId>,
    pub channels: HashMap<ChannelId, ChannelId>,
}

impl IdRemap {
    pub fn resolve_role(&self, old: &RoleId) -> Option<&RoleId> {
        self.roles.get(old)
    }

    pub fn resolve_channel(&self, old: &ChannelId) -> Option<&ChannelId> {
        self.channels.get(old)
    }
}

/// Final result of a restore run.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub roles: EntityTally,
    pub channels: EntityTally,
    /// Overwrites applied (`created`) vs dropped because their subject
    /// could not be resolved (`skipped`).
    pub overwrites: EntityTally,
    pub messages: EntityTally,
    pub remap: IdRemap,
}

/// A non-fatal problem recorded during capture, with enough context to
/// diagnose which entity was affected and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureWarning {
    /// Entity class, e.g. `"channel"`.
    pub entity: String,
    pub id: String,
    pub reason: String,
}

impl std::fmt::Display for CaptureWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.entity, self.id, self.reason)
    }
}

/// Summary of a completed capture, emitted to the log sink and returned to
/// the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    /// Final (published) archive location.
    pub archive_path: String,
    pub archive_bytes: u64,
    pub roles: usize,
    pub channels: usize,
    pub messages: usize,
    pub audit_entries: usize,
    pub warnings: Vec<CaptureWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remap_resolution() {
        let mut remap = IdRemap::default();
        remap
            .roles
            .insert(RoleId::new("old"), RoleId::new("new"));

        assert_eq!(
            remap.resolve_role(&RoleId::new("old")),
            Some(&RoleId::new("new"))
        );
        assert_eq!(remap.resolve_role(&RoleId::new("missing")), None);
    }

    #[test]
    fn test_tally_total() {
        let tally = EntityTally {
            created: 2,
            skipped: 1,
            failed: 1,
        };
        assert_eq!(tally.total(), 4);
    }
}
