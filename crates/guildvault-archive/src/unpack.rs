use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use tempfile::TempDir;
use tracing::debug;

use guildvault_model::{AuditEntry, Channel, ChannelMessages, Role, Snapshot};

use crate::error::{CodecError, Result};
use crate::manifest::Manifest;
use crate::{AUDIT_FILE, CHANNELS_FILE, MANIFEST_FILE, MESSAGES_FILE, ROLES_FILE};

/// An extracted archive, scoped to a temporary directory.
///
/// The directory is removed when this value drops, on every exit path —
/// callers hold the `Extraction` for exactly as long as a restore needs
/// the files.
#[derive(Debug)]
pub struct Extraction {
    dir: TempDir,
    manifest: Manifest,
}

/// Extract `archive` into a fresh temporary directory and validate its
/// manifest.  An unreadable container or unknown format version is fatal;
/// no best-effort parse is attempted.
pub fn unpack(archive: &Path) -> Result<Extraction> {
    let dir = tempfile::Builder::new()
        .prefix("guildvault-extract-")
        .tempdir()?;
    unpack_with(archive, dir)
}

/// Like [`unpack`], but extracts under `parent` instead of the system
/// temp directory.  Keeps extraction on the same filesystem as the
/// archive store and makes leftover detection trivial.
pub fn unpack_in(archive: &Path, parent: &Path) -> Result<Extraction> {
    std::fs::create_dir_all(parent)?;
    unpack_with(
        archive,
        tempfile::Builder::new()
            .prefix("guildvault-extract-")
            .tempdir_in(parent)?,
    )
}

fn unpack_with(archive: &Path, dir: TempDir) -> Result<Extraction> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.unpack(dir.path())?;

    let manifest_path = dir.path().join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(CodecError::MissingManifest);
    }
    let manifest: Manifest = serde_json::from_reader(File::open(manifest_path)?)?;
    manifest.check_version()?;

    debug!(
        path = %dir.path().display(),
        version = manifest.format_version,
        "Archive extracted"
    );

    Ok(Extraction { dir, manifest })
}

impl Extraction {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn roles(&self) -> Result<Vec<Role>> {
        self.load(ROLES_FILE)
    }

    pub fn channels(&self) -> Result<Vec<Channel>> {
        self.load(CHANNELS_FILE)
    }

    pub fn messages(&self) -> Result<Vec<ChannelMessages>> {
        self.load(MESSAGES_FILE)
    }

    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
        self.load(AUDIT_FILE)
    }

    /// Reassemble the full snapshot this archive was packed from.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            captured_at: self.manifest.captured_at,
            source_guild_id: self.manifest.source_guild_id.clone(),
            roles: self.roles()?,
            channels: self.channels()?,
            messages: self.messages()?,
            audit_entries: self.audit_entries()?,
        })
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.path().join(name);
        if !path.exists() {
            return Err(CodecError::MissingEntry(name.to_string()));
        }
        Ok(serde_json::from_reader(File::open(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack;
    use guildvault_model::{ChannelId, ChannelKind, GuildId, RoleId};
    use std::io::Write;

    fn sample_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(GuildId::new("g1"));
        snapshot.roles.push(Role {
            id: RoleId::new("r1"),
            name: "Admin".into(),
            color: 0x5865F2,
            hoist: true,
            position: 1,
            permission_mask: (1u64 << 60) | 8,
            mentionable: false,
        });
        snapshot.channels.push(Channel {
            id: ChannelId::new("c1"),
            name: "general".into(),
            kind: ChannelKind::Text,
            position: 0,
            parent_id: None,
            overwrites: Vec::new(),
        });
        snapshot
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("backup.tar.gz");

        let snapshot = sample_snapshot();
        pack(&snapshot, &dest).unwrap();

        let extraction = unpack(&dest).unwrap();
        let restored = extraction.snapshot().unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_extraction_dir_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("backup.tar.gz");
        pack(&sample_snapshot(), &dest).unwrap();

        let extraction = unpack(&dest).unwrap();
        let extract_path = extraction.path().to_path_buf();
        assert!(extract_path.exists());

        drop(extraction);
        assert!(!extract_path.exists());
    }

    #[test]
    fn test_corrupt_container_is_fatal() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("bogus.tar.gz");
        std::fs::write(&dest, b"this is not a gzip stream").unwrap();

        assert!(unpack(&dest).is_err());
    }

    #[test]
    fn test_unknown_version_is_fatal() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("backup.tar.gz");
        pack(&sample_snapshot(), &dest).unwrap();

        // Rewrite the archive with a bumped manifest version.
        let extraction = unpack(&dest).unwrap();
        let mut manifest = extraction.manifest().clone();
        manifest.format_version += 1;

        let tampered = dir.path().join("tampered.tar.gz");
        let out = File::create(&tampered).unwrap();
        let encoder = flate2::write::GzEncoder::new(out, flate2::Compression::best());
        let mut builder = tar::Builder::new(encoder);
        for name in &manifest.files {
            builder
                .append_path_with_name(extraction.path().join(name), name)
                .unwrap();
        }
        let manifest_json = serde_json::to_vec(&manifest).unwrap();
        let mut header = tar::Header::new_gnu();
        header.set_size(manifest_json.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, MANIFEST_FILE, manifest_json.as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();

        let err = unpack(&tampered).unwrap_err();
        assert!(matches!(err, CodecError::VersionMismatch { .. }));
    }

    #[test]
    fn test_packing_twice_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let snapshot = sample_snapshot();

        let a = dir.path().join("first.tar.gz");
        let b = dir.path().join("second.tar.gz");
        pack(&snapshot, &a).unwrap();
        pack(&snapshot, &b).unwrap();

        let ea = unpack(&a).unwrap();
        let eb = unpack(&b).unwrap();
        for name in &ea.manifest().files {
            let da = std::fs::read(ea.path().join(name)).unwrap();
            let db = std::fs::read(eb.path().join(name)).unwrap();
            assert_eq!(da, db, "entity payload {name} differs between packs");
        }
    }
}
