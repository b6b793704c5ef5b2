use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use guildvault_model::{GuildId, Snapshot};

use crate::error::Result;
use crate::manifest::{Manifest, FORMAT_VERSION};
use crate::{AUDIT_FILE, CHANNELS_FILE, MANIFEST_FILE, MESSAGES_FILE, ROLES_FILE};

/// A successfully published archive.
#[derive(Debug, Clone)]
pub struct PackedArchive {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Timestamp-qualified archive file name, so repeated runs never collide
/// and a directory listing sorts chronologically.
pub fn archive_file_name(
    guild_id: &GuildId,
    captured_at: DateTime<Utc>,
    include_messages: bool,
) -> String {
    let stamp = captured_at.format("%Y%m%d_%H%M%S");
    if include_messages {
        format!("backup-{guild_id}-{stamp}.tar.gz")
    } else {
        format!("backup-{guild_id}-no-messages-{stamp}.tar.gz")
    }
}

/// Serialize `snapshot` into entity files plus a manifest, compress them
/// into one container, and publish it at `dest`.
///
/// Entity files are staged in a scoped temporary directory that is removed
/// on every exit path.  The container itself is written to a temp file in
/// `dest`'s directory and renamed into place only once the write has
/// completed, so no partial archive ever appears at the final location.
pub fn pack(snapshot: &Snapshot, dest: &Path) -> Result<PackedArchive> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix("guildvault-staging-")
        .tempdir_in(parent)?;
    debug!(path = %staging.path().display(), "Created staging directory");

    write_entity_file(staging.path(), ROLES_FILE, &snapshot.roles)?;
    write_entity_file(staging.path(), CHANNELS_FILE, &snapshot.channels)?;
    write_entity_file(staging.path(), MESSAGES_FILE, &snapshot.messages)?;
    write_entity_file(staging.path(), AUDIT_FILE, &snapshot.audit_entries)?;

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        captured_at: snapshot.captured_at,
        source_guild_id: snapshot.source_guild_id.clone(),
        files: vec![
            ROLES_FILE.to_string(),
            CHANNELS_FILE.to_string(),
            MESSAGES_FILE.to_string(),
            AUDIT_FILE.to_string(),
        ],
    };
    write_entity_file(staging.path(), MANIFEST_FILE, &manifest)?;

    // Compress into a temp file next to the destination, then persist.
    let tmp = NamedTempFile::new_in(parent)?;
    {
        let encoder = GzEncoder::new(tmp.as_file(), Compression::best());
        let mut builder = tar::Builder::new(encoder);
        let mut names: Vec<&str> = manifest.files.iter().map(String::as_str).collect();
        names.push(MANIFEST_FILE);
        for name in names {
            builder.append_path_with_name(staging.path().join(name), name)?;
        }
        builder.into_inner()?.finish()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;

    let bytes = std::fs::metadata(dest)?.len();
    info!(path = %dest.display(), bytes, "Archive published");

    // Staging dir is dropped (removed) here, after the container exists.
    Ok(PackedArchive {
        path: dest.to_path_buf(),
        bytes,
    })
}

fn write_entity_file<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    let mut file = File::create(dir.join(name))?;
    file.write_all(&json)?;
    Ok(())
}
