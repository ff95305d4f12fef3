//! Manifest output.
//!
//! Writes a batch as pretty-printed JSON files, one per manifest, optionally
//! split into groups so separate runners can take one group each.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tn_core::{split_groups, Manifest};
use tracing::{debug, info};

/// Errors writing a batch to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize manifest {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File name of the `index`-th manifest, inside `group` when grouping.
#[must_use]
pub fn manifest_file_name(group: Option<usize>, index: usize) -> String {
    match group {
        Some(group) => format!("gen-group{:02}-{:04}.json", group, index),
        None => format!("gen-{:04}.json", index),
    }
}

/// Write `manifests` into `dir`, creating it if needed.
///
/// With `groups == 0` every manifest gets a sequential file; otherwise the
/// batch is split into at most `groups` contiguous groups. Returns the
/// written paths in batch order.
pub fn write_manifests(
    dir: &Path,
    manifests: &[Manifest],
    groups: usize,
) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(manifests.len());
    if groups == 0 {
        for (index, manifest) in manifests.iter().enumerate() {
            let path = dir.join(manifest_file_name(None, index));
            write_manifest(&path, manifest)?;
            written.push(path);
        }
    } else {
        for (group, members) in split_groups(manifests, groups).iter().enumerate() {
            for (index, manifest) in members.iter().enumerate() {
                let path = dir.join(manifest_file_name(Some(group), index));
                write_manifest(&path, manifest)?;
                written.push(path);
            }
        }
    }

    info!(dir = %dir.display(), files = written.len(), groups, "wrote manifests");
    Ok(written)
}

fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(manifest).map_err(|source| OutputError::Serialize {
        name: manifest.name.clone(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), manifest = %manifest.name, "wrote manifest");
    Ok(())
}
