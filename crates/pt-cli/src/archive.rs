//! Session archive extraction.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::ZipArchive;

/// Extracts every entry of `archive` into `dest`, returning the written file paths.
///
/// Entries whose names would escape `dest` (absolute paths, `..`) are rejected.
pub fn extract(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive {}", archive.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("failed to read archive {}", archive.display()))?;

    let mut written = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .with_context(|| format!("failed to read entry {index} of {}", archive.display()))?;

        let Some(relative) = entry.enclosed_name() else {
            anyhow::bail!(
                "archive {} contains unsafe entry name {:?}",
                archive.display(),
                entry.name()
            );
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut out = File::create(&target)
            .with_context(|| format!("failed to create {}", target.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {}", target.display()))?;

        tracing::trace!(path = %target.display(), "extracted archive entry");
        written.push(target);
    }

    Ok(written)
}
