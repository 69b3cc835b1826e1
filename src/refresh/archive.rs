//! Zip extraction of the downloaded source files.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use zip::ZipArchive;

use crate::error_handling::UpdateError;

/// Extracts, for each non-empty filter, the first entry whose name contains it.
///
/// Entries are written flattened (directory prefix dropped) into `target_dir`
/// through a `.tmp` file renamed over the previous copy. Filters with no
/// matching entry are logged and skipped. Returns the written paths.
pub fn extract_matching(
    archive_path: &Path,
    target_dir: &Path,
    filters: &[&str],
) -> Result<Vec<PathBuf>, UpdateError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    // Archive order: the first matching entry in the zip wins.
    let entry_names: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| !name.ends_with('/'))
        .collect();

    let mut written = Vec::new();
    for filter in filters.iter().filter(|f| !f.is_empty()) {
        let Some(entry_name) = entry_names.iter().find(|name| name.contains(filter)) else {
            warn!(
                "No entry matching '{}' in {}",
                filter,
                archive_path.display()
            );
            continue;
        };
        let Some(file_name) = Path::new(entry_name).file_name() else {
            continue;
        };

        let target = target_dir.join(file_name);
        let temp = target_dir.join(format!("{}.tmp", file_name.to_string_lossy()));

        let mut entry = archive.by_name(entry_name)?;
        let copy = File::create(&temp).and_then(|mut out| {
            io::copy(&mut entry, &mut out)?;
            out.sync_all()
        });
        if let Err(e) = copy.and_then(|()| fs::rename(&temp, &target)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        info!("Extracted {} to {}", entry_name, target.display());
        written.push(target);
    }
    Ok(written)
}
