//! Local data age.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::FileFilters;
use crate::geoip::discovery::first_matching_file;

/// Last-write time of the first data file matching any enabled filter.
///
/// `None` when the directory is missing or holds no matching file.
pub fn local_last_write(directory: &Path, filters: &FileFilters) -> io::Result<Option<DateTime<Utc>>> {
    let Some(path) = first_matching_file(directory, filters)? else {
        return Ok(None);
    };
    let modified = std::fs::metadata(&path)?.modified()?;
    Ok(Some(DateTime::<Utc>::from(modified)))
}
