//! Locating source files in the data directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::FileFilters;

/// Source files found for one load. `None` means not present or disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredFiles {
    pub blocks_ipv4: Option<PathBuf>,
    pub blocks_ipv6: Option<PathBuf>,
    pub locations: Option<PathBuf>,
    pub isps: Option<PathBuf>,
}

impl DiscoveredFiles {
    pub fn has_blocks(&self) -> bool {
        self.blocks_ipv4.is_some() || self.blocks_ipv6.is_some()
    }
}

/// Finds one file per filter in `directory`.
///
/// Entries are considered in file-name order; an entry named exactly like the
/// filter wins, otherwise the first entry whose name contains it. Archives
/// and `.tmp` files left by an update are never returned. A missing directory
/// finds nothing.
pub fn discover_files(directory: &Path, filters: &FileFilters) -> io::Result<DiscoveredFiles> {
    let names = match list_candidates(directory) {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };

    let pick = |filter: &str| select(&names, filter).map(|name| directory.join(name));
    Ok(DiscoveredFiles {
        blocks_ipv4: pick(&filters.blocks_ipv4),
        blocks_ipv6: pick(&filters.blocks_ipv6),
        locations: pick(&filters.locations),
        isps: pick(&filters.isps),
    })
}

/// Path of the first file (in filter order) matching any enabled filter.
pub fn first_matching_file(directory: &Path, filters: &FileFilters) -> io::Result<Option<PathBuf>> {
    let names = match list_candidates(directory) {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(filters
        .enabled()
        .find_map(|filter| select(&names, filter))
        .map(|name| directory.join(name)))
}

fn list_candidates(directory: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") || lower.ends_with(".tmp") {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn select<'a>(names: &'a [String], filter: &str) -> Option<&'a str> {
    if filter.is_empty() {
        return None;
    }
    names
        .iter()
        .find(|name| name.as_str() == filter)
        .or_else(|| names.iter().find(|name| name.contains(filter)))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"network\n").expect("Failed to write file");
    }

    #[test]
    fn test_substring_match_in_name_order() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "GeoLite2-City-Blocks-IPv4.csv");
        touch(dir.path(), "GeoIP2-City-Blocks-IPv4.csv");
        touch(dir.path(), "GeoLite2-City-Locations-en.csv");

        let found = discover_files(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(
            found.blocks_ipv4,
            Some(dir.path().join("GeoIP2-City-Blocks-IPv4.csv"))
        );
        assert_eq!(found.blocks_ipv6, None);
        assert!(found.locations.is_some());
        assert!(found.has_blocks());
    }

    #[test]
    fn test_exact_name_preferred() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "A-Blocks-IPv4.csv");
        touch(dir.path(), "Blocks-IPv4.csv");

        let found = discover_files(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(found.blocks_ipv4, Some(dir.path().join("Blocks-IPv4.csv")));
    }

    #[test]
    fn test_skips_archives_and_temp_files() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "Blocks-IPv4.csv.tmp");
        touch(dir.path(), "Blocks-IPv4.csv.zip");

        let found = discover_files(dir.path(), &FileFilters::default()).unwrap();
        assert!(!found.has_blocks());
    }

    #[test]
    fn test_empty_filter_disables_source() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "Anything.csv");
        let filters = FileFilters {
            isps: String::new(),
            ..Default::default()
        };
        let found = discover_files(dir.path(), &filters).unwrap();
        assert_eq!(found.isps, None);
    }

    #[test]
    fn test_missing_directory_finds_nothing() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let missing = dir.path().join("absent");
        assert_eq!(
            discover_files(&missing, &FileFilters::default()).unwrap(),
            DiscoveredFiles::default()
        );
        assert_eq!(first_matching_file(&missing, &FileFilters::default()).unwrap(), None);
    }

    #[test]
    fn test_first_matching_file_follows_filter_order() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "Locations-en.csv");
        touch(dir.path(), "Blocks-IPv6.csv");

        let first = first_matching_file(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(first, Some(dir.path().join("Blocks-IPv6.csv")));
    }
}
