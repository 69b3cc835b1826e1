//! Download, verify and extract one new set of source files.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::archive::extract_matching;
use super::transport::HttpTransport;
use super::UpdateSlot;
use crate::config::{GeoIpOptions, HASH_SIDECAR_SUFFIX};
use crate::error_handling::UpdateError;

/// Files written by a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub extracted: Vec<PathBuf>,
    /// Lowercase hex SHA-256 of the downloaded archive
    pub sha256: String,
}

/// Runs one update while holding the update slot.
///
/// Options are validated before anything else. The archive is removed on
/// every failure path, and after extraction unless `keep_archive` is set.
pub(crate) async fn update_files(
    options: &GeoIpOptions,
    transport: &HttpTransport,
    slot: &UpdateSlot,
) -> Result<UpdateOutcome, UpdateError> {
    options.validate_update()?;

    let _guard = slot.lock().await;
    let data_dir = options.data_directory.clone();
    tokio::fs::create_dir_all(&data_dir).await?;

    let archive = data_dir.join(options.archive_file_name());
    remove_if_exists(&archive).await?;

    let url = options.resolved_download_url();
    let display_url = options.redacted_download_url();

    let expected = if options.hash_check {
        let sidecar = transport
            .download_string(
                &format!("{}{}", url, HASH_SIDECAR_SUFFIX),
                &format!("{}{}", display_url, HASH_SIDECAR_SUFFIX),
            )
            .await?;
        let digest = parse_sidecar(&sidecar).ok_or_else(|| UpdateError::Transport {
            url: format!("{}{}", display_url, HASH_SIDECAR_SUFFIX),
            reason: "empty hash sidecar".to_string(),
            retriable: false,
        })?;
        Some(digest)
    } else {
        None
    };

    info!("Downloading {}", display_url);
    let actual = transport.download_to_file(&url, &display_url, &archive).await?;

    if let Some(expected) = expected {
        if !expected.eq_ignore_ascii_case(&actual) {
            remove_if_exists(&archive).await?;
            return Err(UpdateError::Integrity { expected, actual });
        }
        debug!("Archive hash verified: {}", actual);
    }

    let filters: Vec<String> = options
        .effective_filters()
        .enabled()
        .map(str::to_string)
        .collect();
    let extraction = {
        let archive = archive.clone();
        let data_dir = data_dir.clone();
        tokio::task::spawn_blocking(move || {
            let filters: Vec<&str> = filters.iter().map(String::as_str).collect();
            extract_matching(&archive, &data_dir, &filters)
        })
        .await
        .map_err(|e| UpdateError::Task(e.to_string()))
        .and_then(|result| result)
    };

    if !options.keep_archive {
        if let Err(e) = remove_if_exists(&archive).await {
            warn!("Failed to remove archive {}: {}", archive.display(), e);
        }
    }

    let extracted = extraction?;
    info!(
        "Update complete: {} files extracted into {}",
        extracted.len(),
        data_dir.display()
    );
    Ok(UpdateOutcome {
        extracted,
        sha256: actual,
    })
}

/// First whitespace-separated token of a `.sha256` sidecar, lowercased.
pub(crate) fn parse_sidecar(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_ascii_lowercase)
}

async fn remove_if_exists(path: &Path) -> Result<(), UpdateError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
