//! Peer list download and archive scanning.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_retry::Retry;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::AppConfig;
use crate::core::models::Peer;
use crate::errors::UpdaterError;
use crate::peers::parser::parse_document;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("ygg-updater/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Downloads the public peer archive and returns every peer listed in it.
///
/// # Errors
///
/// Returns an error if the download keeps failing after the configured
/// retries, if the archive is corrupt, or if it lists no peers at all.
pub async fn fetch_peers(config: &AppConfig) -> Result<Vec<Peer>, UpdaterError> {
    let bytes = download_archive(&HTTP_CLIENT, &config.peers_url, config.download_retries).await?;
    let peers = peers_from_archive(&bytes, &config.excluded_files, &config.excluded_dirs)?;

    if peers.is_empty() {
        return Err(UpdaterError::NoPeersFound(config.peers_url.to_string()));
    }

    info!("Found {} peers in {}", peers.len(), config.peers_url);
    Ok(peers)
}

/// # Errors
///
/// Returns `HttpError` on transport failures and non-success status codes.
pub async fn download_archive(
    client: &Client,
    url: &Url,
    retries: usize,
) -> Result<Vec<u8>, UpdaterError> {
    let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(retries);

    Retry::spawn(strategy, || async {
        info!("Downloading peer archive from {}", url);
        let response = client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(|e| {
                warn!("Peer archive request failed: {}", e);
                UpdaterError::HttpError(e.to_string())
            })?;
        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok::<_, UpdaterError>(bytes.to_vec())
    })
    .await
}

/// Scans an in-memory zip archive for peer URIs.
///
/// Each file contributes peers attributed to its parent directory (region)
/// and its name without the `.md` suffix (country).
///
/// # Errors
///
/// Returns `ArchiveError` if the bytes are not a readable zip archive.
/// Unreadable entries inside a valid archive are skipped.
pub fn peers_from_archive(
    bytes: &[u8],
    excluded_files: &[String],
    excluded_dirs: &[String],
) -> Result<Vec<Peer>, UpdaterError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut peers = Vec::new();

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Could not open archive entry {}: {}", index, e);
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }
        let Some(path) = entry.enclosed_name() else {
            debug!("Skipping archive entry with unsafe name: {}", entry.name());
            continue;
        };
        if is_excluded(&path, excluded_files, excluded_dirs) {
            debug!("Skipping excluded entry {}", path.display());
            continue;
        }

        let mut raw = Vec::new();
        if let Err(e) = entry.read_to_end(&mut raw) {
            debug!("Could not read file {}: {}", path.display(), e);
            continue;
        }

        let (region, country) = region_and_country(&path);
        let text = String::from_utf8_lossy(&raw);
        let found = parse_document(&text, &region, &country);

        #[cfg(feature = "debug-logs")]
        debug!("{}: {:?}", path.display(), found);

        #[cfg(not(feature = "debug-logs"))]
        debug!("{}: {} peers", path.display(), found.len());

        peers.extend(found);
    }

    debug!("Search complete. Found {} matches.", peers.len());
    Ok(peers)
}

fn is_excluded(path: &Path, excluded_files: &[String], excluded_dirs: &[String]) -> bool {
    excluded_files.iter().any(|file| path == Path::new(file))
        || excluded_dirs.iter().any(|dir| path.starts_with(dir))
}

fn region_and_country(path: &Path) -> (String, String) {
    let region = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let country = file_name
        .strip_suffix(".md")
        .map(ToString::to_string)
        .unwrap_or(file_name);

    (region, country)
}
