use std::io::{Cursor, Write};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ygg_updater::core::config::AppConfig;
use ygg_updater::errors::UpdaterError;
use ygg_updater::peers::{download_archive, fetch_peers, peers_from_archive};
use zip::write::SimpleFileOptions;

/// Builds a zip archive laid out like the GitHub archive of the public peer list.
fn peer_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    writer
        .add_directory("public-peers-master/", options)
        .unwrap();
    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

fn default_excludes() -> (Vec<String>, Vec<String>) {
    let config = AppConfig::default();
    (config.excluded_files, config.excluded_dirs)
}

#[test]
fn test_peers_from_archive_attributes_region_and_country() {
    let archive = peer_archive(&[
        (
            "public-peers-master/europe/germany.md",
            "* `tcp://de.example:9001`\n* `tls://de.example:9002?key=abc`\n",
        ),
        (
            "public-peers-master/asia/japan.md",
            "* `quic://jp.example:443`\n",
        ),
    ]);
    let (files, dirs) = default_excludes();

    let peers = peers_from_archive(&archive, &files, &dirs).unwrap();

    assert_eq!(peers.len(), 3);
    assert_eq!(peers[0].region, "europe");
    assert_eq!(peers[0].country, "germany");
    assert_eq!(peers[1].key.as_deref(), Some("abc"));
    assert_eq!(peers[2].region, "asia");
    assert_eq!(peers[2].country, "japan");
}

#[test]
fn test_peers_from_archive_skips_excluded_entries() {
    let archive = peer_archive(&[
        (
            "public-peers-master/README.md",
            "Example: `tcp://readme.example:1234`\n",
        ),
        (
            "public-peers-master/.github/workflows/check.yml",
            "run: check tcp://ci.example:1\n",
        ),
        (
            "public-peers-master/north-america/canada.md",
            "* `tcp://ca.example:9001`\n",
        ),
    ]);
    let (files, dirs) = default_excludes();

    let peers = peers_from_archive(&archive, &files, &dirs).unwrap();

    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].host, "ca.example");
}

#[test]
fn test_peers_from_archive_tolerates_invalid_utf8() {
    let mut archive_bytes = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut archive_bytes));
        writer
            .start_file("public-peers-master/europe/france.md", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"\xff\xfe junk\n* `tcp://fr.example:9001`\n").unwrap();
        writer.finish().unwrap();
    }

    let peers = peers_from_archive(&archive_bytes, &[], &[]).unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].country, "france");
}

#[test]
fn test_peers_from_archive_rejects_garbage() {
    let result = peers_from_archive(b"definitely not a zip", &[], &[]);
    assert!(matches!(result, Err(UpdaterError::ArchiveError(_))));
}

#[tokio::test]
async fn test_fetch_peers_downloads_and_parses() {
    let server = MockServer::start().await;
    let archive = peer_archive(&[(
        "public-peers-master/europe/germany.md",
        "* `tcp://de.example:9001`\n",
    )]);
    Mock::given(method("GET"))
        .and(path("/master.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig {
        peers_url: Url::parse(&format!("{}/master.zip", server.uri())).unwrap(),
        ..AppConfig::default()
    };

    let peers = fetch_peers(&config).await.unwrap();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].uri(true), "tcp://de.example:9001");
}

#[tokio::test]
async fn test_fetch_peers_with_empty_archive_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(peer_archive(&[("public-peers-master/empty.md", "nothing\n")])),
        )
        .mount(&server)
        .await;

    let config = AppConfig {
        peers_url: Url::parse(&format!("{}/master.zip", server.uri())).unwrap(),
        ..AppConfig::default()
    };

    let result = fetch_peers(&config).await;
    assert!(matches!(result, Err(UpdaterError::NoPeersFound(_))));
}

#[tokio::test]
async fn test_download_archive_retries_then_reports_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let url = Url::parse(&format!("{}/master.zip", server.uri())).unwrap();

    // One retry after the first attempt
    let result = download_archive(&client, &url, 1).await;
    assert!(matches!(result, Err(UpdaterError::HttpError(_))));
}
