//! Ranking and rendering of probed peers

pub mod table;

use chrono::Utc;
use serde::Serialize;

use crate::core::models::{Network, Peer, Protocol};
use crate::errors::UpdaterError;
use table::{Cell, OrgTable};

pub const TABLE_HEADERS: [&str; 5] = ["URI", "Region", "Country", "Proto_latency", "Ping_latency"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// URIs with keys, ready to paste into `yggdrasil.conf`.
    KeyList,
    Table,
    Json,
}

impl OutputMode {
    /// `key` selects the key list and `json` the JSON document; anything else
    /// renders a table.
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        match arg {
            "key" => OutputMode::KeyList,
            "json" => OutputMode::Json,
            _ => OutputMode::Table,
        }
    }
}

/// Orders peers by ping: answered pings fastest first, then hidden-service
/// peers, then peers that never answered. Ties keep their original order.
///
/// Earlier releases sorted on the raw `ping_latency` value, which put the
/// `-1` (no reply) peers at the top; they now come last.
pub fn rank(peers: &mut [Peer]) {
    peers.sort_by_key(|peer| peer.ping.rank_key());
}

/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn render(peers: &[Peer], mode: OutputMode) -> Result<String, UpdaterError> {
    match mode {
        OutputMode::KeyList => Ok(render_key_list(peers)),
        OutputMode::Table => Ok(format!("{}\n", render_table(peers))),
        OutputMode::Json => render_json(peers).map(|json| format!("{json}\n")),
    }
}

#[must_use]
pub fn render_key_list(peers: &[Peer]) -> String {
    let mut out = String::new();
    for peer in peers {
        out.push_str(&format!(
            "# ping_latency: {} |region: {} |country: {} |proto_latency: {}\n",
            peer.ping.as_millis(),
            peer.region,
            peer.country,
            peer.proto_latency_millis()
        ));
        out.push_str(&peer.uri(true));
        out.push_str("\n\n");
    }
    out
}

#[must_use]
pub fn render_table(peers: &[Peer]) -> String {
    let mut table = OrgTable::new(TABLE_HEADERS);
    for peer in peers {
        let (uri, region, country, proto_latency, ping_latency) = peer.row();
        table.push_row(vec![
            Cell::Text(uri),
            Cell::Text(region.to_string()),
            Cell::Text(country.to_string()),
            Cell::Number(proto_latency),
            Cell::Number(ping_latency),
        ]);
    }
    table.render()
}

#[derive(Debug, Serialize)]
struct PeerReport<'a> {
    uri: String,
    uri_with_key: String,
    protocol: Protocol,
    network: Network,
    region: &'a str,
    country: &'a str,
    proto_latency_ms: i64,
    ping_latency_ms: i64,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    generated_at: String,
    peers: Vec<PeerReport<'a>>,
}

/// # Errors
///
/// Returns `GeneralError` if serialization fails.
pub fn render_json(peers: &[Peer]) -> Result<String, UpdaterError> {
    let report = Report {
        generated_at: Utc::now().to_rfc3339(),
        peers: peers
            .iter()
            .map(|peer| PeerReport {
                uri: peer.uri(false),
                uri_with_key: peer.uri(true),
                protocol: peer.protocol,
                network: peer.network,
                region: &peer.region,
                country: &peer.country,
                proto_latency_ms: peer.proto_latency_millis(),
                ping_latency_ms: peer.ping.as_millis(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
