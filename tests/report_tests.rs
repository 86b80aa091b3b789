use ygg_updater::core::models::{Network, Peer, PingOutcome, Protocol};
use ygg_updater::report::{OutputMode, rank, render, render_json, render_key_list, render_table};

// Ranking and the three output formats

fn probed(uri_host: &str, proto_ms: u64, ping: PingOutcome) -> Peer {
    let mut peer = Peer::internet(
        Protocol::Tls,
        uri_host,
        443,
        "europe",
        "germany",
        Some("abcd".to_string()),
    );
    peer.alive = true;
    peer.proto_latency_ms = Some(proto_ms);
    peer.ping = ping;
    peer
}

fn hidden_probed() -> Peer {
    let mut peer = Peer::hidden("xyz", 1234, Network::Onion, "127.0.0.1:9050");
    peer.alive = true;
    peer.proto_latency_ms = Some(900);
    peer.ping = PingOutcome::Overlay;
    peer
}

#[test]
fn test_rank_orders_by_ping_with_silent_peers_last() {
    let mut peers = vec![
        probed("silent.example", 10, PingOutcome::NoReply),
        hidden_probed(),
        probed("slow.example", 30, PingOutcome::Rtt(120)),
        probed("fast.example", 50, PingOutcome::Rtt(8)),
    ];

    rank(&mut peers);

    let hosts: Vec<&str> = peers.iter().map(|p| p.host.as_str()).collect();
    assert_eq!(hosts, vec!["fast.example", "slow.example", "xyz", "silent.example"]);
}

#[test]
fn test_rank_is_stable_for_equal_pings() {
    let mut peers = vec![
        probed("a.example", 10, PingOutcome::Rtt(5)),
        probed("b.example", 20, PingOutcome::Rtt(5)),
    ];
    rank(&mut peers);
    assert_eq!(peers[0].host, "a.example");
    assert_eq!(peers[1].host, "b.example");
}

#[test]
fn test_key_list_format() {
    let peers = vec![probed("fast.example", 50, PingOutcome::Rtt(8)), hidden_probed()];

    let rendered = render_key_list(&peers);

    assert_eq!(
        rendered,
        "# ping_latency: 8 |region: europe |country: germany |proto_latency: 50\n\
         tls://fast.example:443?key=abcd\n\
         \n\
         # ping_latency: 60000 |region: hidden |country: unknown |proto_latency: 900\n\
         socks://127.0.0.1:9050/xyz.onion:1234\n\
         \n"
    );
}

#[test]
fn test_table_format() {
    let peers = vec![probed("fast.example", 50, PingOutcome::Rtt(8))];

    let rendered = render_table(&peers);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "| URI                    | Region   | Country   |   Proto_latency |   Ping_latency |"
    );
    assert_eq!(
        lines[1],
        "|------------------------+----------+-----------+-----------------+----------------|"
    );
    assert_eq!(
        lines[2],
        "| tls://fast.example:443 | europe   | germany   |              50 |              8 |"
    );
    // Keys are never shown in the table
    assert!(!rendered.contains("key="));
}

#[test]
fn test_json_report() {
    let peers = vec![probed("fast.example", 50, PingOutcome::NoReply)];

    let rendered = render_json(&peers).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

    assert!(value["generated_at"].is_string());
    let peer = &value["peers"][0];
    assert_eq!(peer["uri"], "tls://fast.example:443");
    assert_eq!(peer["uri_with_key"], "tls://fast.example:443?key=abcd");
    assert_eq!(peer["protocol"], "tls");
    assert_eq!(peer["network"], "internet");
    assert_eq!(peer["proto_latency_ms"], 50);
    assert_eq!(peer["ping_latency_ms"], -1);
}

#[test]
fn test_output_mode_from_arg() {
    assert_eq!(OutputMode::from_arg("key"), OutputMode::KeyList);
    assert_eq!(OutputMode::from_arg("json"), OutputMode::Json);
    assert_eq!(OutputMode::from_arg("table"), OutputMode::Table);
    assert_eq!(OutputMode::from_arg("anything"), OutputMode::Table);
}

#[test]
fn test_render_empty_peer_list() {
    assert_eq!(render(&[], OutputMode::KeyList).unwrap(), "");
    let table = render(&[], OutputMode::Table).unwrap();
    assert!(table.starts_with("| URI "));
    assert!(table.ends_with("|\n"));
}
