use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::models::{Network, Peer, Protocol};

static PEER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(tcp|tls|quic|ws|wss|socks)://([a-z0-9.\-:\[\]]+):([0-9]+)(?:\?key=([0-9a-f]*))?")
        .expect("static regex compile")
});

// socks://<proxy host>:<proxy port>/<name>.<onion|b32.i2p>[:port]
static HIDDEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(socks)://([a-z0-9.\-:\[\]]+):([0-9]+)/+([0-9a-z]+)\.(onion|b32\.i2p):*([0-9]*)")
        .expect("static regex compile")
});

/// Extracts every peer URI found on a single line of a peer list file.
///
/// Plain peers take `region` and `country` from the file they were found in.
/// Hidden peers (`socks://proxy/name.onion:port`) are always attributed to
/// region `hidden` and country `unknown`.
#[must_use]
pub fn parse_line(line: &str, region: &str, country: &str) -> Vec<Peer> {
    let mut peers = Vec::new();

    for caps in PEER_RE.captures_iter(line) {
        let (Some(proto), Some(host), Some(port)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };

        let Ok(protocol) = proto.as_str().parse::<Protocol>() else {
            continue;
        };
        if protocol == Protocol::Socks {
            continue;
        }

        let Ok(port) = port.as_str().parse::<u16>() else {
            debug!("Skipping peer with out-of-range port: {}", &caps[0]);
            continue;
        };

        let key = caps.get(4).map(|k| k.as_str().to_string());
        peers.push(Peer::internet(
            protocol,
            host.as_str(),
            port,
            region,
            country,
            key,
        ));
    }

    for caps in HIDDEN_RE.captures_iter(line) {
        let network = caps.get(5).and_then(|m| Network::from_suffix(m.as_str()));
        let (Some(network), Some(name)) = (network, caps.get(4)) else {
            continue;
        };

        let proxy = format!("{}:{}", &caps[2], &caps[3]);
        let port = match caps.get(6).map(|m| m.as_str()) {
            None | Some("") => 0,
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    debug!("Skipping hidden peer with out-of-range port: {}", &caps[0]);
                    continue;
                }
            },
        };

        peers.push(Peer::hidden(name.as_str(), port, network, proxy));
    }

    peers
}

/// Runs [`parse_line`] over every line of a peer list file.
#[must_use]
pub fn parse_document(text: &str, region: &str, country: &str) -> Vec<Peer> {
    text.lines()
        .flat_map(|line| parse_line(line, region, country))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_markdown_list_item() {
        let line = "* Frankfurt: `tls://95.216.5.243:18836?key=0000abcd`, operated by someone";
        let peers = parse_line(line, "europe", "germany");
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].protocol, Protocol::Tls);
        assert_eq!(peers[0].host, "95.216.5.243");
        assert_eq!(peers[0].port, 18836);
        assert_eq!(peers[0].key.as_deref(), Some("0000abcd"));
    }

    #[test]
    fn key_starting_with_e_is_kept_whole() {
        let peers = parse_line("tcp://example.com:80?key=ee01", "r", "c");
        assert_eq!(peers[0].key.as_deref(), Some("ee01"));
    }

    #[test]
    fn socks_peer_is_only_taken_as_hidden() {
        let line = "`socks://localhost:9050/xyz123.onion:7743`";
        let peers = parse_line(line, "other", "tor");
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].network, Network::Onion);
        assert_eq!(peers[0].proxy.as_deref(), Some("localhost:9050"));
    }
}
