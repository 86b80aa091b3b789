use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::UpdaterError;

/// Milliseconds reported for peers behind Tor or I2P, which cannot be pinged.
pub const OVERLAY_PING_MS: i64 = 60_000;

/// Milliseconds reported when a latency was never measured or got no reply.
pub const UNMEASURED_MS: i64 = -1;

/// Transport named by the scheme of a peer URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Tls,
    Quic,
    Ws,
    Wss,
    Socks,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tls => "tls",
            Protocol::Quic => "quic",
            Protocol::Ws => "ws",
            Protocol::Wss => "wss",
            Protocol::Socks => "socks",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "tls" => Ok(Protocol::Tls),
            "quic" => Ok(Protocol::Quic),
            "ws" => Ok(Protocol::Ws),
            "wss" => Ok(Protocol::Wss),
            "socks" => Ok(Protocol::Socks),
            other => Err(UpdaterError::ParseError(format!(
                "unknown protocol '{}'",
                other
            ))),
        }
    }
}

/// Where a peer lives: the public internet or an overlay reached through a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Internet,
    Onion,
    I2p,
}

impl Network {
    /// Domain suffix of hidden-service addresses on this network.
    #[must_use]
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Network::Internet => None,
            Network::Onion => Some("onion"),
            Network::I2p => Some("b32.i2p"),
        }
    }

    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "onion" => Some(Network::Onion),
            "b32.i2p" => Some(Network::I2p),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_hidden(self) -> bool {
        self != Network::Internet
    }
}

/// Result of pinging a peer over ICMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PingOutcome {
    #[default]
    NotMeasured,
    NoReply,
    Rtt(u64),
    /// Hidden services are never pinged.
    Overlay,
}

impl PingOutcome {
    #[must_use]
    pub fn as_millis(self) -> i64 {
        match self {
            PingOutcome::NotMeasured | PingOutcome::NoReply => UNMEASURED_MS,
            PingOutcome::Rtt(ms) => i64::try_from(ms).unwrap_or(i64::MAX),
            PingOutcome::Overlay => OVERLAY_PING_MS,
        }
    }

    /// Ordering key: answered pings first, then overlay peers, then the rest.
    #[must_use]
    pub fn rank_key(self) -> u64 {
        match self {
            PingOutcome::Rtt(ms) => ms,
            PingOutcome::Overlay => OVERLAY_PING_MS as u64,
            PingOutcome::NotMeasured | PingOutcome::NoReply => u64::MAX,
        }
    }
}

/// A public peer parsed from the peer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub protocol: Protocol,
    /// Host as written in the list. IPv6 literals keep their brackets.
    pub host: String,
    pub port: u16,
    pub region: String,
    pub country: String,
    pub key: Option<String>,
    pub network: Network,
    /// `host:port` of the SOCKS proxy for hidden peers.
    pub proxy: Option<String>,
    pub alive: bool,
    pub proto_latency_ms: Option<u64>,
    pub ping: PingOutcome,
}

impl Peer {
    #[must_use]
    pub fn internet(
        protocol: Protocol,
        host: impl Into<String>,
        port: u16,
        region: impl Into<String>,
        country: impl Into<String>,
        key: Option<String>,
    ) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            region: region.into(),
            country: country.into(),
            key: key.filter(|k| !k.is_empty()),
            network: Network::Internet,
            proxy: None,
            alive: false,
            proto_latency_ms: None,
            ping: PingOutcome::NotMeasured,
        }
    }

    #[must_use]
    pub fn hidden(
        host: impl Into<String>,
        port: u16,
        network: Network,
        proxy: impl Into<String>,
    ) -> Self {
        Self {
            protocol: Protocol::Tcp,
            host: host.into(),
            port,
            region: "hidden".to_string(),
            country: "unknown".to_string(),
            key: None,
            network,
            proxy: Some(proxy.into()),
            alive: false,
            proto_latency_ms: None,
            ping: PingOutcome::NotMeasured,
        }
    }

    /// URI in the form Yggdrasil accepts in its `Peers` list.
    #[must_use]
    pub fn uri(&self, with_key: bool) -> String {
        match self.network.suffix() {
            None => {
                let uri = format!("{}://{}:{}", self.protocol, self.host, self.port);
                match self.key.as_deref() {
                    Some(key) if with_key && !key.is_empty() => format!("{uri}?key={key}"),
                    _ => uri,
                }
            }
            Some(suffix) => format!(
                "socks://{}/{}.{}:{}",
                self.proxy.as_deref().unwrap_or_default(),
                self.host,
                suffix,
                self.port
            ),
        }
    }

    /// Host suitable for name resolution, with IPv6 brackets removed.
    #[must_use]
    pub fn dial_host(&self) -> &str {
        self.host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host)
    }

    /// Full hidden-service name, e.g. `abc.onion`.
    #[must_use]
    pub fn hidden_address(&self) -> Option<String> {
        self.network
            .suffix()
            .map(|suffix| format!("{}.{}", self.host, suffix))
    }

    #[must_use]
    pub fn proto_latency_millis(&self) -> i64 {
        self.proto_latency_ms
            .map_or(UNMEASURED_MS, |ms| i64::try_from(ms).unwrap_or(i64::MAX))
    }

    /// `(uri, region, country, proto_latency, ping_latency)` for tabular output.
    #[must_use]
    pub fn row(&self) -> (String, &str, &str, i64, i64) {
        (
            self.uri(false),
            &self.region,
            &self.country,
            self.proto_latency_millis(),
            self.ping.as_millis(),
        )
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internet_uri_appends_key_only_when_asked() {
        let peer = Peer::internet(
            Protocol::Tls,
            "1.2.3.4",
            443,
            "europe",
            "germany",
            Some("abcd".to_string()),
        );
        assert_eq!(peer.uri(false), "tls://1.2.3.4:443");
        assert_eq!(peer.uri(true), "tls://1.2.3.4:443?key=abcd");
        assert_eq!(peer.to_string(), "tls://1.2.3.4:443?key=abcd");
    }

    #[test]
    fn empty_key_is_dropped() {
        let peer = Peer::internet(Protocol::Tcp, "h", 1, "r", "c", Some(String::new()));
        assert_eq!(peer.key, None);
        assert_eq!(peer.uri(true), "tcp://h:1");
    }

    #[test]
    fn hidden_uri_goes_through_proxy() {
        let peer = Peer::hidden("abcdef", 1234, Network::Onion, "127.0.0.1:9050");
        assert_eq!(peer.uri(true), "socks://127.0.0.1:9050/abcdef.onion:1234");
        assert_eq!(peer.hidden_address().as_deref(), Some("abcdef.onion"));
        assert_eq!(peer.region, "hidden");
        assert_eq!(peer.country, "unknown");
    }

    #[test]
    fn dial_host_strips_ipv6_brackets() {
        let peer = Peer::internet(Protocol::Tcp, "[2001:db8::1]", 80, "r", "c", None);
        assert_eq!(peer.dial_host(), "2001:db8::1");
        assert_eq!(peer.uri(false), "tcp://[2001:db8::1]:80");
    }

    #[test]
    fn ping_outcome_sentinels() {
        assert_eq!(PingOutcome::NoReply.as_millis(), -1);
        assert_eq!(PingOutcome::NotMeasured.as_millis(), -1);
        assert_eq!(PingOutcome::Overlay.as_millis(), 60_000);
        assert_eq!(PingOutcome::Rtt(42).as_millis(), 42);
        assert!(PingOutcome::Rtt(59_999).rank_key() < PingOutcome::Overlay.rank_key());
        assert!(PingOutcome::Overlay.rank_key() < PingOutcome::NoReply.rank_key());
    }
}
