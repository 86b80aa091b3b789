use futures::future::join_all;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tokio::net::lookup_host;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::core::config::AppConfig;
use crate::core::models::{Peer, PingOutcome};

const PING_INTERVAL: Duration = Duration::from_secs(1);
const PAYLOAD: [u8; 56] = [0; 56];

static NEXT_IDENTIFIER: AtomicU16 = AtomicU16::new(0);

fn next_identifier() -> PingIdentifier {
    let base = (std::process::id() & 0xffff) as u16;
    PingIdentifier(base.wrapping_add(NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed)))
}

/// ICMP echo sender holding one socket per address family.
///
/// Opening ICMP sockets needs raw-socket privileges or an unprivileged ICMP
/// socket range; a family whose socket cannot be opened reports no replies.
pub struct Pinger {
    v4: Option<Client>,
    v6: Option<Client>,
    timeout: Duration,
    count: u16,
}

impl Pinger {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let v4 = Client::new(&Config::default())
            .map_err(|e| debug!("ICMPv4 socket unavailable: {}", e))
            .ok();
        let v6 = Client::new(&Config::builder().kind(ICMP::V6).build())
            .map_err(|e| debug!("ICMPv6 socket unavailable: {}", e))
            .ok();

        Self {
            v4,
            v6,
            timeout: config.ping_timeout,
            count: config.ping_count,
        }
    }

    /// Pings the peer over IPv6 first, falling back to IPv4.
    pub async fn ping(&self, peer: &Peer) -> PingOutcome {
        if peer.network.is_hidden() {
            return PingOutcome::Overlay;
        }

        let addrs: Vec<IpAddr> = match timeout(self.timeout, lookup_host((peer.dial_host(), 0u16))).await {
            Ok(Ok(addrs)) => addrs.map(|a| a.ip()).collect(),
            Ok(Err(e)) => {
                debug!("ERROR: {} -> {}", peer.host, e);
                return PingOutcome::NoReply;
            }
            Err(_) => {
                debug!("ERROR: {} -> name resolution timed out", peer.host);
                return PingOutcome::NoReply;
            }
        };

        let v6 = addrs.iter().copied().find(IpAddr::is_ipv6);
        let v4 = addrs.iter().copied().find(IpAddr::is_ipv4);

        for ip in [v6, v4].into_iter().flatten() {
            if let Some(avg_ms) = self.ping_addr(ip).await {
                debug!("SUCCESS: {} -> {} ms", peer.host, avg_ms);
                return PingOutcome::Rtt(avg_ms);
            }
        }

        debug!(
            "TIMEOUT: {} -> No response within {}s",
            peer.host,
            self.timeout.as_secs()
        );
        PingOutcome::NoReply
    }

    /// Average round trip in milliseconds over the replies received.
    async fn ping_addr(&self, ip: IpAddr) -> Option<u64> {
        let client = match ip {
            IpAddr::V4(_) => self.v4.as_ref()?,
            IpAddr::V6(_) => self.v6.as_ref()?,
        };

        let mut pinger = client.pinger(ip, next_identifier()).await;
        pinger.timeout(self.timeout);

        let mut rtts = Vec::with_capacity(usize::from(self.count));
        for seq in 0..self.count {
            if seq > 0 {
                sleep(PING_INTERVAL).await;
            }
            match pinger.ping(PingSequence(seq), &PAYLOAD).await {
                Ok((_packet, rtt)) => rtts.push(rtt),
                Err(e) => debug!("Ping {} seq {} failed: {}", ip, seq, e),
            }
        }

        average_millis(&rtts)
    }
}

fn average_millis(rtts: &[Duration]) -> Option<u64> {
    if rtts.is_empty() {
        return None;
    }
    let total: f64 = rtts.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
    Some((total / rtts.len() as f64) as u64)
}

/// Pings every alive peer concurrently and records the outcome on each.
pub async fn ping_peers(peers: Vec<Peer>, config: &AppConfig) -> Vec<Peer> {
    debug!("--- Pinging {} peers in parallel ---", peers.len());
    let pinger = Pinger::new(config);
    let pinger = &pinger;

    let peers = join_all(peers.into_iter().map(|mut peer| async move {
        if peer.alive {
            peer.ping = pinger.ping(&peer).await;
        }
        peer
    }))
    .await;

    debug!("--- All pings complete ---");
    peers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_truncates_to_whole_millis() {
        let rtts = [Duration::from_micros(10_500), Duration::from_micros(11_900)];
        assert_eq!(average_millis(&rtts), Some(11));
        assert_eq!(average_millis(&[]), None);
    }
}
