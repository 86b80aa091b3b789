//! Reachability checks for parsed peers

pub mod net;
pub mod ping;
pub mod tls;
pub mod transports;

use futures::{StreamExt, stream};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

use crate::core::config::AppConfig;
use crate::core::models::{Peer, Protocol};
use crate::errors::UpdaterError;

pub use ping::{Pinger, ping_peers};

/// Progress line written to stderr while probes run.
#[derive(Debug, Default)]
pub struct Progress {
    done: AtomicUsize,
    enabled: bool,
}

impl Progress {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            done: AtomicUsize::new(0),
            enabled,
        }
    }

    pub fn advance(&self, total: usize) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.enabled {
            eprint!("\rtesting {}/{}...", done, total);
            let _ = std::io::stderr().flush();
        }
    }

    pub fn note(&self, message: &str) {
        if self.enabled {
            eprint!("{}", message);
            let _ = std::io::stderr().flush();
        }
    }

    pub fn finish(&self) {
        if self.enabled {
            eprintln!();
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

/// Runs the transport test matching the peer and records the result on it.
///
/// On success the peer is marked alive and its protocol latency is the wall
/// time the test took.
///
/// # Errors
///
/// Returns `ProbeError` when the peer cannot be reached or its transport is
/// not supported.
pub async fn probe_peer(peer: &mut Peer, config: &AppConfig) -> Result<(), UpdaterError> {
    let started = Instant::now();
    let host = peer.dial_host().to_string();
    let port = peer.port;

    let result = if peer.network.is_hidden() {
        transports::probe_hidden(peer, config.hidden_timeout).await
    } else {
        match peer.protocol {
            Protocol::Tcp => transports::probe_tcp(&host, port, config.probe_timeout).await,
            Protocol::Tls => transports::probe_tls(&host, port, config.probe_timeout).await,
            Protocol::Ws | Protocol::Wss => {
                transports::probe_websocket(&peer.uri(false), &host, port, config.probe_timeout)
                    .await
            }
            Protocol::Quic => transports::probe_quic(&host, port, config.probe_timeout).await,
            Protocol::Socks => Err(UpdaterError::ProbeError(format!(
                "Unsupported protocol: '{}'.",
                peer.protocol
            ))),
        }
    };

    match result {
        Ok(message) => {
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            peer.alive = true;
            peer.proto_latency_ms = Some(elapsed);
            debug!("[SUCCESS] {} (latency: {} ms)", message, elapsed);
            Ok(())
        }
        Err(e) => {
            debug!("[FAILURE] {}", e);
            Err(e)
        }
    }
}

/// Probes every peer with at most `config.concurrency` probes in flight and
/// returns the reachable ones in their original order.
pub async fn run_probes(peers: Vec<Peer>, config: &AppConfig, progress: &Progress) -> Vec<Peer> {
    let total = peers.len();
    debug!(
        "--- Starting Connection Tests (Timeout={}s) ---",
        config.probe_timeout.as_secs()
    );

    let alive: Vec<Peer> = stream::iter(peers)
        .map(|mut peer| async move {
            let outcome = probe_peer(&mut peer, config).await;
            progress.advance(total);
            outcome.map(|()| peer)
        })
        .buffered(config.concurrency.max(1))
        .filter_map(|outcome| async move { outcome.ok() })
        .collect()
        .await;

    debug!("--- All Tests Complete: {}/{} alive ---", alive.len(), total);
    alive
}
