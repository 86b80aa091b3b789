//! One connectivity test per transport.
//!
//! Every test returns a human-readable success message, or a `ProbeError`
//! describing why the peer could not be reached.

use quinn::crypto::rustls::QuicClientConfig;
use quinn::{Endpoint, IdleTimeout, TransportConfig, VarInt};
use rustls::pki_types::ServerName;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_socks::tcp::Socks5Stream;
use tokio_tungstenite::{Connector, client_async_tls_with_config};
use tracing::debug;

use crate::core::models::Peer;
use crate::errors::UpdaterError;
use crate::probe::net::{dial_tcp, resolve};
use crate::probe::tls::insecure_client_config;

const QUIC_IDLE_TIMEOUT: Duration = Duration::from_secs(2);

fn timed_out(what: &str, limit: Duration) -> UpdaterError {
    UpdaterError::ProbeError(format!("{} timed out after {}s", what, limit.as_secs()))
}

pub async fn probe_tcp(host: &str, port: u16, limit: Duration) -> Result<String, UpdaterError> {
    let _stream = dial_tcp(host, port, limit).await?;
    Ok(format!("Successfully connected to {}:{} via TCP.", host, port))
}

pub async fn probe_tls(host: &str, port: u16, limit: Duration) -> Result<String, UpdaterError> {
    let stream = dial_tcp(host, port, limit).await?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| UpdaterError::ProbeError(format!("invalid TLS server name {}: {}", host, e)))?;
    let connector = TlsConnector::from(insecure_client_config()?);

    let tls = timeout(limit, connector.connect(server_name, stream))
        .await
        .map_err(|_| timed_out(&format!("TLS handshake with {}:{}", host, port), limit))?
        .map_err(|e| {
            UpdaterError::ProbeError(format!("Failed TLS connection to {}:{}: {}", host, port, e))
        })?;

    let version = tls
        .get_ref()
        .1
        .protocol_version()
        .map_or_else(|| "unknown".to_string(), |v| format!("{:?}", v));
    Ok(format!(
        "Successfully connected to {}:{} via TLS. Version: {}",
        host, port, version
    ))
}

/// Performs a WebSocket handshake on `uri`; `wss` handshakes skip certificate checks.
pub async fn probe_websocket(
    uri: &str,
    host: &str,
    port: u16,
    limit: Duration,
) -> Result<String, UpdaterError> {
    let proto = uri.split(':').next().unwrap_or_default().to_ascii_uppercase();
    let stream = dial_tcp(host, port, limit).await?;
    let connector = Connector::Rustls(insecure_client_config()?);

    timeout(
        limit,
        client_async_tls_with_config(uri, stream, None, Some(connector)),
    )
    .await
    .map_err(|_| timed_out(&format!("{} handshake with {}", proto, uri), limit))?
    .map_err(|e| UpdaterError::ProbeError(format!("Failed {} connection to {}: {}", proto, uri, e)))?;

    Ok(format!("Successfully connected to {} via {}.", uri, proto))
}

pub async fn probe_quic(host: &str, port: u16, limit: Duration) -> Result<String, UpdaterError> {
    let addrs = timeout(limit, resolve(host, port))
        .await
        .map_err(|_| timed_out(&format!("resolving {}", host), limit))??;

    let crypto = QuicClientConfig::try_from(insecure_client_config()?)
        .map_err(|e| UpdaterError::ProbeError(format!("QUIC TLS setup failed: {}", e)))?;
    let mut client_config = quinn::ClientConfig::new(Arc::new(crypto));
    let mut transport = TransportConfig::default();
    transport.max_idle_timeout(Some(
        IdleTimeout::try_from(QUIC_IDLE_TIMEOUT)
            .map_err(|e| UpdaterError::ProbeError(format!("QUIC idle timeout: {}", e)))?,
    ));
    client_config.transport_config(Arc::new(transport));

    let mut last_error = String::from("no address tried");
    for addr in addrs {
        let bind: SocketAddr = if addr.is_ipv6() {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        };
        let mut endpoint = Endpoint::client(bind)?;
        endpoint.set_default_client_config(client_config.clone());

        let connecting = match endpoint.connect(addr, host) {
            Ok(connecting) => connecting,
            Err(e) => {
                last_error = e.to_string();
                continue;
            }
        };

        match timeout(limit, connecting).await {
            Ok(Ok(connection)) => {
                connection.close(VarInt::from_u32(0), b"probe done");
                return Ok(format!(
                    "Successfully established QUIC connection to {}:{}.",
                    host, port
                ));
            }
            Ok(Err(e)) => {
                debug!("QUIC connect to {} failed: {}", addr, e);
                last_error = e.to_string();
            }
            Err(_) => {
                debug!("QUIC connect to {} timed out", addr);
                last_error = format!("timed out after {}s", limit.as_secs());
            }
        }
    }

    Err(UpdaterError::ProbeError(format!(
        "Failed QUIC connection to {}:{}: {}",
        host, port, last_error
    )))
}

/// Connects to a Tor or I2P hidden service through the peer's SOCKS5 proxy.
///
/// Name resolution of the hidden address is left to the proxy.
pub async fn probe_hidden(peer: &Peer, limit: Duration) -> Result<String, UpdaterError> {
    let proxy = peer
        .proxy
        .as_deref()
        .ok_or_else(|| UpdaterError::ProbeError(format!("{} has no proxy", peer)))?;
    let address = peer
        .hidden_address()
        .ok_or_else(|| UpdaterError::ProbeError(format!("{} is not a hidden service", peer)))?;

    debug!(
        "Attempting to connect to {}:{} via socks proxy at {}...",
        address, peer.port, proxy
    );

    match timeout(limit, Socks5Stream::connect(proxy, (address.as_str(), peer.port))).await {
        Ok(Ok(_stream)) => Ok(format!(
            "Connection to {}:{} was successful.",
            address, peer.port
        )),
        Ok(Err(tokio_socks::Error::ProxyServerUnreachable)) => {
            Err(UpdaterError::ProbeError(format!(
                "Could not connect to the Tor or I2P proxy at {}. Is Tor or I2P running?",
                proxy
            )))
        }
        Ok(Err(e)) => Err(UpdaterError::ProbeError(format!(
            "Could not reach the hidden service {}: {}",
            address, e
        ))),
        Err(_) => Err(timed_out(&format!("Connection to {}", address), limit)),
    }
}
