use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::debug;

use crate::errors::UpdaterError;

/// Resolves `host`, returning IPv6 addresses before IPv4 ones.
///
/// # Errors
///
/// Returns `ProbeError` if resolution fails or yields nothing.
pub async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, UpdaterError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| UpdaterError::ProbeError(format!("could not resolve {}: {}", host, e)))?;

    let (mut ordered, v4): (Vec<SocketAddr>, Vec<SocketAddr>) =
        addrs.partition(SocketAddr::is_ipv6);
    ordered.extend(v4);

    if ordered.is_empty() {
        return Err(UpdaterError::ProbeError(format!(
            "{} has no addresses",
            host
        )));
    }
    Ok(ordered)
}

/// Opens a TCP connection, trying each resolved address in turn.
///
/// Resolution and every connection attempt are each bounded by `limit`.
///
/// # Errors
///
/// Returns `ProbeError` carrying the last failure if no address accepts.
pub async fn dial_tcp(host: &str, port: u16, limit: Duration) -> Result<TcpStream, UpdaterError> {
    let addrs = timeout(limit, resolve(host, port))
        .await
        .map_err(|_| {
            UpdaterError::ProbeError(format!("resolving {} timed out", host))
        })??;

    let mut last_error = String::from("no address tried");
    for addr in addrs {
        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => {
                debug!("TCP connect to {} failed: {}", addr, e);
                last_error = e.to_string();
            }
            Err(_) => {
                debug!("TCP connect to {} timed out", addr);
                last_error = format!("timed out after {}s", limit.as_secs());
            }
        }
    }

    Err(UpdaterError::ProbeError(format!(
        "Failed TCP connection to {}:{}: {}",
        host, port, last_error
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_orders_ipv6_first() {
        let addrs = resolve("::1", 80).await.unwrap();
        assert!(addrs[0].is_ipv6());

        let addrs = resolve("127.0.0.1", 80).await.unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:80".parse::<SocketAddr>().unwrap()]);
    }
}
