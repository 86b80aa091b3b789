/// ygg-updater - finds the fastest reachable public peers of the Yggdrasil network.
///
/// The tool downloads the community public peer list, extracts every peer URI
/// from it, checks which peers accept connections over their transport and
/// ranks the reachable ones by ICMP round trip.
///
/// # Architecture
///
/// - `peers` downloads the peer archive and parses peer URIs out of it
/// - `probe` runs TCP, TLS, WebSocket, QUIC and SOCKS5 reachability checks
///   and ICMP pings
/// - `report` ranks peers and renders them as a key list, table or JSON
/// - `cli` wires the stages together behind a clap command line
///
/// # Example
///
/// ```no_run
/// use ygg_updater::core::config::AppConfig;
/// use ygg_updater::probe::{Progress, ping_peers, run_probes};
/// use ygg_updater::report::{rank, render_key_list};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     ygg_updater::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let peers = ygg_updater::peers::fetch_peers(&config).await?;
///
///     let alive = run_probes(peers, &config, &Progress::new(false)).await;
///     let mut alive = ping_peers(alive, &config).await;
///     rank(&mut alive);
///
///     print!("{}", render_key_list(&alive));
///     Ok(())
/// }
/// ```
pub mod cli;
pub mod core;
pub mod errors;
pub mod peers;
pub mod probe;
pub mod report;

pub use errors::UpdaterError;

/// Configure logging to stderr.
///
/// The level comes from `RUST_LOG` and defaults to `warn`, so stdout only
/// carries the report. Setting `YGG_LOG_FORMAT=json` switches to structured
/// JSON lines. Calling this more than once is harmless.
///
/// # Example
///
/// ```
/// ygg_updater::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("YGG_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).try_init()
    };
}
