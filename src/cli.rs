//! Command line entry point
use clap::{CommandFactory, Parser};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::core::config::AppConfig;
use crate::core::models::{Peer, Protocol};
use crate::errors::UpdaterError;
use crate::peers::fetch_peers;
use crate::probe::{Progress, ping_peers, run_probes};
use crate::report::{OutputMode, rank, render};

#[derive(Debug, Parser)]
#[command(name = "ygg-updater", version)]
#[command(about = "Find the fastest reachable Yggdrasil public peers")]
#[command(after_help = "Ping_latency = -1 means ICMP requests did not get a reply.")]
pub struct Cli {
    /// `key` prints peers with their keys, ready to be placed in
    /// /etc/yggdrasil/yggdrasil.conf. `json` prints a JSON report.
    /// Any other value prints a table.
    pub mode: Option<String>,

    #[arg(long, help = "URL of the public peers zip archive")]
    pub source_url: Option<Url>,

    /// Connection timeout for each probe, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Only print the first N ranked peers
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only test peers using this protocol (repeatable).
    /// Tor and I2P peers count as `socks`.
    #[arg(long = "protocol")]
    pub protocols: Vec<Protocol>,

    /// Skip Tor and I2P peers
    #[arg(long)]
    pub skip_hidden: bool,

    /// Skip ICMP pings
    #[arg(long)]
    pub no_ping: bool,

    /// Don't print progress to stderr
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Applies command line overrides on top of the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the resulting configuration is invalid.
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), UpdaterError> {
        if let Some(url) = &self.source_url {
            config.peers_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config.validate()
    }

    /// Drops peers excluded by `--protocol` and `--skip-hidden`.
    ///
    /// Hidden peers are listed as `socks://` URIs, so they match `socks`
    /// rather than the `tcp` they are dialed with.
    #[must_use]
    pub fn select(&self, peers: Vec<Peer>) -> Vec<Peer> {
        peers
            .into_iter()
            .filter(|peer| !(self.skip_hidden && peer.network.is_hidden()))
            .filter(|peer| {
                let listed_as = if peer.network.is_hidden() {
                    Protocol::Socks
                } else {
                    peer.protocol
                };
                self.protocols.is_empty() || self.protocols.contains(&listed_as)
            })
            .collect()
    }

    /// Prints help when no mode is given; otherwise loads the configuration
    /// from the environment and prints the report.
    pub async fn run(&self) -> Result<(), UpdaterError> {
        let Some(mode) = self.mode.as_deref() else {
            Cli::command().print_long_help()?;
            println!();
            return Ok(());
        };

        let config = AppConfig::from_env()?;
        print!("{}", self.report(OutputMode::from_arg(mode), config).await?);
        Ok(())
    }

    /// Fetches, probes, pings and ranks peers, returning the rendered report.
    pub async fn report(
        &self,
        mode: OutputMode,
        mut config: AppConfig,
    ) -> Result<String, UpdaterError> {
        self.apply(&mut config)?;

        let peers = self.select(fetch_peers(&config).await?);
        info!(count = peers.len(), "Testing peers");

        let progress = Progress::new(!self.quiet);
        let mut alive = run_probes(peers, &config, &progress).await;
        progress.finish();

        if !self.no_ping {
            progress.note("testing ping...");
            alive = ping_peers(alive, &config).await;
            progress.finish();
        }

        rank(&mut alive);
        if let Some(limit) = self.limit {
            alive.truncate(limit);
        }
        info!(count = alive.len(), "Reachable peers");

        render(&alive, mode)
    }
}
