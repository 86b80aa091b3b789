use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::errors::UpdaterError;

pub const DEFAULT_PEERS_URL: &str =
    "https://github.com/yggdrasil-network/public-peers/archive/refs/heads/master.zip";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub peers_url: Url,
    /// Archive paths skipped while scanning for peers.
    pub excluded_files: Vec<String>,
    /// Archive directories skipped while scanning for peers.
    pub excluded_dirs: Vec<String>,
    pub probe_timeout: Duration,
    pub hidden_timeout: Duration,
    pub ping_timeout: Duration,
    pub ping_count: u16,
    pub concurrency: usize,
    pub download_retries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            peers_url: Url::parse(DEFAULT_PEERS_URL).expect("static peers URL parses"),
            excluded_files: vec![
                "public-peers-master/README.md".to_string(),
                "peers.zip".to_string(),
            ],
            excluded_dirs: vec!["public-peers-master/.github".to_string()],
            probe_timeout: Duration::from_secs(5),
            hidden_timeout: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(10),
            ping_count: 3,
            concurrency: 32,
            download_retries: 3,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, UpdaterError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable source, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, UpdaterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let peers_url = match lookup("YGG_PEERS_URL") {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|e| UpdaterError::ConfigError(format!("YGG_PEERS_URL: {}", e)))?,
            None => defaults.peers_url,
        };

        let config = Self {
            peers_url,
            excluded_files: lookup("YGG_EXCLUDED_FILES")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.excluded_files),
            excluded_dirs: lookup("YGG_EXCLUDED_DIRS")
                .map(|raw| split_list(&raw))
                .unwrap_or(defaults.excluded_dirs),
            probe_timeout: parse_var(&lookup, "YGG_PROBE_TIMEOUT_SECS")?
                .map_or(defaults.probe_timeout, Duration::from_secs),
            hidden_timeout: parse_var(&lookup, "YGG_HIDDEN_TIMEOUT_SECS")?
                .map_or(defaults.hidden_timeout, Duration::from_secs),
            ping_timeout: parse_var(&lookup, "YGG_PING_TIMEOUT_SECS")?
                .map_or(defaults.ping_timeout, Duration::from_secs),
            ping_count: parse_var(&lookup, "YGG_PING_COUNT")?.unwrap_or(defaults.ping_count),
            concurrency: parse_var(&lookup, "YGG_CONCURRENCY")?.unwrap_or(defaults.concurrency),
            download_retries: parse_var(&lookup, "YGG_DOWNLOAD_RETRIES")?
                .unwrap_or(defaults.download_retries),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), UpdaterError> {
        if self.concurrency == 0 {
            return Err(UpdaterError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.ping_count == 0 {
            return Err(UpdaterError::ConfigError(
                "ping count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, UpdaterError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| UpdaterError::ConfigError(format!("{}: {}", name, e)))
        })
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
