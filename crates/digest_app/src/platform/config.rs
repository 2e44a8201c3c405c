//! RON client configuration, loaded from `digest_client.ron` by default.
//!
//! Every field has a default so a partial file only overrides what it names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use digest_core::Pacing;
use digest_engine::ServerSettings;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::cli::Cli;
use super::logging::LogDestination;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub channel_path: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub modal_started_ms: u64,
    pub modal_reveal_ms: u64,
    pub notice_lifetime_secs: u64,
    pub log_destination: LogDestination,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    pub auto_download: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let server = ServerSettings::default();
        let pacing = Pacing::default();
        Self {
            server_url: server.base_url,
            channel_path: server.channel_path,
            connect_timeout_secs: server.connect_timeout.as_secs(),
            request_timeout_secs: server.request_timeout.as_secs(),
            output_dir: PathBuf::from("downloads"),
            modal_started_ms: pacing.started_delay.as_millis() as u64,
            modal_reveal_ms: pacing.reveal_delay.as_millis() as u64,
            notice_lifetime_secs: pacing.notice_lifetime.as_secs(),
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
            auto_download: true,
        }
    }
}

impl ClientConfig {
    /// Command-line flags win over file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(server) = &cli.server {
            self.server_url = server.clone();
        }
        if let Some(output) = &cli.output {
            self.output_dir = output.clone();
        }
        if let Some(destination) = cli.log {
            self.log_destination = destination;
        }
        if cli.no_download {
            self.auto_download = false;
        }
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            base_url: self.server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            channel_path: self.channel_path.clone(),
        }
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            started_delay: Duration::from_millis(self.modal_started_ms),
            reveal_delay: Duration::from_millis(self.modal_reveal_ms),
            notice_lifetime: Duration::from_secs(self.notice_lifetime_secs),
        }
    }

    /// Unknown level names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

/// Reads the config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ClientConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
