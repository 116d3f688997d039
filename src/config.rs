use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::ClientError;

pub const DEFAULT_OMDB_BASE: &str = "https://www.omdbapi.com/";
pub const DEFAULT_BACKEND_BASE: &str = "https://websitenet-eight.vercel.app";
pub const DEFAULT_DATA_DIR: &str = ".movie-explorer";

#[derive(Debug, Clone)]
pub struct Config {
    pub omdb_api_key: Option<String>,
    pub omdb_base_url: String,
    pub backend_url: String,
    pub data_dir: PathBuf,
    pub http_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            omdb_api_key: None,
            omdb_base_url: DEFAULT_OMDB_BASE.to_string(),
            backend_url: DEFAULT_BACKEND_BASE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let http_timeout = match non_empty_var("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {raw}"))?,
            )),
            None => None,
        };
        let config = Self {
            omdb_api_key: non_empty_var("OMDB_API_KEY"),
            omdb_base_url: non_empty_var("OMDB_BASE_URL").unwrap_or(defaults.omdb_base_url),
            backend_url: non_empty_var("MOVIE_BACKEND_URL").unwrap_or(defaults.backend_url),
            data_dir: non_empty_var("MOVIE_EXPLORER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            http_timeout,
        };
        info!(
            backend = %config.backend_url,
            data_dir = %config.data_dir.display(),
            omdb_key = config.omdb_api_key.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub(crate) fn http_client(&self) -> Result<Client, ClientError> {
        let user_agent = format!("movie-explorer/{}", env!("CARGO_PKG_VERSION"));
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = self.http_timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| ClientError::transport("failed to build HTTP client", e))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
