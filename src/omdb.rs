use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{Movie, MovieDetail, SearchType};

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub movies: Vec<Movie>,
    pub total_results: Option<u32>,
}

#[async_trait]
pub trait OmdbApi: Send + Sync {
    async fn search(&self, query: &str, search_type: Option<SearchType>) -> Result<SearchResults>;
    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Search", default)]
    search: Vec<Movie>,
    #[serde(rename = "totalResults")]
    total_results: Option<String>,
}

impl OmdbClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.omdb_base_url.clone(),
            api_key: config.omdb_api_key.clone(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClientError::Configuration("API Key is required".to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, failure: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::transport("catalog request failed", e))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ClientError::transport("reading catalog body failed", e))?;

        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| ClientError::decode("catalog response", e))?;
        if envelope.response.as_deref() == Some("False") {
            let message = envelope.error.unwrap_or_else(|| failure.to_string());
            warn!(%status, "Catalog reported failure: {}", message);
            return Err(ClientError::Provider(message));
        }
        if !status.is_success() {
            return Err(ClientError::Provider(format!("{failure} (status {status})")));
        }
        serde_json::from_str(&text).map_err(|e| ClientError::decode("catalog response", e))
    }
}

#[async_trait]
impl OmdbApi for OmdbClient {
    async fn search(&self, query: &str, search_type: Option<SearchType>) -> Result<SearchResults> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}?apikey={}&s={}&type={}",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(query),
            SearchType::param(search_type)
        );
        debug!(query, kind = SearchType::param(search_type), "Searching catalog");
        let data: SearchResponse = self.get_json(&url, "Failed to fetch movies").await?;
        Ok(SearchResults {
            total_results: data.total_results.and_then(|t| t.trim().parse().ok()),
            movies: data.search,
        })
    }

    async fn fetch_detail(&self, imdb_id: &str) -> Result<MovieDetail> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}?apikey={}&i={}&plot=full",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(imdb_id)
        );
        debug!(imdb_id, "Fetching catalog detail");
        self.get_json(&url, "Failed to fetch movie details").await
    }
}
