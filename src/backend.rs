use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{Movie, MovieDetail, SearchCriteria, SearchType};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthGrant {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant>;
    async fn register(&self, registration: &Registration) -> Result<AuthGrant>;
    async fn search_movies(
        &self,
        criteria: &SearchCriteria,
        access_token: Option<&str>,
    ) -> Result<Vec<Movie>>;
    async fn get_movie_detail(
        &self,
        imdb_id: &str,
        access_token: Option<&str>,
    ) -> Result<MovieDetail>;
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl BackendClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: config.http_client()?,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, context: &'static str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| ClientError::transport(context, e))
    }

    async fn read_json<T: DeserializeOwned>(
        res: Response,
        context: &'static str,
        rejected: impl FnOnce(Option<String>) -> ClientError,
    ) -> Result<T> {
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ClientError::transport(context, e))?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty());
            warn!(%status, context, "Backend rejected request");
            return Err(rejected(message));
        }
        serde_json::from_str(&text).map_err(|e| ClientError::decode(context, e))
    }

    fn authorize(request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        match access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn auth_rejected(message: Option<String>) -> ClientError {
    ClientError::Auth(message.unwrap_or_else(|| "An error occurred".to_string()))
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        validation::validate_login(email, password)?;
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginBody { email, password });
        let res = self.send(request, "login request failed").await?;
        let grant: AuthGrant = Self::read_json(res, "login response", auth_rejected).await?;
        info!("Logged in as {}", grant.name);
        Ok(grant)
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant> {
        validation::validate_register(
            &registration.name,
            &registration.email,
            &registration.phone,
            &registration.password,
        )?;
        let request = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&RegisterBody {
                name: &registration.name,
                email: &registration.email,
                phone: &registration.phone,
                password: &registration.password,
            });
        let res = self.send(request, "register request failed").await?;
        let grant: AuthGrant = Self::read_json(res, "register response", auth_rejected).await?;
        info!("Registered {}", grant.name);
        Ok(grant)
    }

    async fn search_movies(
        &self,
        criteria: &SearchCriteria,
        access_token: Option<&str>,
    ) -> Result<Vec<Movie>> {
        let mut url = format!(
            "{}?query={}&type={}",
            self.url("/api/movies"),
            urlencoding::encode(&criteria.query),
            SearchType::param(criteria.search_type)
        );
        if let Some((start, end)) = criteria.year_bounds() {
            url.push_str(&format!(
                "&startYear={}&endYear={}",
                urlencoding::encode(start),
                urlencoding::encode(end)
            ));
        }
        debug!(%url, "Searching backend");
        let request = Self::authorize(self.client.get(&url), access_token);
        let res = self.send(request, "movie search request failed").await?;
        Self::read_json(res, "movie search response", |m| {
            ClientError::Provider(m.unwrap_or_else(|| "Failed to fetch movies".to_string()))
        })
        .await
    }

    async fn get_movie_detail(
        &self,
        imdb_id: &str,
        access_token: Option<&str>,
    ) -> Result<MovieDetail> {
        let url = format!("{}?id={}", self.url("/api/movie"), urlencoding::encode(imdb_id));
        debug!(imdb_id, "Fetching backend detail");
        let request = Self::authorize(self.client.get(&url), access_token);
        let res = self.send(request, "movie detail request failed").await?;
        Self::read_json(res, "movie detail response", |m| {
            ClientError::Provider(
                m.unwrap_or_else(|| "Failed to fetch movie details".to_string()),
            )
        })
        .await
    }
}
