use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::{BackendApi, BackendClient, Registration};
use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{Movie, MovieDetail, SearchCriteria, SearchType};
use crate::omdb::{OmdbApi, OmdbClient, SearchResults};
use crate::ratings::RatingChart;
use crate::search::{SearchOrchestrator, SearchOutcome};
use crate::session::{FavoriteToggle, Session, SessionStore};
use crate::storage::{FileStorage, KeyValueStorage};

pub const LOGIN_FALLBACK: &str = "An error occurred while logging in. Please try again.";
pub const REGISTER_FALLBACK: &str = "An error occurred while registering. Please try again.";
pub const SEARCH_FALLBACK: &str = "Failed to fetch movies. Try again later.";
pub const DETAILS_FALLBACK: &str = "Failed to fetch movie details";
pub const EMPTY_RESULTS: &str = "No movies found. Try a different search.";
pub const NO_FAVORITES: &str = "No favorites added yet.";

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionStore>,
    pub catalog: CatalogStore,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub backend: Arc<dyn BackendApi>,
    pub omdb: Arc<dyn OmdbApi>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
    pub outcome: SearchOutcome,
    pub featured: Vec<Movie>,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailsView {
    pub detail: MovieDetail,
    pub chart: RatingChart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: &'static str,
    pub message: String,
}

impl Alert {
    pub fn from_error(err: &ClientError, fallback: &str) -> Self {
        Self {
            title: err.title(),
            message: err.user_message(fallback),
        }
    }
}

impl AppState {
    pub async fn init(config: &Config) -> Result<Self> {
        let backend: Arc<dyn BackendApi> = Arc::new(BackendClient::from_config(config)?);
        let omdb: Arc<dyn OmdbApi> = Arc::new(OmdbClient::from_config(config)?);
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.data_dir));
        Ok(Self::with_parts(backend, omdb, storage).await)
    }

    pub async fn with_parts(
        backend: Arc<dyn BackendApi>,
        omdb: Arc<dyn OmdbApi>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let session = Arc::new(SessionStore::rehydrate(storage).await);
        let catalog = CatalogStore::new();
        let orchestrator = Arc::new(SearchOrchestrator::new(backend.clone(), catalog.clone()));
        Self {
            session,
            catalog,
            orchestrator,
            backend,
            omdb,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let grant = self.backend.login(email, password).await?;
        self.session
            .login(grant.name.clone(), grant.access_token)
            .await;
        Ok(grant.name)
    }

    pub async fn register(&self, registration: &Registration) -> Result<String> {
        let grant = self.backend.register(registration).await?;
        self.session
            .login(grant.name.clone(), grant.access_token)
            .await;
        Ok(grant.name)
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }

    async fn require_login(&self) -> Result<Session> {
        let session = self.session.snapshot().await;
        if !session.is_logged_in() {
            debug!("Gated screen requested without a session");
            return Err(ClientError::Auth(
                "You must be logged in. Run `login` or `register` first.".to_string(),
            ));
        }
        Ok(session)
    }

    pub async fn search(&self, criteria: SearchCriteria) -> Result<SearchView> {
        let session = self.require_login().await?;
        let outcome = self.orchestrator.search(criteria, session.access_token()).await?;
        Ok(SearchView {
            outcome,
            featured: self.catalog.featured().await,
            movies: self.catalog.movies().await,
        })
    }

    pub async fn movie_details(&self, route_param: &str) -> Result<DetailsView> {
        let session = self.require_login().await?;
        let movie = Movie::from_route_param(route_param)
            .map_err(|e| ClientError::decode("navigation parameter", e))?;
        let Some(imdb_id) = movie.imdb_id.as_deref() else {
            warn!("Details requested for '{}' without an id", movie.display_title());
            return Err(ClientError::Provider("Movie details not found".to_string()));
        };
        let detail = self
            .backend
            .get_movie_detail(imdb_id, session.access_token())
            .await?;
        Ok(details_view(detail))
    }

    pub async fn catalog_search(
        &self,
        query: &str,
        search_type: Option<SearchType>,
    ) -> Result<SearchResults> {
        self.omdb.search(query, search_type).await
    }

    pub async fn catalog_details(&self, imdb_id: &str) -> Result<DetailsView> {
        let detail = self.omdb.fetch_detail(imdb_id).await?;
        Ok(details_view(detail))
    }

    pub async fn favorites(&self) -> Result<Vec<Movie>> {
        self.require_login().await?;
        Ok(self.session.favorites().await)
    }

    pub async fn add_favorite(&self, movie: Movie) -> Result<()> {
        self.require_login().await?;
        info!("Adding favorite '{}'", movie.display_title());
        self.session.add_favorite(movie).await;
        Ok(())
    }

    pub async fn remove_favorite(&self, imdb_id: &str) -> Result<()> {
        self.require_login().await?;
        info!("Removing favorite {}", imdb_id);
        self.session.remove_favorite(imdb_id).await;
        Ok(())
    }

    pub async fn toggle_favorite(&self, movie: Movie) -> Result<FavoriteToggle> {
        self.require_login().await?;
        Ok(self.session.toggle_favorite(movie).await)
    }
}

fn details_view(detail: MovieDetail) -> DetailsView {
    let chart = RatingChart::from_ratings(&detail.ratings);
    DetailsView { detail, chart }
}
