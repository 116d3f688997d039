use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backend::BackendApi;
use crate::catalog::CatalogStore;
use crate::error::Result;
use crate::models::{Movie, SearchCriteria};

const MAX_CACHED_SEARCHES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Skipped,
    Applied { count: usize },
    Superseded,
}

pub struct SearchOrchestrator {
    backend: Arc<dyn BackendApi>,
    catalog: CatalogStore,
    generation: AtomicU64,
    cache: Mutex<HashMap<SearchCriteria, Vec<Movie>>>,
}

impl SearchOrchestrator {
    pub fn new(backend: Arc<dyn BackendApi>, catalog: CatalogStore) -> Self {
        Self {
            backend,
            catalog,
            generation: AtomicU64::new(0),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub async fn search(
        &self,
        criteria: SearchCriteria,
        access_token: Option<&str>,
    ) -> Result<SearchOutcome> {
        if criteria.is_blank() {
            debug!("Ignoring blank search");
            return Ok(SearchOutcome::Skipped);
        }
        let criteria = criteria.normalized();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, query = %criteria.query, "Issuing search");

        let cached = self.cache.lock().await.get(&criteria).cloned();
        if let Some(movies) = cached {
            debug!(generation, count = movies.len(), "Showing cached results");
            self.apply_if_current(generation, movies).await;
        }

        match self.backend.search_movies(&criteria, access_token).await {
            Ok(movies) => {
                self.remember(criteria.clone(), movies.clone()).await;
                let count = movies.len();
                if self.apply_if_current(generation, movies).await {
                    info!("Search '{}' returned {} result(s)", criteria.query, count);
                    Ok(SearchOutcome::Applied { count })
                } else {
                    debug!(generation, "Dropping superseded search response");
                    Ok(SearchOutcome::Superseded)
                }
            }
            Err(e) if !self.is_current(generation) => {
                debug!(generation, "Dropping superseded search failure: {}", e);
                Ok(SearchOutcome::Superseded)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn cached(&self, criteria: &SearchCriteria) -> Option<Vec<Movie>> {
        let key = criteria.clone().normalized();
        self.cache.lock().await.get(&key).cloned()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    // Checked under the catalog lock so it cannot interleave with another replacement.
    async fn apply_if_current(&self, generation: u64, movies: Vec<Movie>) -> bool {
        let mut current = self.catalog.lock().await;
        if !self.is_current(generation) {
            return false;
        }
        *current = movies;
        true
    }

    async fn remember(&self, criteria: SearchCriteria, movies: Vec<Movie>) {
        let mut cache = self.cache.lock().await;
        if cache.len() >= MAX_CACHED_SEARCHES && !cache.contains_key(&criteria) {
            cache.clear();
        }
        cache.insert(criteria, movies);
    }
}
