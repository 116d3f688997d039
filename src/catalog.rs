use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::models::Movie;

pub const FEATURED_COUNT: usize = 5;

#[derive(Clone, Default)]
pub struct CatalogStore {
    movies: Arc<Mutex<Vec<Movie>>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_movies(&self, movies: Vec<Movie>) {
        *self.movies.lock().await = movies;
    }

    pub async fn movies(&self) -> Vec<Movie> {
        self.movies.lock().await.clone()
    }

    pub async fn featured(&self) -> Vec<Movie> {
        self.movies
            .lock()
            .await
            .iter()
            .take(FEATURED_COUNT)
            .cloned()
            .collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.movies.lock().await.is_empty()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Vec<Movie>> {
        self.movies.lock().await
    }
}
