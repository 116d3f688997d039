use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::Movie;
use crate::storage::KeyValueStorage;

pub const STORAGE_KEY: &str = "auth-storage";
const STORAGE_VERSION: u32 = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    is_logged_in: bool,
    username: Option<String>,
    access_token: Option<String>,
    #[serde(default)]
    favorites: Vec<Movie>,
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn favorites(&self) -> &[Movie] {
        &self.favorites
    }

    pub fn is_favorite(&self, imdb_id: &str) -> bool {
        self.favorites
            .iter()
            .any(|m| m.imdb_id.as_deref() == Some(imdb_id))
    }

    fn clear_credentials(&mut self) {
        self.is_logged_in = false;
        self.username = None;
        self.access_token = None;
    }

    fn normalized(mut self) -> Self {
        if self.is_logged_in && (self.username.is_none() || self.access_token.is_none()) {
            warn!("Stored session is missing credentials, treating as logged out");
            self.clear_credentials();
        }
        self
    }
}

#[derive(Serialize, Deserialize)]
struct Persisted {
    state: Session,
    #[serde(default)]
    version: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
    Ignored,
}

pub struct SessionStore {
    state: Mutex<Session>,
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub async fn rehydrate(storage: Arc<dyn KeyValueStorage>) -> Self {
        let session = match storage.get_item(STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Persisted>(&raw) {
                Ok(persisted) => {
                    debug!(
                        version = persisted.version,
                        favorites = persisted.state.favorites.len(),
                        "Rehydrated session"
                    );
                    persisted.state.normalized()
                }
                Err(e) => {
                    warn!("Stored session is corrupt, starting fresh: {}", e);
                    Session::default()
                }
            },
            Ok(None) => {
                debug!("No stored session");
                Session::default()
            }
            Err(e) => {
                warn!("Failed to read stored session, starting fresh: {}", e);
                Session::default()
            }
        };
        Self {
            state: Mutex::new(session),
            storage,
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.state.lock().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.lock().await.access_token.clone()
    }

    pub async fn favorites(&self) -> Vec<Movie> {
        self.state.lock().await.favorites.clone()
    }

    pub async fn is_favorite(&self, imdb_id: &str) -> bool {
        self.state.lock().await.is_favorite(imdb_id)
    }

    pub async fn login(&self, username: String, access_token: String) {
        info!("Session opened for {}", username);
        self.mutate(|s| {
            s.is_logged_in = true;
            s.username = Some(username);
            s.access_token = Some(access_token);
        })
        .await
    }

    pub async fn logout(&self) {
        info!("Session closed");
        self.mutate(Session::clear_credentials).await
    }

    pub async fn add_favorite(&self, movie: Movie) {
        self.mutate(|s| s.favorites.push(movie)).await
    }

    pub async fn remove_favorite(&self, imdb_id: &str) {
        self.mutate(|s| {
            s.favorites
                .retain(|m| m.imdb_id.as_deref() != Some(imdb_id))
        })
        .await
    }

    pub async fn toggle_favorite(&self, movie: Movie) -> FavoriteToggle {
        let Some(id) = movie.imdb_id.clone() else {
            return FavoriteToggle::Ignored;
        };
        self.mutate(|s| {
            if s.is_favorite(&id) {
                s.favorites.retain(|m| m.imdb_id.as_deref() != Some(id.as_str()));
                FavoriteToggle::Removed
            } else {
                s.favorites.push(movie);
                FavoriteToggle::Added
            }
        })
        .await
    }

    // Persists before the lock is released so writes land in mutation order.
    async fn mutate<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.state.lock().await;
        let out = f(&mut guard);
        self.persist(&guard).await;
        out
    }

    async fn persist(&self, session: &Session) {
        let persisted = Persisted {
            state: session.clone(),
            version: STORAGE_VERSION,
        };
        let raw = match serde_json::to_string(&persisted) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize session: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(STORAGE_KEY, &raw).await {
            warn!("Failed to persist session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::io;

    fn movie(id: Option<&str>, title: &str) -> Movie {
        Movie {
            imdb_id: id.map(str::to_string),
            title: Some(title.to_string()),
            year: Some("2001".to_string()),
            poster: None,
        }
    }

    async fn fresh() -> (SessionStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::rehydrate(storage.clone()).await;
        (store, storage)
    }

    struct BrokenStorage;

    #[async_trait::async_trait]
    impl KeyValueStorage for BrokenStorage {
        async fn get_item(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
        async fn set_item(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
        async fn remove_item(&self, _key: &str) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn login_then_logout_clears_credentials() {
        let (store, _) = fresh().await;
        store.login("ana".to_string(), "tok".to_string()).await;
        let s = store.snapshot().await;
        assert!(s.is_logged_in());
        assert_eq!(s.username(), Some("ana"));
        assert_eq!(s.access_token(), Some("tok"));

        store.logout().await;
        let s = store.snapshot().await;
        assert!(!s.is_logged_in());
        assert_eq!(s.username(), None);
        assert_eq!(s.access_token(), None);
    }

    #[tokio::test]
    async fn logout_when_already_logged_out_is_a_no_op() {
        let (store, _) = fresh().await;
        store.logout().await;
        assert_eq!(store.snapshot().await, Session::default());
    }

    #[tokio::test]
    async fn logout_keeps_favorites() {
        let (store, _) = fresh().await;
        store.login("ana".to_string(), "tok".to_string()).await;
        store.add_favorite(movie(Some("tt1"), "One")).await;
        store.logout().await;
        assert_eq!(store.favorites().await.len(), 1);
    }

    #[tokio::test]
    async fn favorites_follow_a_model_sequence() {
        let (store, _) = fresh().await;
        let mut model: Vec<Movie> = Vec::new();
        let ids = ["tt1", "tt2", "tt3", "tt4"];
        let mut seed: u32 = 7;
        for step in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let id = ids[(seed >> 16) as usize % ids.len()];
            if (seed >> 8) % 3 == 0 {
                store.remove_favorite(id).await;
                model.retain(|m| m.imdb_id.as_deref() != Some(id));
            } else {
                let m = movie(Some(id), &format!("step {step}"));
                store.add_favorite(m.clone()).await;
                model.push(m);
            }
            assert_eq!(store.favorites().await, model);
        }
    }

    #[tokio::test]
    async fn add_does_not_deduplicate_and_remove_drops_all_copies() {
        let (store, _) = fresh().await;
        store.add_favorite(movie(Some("tt1"), "A")).await;
        store.add_favorite(movie(Some("tt2"), "B")).await;
        store.add_favorite(movie(Some("tt1"), "A again")).await;
        assert_eq!(store.favorites().await.len(), 3);

        store.remove_favorite("tt1").await;
        let favs = store.favorites().await;
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].imdb_id.as_deref(), Some("tt2"));
    }

    #[tokio::test]
    async fn toggle_ignores_movies_without_identifier() {
        let (store, _) = fresh().await;
        assert_eq!(
            store.toggle_favorite(movie(None, "Nameless")).await,
            FavoriteToggle::Ignored
        );
        assert_eq!(
            store.toggle_favorite(movie(Some("tt9"), "Nine")).await,
            FavoriteToggle::Added
        );
        assert!(store.is_favorite("tt9").await);
        assert_eq!(
            store.toggle_favorite(movie(Some("tt9"), "Nine")).await,
            FavoriteToggle::Removed
        );
        assert!(store.favorites().await.is_empty());
    }

    #[tokio::test]
    async fn every_mutation_is_persisted_and_rehydrates() {
        let (store, storage) = fresh().await;
        store.login("ana".to_string(), "tok".to_string()).await;
        store.add_favorite(movie(Some("tt1"), "One")).await;

        let raw = storage.peek(STORAGE_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["state"]["isLoggedIn"], true);
        assert_eq!(value["state"]["username"], "ana");
        assert_eq!(value["state"]["accessToken"], "tok");
        assert_eq!(value["state"]["favorites"][0]["imdbID"], "tt1");

        let again = SessionStore::rehydrate(storage.clone()).await;
        assert_eq!(again.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn corrupt_storage_rehydrates_as_default() {
        let storage = Arc::new(MemoryStorage::with_item(STORAGE_KEY, "{not json"));
        let store = SessionStore::rehydrate(storage).await;
        assert_eq!(store.snapshot().await, Session::default());
    }

    #[tokio::test]
    async fn unreadable_storage_rehydrates_as_default_and_writes_fail_quietly() {
        let store = SessionStore::rehydrate(Arc::new(BrokenStorage)).await;
        assert_eq!(store.snapshot().await, Session::default());
        store.login("ana".to_string(), "tok".to_string()).await;
        assert!(store.snapshot().await.is_logged_in());
    }

    #[tokio::test]
    async fn logged_in_without_token_is_normalised() {
        let raw = r#"{"state":{"isLoggedIn":true,"username":"ana","accessToken":null,
            "favorites":[{"imdbID":"tt1"}]},"version":0}"#;
        let storage = Arc::new(MemoryStorage::with_item(STORAGE_KEY, raw));
        let s = SessionStore::rehydrate(storage).await.snapshot().await;
        assert!(!s.is_logged_in());
        assert_eq!(s.username(), None);
        assert_eq!(s.favorites().len(), 1);
    }
}
