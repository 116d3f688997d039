use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, trace};

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> io::Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> io::Result<()>;
    async fn remove_item(&self, key: &str) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                debug!(path = %path.display(), "Loaded stored item");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("tmp");
        trace!(tmp_path = %tmp_path.display(), "Writing temporary file");
        tokio::fs::write(&tmp_path, value).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        debug!(path = %path.display(), bytes = value.len(), "Stored item");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::default();
        lock(&storage.items).insert(key.to_string(), value.to_string());
        storage
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.peek(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        lock(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> io::Result<()> {
        lock(&self.items).remove(key);
        Ok(())
    }
}
