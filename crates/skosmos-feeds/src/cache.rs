//! Visited-URI cache.
//!
//! The set of URIs a feed no longer needs to fetch (or emit) lives in an
//! external key/value store so it survives across runs. Nothing here prunes
//! it; [`crate::pipeline::clear_feed`] drops a feed's sets wholesale.
//!
//! The store is not transactional. Two runs writing the same key concurrently
//! can lose each other's updates; callers must serialize runs per feed.

use crate::error::CacheError;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

const LOADED_URIS_SUFFIX: &str = "_loaded_uris";

/// Plain key/value store of URI lists.
pub trait CacheBackend {
    fn get(&self, key: &str) -> Option<Vec<String>>;
    fn set(&mut self, key: &str, uris: Vec<String>);
    fn delete(&mut self, key: &str);
}

impl<B: CacheBackend + ?Sized> CacheBackend for &mut B {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, uris: Vec<String>) {
        (**self).set(key, uris)
    }

    fn delete(&mut self, key: &str) {
        (**self).delete(key)
    }
}

/// `isVisited` / `markVisited` over any [`CacheBackend`].
pub struct UriCache<B> {
    backend: B,
}

impl<B: CacheBackend> UriCache<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    pub fn is_visited(&self, uri: &str, cache_key: &str) -> bool {
        self.visited(cache_key).iter().any(|u| u == uri)
    }

    pub fn mark_visited(&mut self, uri: &str, cache_key: &str) {
        let mut uris = self.visited(cache_key);
        if uris.iter().any(|u| u == uri) {
            return;
        }
        uris.push(uri.to_string());
        self.backend.set(&storage_key(cache_key), uris);
    }

    pub fn visited(&self, cache_key: &str) -> Vec<String> {
        self.backend
            .get(&storage_key(cache_key))
            .unwrap_or_default()
    }

    pub fn forget(&mut self, cache_key: &str) {
        self.backend.delete(&storage_key(cache_key));
    }
}

fn storage_key(cache_key: &str) -> String {
    format!("{cache_key}{LOADED_URIS_SUFFIX}")
}

// ============================================================================
// Backends
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    entries: BTreeMap<String, Vec<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, uris: Vec<String>) {
        self.entries.insert(key.to_string(), uris);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// A [`MemoryCache`] persisted as one JSON object. Writes stay in memory
/// until [`FileCache::save`].
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    inner: MemoryCache,
    dirty: bool,
}

impl FileCache {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            inner: MemoryCache { entries },
            dirty: false,
        })
    }

    pub fn save(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.inner.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), "saved URI cache");
        Ok(())
    }
}

impl CacheBackend for FileCache {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, uris: Vec<String>) {
        self.inner.set(key, uris);
        self.dirty = true;
    }

    fn delete(&mut self, key: &str) {
        self.inner.delete(key);
        self.dirty = true;
    }
}
