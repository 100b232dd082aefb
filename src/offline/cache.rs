//! Named response caches: on disk for the CLI, in memory for tests

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A stored response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    content_type: Option<String>,
}

/// Storage behind a named cache, keyed by absolute URL.
pub trait CacheStorage: Send + Sync {
    fn name(&self) -> &str;

    fn put(&self, entry: &CachedResponse) -> Result<()>;

    fn get(&self, url: &str) -> Result<Option<CachedResponse>>;

    /// URLs currently stored
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.get(url)?.is_some())
    }
}

/// Hex SHA-256 of the URL, used as the on-disk entry name.
pub fn entry_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// `<root>/<cache name>/<sha256>.json` + `.body`
#[derive(Debug, Clone)]
pub struct DiskCache {
    name: String,
    dir: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) the cache `name` under `root`.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        if name.is_empty() || name.contains(&['/', '\\'][..]) || name == "." || name == ".." {
            return Err(Error::CacheError(format!("invalid cache name '{}'", name)));
        }
        let dir = root.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            name: name.to_string(),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn paths(&self, url: &str) -> (PathBuf, PathBuf) {
        let key = entry_key(url);
        (
            self.dir.join(format!("{}.json", key)),
            self.dir.join(format!("{}.body", key)),
        )
    }
}

impl CacheStorage for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, entry: &CachedResponse) -> Result<()> {
        let (meta_path, body_path) = self.paths(&entry.url);
        let meta = EntryMeta {
            url: entry.url.clone(),
            status: entry.status,
            content_type: entry.content_type.clone(),
        };
        // body first so a metadata file never points at a missing body
        std::fs::write(&body_path, &entry.body)?;
        let json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| Error::CacheError(format!("encode metadata: {}", e)))?;
        std::fs::write(&meta_path, json)?;
        Ok(())
    }

    fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let (meta_path, body_path) = self.paths(url);
        if !meta_path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read(&meta_path)?;
        let meta: EntryMeta = serde_json::from_slice(&raw)
            .map_err(|e| Error::CacheError(format!("corrupt entry {}: {}", meta_path.display(), e)))?;
        let body = std::fs::read(&body_path)?;
        Ok(Some(CachedResponse {
            url: meta.url,
            status: meta.status,
            content_type: meta.content_type,
            body,
        }))
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = std::fs::read(&path)?;
            if let Ok(meta) = serde_json::from_slice::<EntryMeta>(&raw) {
                urls.push(meta.url);
            }
        }
        urls.sort();
        Ok(urls)
    }
}

/// Cache held in memory
#[derive(Debug, Default)]
pub struct MemoryCache {
    name: String,
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl MemoryCache {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CachedResponse>>> {
        self.entries
            .lock()
            .map_err(|_| Error::CacheError("memory cache lock poisoned".into()))
    }
}

impl CacheStorage for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    fn put(&self, entry: &CachedResponse) -> Result<()> {
        self.lock()?.insert(entry.url.clone(), entry.clone());
        Ok(())
    }

    fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        Ok(self.lock()?.get(url).cloned())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut urls: Vec<String> = self.lock()?.keys().cloned().collect();
        urls.sort();
        Ok(urls)
    }
}
