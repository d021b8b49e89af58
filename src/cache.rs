//! Offline asset cache.
//!
//! A versioned, on-disk response cache with an install / activate / fetch
//! lifecycle. Each named cache is a directory under the cache root; every
//! entry is a body file plus a TOML metadata file, both named after the
//! SHA-256 of the request URL. Bumping the cache name is the only way
//! entries are invalidated: the next activation deletes every cache whose
//! name differs from the current one.
//!
//! Only directories carrying a [`CACHE_MARKER`] file count as caches, so a
//! root shared with other programs never loses their directories.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::format::format_bytes;
use crate::source::{Fetcher, Response};

/// Lifecycle events the cache reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent<'a> {
    /// Populate the current cache with every configured asset.
    Install,
    /// Delete caches left behind by earlier versions.
    Activate,
    /// Serve a request cache-first.
    Fetch(&'a str),
}

/// Result of handling a [`CacheEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// All assets stored; the cache is ready to serve immediately.
    Installed { assets: usize, bytes: u64 },
    /// Names of the caches that were deleted.
    Activated { evicted: Vec<String> },
    /// Response for a fetch, from the cache or the network.
    Response(Response),
}

/// File written into every cache directory this crate creates.
pub const CACHE_MARKER: &str = ".chem-cache";

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    stored_at: DateTime<Utc>,
}

/// The set of named caches under one root directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens the named cache, creating its directory if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a plain directory name or the
    /// directory cannot be created.
    pub async fn open(&self, name: &str) -> Result<NamedCache> {
        let dir = self.cache_dir(name)?;
        tokio::fs::create_dir_all(&dir).await?;
        let marker = dir.join(CACHE_MARKER);
        if !tokio::fs::try_exists(&marker).await? {
            tokio::fs::write(&marker, name).await?;
        }
        Ok(NamedCache { dir })
    }

    /// Handle to the named cache without creating it; lookups in a cache
    /// that does not exist simply miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a plain directory name.
    pub fn get(&self, name: &str) -> Result<NamedCache> {
        Ok(NamedCache {
            dir: self.cache_dir(name)?,
        })
    }

    /// Names of every existing cache. Unmarked directories are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the root exists but cannot be listed.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut read_dir = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_dir()
                && tokio::fs::try_exists(entry.path().join(CACHE_MARKER)).await?
            {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes the named cache. Returns `false` if it did not exist or the
    /// directory is not one of ours.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.cache_dir(name)?;
        if !tokio::fs::try_exists(dir.join(CACHE_MARKER)).await? {
            return Ok(false);
        }
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn cache_dir(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if plain {
            Ok(self.root.join(name))
        } else {
            Err(Error::Config(format!("invalid cache name: {name:?}")))
        }
    }
}

/// One named cache: a directory of stored responses.
#[derive(Debug, Clone)]
pub struct NamedCache {
    dir: PathBuf,
}

impl NamedCache {
    /// Looks up the stored response for `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored entry exists but cannot be read.
    pub async fn lookup(&self, url: &str) -> Result<Option<Response>> {
        let (meta_path, body_path) = self.entry_paths(url);
        let meta = match tokio::fs::read_to_string(&meta_path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = toml::from_str(&meta)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        // Guards against a hash collision with a different URL.
        if meta.url != url {
            return Ok(None);
        }
        let body = tokio::fs::read(&body_path).await?;
        Ok(Some(Response::new(meta.status, body)))
    }

    /// Stores a response for `url`, replacing any earlier entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry files cannot be written.
    pub async fn put(&self, url: &str, response: &Response) -> Result<()> {
        let (meta_path, body_path) = self.entry_paths(url);
        let meta = EntryMeta {
            url: url.to_string(),
            status: response.status,
            stored_at: Utc::now(),
        };
        let meta = toml::to_string(&meta)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Body first, metadata last: an entry only becomes visible once
        // both files are in place.
        write_atomic(&body_path, &response.body).await?;
        write_atomic(&meta_path, meta.as_bytes()).await?;
        Ok(())
    }

    fn entry_paths(&self, url: &str) -> (PathBuf, PathBuf) {
        let key = format!("{:x}", Sha256::digest(url.as_bytes()));
        (
            self.dir.join(format!("{key}.toml")),
            self.dir.join(format!("{key}.body")),
        )
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents).await?;
    tokio::fs::rename(&tmp_path, path).await
}

/// Versioned asset cache in front of a network fetcher.
pub struct AssetCache<F> {
    storage: CacheStorage,
    name: String,
    assets: Vec<String>,
    network: F,
}

impl<F: Fetcher> AssetCache<F> {
    /// Creates a cache from config, fetching misses through `network`.
    #[must_use]
    pub fn new(config: &CacheConfig, network: F) -> Self {
        Self {
            storage: CacheStorage::new(&config.root),
            name: config.name.clone(),
            assets: config.asset_urls(),
            network,
        }
    }

    /// Current cache version name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Dispatches a lifecycle event.
    ///
    /// # Errors
    ///
    /// Propagates the error of the individual handler.
    pub async fn handle(&self, event: CacheEvent<'_>) -> Result<CacheOutcome> {
        match event {
            CacheEvent::Install => {
                let (assets, bytes) = self.install().await?;
                Ok(CacheOutcome::Installed { assets, bytes })
            }
            CacheEvent::Activate => Ok(CacheOutcome::Activated {
                evicted: self.activate().await?,
            }),
            CacheEvent::Fetch(url) => Ok(CacheOutcome::Response(self.fetch(url).await?)),
        }
    }

    /// Fetches every configured asset and stores them in the current cache.
    ///
    /// All assets are fetched before anything is written; a single failed
    /// asset aborts the install and leaves the cache as it was.
    ///
    /// Returns the number of assets stored and their total size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CacheInstall`] if an asset fails to fetch or answers
    /// with a non-2xx status, or an I/O error if the cache cannot be written.
    pub async fn install(&self) -> Result<(usize, u64)> {
        let fetched = future::try_join_all(self.assets.iter().map(|url| async move {
            let response = self.network.get(url).await.map_err(|e| Error::CacheInstall {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            if !response.is_success() {
                return Err(Error::CacheInstall {
                    url: url.clone(),
                    reason: format!("status {}", response.status),
                });
            }
            Ok::<_, Error>((url, response))
        }))
        .await?;

        let cache = self.storage.open(&self.name).await?;
        let mut bytes = 0u64;
        for (url, response) in &fetched {
            cache.put(url, response).await?;
            bytes += response.body.len() as u64;
        }
        log::info!(
            "Installed cache {} with {} assets ({})",
            self.name,
            fetched.len(),
            format_bytes(bytes)
        );
        Ok((fetched.len(), bytes))
    }

    /// Deletes every cache whose name is not the current one.
    ///
    /// # Errors
    ///
    /// Returns an error if the caches cannot be listed or a stale one cannot
    /// be removed.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != self.name)
            .collect();

        future::try_join_all(stale.iter().map(|name| self.storage.delete(name))).await?;
        for name in &stale {
            log::info!("Evicted stale cache {name}");
        }
        Ok(stale)
    }

    /// Serves `url` from the current cache, falling back to the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or the network fetch
    /// fails.
    pub async fn fetch(&self, url: &str) -> Result<Response> {
        let cache = self.storage.get(&self.name)?;
        if let Some(response) = cache.lookup(url).await? {
            log::debug!("Cache hit: {url}");
            return Ok(response);
        }
        log::debug!("Cache miss: {url}");
        self.network.get(url).await
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for AssetCache<F> {
    async fn get(&self, url: &str) -> Result<Response> {
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::{DATA_URL, MockFetcher, THREE_RECORDS};
    use tempfile::TempDir;

    const BASE: &str = "http://localhost";

    fn config(dir: &TempDir, name: &str) -> CacheConfig {
        CacheConfig::new()
            .with_root(dir.path())
            .with_name(name)
            .with_assets(
                BASE,
                vec!["/".to_string(), "/app.js".to_string(), "/data/data.json".to_string()],
            )
    }

    fn network() -> MockFetcher {
        MockFetcher::new()
            .with("http://localhost/", 200, "<html></html>")
            .with("http://localhost/app.js", 200, "console.log(1)")
            .with(DATA_URL, 200, THREE_RECORDS)
    }

    #[tokio::test]
    async fn install_then_fetch_hits_cache() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(&config(&dir, "v1"), network());

        let outcome = cache.handle(CacheEvent::Install).await.unwrap();
        assert!(matches!(outcome, CacheOutcome::Installed { assets: 3, .. }));
        assert_eq!(cache.network.request_count(), 3);

        let response = cache.fetch("http://localhost/app.js").await.unwrap();
        assert_eq!(response, Response::new(200, "console.log(1)"));
        assert_eq!(cache.network.request_count(), 3);
    }

    #[tokio::test]
    async fn cached_response_survives_network_change() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(&config(&dir, "v1"), network());
        cache.install().await.unwrap();

        cache.network.set(DATA_URL, 500, "down");
        let response = cache.get(DATA_URL).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, THREE_RECORDS.as_bytes());
    }

    #[tokio::test]
    async fn miss_falls_through_to_network_without_storing() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new(&config(&dir, "v1"), network());
        cache.network.set("http://localhost/other", 404, "missing");

        let CacheOutcome::Response(first) = cache
            .handle(CacheEvent::Fetch("http://localhost/other"))
            .await
            .unwrap()
        else {
            panic!("expected response");
        };
        assert_eq!(first.status, 404);
        cache.fetch("http://localhost/other").await.unwrap();
        assert_eq!(cache.network.request_count(), 2);
    }

    #[tokio::test]
    async fn failed_asset_aborts_install() {
        let dir = TempDir::new().unwrap();
        let net = network().with("http://localhost/app.js", 503, "");
        let cache = AssetCache::new(&config(&dir, "v1"), net);

        let err = cache.install().await.unwrap_err();
        assert!(matches!(err, Error::CacheInstall { .. }));
        assert!(cache.storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_asset_aborts_install() {
        let dir = TempDir::new().unwrap();
        let net = MockFetcher::new().with("http://localhost/", 200, "<html></html>");
        let cache = AssetCache::new(&config(&dir, "v1"), net);

        let err = cache.install().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to cache http://localhost/"));
    }

    #[tokio::test]
    async fn activate_evicts_other_versions() {
        let dir = TempDir::new().unwrap();
        let old = AssetCache::new(&config(&dir, "chem-app-cache-v0"), network());
        old.install().await.unwrap();
        let older = CacheStorage::new(dir.path());
        older.open("legacy").await.unwrap();

        let current = AssetCache::new(&config(&dir, "chem-app-cache-v1"), network());
        current.install().await.unwrap();
        let outcome = current.handle(CacheEvent::Activate).await.unwrap();

        assert_eq!(
            outcome,
            CacheOutcome::Activated {
                evicted: vec!["chem-app-cache-v0".to_string(), "legacy".to_string()]
            }
        );
        assert_eq!(
            current.storage.keys().await.unwrap(),
            vec!["chem-app-cache-v1".to_string()]
        );
    }

    #[tokio::test]
    async fn activate_keeps_unmarked_directories() {
        let dir = TempDir::new().unwrap();
        let foreign = dir.path().join("mozilla").join("important");
        std::fs::create_dir_all(&foreign).unwrap();
        std::fs::write(foreign.join("x"), "keep").unwrap();
        CacheStorage::new(dir.path()).open("chem-app-cache-v0").await.unwrap();

        let current = AssetCache::new(&config(&dir, "chem-app-cache-v1"), network());
        let evicted = current.activate().await.unwrap();

        assert_eq!(evicted, vec!["chem-app-cache-v0".to_string()]);
        assert!(foreign.join("x").exists());
        assert!(!current.storage.delete("mozilla").await.unwrap());
        assert!(dir.path().join("mozilla").exists());
    }

    #[tokio::test]
    async fn activate_on_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, "v1").with_root(dir.path().join("absent"));
        let cache = AssetCache::new(&cfg, network());
        assert!(cache.activate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let storage = CacheStorage::new("/tmp/unused");
        assert!(storage.open("../escape").await.is_err());
        assert!(storage.delete("").await.is_err());
    }

    #[tokio::test]
    async fn put_replaces_entry() {
        let dir = TempDir::new().unwrap();
        let cache = CacheStorage::new(dir.path()).open("v1").await.unwrap();
        cache.put("http://a/", &Response::new(200, "one")).await.unwrap();
        cache.put("http://a/", &Response::new(200, "two")).await.unwrap();
        let hit = cache.lookup("http://a/").await.unwrap().unwrap();
        assert_eq!(hit.body, "two".as_bytes());
        assert!(cache.lookup("http://b/").await.unwrap().is_none());
    }
}
