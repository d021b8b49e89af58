//! Configuration for the data source and the offline asset cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default location of the record document.
pub const DEFAULT_DATA_URL: &str = "https://shauryaswarup.github.io/IITBChallenge/data/data.json";

/// Default cache version name. Bumping it invalidates every older cache.
pub const DEFAULT_CACHE_NAME: &str = "chem-app-cache-v1";

const DEFAULT_ASSET_BASE: &str = "https://shauryaswarup.github.io";

const DEFAULT_ASSETS: [&str; 5] = [
    "/IITBChallenge/",
    "/IITBChallenge/index.html",
    "/IITBChallenge/styles.css",
    "/IITBChallenge/app.js",
    "/IITBChallenge/data/data.json",
];

/// Where the record document comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the JSON array of records.
    pub url: String,
    /// Connect timeout in seconds for the HTTP client.
    pub connect_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATA_URL.to_string(),
            connect_timeout_secs: 10,
        }
    }
}

impl SourceConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record document URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the connect timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Offline asset cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether requests go through the asset cache at all.
    pub enabled: bool,
    /// Directory holding one subdirectory per named cache.
    pub root: PathBuf,
    /// Current cache version name.
    pub name: String,
    /// Origin the asset paths are resolved against.
    pub base_url: String,
    /// Asset paths cached on install.
    pub assets: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("chem-table"),
            name: DEFAULT_CACHE_NAME.to_string(),
            base_url: DEFAULT_ASSET_BASE.to_string(),
            assets: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the cache is used.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the cache root directory.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the cache version name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the origin and the asset paths cached on install.
    #[must_use]
    pub fn with_assets(mut self, base_url: impl Into<String>, assets: Vec<String>) -> Self {
        self.base_url = base_url.into();
        self.assets = assets;
        self
    }

    /// Absolute URLs of every configured asset.
    #[must_use]
    pub fn asset_urls(&self) -> Vec<String> {
        let base = self.base_url.trim_end_matches('/');
        self.assets
            .iter()
            .map(|path| {
                if path.starts_with("http://") || path.starts_with("https://") {
                    path.clone()
                } else {
                    format!("{base}/{}", path.trim_start_matches('/'))
                }
            })
            .collect()
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Record source settings.
    pub source: SourceConfig,
    /// Asset cache settings.
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location (`$XDG_CONFIG_HOME/chem-table/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chem-table")
            .join("config.toml")
    }

    /// Loads the config at `path`, writing the defaults there first if the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written, or parsed.
    pub fn load_or_create(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Saves the config to `path` atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let toml_str = toml::to_string(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, toml_str)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}
