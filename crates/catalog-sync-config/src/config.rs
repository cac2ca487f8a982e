use catalog_sync_models::Collection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value shipped in the sample config; a URL still equal to it was never filled in
pub const PLACEHOLDER_URL: &str = "https://<PROJECT-ID>.supabase.co";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub collections: CollectionConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Backend name: "rest" for the hosted catalog service, "memory" for an
    /// in-process catalog (offline demos)
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub url: String,
    /// Path of the server-sent change feed, relative to `url`
    #[serde(default = "default_changes_path")]
    pub changes_path: String,
}

/// Remote table backing each collection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollectionConfig {
    #[serde(default = "default_movies_table")]
    pub movies_table: String,
    #[serde(default = "default_shows_table")]
    pub shows_table: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncOptions {
    /// Fall back to the built-in sample catalog when nothing else is available
    #[serde(default = "default_true")]
    pub seed_when_empty: bool,
    /// Write collection snapshots to the local fallback store
    #[serde(default = "default_true")]
    pub persist_snapshots: bool,
    /// Subscribe to the remote change feed while a session is open
    #[serde(default = "default_true")]
    pub live_updates: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub json: Option<bool>,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_backend() -> String {
    "rest".to_string()
}

fn default_changes_path() -> String {
    "/realtime/v1/changes".to_string()
}

fn default_movies_table() -> String {
    "movies".to_string()
}

fn default_shows_table() -> String {
    "tv_shows".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: PLACEHOLDER_URL.to_string(),
            changes_path: default_changes_path(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            movies_table: default_movies_table(),
            shows_table: default_shows_table(),
        }
    }
}

impl CollectionConfig {
    pub fn table_for(&self, collection: Collection) -> &str {
        match collection {
            Collection::Movies => &self.movies_table,
            Collection::Shows => &self.shows_table,
        }
    }

    /// Reverse lookup used when a change payload names its table
    pub fn collection_for(&self, table: &str) -> Option<Collection> {
        Collection::ALL.into_iter().find(|c| self.table_for(*c) == table)
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            seed_when_empty: true,
            persist_snapshots: true,
            live_updates: true,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            collections: CollectionConfig::default(),
            sync: SyncOptions::default(),
            admin: AdminConfig::default(),
            logging: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.remote.backend.as_str() {
            "rest" => {
                let url = self.remote.url.trim();
                if url.is_empty() || url == PLACEHOLDER_URL {
                    return Err(anyhow::anyhow!("remote.url is not configured"));
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(anyhow::anyhow!("remote.url must be an http(s) URL: {}", url));
                }
                if !self.remote.changes_path.starts_with('/') {
                    return Err(anyhow::anyhow!(
                        "remote.changes_path must start with '/': {}",
                        self.remote.changes_path
                    ));
                }
            }
            "memory" => {}
            other => {
                return Err(anyhow::anyhow!("Unknown remote backend: {}", other));
            }
        }

        let movies = self.collections.movies_table.trim();
        let shows = self.collections.shows_table.trim();
        if movies.is_empty() || shows.is_empty() {
            return Err(anyhow::anyhow!("collection table names cannot be empty"));
        }
        if movies == shows {
            return Err(anyhow::anyhow!("movies and shows must use different tables"));
        }

        if self.admin.username.trim().is_empty() {
            return Err(anyhow::anyhow!("admin.username cannot be empty"));
        }

        Ok(())
    }

    pub fn is_remote_configured(&self) -> bool {
        self.remote.backend == "memory"
            || (!self.remote.url.trim().is_empty() && self.remote.url != PLACEHOLDER_URL)
    }
}
