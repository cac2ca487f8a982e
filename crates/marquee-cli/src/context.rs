use crate::output::Output;
use catalog_sync_config::{Config, CredentialStore, PathManager};
use catalog_sync_core::{AdminAuth, CatalogSynchronizer, FallbackStore, JsonFileStore};
use catalog_sync_remote::BackendRegistry;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

/// Load `config.toml`, or the defaults when there is none yet.
pub fn load_config() -> Result<Config> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        return Ok(Config::default());
    }
    Config::load_from_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

pub fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

pub fn open_fallback(path_manager: &PathManager) -> Result<Arc<dyn FallbackStore>> {
    let store = JsonFileStore::new(path_manager)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open local store at {}: {}", path_manager.fallback_dir().display(), e))?;
    Ok(Arc::new(store))
}

/// Everything a command needs to read or write the catalog.
pub struct CatalogContext {
    pub config: Config,
    pub credentials: CredentialStore,
    pub fallback: Arc<dyn FallbackStore>,
    pub sync: CatalogSynchronizer,
}

impl CatalogContext {
    pub fn open() -> Result<Self> {
        let config = load_config()?;
        config
            .validate()
            .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}. Run `marquee config init`.", e))?;

        let path_manager = PathManager::default();
        path_manager
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

        let credentials = load_credentials(&path_manager)?;
        let fallback = open_fallback(&path_manager)?;

        let registry = BackendRegistry::new();
        let remote = registry
            .create(&config, &credentials)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create catalog backend: {}", e))?;

        let sync = CatalogSynchronizer::create(remote, fallback.clone(), config.sync.clone());
        Ok(Self {
            config,
            credentials,
            fallback,
            sync,
        })
    }

    /// Open and run the initial load behind a spinner.
    pub async fn open_loaded(output: &Output) -> Result<Self> {
        let ctx = Self::open()?;
        let spinner = LoadSpinner::start(output, "Loading catalog...");
        ctx.sync.initial_load().await;
        spinner.finish();

        if let Some(error) = ctx.sync.last_error().await {
            output.warn(format!("Catalog service unavailable, showing local data ({})", error));
        }
        Ok(ctx)
    }

    /// Admin sign-in state, restored from the local store.
    pub fn admin(&self) -> AdminAuth {
        let mut auth = AdminAuth::new(
            self.fallback.clone(),
            &self.config.admin.username,
            self.credentials.get_admin_password().cloned(),
        );
        auth.restore();
        auth
    }

    pub fn require_admin(&self) -> Result<AdminAuth> {
        let auth = self.admin();
        if !auth.is_authenticated() {
            return Err(color_eyre::eyre::eyre!(
                "Admin sign-in required. Run `marquee login` first."
            ));
        }
        Ok(auth)
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

/// Spinner while the catalog loads. Only drawn for humans at a terminal;
/// otherwise progress goes to the structured log.
pub struct LoadSpinner {
    bar: Option<ProgressBar>,
}

impl LoadSpinner {
    pub fn start(output: &Output, message: &str) -> Self {
        if !output.is_human() || !is_interactive() {
            tracing::info!(operation = "catalog_load", message = %message, "Progress update");
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
        {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar: Some(bar) }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
