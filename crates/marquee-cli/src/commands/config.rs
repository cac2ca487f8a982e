use super::prompts;
use crate::context::{load_config, load_credentials};
use crate::output::Output;
use crate::ConfigCommands;
use catalog_sync_config::{Config, PathManager, PLACEHOLDER_URL};
use catalog_sync_remote::{BackendRegistry, API_KEY_ENV};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output).await,
        ConfigCommands::Init { url, backend, force } => init_config(url, backend, force, output).await,
        ConfigCommands::SetKey { key } => set_key(key, output).await,
        ConfigCommands::SetPassword => set_password(output).await,
    }
}

async fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Showing defaults. Run 'marquee config init' to create one.");
    }

    let config = load_config()?;
    let credentials = load_credentials(&path_manager)?;
    let api_key = credentials
        .get_remote_api_key()
        .cloned()
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .unwrap_or_default();
    let api_key_display = if full { api_key.clone() } else { mask_string(&api_key) };
    let password_set = credentials.get_admin_password().is_some();

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config": config,
            "api_key": api_key_display,
            "admin_password_set": password_set,
            "fallback_dir": path_manager.fallback_dir().display().to_string(),
        }));
        return Ok(());
    }

    print_section_header("Configuration", output);

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);

    let yes_no = |b: bool| if b { "✓".green().to_string() } else { "✗".red().to_string() };
    let rows: Vec<(&str, String)> = vec![
        ("Config file", config_file.display().to_string()),
        ("Backend", config.remote.backend.clone()),
        ("Service URL", config.remote.url.clone()),
        ("Changes path", config.remote.changes_path.clone()),
        ("API key", api_key_display),
        ("Movies table", config.collections.movies_table.clone()),
        ("Shows table", config.collections.shows_table.clone()),
        ("Seed when empty", yes_no(config.sync.seed_when_empty)),
        ("Persist snapshots", yes_no(config.sync.persist_snapshots)),
        ("Live updates", yes_no(config.sync.live_updates)),
        ("Admin username", config.admin.username.clone()),
        ("Admin password", yes_no(password_set)),
        ("Local store", path_manager.fallback_dir().display().to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{}", table);

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is not usable yet: {}", e));
    }
    Ok(())
}

async fn init_config(url: Option<String>, backend: Option<String>, force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    if config_file.exists()
        && !force
        && !prompts::prompt_yes_no(&format!("Overwrite {}?", config_file.display()), Some(false))?
    {
        output.info("Configuration left unchanged");
        return Ok(());
    }

    let mut config = Config::default();
    if let Some(backend) = backend {
        let registry = BackendRegistry::new();
        if !registry.is_registered(&backend) {
            return Err(color_eyre::eyre::eyre!(
                "Unknown backend '{}'. Available: {}",
                backend,
                registry.registered_backends().join(", ")
            ));
        }
        config.remote.backend = backend;
    }

    if config.remote.backend == "rest" {
        config.remote.url = match url {
            Some(url) => url,
            None => prompts::prompt_string("Catalog service URL", Some(PLACEHOLDER_URL))?,
        };
    }

    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Configuration validation failed: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Configuration written to {}", config_file.display()));
    if config.remote.backend == "rest" {
        output.info("Next: store the service key with 'marquee config set-key'");
    }
    Ok(())
}

async fn set_key(key: Option<String>, output: &Output) -> Result<()> {
    let key = match key {
        Some(k) => k,
        None => rpassword::prompt_password("Catalog service API key: ")
            .map_err(|e| color_eyre::eyre::eyre!("Failed to read key: {}", e))?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(color_eyre::eyre::eyre!("API key is required"));
    }

    let path_manager = PathManager::default();
    let mut credentials = load_credentials(&path_manager)?;
    credentials.set_remote_api_key(key);
    credentials.save().map_err(|e| {
        color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", path_manager.credentials_file().display(), e)
    })?;

    output.success("API key saved");
    Ok(())
}

async fn set_password(output: &Output) -> Result<()> {
    let password = prompts::prompt_new_secret("Admin password")?;
    validate_password_strength(&password).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let path_manager = PathManager::default();
    let mut credentials = load_credentials(&path_manager)?;
    credentials.set_admin_password(password);
    credentials.save().map_err(|e| {
        color_eyre::eyre::eyre!("Failed to save credentials to {}: {}", path_manager.credentials_file().display(), e)
    })?;

    output.success("Admin password saved");
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    match (s.get(..2), s.get(s.len() - 2..)) {
        (Some(head), Some(tail)) => format!("{}***{}", head, tail),
        _ => "*".repeat(s.chars().count()),
    }
}

fn validate_password_strength(input: &str) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err("Password cannot be empty");
    }
    if input.len() < 6 {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}

fn print_section_header(title: &str, output: &Output) {
    output.info("");
    output.info(format!("{}", title.bold().bright_cyan()));
    output.info(format!("{}", "─".repeat(title.len()).bright_cyan()));
}
