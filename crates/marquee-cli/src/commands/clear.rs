use crate::context::open_fallback;
use crate::output::Output;
use catalog_sync_config::PathManager;
use catalog_sync_core::admin::SESSION_BUCKET;
use catalog_sync_core::FallbackStore;
use catalog_sync_models::Collection;
use color_eyre::Result;
use std::fs;

pub async fn run_clear(all: bool, fallback: bool, session: bool, credentials: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if all {
        clear_fallback(&path_manager, output)?;
        clear_session(&path_manager, output)?;
        clear_credentials(&path_manager, output)?;
        output.success("Local catalog snapshot, admin session and credentials cleared");
        return Ok(());
    }

    let mut cleared_anything = false;

    if fallback {
        clear_fallback(&path_manager, output)?;
        cleared_anything = true;
    }

    if session {
        clear_session(&path_manager, output)?;
        cleared_anything = true;
    }

    if credentials {
        clear_credentials(&path_manager, output)?;
        cleared_anything = true;
    }

    if !cleared_anything {
        output.warn("No clear option specified. Use --fallback, --session, --credentials, or --all");
        output.info("\nExample: marquee clear --fallback");
    }

    Ok(())
}

fn clear_fallback(path_manager: &PathManager, output: &Output) -> Result<()> {
    if !path_manager.fallback_dir().exists() {
        output.info("No local catalog snapshot found to clear");
        return Ok(());
    }

    let store = open_fallback(path_manager)?;
    for collection in Collection::ALL {
        store
            .remove(collection.name())
            .map_err(|e| color_eyre::eyre::eyre!("Failed to clear local {}: {}", collection, e))?;
    }
    output.success(format!("Cleared local catalog snapshot: {}", path_manager.fallback_dir().display()));
    Ok(())
}

fn clear_session(path_manager: &PathManager, output: &Output) -> Result<()> {
    if !path_manager.fallback_dir().exists() {
        output.info("No admin session found to clear");
        return Ok(());
    }

    let store = open_fallback(path_manager)?;
    store
        .remove(SESSION_BUCKET)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to clear admin session: {}", e))?;
    output.success("Cleared admin session");
    Ok(())
}

fn clear_credentials(path_manager: &PathManager, output: &Output) -> Result<()> {
    let credentials_file = path_manager.credentials_file();

    if credentials_file.exists() {
        fs::remove_file(&credentials_file).map_err(|e| {
            color_eyre::eyre::eyre!("Failed to remove credentials file at {}: {}", credentials_file.display(), e)
        })?;
        output.success(format!("Cleared credentials: {}", credentials_file.display()));
    } else {
        output.info("No credentials file found to clear");
    }

    Ok(())
}
