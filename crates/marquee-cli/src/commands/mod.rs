pub mod admin;
pub mod catalog;
pub mod clear;
pub mod config;
pub mod prompts;
pub mod watch;

use catalog_sync_models::Collection;
use color_eyre::Result;

pub(crate) fn parse_collection(value: &str) -> Result<Collection> {
    value.parse::<Collection>().map_err(|e| color_eyre::eyre::eyre!(e))
}
