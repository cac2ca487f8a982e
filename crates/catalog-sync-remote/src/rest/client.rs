use crate::error::RemoteError;
use crate::feed::ChangeFeed;
use crate::rest::{api, changes};
use crate::traits::RemoteCatalog;
use anyhow::Result;
use async_trait::async_trait;
use catalog_sync_config::CollectionConfig;
use catalog_sync_models::{Collection, ItemId, RawRecord};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Client for the hosted catalog service (PostgREST-style HTTP plus a
/// server-sent change feed).
#[derive(Clone)]
pub struct RestCatalog {
    client: Arc<Client>,
    base_url: String,
    changes_path: String,
    tables: CollectionConfig,
}

impl RestCatalog {
    pub fn new(base_url: &str, api_key: &str, changes_path: &str, tables: CollectionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", api_key))?);

        // No request timeout: a stalled call stays outstanding until it resolves
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            changes_path: changes_path.to_string(),
            tables,
        })
    }

    fn table(&self, collection: Collection) -> &str {
        self.tables.table_for(collection)
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table(collection))
    }

    fn changes_url(&self) -> String {
        format!("{}{}", self.base_url, self.changes_path)
    }
}

#[async_trait]
impl RemoteCatalog for RestCatalog {
    fn backend_name(&self) -> &str {
        "rest"
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<RawRecord>, RemoteError> {
        api::list_rows(&self.client, &self.table_url(collection), self.table(collection)).await
    }

    async fn insert(&self, collection: Collection, record: &RawRecord) -> Result<RawRecord, RemoteError> {
        api::insert_row(&self.client, &self.table_url(collection), self.table(collection), record).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: ItemId,
        patch: &RawRecord,
    ) -> Result<RawRecord, RemoteError> {
        api::update_row(&self.client, &self.table_url(collection), self.table(collection), id, patch).await
    }

    async fn remove(&self, collection: Collection, id: ItemId) -> Result<(), RemoteError> {
        api::delete_row(&self.client, &self.table_url(collection), self.table(collection), id).await
    }

    async fn subscribe(&self, collection: Collection) -> Result<ChangeFeed, RemoteError> {
        let (sender, feed) = ChangeFeed::channel(collection);
        info!("Subscribing to {} changes ({})", collection, self.table(collection));
        changes::spawn_change_stream(
            Arc::clone(&self.client),
            self.changes_url(),
            self.table(collection).to_string(),
            sender,
        );
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let catalog = RestCatalog::new(
            "https://catalog.example.com/",
            "anon-key",
            "/realtime/v1/changes",
            CollectionConfig::default(),
        )
        .unwrap();

        assert_eq!(catalog.table_url(Collection::Movies), "https://catalog.example.com/rest/v1/movies");
        assert_eq!(catalog.table_url(Collection::Shows), "https://catalog.example.com/rest/v1/tv_shows");
        assert_eq!(catalog.changes_url(), "https://catalog.example.com/realtime/v1/changes");
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let result = RestCatalog::new(
            "https://catalog.example.com",
            "bad\nkey",
            "/realtime/v1/changes",
            CollectionConfig::default(),
        );
        assert!(result.is_err());
    }
}
