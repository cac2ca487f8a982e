use catalog_sync_models::ItemId;
use thiserror::Error;

/// Failures reported by a remote catalog backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    /// The service could not be reached or answered with a server-side failure
    #[error("catalog service unreachable: {0}")]
    Connectivity(String),

    /// The collection has not been provisioned on the service yet
    #[error("collection '{0}' does not exist on the catalog service")]
    SchemaMissing(String),

    /// The service rejected a write payload
    #[error("catalog service rejected the write: {0}")]
    Validation(String),

    #[error("no record with id {0}")]
    NotFound(ItemId),
}

impl RemoteError {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteError::Connectivity(_) => "connectivity",
            RemoteError::SchemaMissing(_) => "schema_missing",
            RemoteError::Validation(_) => "validation",
            RemoteError::NotFound(_) => "not_found",
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Connectivity(e.to_string())
    }
}
