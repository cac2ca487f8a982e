pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{AdminConfig, CollectionConfig, Config, LoggingConfig, RemoteConfig, SyncOptions, PLACEHOLDER_URL};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
