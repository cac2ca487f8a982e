pub mod error;
pub mod factory;
pub mod feed;
pub mod memory;
pub mod rest;
pub mod traits;

pub use error::RemoteError;
pub use factory::{BackendFactory, BackendRegistry, API_KEY_ENV};
pub use feed::{ChangeFeed, FeedSender};
pub use memory::MemoryCatalog;
pub use rest::RestCatalog;
pub use traits::RemoteCatalog;
