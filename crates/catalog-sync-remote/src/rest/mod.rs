pub mod api;
pub mod changes;
pub mod client;

pub use client::RestCatalog;
