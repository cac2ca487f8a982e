//! Catalog synchronization for the Marquee video catalog.
//!
//! [`CatalogSynchronizer`] keeps the in-memory movie and show lists in step
//! with a remote catalog backend, falling back to a local snapshot store
//! whenever the backend is unreachable.

pub mod admin;
pub mod fallback;
pub mod ids;
pub mod normalize;
pub mod query;
pub mod seed;
pub mod state;
pub mod synchronizer;

pub use admin::{AdminAuth, AuthError};
pub use fallback::{load_bucket, save_bucket, FallbackStore, JsonFileStore, MemoryStore, StoreError};
pub use ids::LocalIdGenerator;
pub use normalize::NormalizeError;
pub use query::{browse, home_rows, similar, BrowseFilter, HomeRows, SortOrder};
pub use seed::seed_items;
pub use state::{CatalogSnapshot, CatalogState, EventOutcome};
pub use synchronizer::{AppliedChange, CatalogSynchronizer, Written};
