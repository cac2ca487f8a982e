pub mod admin;
pub mod collection;
pub mod draft;
pub mod event;
pub mod item;
pub mod lenient;
pub mod raw;

pub use admin::AdminSession;
pub use collection::Collection;
pub use draft::{ItemDraft, ItemPatch};
pub use event::{Change, ChangeEvent};
pub use item::{CatalogItem, ItemDetails, ItemId};
pub use raw::RawRecord;
