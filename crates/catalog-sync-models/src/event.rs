use crate::collection::Collection;
use crate::item::ItemId;
use crate::raw::RawRecord;
use serde::{Deserialize, Serialize};

/// What happened to a remote row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Change {
    Insert { record: RawRecord },
    Update { record: RawRecord },
    Delete { id: ItemId },
}

/// A remote insert/update/delete, delivered out of band from any request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub change: Change,
}

impl ChangeEvent {
    pub fn insert(collection: Collection, record: RawRecord) -> Self {
        Self { collection, change: Change::Insert { record } }
    }

    pub fn update(collection: Collection, record: RawRecord) -> Self {
        Self { collection, change: Change::Update { record } }
    }

    pub fn delete(collection: Collection, id: ItemId) -> Self {
        Self { collection, change: Change::Delete { id } }
    }

    pub fn kind(&self) -> &'static str {
        match self.change {
            Change::Insert { .. } => "INSERT",
            Change::Update { .. } => "UPDATE",
            Change::Delete { .. } => "DELETE",
        }
    }

    /// Id of the affected row, when the payload carries one.
    pub fn id(&self) -> Option<ItemId> {
        match &self.change {
            Change::Insert { record } | Change::Update { record } => record.id,
            Change::Delete { id } => Some(*id),
        }
    }
}
