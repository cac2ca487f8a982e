use catalog_sync_models::ItemId;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Ids for items created while the catalog service is unreachable.
///
/// Values are wall-clock milliseconds, bumped so that every id handed out
/// by one generator is strictly greater than the previous one. Nothing
/// stops a later service-assigned id from landing on the same value.
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: AtomicI64,
}

impl LocalIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> ItemId {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn next_at(&self, now_ms: i64) -> ItemId {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
            {
                Ok(_) => return ItemId(candidate),
                Err(current) => last = current,
            }
        }
    }
}
