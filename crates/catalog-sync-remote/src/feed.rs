use catalog_sync_models::{ChangeEvent, Collection};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A live subscription to one collection's change events.
///
/// Events are yielded in the order the backend delivered them. Dropping the
/// feed (or calling [`ChangeFeed::unsubscribe`]) cancels the producer side.
pub struct ChangeFeed {
    collection: Collection,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    cancel: CancellationToken,
}

/// Producer half handed to whatever delivers events into a [`ChangeFeed`].
#[derive(Clone)]
pub struct FeedSender {
    collection: Collection,
    sender: mpsc::UnboundedSender<ChangeEvent>,
    cancel: CancellationToken,
}

impl ChangeFeed {
    pub fn channel(collection: Collection) -> (FeedSender, ChangeFeed) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        (
            FeedSender {
                collection,
                sender,
                cancel: cancel.clone(),
            },
            ChangeFeed {
                collection,
                receiver,
                cancel,
            },
        )
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn unsubscribe(self) {
        self.cancel.cancel();
    }

    /// Token that unsubscribes this feed when cancelled, usable after the
    /// feed itself has been moved into a consumer task.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for ChangeFeed {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

impl FeedSender {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Deliver an event. Returns false once the feed is gone.
    pub fn send(&self, event: ChangeEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }

    /// Resolves when the consumer unsubscribes
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }
}
