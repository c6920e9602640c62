//! In-process [`Feed`] of committed [`Package`] changes.

use derive_more::{Display, Error as StdError};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing as log;

use crate::domain::{package, Package};

/// Committed change of a [`Package`].
#[derive(Clone, Debug)]
pub enum Change {
    /// [`Package`] was created or overwritten.
    Saved(Package),

    /// [`Package`] with the provided ID was deleted.
    Removed(package::Id),
}

/// Broadcast of [`Change`]s to every live subscriber.
///
/// Unsubscribing is dropping the stream returned by [`Feed::subscribe()`].
#[derive(Clone, Debug)]
pub struct Feed {
    /// Sending half of the underlying channel.
    sender: broadcast::Sender<Change>,
}

impl Feed {
    /// Default number of [`Change`]s buffered for a slow subscriber.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a new [`Feed`] buffering up to `capacity` [`Change`]s for each
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes the provided [`Change`] to all current subscribers.
    pub fn publish(&self, change: Change) {
        match self.sender.send(change) {
            Ok(n) => log::debug!("`Change` published to {n} subscribers"),
            Err(_) => log::trace!("`Change` published with no subscribers"),
        }
    }

    /// Subscribes to [`Change`]s published after this call.
    #[must_use]
    pub fn subscribe(&self) -> BroadcastStream<Change> {
        BroadcastStream::new(self.sender.subscribe())
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

/// Error of a [`Feed`] subscription.
#[derive(Clone, Copy, Debug, Display, StdError, Eq, PartialEq)]
pub enum Error {
    /// Subscriber was too slow and missed some [`Change`]s.
    #[display("Subscriber lagged behind by {_0} changes")]
    Lagged(#[error(not(source))] u64),
}

#[cfg(test)]
mod spec {
    use futures::StreamExt as _;

    use crate::domain::package;

    use super::{Change, Feed};

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let feed = Feed::new(4);
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();
        let id = package::Id::new();

        feed.publish(Change::Removed(id));

        for sub in [&mut first, &mut second] {
            match sub.next().await {
                Some(Ok(Change::Removed(got))) => assert_eq!(got, id),
                other => panic!("unexpected item: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn reports_lag() {
        let feed = Feed::new(1);
        let mut sub = feed.subscribe();

        feed.publish(Change::Removed(package::Id::new()));
        feed.publish(Change::Removed(package::Id::new()));

        assert!(matches!(sub.next().await, Some(Err(_))));
        assert!(matches!(sub.next().await, Some(Ok(Change::Removed(_)))));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        Feed::default().publish(Change::Removed(package::Id::new()));
    }
}
