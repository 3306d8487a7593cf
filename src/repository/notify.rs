//! Structural-change notifications over a Tokio broadcast channel.
//!
//! Notifications carry no payload. Observers re-read the snapshot when they
//! see one, so missed notifications collapse into a single wakeup.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Marker sent when the set or order of sites changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitesChanged;

/// Publishing side, owned by the snapshot container.
#[derive(Debug, Clone)]
pub(crate) struct SitesNotifier {
    sender: broadcast::Sender<SitesChanged>,
}

impl SitesNotifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a change to all observers (best effort).
    pub(crate) fn publish(&self) {
        metrics::counter!("site_notifications_total").increment(1);
        // No observers is not an error
        let _ = self.sender.send(SitesChanged);
    }

    pub(crate) fn subscribe(&self) -> SitesObserver {
        metrics::counter!("site_observer_subscriptions_total").increment(1);
        SitesObserver {
            receiver: self.sender.subscribe(),
        }
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side of change notifications.
///
/// Dropping the observer unregisters it.
#[derive(Debug)]
pub struct SitesObserver {
    receiver: broadcast::Receiver<SitesChanged>,
}

impl SitesObserver {
    /// Waits for the next change.
    ///
    /// Returns `None` once the publishing container has been dropped.
    pub async fn changed(&mut self) -> Option<SitesChanged> {
        match self.receiver.recv().await {
            Ok(change) => Some(change),
            Err(RecvError::Lagged(skipped)) => {
                metrics::counter!("site_observer_lagged_total").increment(skipped);
                Some(SitesChanged)
            },
            Err(RecvError::Closed) => None,
        }
    }

    /// Drains pending notifications without waiting.
    ///
    /// Returns true if at least one change was pending.
    pub fn take_changed(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return changed,
            }
        }
    }
}
