//! Change bus broadcasting row changes to subscribers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::types::{ChangeEvent, ChangeMessage};

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of row changes to every subscriber
#[derive(Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let message = ChangeMessage::new(event);
        let table = message.event.table.as_str();
        let op = message.event.op;
        let row_id = message.event.row_id;

        match self.sender.send(message) {
            Ok(count) => {
                debug!(table, ?op, %row_id, subscribers = count, "Change published");
            }
            Err(_) => {
                debug!(table, ?op, %row_id, "Change published (no subscribers)");
            }
        }
    }

    pub fn subscribe(&self) -> ChangeSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total = count, "New change subscriber");

        ChangeSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
    /// The subscriber fell behind and this many messages were dropped.
    Lagged(u64),
    Closed,
}

/// Receives changes from the bus; dropping it releases the subscription.
pub struct ChangeSubscriber {
    receiver: broadcast::Receiver<ChangeMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl ChangeSubscriber {
    /// Cancel safe.
    pub async fn recv(&mut self) -> Result<ChangeMessage, ReceiveError> {
        match self.receiver.recv().await {
            Ok(msg) => Ok(msg),
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!(missed = count, "Change subscriber lagged");
                Err(ReceiveError::Lagged(count))
            }
            Err(broadcast::error::RecvError::Closed) => Err(ReceiveError::Closed),
        }
    }
}

impl Drop for ChangeSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        info!(remaining = prev.saturating_sub(1), "Change subscriber released");
    }
}

/// Shared change bus type
pub type SharedChangeBus = Arc<ChangeBus>;

pub fn create_change_bus() -> SharedChangeBus {
    Arc::new(ChangeBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::ChangeOp;
    use uuid::Uuid;

    #[tokio::test]
    async fn subscriber_receives_published_change() {
        let bus = ChangeBus::new();
        let mut sub = bus.subscribe();
        let user = Uuid::new_v4();
        bus.publish(ChangeEvent::user(ChangeOp::Insert, user));

        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.row_id, user);
    }

    #[tokio::test]
    async fn dropping_subscriber_releases_it() {
        let bus = ChangeBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(a);
        assert_eq!(bus.subscriber_count(), 1);
        drop(b);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn overflow_reports_lag() {
        let bus = ChangeBus::with_capacity(2);
        let mut sub = bus.subscribe();
        for _ in 0..5 {
            bus.publish(ChangeEvent::user(ChangeOp::Update, Uuid::new_v4()));
        }
        assert!(matches!(sub.recv().await, Err(ReceiveError::Lagged(_))));
        assert!(sub.recv().await.is_ok());
    }
}
