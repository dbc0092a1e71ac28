//! Watched subscriptions
//!
//! A view that shows location or booking state needs to refresh when a
//! matching row changes, and also when nothing has been heard for a while
//! (missed events, dead channel). `WatchedSubscription` yields both kinds
//! of refresh from one stream, so the two sources never race.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::events::{ChangeBus, ChangeFilter, ChangeMessage, ChangeSubscriber, ReceiveError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Why the view should refresh
#[derive(Debug, Clone)]
pub enum SyncTrigger {
    /// A matching row changed.
    Changed(ChangeMessage),
    /// Nothing matching arrived within the poll interval, or events were lost.
    Stale,
}

pub struct WatchedSubscription {
    subscriber: ChangeSubscriber,
    filter: ChangeFilter,
    poll_interval: Duration,
    deadline: Instant,
}

impl WatchedSubscription {
    pub fn new(bus: &ChangeBus, filter: ChangeFilter, poll_interval: Duration) -> Self {
        Self {
            subscriber: bus.subscribe(),
            filter,
            poll_interval,
            deadline: Instant::now() + poll_interval,
        }
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    fn reset_watchdog(&mut self) {
        self.deadline = Instant::now() + self.poll_interval;
    }

    /// Next refresh trigger. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<SyncTrigger> {
        loop {
            tokio::select! {
                received = self.subscriber.recv() => match received {
                    Ok(msg) if self.filter.matches(&msg.event) => {
                        self.reset_watchdog();
                        return Some(SyncTrigger::Changed(msg));
                    }
                    Ok(_) => continue,
                    Err(ReceiveError::Lagged(missed)) => {
                        debug!(missed, "Watched subscription lagged, forcing refresh");
                        self.reset_watchdog();
                        return Some(SyncTrigger::Stale);
                    }
                    Err(ReceiveError::Closed) => return None,
                },
                _ = tokio::time::sleep_until(self.deadline) => {
                    self.reset_watchdog();
                    return Some(SyncTrigger::Stale);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{ChangeEvent, ChangeOp, Table};
    use uuid::Uuid;

    fn booking_at(location_id: Uuid) -> ChangeEvent {
        ChangeEvent {
            table: Table::Bookings,
            op: ChangeOp::Insert,
            row_id: Uuid::new_v4(),
            location_id: Some(location_id),
            owner_id: None,
            user_id: None,
            record: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn matching_event_triggers_change() {
        let bus = ChangeBus::new();
        let loc = Uuid::new_v4();
        let mut watch = WatchedSubscription::new(
            &bus,
            ChangeFilter::table(Table::Bookings).with_location(loc),
            Duration::from_secs(5),
        );

        bus.publish(booking_at(Uuid::new_v4()));
        bus.publish(booking_at(loc));

        match watch.next().await {
            Some(SyncTrigger::Changed(msg)) => assert_eq!(msg.event.location_id, Some(loc)),
            other => panic!("expected change, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silence_triggers_stale() {
        let bus = ChangeBus::new();
        let mut watch =
            WatchedSubscription::new(&bus, ChangeFilter::default(), Duration::from_millis(30));
        let trigger = tokio::time::timeout(Duration::from_secs(2), watch.next())
            .await
            .expect("watchdog should fire");
        assert!(matches!(trigger, Some(SyncTrigger::Stale)));
    }

    #[tokio::test]
    async fn lag_triggers_stale() {
        let bus = ChangeBus::with_capacity(1);
        let mut watch =
            WatchedSubscription::new(&bus, ChangeFilter::default(), Duration::from_secs(5));
        for _ in 0..4 {
            bus.publish(booking_at(Uuid::new_v4()));
        }
        assert!(matches!(watch.next().await, Some(SyncTrigger::Stale)));
    }

    #[tokio::test]
    async fn drop_releases_channel() {
        let bus = ChangeBus::new();
        let watch = WatchedSubscription::new(&bus, ChangeFilter::default(), DEFAULT_POLL_INTERVAL);
        assert_eq!(bus.subscriber_count(), 1);
        drop(watch);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
