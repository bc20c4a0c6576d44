//! Periodic price broadcast feed.
//!
//! One shared loop serves every subscriber: each tick calls the
//! aggregator once, wraps the leading entries in a tagged message, and
//! pushes a copy down every registered channel. Subscribers that cannot
//! accept a message (closed or backlogged) transition to `Closed` and
//! are deregistered without disturbing the rest; an aggregator failure
//! skips the tick and the loop keeps its cadence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::models::MarketEntry;

/// Entries carried per broadcast message.
pub const BROADCAST_TOP_N: usize = 20;

/// Per-subscriber channel depth; a subscriber this far behind is dropped.
pub const FEED_CHANNEL_CAPACITY: usize = 8;

/// Message tag understood by feed consumers.
const MESSAGE_TYPE: &str = "price_update";

/// Lifecycle of one subscriber connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    /// Channel created, not yet registered
    Connecting,
    /// Registered and receiving broadcasts
    Open,
    /// Send failed; deregistered at the end of the tick
    Closed,
}

/// Tagged broadcast message.
#[derive(Clone, Debug, Serialize)]
pub struct PriceUpdate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Vec<MarketEntry>,
}

impl PriceUpdate {
    /// Wrap the first `BROADCAST_TOP_N` entries in a tagged message.
    pub fn new(mut entries: Vec<MarketEntry>) -> Self {
        entries.truncate(BROADCAST_TOP_N);
        Self {
            kind: MESSAGE_TYPE,
            data: entries,
        }
    }
}

/// One registered consumer of the feed.
struct FeedSubscriber {
    id: u64,
    state: ConnectionState,
    sender: mpsc::Sender<PriceUpdate>,
}

/// Shared broadcast loop over the aggregator's markets snapshot.
pub struct PriceFeed {
    aggregator: Arc<Aggregator>,
    subscribers: Mutex<Vec<FeedSubscriber>>,
    next_id: AtomicU64,
    interval: Duration,
}

impl PriceFeed {
    pub fn new(aggregator: Arc<Aggregator>, interval: Duration) -> Self {
        Self {
            aggregator,
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            interval,
        }
    }

    /// Lock the subscriber registry, recovering from poison if necessary.
    /// The registry self-heals: a stale entry fails its next send and is
    /// deregistered then.
    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<FeedSubscriber>> {
        self.subscribers.lock().unwrap_or_else(|poisoned| {
            warn!("Feed subscriber mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Register a new subscriber and hand back its id and receiver. The
    /// subscriber is `Open` once this returns.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<PriceUpdate>) {
        let (sender, receiver) = mpsc::channel(FEED_CHANNEL_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscriber = FeedSubscriber {
            id,
            state: ConnectionState::Connecting,
            sender,
        };

        let mut subscribers = self.lock_subscribers();
        subscriber.state = ConnectionState::Open;
        subscribers.push(subscriber);
        debug!("Feed subscriber {} open ({} active)", id, subscribers.len());

        (id, receiver)
    }

    /// Explicitly disconnect one subscriber.
    pub fn unsubscribe(&self, id: u64) {
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|subscriber| subscriber.id != id);
        debug!(
            "Feed subscriber {} removed ({} active)",
            id,
            subscribers.len()
        );
    }

    /// Currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    /// Run one broadcast: fetch once, push to every subscriber, and
    /// deregister any subscriber whose channel refused the message. An
    /// aggregator failure logs and skips the tick.
    pub async fn broadcast_tick(&self) {
        let entries = match self.aggregator.get_markets().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Feed tick skipped: {}", e);
                return;
            }
        };

        let message = PriceUpdate::new(entries);

        let mut subscribers = self.lock_subscribers();
        for subscriber in subscribers.iter_mut() {
            if subscriber.sender.try_send(message.clone()).is_err() {
                subscriber.state = ConnectionState::Closed;
                debug!("Feed subscriber {} closed", subscriber.id);
            }
        }
        subscribers.retain(|subscriber| subscriber.state == ConnectionState::Open);
    }

    /// Drive the broadcast loop on its own task until aborted. The first
    /// tick fires immediately, then every `interval`.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                self.broadcast_tick().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::provider::{MarketProvider, ProviderCapabilities, Resource};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;

    /// Markets-only provider producing `entry_count` synthetic entries.
    struct FeedMock {
        entry_count: usize,
        fail: AtomicBool,
    }

    impl FeedMock {
        fn new(entry_count: usize) -> Arc<Self> {
            Arc::new(Self {
                entry_count,
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl MarketProvider for FeedMock {
        fn id(&self) -> &'static str {
            "FEED_MOCK"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                resources: &[Resource::Markets],
            }
        }

        fn min_interval(&self) -> Duration {
            Duration::ZERO
        }

        async fn fetch_markets(&self) -> Result<Vec<MarketEntry>, FetchError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::ProviderReported {
                    provider: "FEED_MOCK".to_string(),
                    message: "scripted failure".to_string(),
                });
            }

            Ok((0..self.entry_count)
                .map(|i| MarketEntry {
                    id: format!("coin-{}", i),
                    symbol: format!("C{}", i),
                    name: format!("Coin {}", i),
                    image: String::new(),
                    current_price: 100.0 + i as f64,
                    market_cap: 0.0,
                    total_volume: 0.0,
                    market_cap_rank: Some(i as u32 + 1),
                    price_change_percentage_24h: 0.0,
                    sparkline_7d: Vec::new(),
                })
                .collect())
        }
    }

    fn feed(mock: Arc<FeedMock>) -> PriceFeed {
        let aggregator = Arc::new(Aggregator::new(vec![mock as Arc<dyn MarketProvider>]));
        PriceFeed::new(aggregator, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_tick_delivers_to_every_subscriber() {
        let feed = feed(FeedMock::new(3));
        let (_, mut rx1) = feed.subscribe();
        let (_, mut rx2) = feed.subscribe();

        feed.broadcast_tick().await;

        let m1 = rx1.try_recv().unwrap();
        let m2 = rx2.try_recv().unwrap();
        assert_eq!(m1.kind, "price_update");
        assert_eq!(m1.data.len(), 3);
        assert_eq!(m2.data.len(), 3);
    }

    #[tokio::test]
    async fn test_tick_carries_only_the_leading_entries() {
        let feed = feed(FeedMock::new(25));
        let (_, mut rx) = feed.subscribe();

        feed.broadcast_tick().await;

        let message = rx.try_recv().unwrap();
        assert_eq!(message.data.len(), BROADCAST_TOP_N);
        assert_eq!(message.data[0].id, "coin-0");
        assert_eq!(message.data[19].id, "coin-19");
    }

    #[tokio::test]
    async fn test_dead_subscriber_does_not_disturb_the_rest() {
        let feed = feed(FeedMock::new(3));
        let (_, mut rx1) = feed.subscribe();
        let (_, rx2) = feed.subscribe();
        let (_, mut rx3) = feed.subscribe();

        // Subscriber 2 hangs up
        drop(rx2);
        feed.broadcast_tick().await;

        assert!(rx1.try_recv().is_ok());
        assert!(rx3.try_recv().is_ok());
        assert_eq!(feed.subscriber_count(), 2);

        // The survivors keep receiving on the next tick
        feed.broadcast_tick().await;
        assert!(rx1.try_recv().is_ok());
        assert!(rx3.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_backlogged_subscriber_is_dropped() {
        let feed = feed(FeedMock::new(1));
        let (_, _rx) = feed.subscribe();

        // Fill the channel without draining it
        for _ in 0..FEED_CHANNEL_CAPACITY {
            feed.broadcast_tick().await;
        }
        assert_eq!(feed.subscriber_count(), 1);

        // One more tick overflows the backlog
        feed.broadcast_tick().await;
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_aggregator_failure_skips_the_tick() {
        let mock = FeedMock::new(3);
        let feed = feed(mock.clone());
        let (_, mut rx) = feed.subscribe();

        mock.fail.store(true, Ordering::SeqCst);
        feed.broadcast_tick().await;

        assert!(rx.try_recv().is_err());
        assert_eq!(feed.subscriber_count(), 1);

        // Cadence resumes once the aggregator recovers
        mock.fail.store(false, Ordering::SeqCst);
        feed.broadcast_tick().await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_the_subscriber() {
        let feed = feed(FeedMock::new(1));
        let (id, mut rx) = feed.subscribe();

        feed.unsubscribe(id);
        assert_eq!(feed.subscriber_count(), 0);

        feed.broadcast_tick().await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_message_serialization_shape() {
        let message = PriceUpdate::new(Vec::new());
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "price_update");
        assert!(json["data"].as_array().unwrap().is_empty());
    }
}
