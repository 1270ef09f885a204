//! # Dispatcher
//!
//! Single consumer of prepared notifications. Two filters run before a
//! token is spent:
//!
//! - **Value tiers**: as the token bucket drains, a rising minimum USD
//!   value is required to publish.
//! - **Lag mode**: once a notification is older than the lag threshold,
//!   only notifications above a high USD floor get through, until the lag
//!   falls back under one replenishment interval.
//!
//! Survivors wait for a token and go to the publisher. A posting-limit
//! failure pauses the dispatcher for a cooldown.

use crate::application::services::score_keeper::PreparedNotification;
use crate::config::{DispatcherConfig, ValueTier};
use crate::infrastructure::publisher::Publisher;
use crate::infrastructure::rate_limit::TokenBucket;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchOutcome {
    /// Handed to the publisher successfully.
    Published,
    /// Below the minimum USD value for the current token level.
    DroppedBelowMinimum {
        /// Minimum that applied.
        min_usd: f64,
    },
    /// Dropped in lag mode.
    DroppedLag,
    /// The publisher failed.
    PublishFailed,
}

impl DispatchOutcome {
    /// Returns true if the notification was published.
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }

    /// Returns true if a filter dropped the notification.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::DroppedBelowMinimum { .. } | Self::DroppedLag)
    }
}

/// Rate-limited publishing stage.
pub struct Dispatcher {
    bucket: Arc<dyn TokenBucket>,
    publisher: Arc<dyn Publisher>,
    tiers: Vec<ValueTier>,
    lag_threshold: Duration,
    lag_exit: Duration,
    lag_mode_min_usd: f64,
    cooldown: Duration,
    lag_mode: bool,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("bucket", &self.bucket)
            .field("publisher", &self.publisher)
            .field("tiers", &self.tiers)
            .field("lag_mode", &self.lag_mode)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        bucket: Arc<dyn TokenBucket>,
        publisher: Arc<dyn Publisher>,
        config: &DispatcherConfig,
    ) -> Self {
        Self {
            bucket,
            publisher,
            tiers: config.value_tiers.clone(),
            lag_threshold: config.lag_threshold(),
            lag_exit: config.replenish_interval(),
            lag_mode_min_usd: config.lag_mode_min_usd,
            cooldown: config.posting_limit_cooldown(),
            lag_mode: false,
        }
    }

    /// Returns true while lag mode is active.
    #[must_use]
    pub fn is_lag_mode(&self) -> bool {
        self.lag_mode
    }

    /// Minimum USD value publishable with `available` tokens left.
    ///
    /// The strictest tier whose level is above `available` applies; with
    /// no such tier everything is publishable.
    #[must_use]
    pub fn minimum_usd(&self, available: u32) -> f64 {
        self.tiers
            .iter()
            .filter(|tier| available < tier.below_burst)
            .map(|tier| tier.min_usd)
            .fold(0.0, f64::max)
    }

    fn update_lag_mode(&mut self, lag: Duration) {
        if lag > self.lag_threshold {
            if !self.lag_mode {
                warn!(lag_secs = lag.as_secs(), "lag mode enabled");
            }
            self.lag_mode = true;
        } else if lag < self.lag_exit {
            if self.lag_mode {
                info!(lag_secs = lag.as_secs(), "lag mode disabled");
            }
            self.lag_mode = false;
        }
    }

    /// Handles `notification` as of now.
    pub async fn handle(&mut self, notification: PreparedNotification) -> DispatchOutcome {
        self.handle_at(notification, Instant::now()).await
    }

    /// Handles `notification`, measuring its lag at `now`.
    pub async fn handle_at(
        &mut self,
        notification: PreparedNotification,
        now: Instant,
    ) -> DispatchOutcome {
        let lag = now.saturating_duration_since(notification.created_at);
        self.update_lag_mode(lag);

        if self.lag_mode && notification.usd_value < self.lag_mode_min_usd {
            info!(
                usd_value = notification.usd_value,
                lag_secs = lag.as_secs(),
                text = %notification.text,
                "dropped in lag mode"
            );
            return DispatchOutcome::DroppedLag;
        }

        let available = self.bucket.available();
        let min_usd = self.minimum_usd(available);
        if notification.usd_value < min_usd {
            info!(
                usd_value = notification.usd_value,
                min_usd,
                available,
                text = %notification.text,
                "dropped below minimum value"
            );
            return DispatchOutcome::DroppedBelowMinimum { min_usd };
        }

        self.bucket.acquire().await;

        match self.publisher.publish(&notification.text).await {
            Ok(()) => {
                info!(lag_secs = lag.as_secs(), text = %notification.text, "published");
                DispatchOutcome::Published
            }
            Err(error) => {
                warn!(%error, text = %notification.text, "failed to publish");
                if error.is_posting_limit() {
                    warn!(
                        cooldown_secs = self.cooldown.as_secs(),
                        "posting limit reached, pausing"
                    );
                    sleep(self.cooldown).await;
                }
                DispatchOutcome::PublishFailed
            }
        }
    }

    /// Drains `notifications` until the queue is closed and empty.
    pub async fn run(mut self, mut notifications: mpsc::Receiver<PreparedNotification>) {
        while let Some(notification) = notifications.recv().await {
            self.handle(notification).await;
        }
        info!("dispatcher drained");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::publisher::{PublishError, RecordingPublisher};
    use crate::infrastructure::rate_limit::ManualTokenBucket;

    struct Harness {
        dispatcher: Dispatcher,
        bucket: Arc<ManualTokenBucket>,
        publisher: RecordingPublisher,
    }

    fn harness(available: u32) -> Harness {
        let bucket = Arc::new(ManualTokenBucket::new(available));
        let publisher = RecordingPublisher::new();
        let dispatcher = Dispatcher::new(
            bucket.clone(),
            Arc::new(publisher.clone()),
            &DispatcherConfig::default(),
        );
        Harness {
            dispatcher,
            bucket,
            publisher,
        }
    }

    fn notification(usd_value: f64, created_at: Instant) -> PreparedNotification {
        PreparedNotification {
            text: format!("worth {usd_value}"),
            created_at,
            usd_value,
        }
    }

    mod tiers {
        use super::*;

        #[test]
        fn minimum_rises_as_bucket_drains() {
            let h = harness(300);
            assert_eq!(h.dispatcher.minimum_usd(300), 0.0);
            assert_eq!(h.dispatcher.minimum_usd(150), 0.0);
            assert_eq!(h.dispatcher.minimum_usd(149), 100_000.0);
            assert_eq!(h.dispatcher.minimum_usd(49), 1_000_000.0);
            assert_eq!(h.dispatcher.minimum_usd(9), 5_000_000.0);
            assert_eq!(h.dispatcher.minimum_usd(0), 5_000_000.0);
        }

        #[tokio::test]
        async fn drops_below_minimum_without_spending_a_token() {
            let mut h = harness(5);
            let now = Instant::now();

            let outcome = h.dispatcher.handle_at(notification(1_000_000.0, now), now).await;
            assert_eq!(
                outcome,
                DispatchOutcome::DroppedBelowMinimum { min_usd: 5_000_000.0 }
            );
            assert_eq!(h.bucket.acquired(), 0);
            assert!(h.publisher.is_empty());
        }

        #[tokio::test]
        async fn replenishment_lowers_the_bar() {
            let mut h = harness(5);
            let now = Instant::now();
            assert!(
                h.dispatcher
                    .handle_at(notification(200_000.0, now), now)
                    .await
                    .is_dropped()
            );

            h.bucket.set_available(100);
            assert!(
                h.dispatcher
                    .handle_at(notification(200_000.0, now), now)
                    .await
                    .is_published()
            );

            h.bucket.set_available(300);
            assert!(
                h.dispatcher
                    .handle_at(notification(10.0, now), now)
                    .await
                    .is_published()
            );
            assert_eq!(h.publisher.len(), 2);
            assert_eq!(h.bucket.acquired(), 2);
        }
    }

    mod lag {
        use super::*;

        #[tokio::test]
        async fn stale_notifications_enter_lag_mode() {
            let mut h = harness(300);
            let created = Instant::now();
            let late = created + Duration::from_secs(181);

            let outcome = h.dispatcher.handle_at(notification(999_999.0, created), late).await;
            assert_eq!(outcome, DispatchOutcome::DroppedLag);
            assert!(h.dispatcher.is_lag_mode());

            let outcome = h
                .dispatcher
                .handle_at(notification(1_000_000.0, created), late)
                .await;
            assert!(outcome.is_published());
        }

        #[tokio::test]
        async fn lag_mode_persists_until_caught_up() {
            let mut h = harness(300);
            let created = Instant::now();
            h.dispatcher
                .handle_at(notification(10.0, created), created + Duration::from_secs(200))
                .await;

            // Between the exit interval and the threshold: still lagging.
            let outcome = h
                .dispatcher
                .handle_at(notification(10.0, created), created + Duration::from_secs(60))
                .await;
            assert_eq!(outcome, DispatchOutcome::DroppedLag);

            let outcome = h
                .dispatcher
                .handle_at(notification(10.0, created), created + Duration::from_secs(35))
                .await;
            assert!(outcome.is_published());
            assert!(!h.dispatcher.is_lag_mode());
        }
    }

    mod publishing {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn posting_limit_pauses_dispatcher() {
            let mut h = harness(300);
            h.publisher
                .fail_next(PublishError::posting_limit_exceeded("daily status update limit"));

            let start = Instant::now();
            let outcome = h.dispatcher.handle(notification(10.0, start)).await;

            assert_eq!(outcome, DispatchOutcome::PublishFailed);
            assert!(start.elapsed() >= Duration::from_secs(180));
        }

        #[tokio::test(start_paused = true)]
        async fn other_failures_do_not_pause() {
            let mut h = harness(300);
            h.publisher.fail_next(PublishError::authentication("bad token"));

            let start = Instant::now();
            let outcome = h.dispatcher.handle(notification(10.0, start)).await;

            assert_eq!(outcome, DispatchOutcome::PublishFailed);
            assert!(start.elapsed() < Duration::from_secs(1));
        }

        #[tokio::test]
        async fn run_drains_queue() {
            let h = harness(300);
            let (tx, rx) = mpsc::channel(8);
            for usd in [1.0, 2.0, 3.0] {
                tx.send(notification(usd, Instant::now())).await.unwrap();
            }
            drop(tx);

            h.dispatcher.run(rx).await;
            assert_eq!(
                h.publisher.published(),
                vec!["worth 1", "worth 2", "worth 3"]
            );
        }
    }
}
