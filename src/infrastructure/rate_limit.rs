//! # Rate Limiting
//!
//! Token bucket sized to the posting platform's policy: one token is
//! replenished every `replenish_interval`, up to `burst` tokens.
//!
//! The dispatcher needs two things from the bucket: how many tokens are
//! available right now (to decide which notifications are worth a token)
//! and a way to wait for the next one. [`TokenBucket`] is that port;
//! [`GovernorBucket`] implements it with `governor`.

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::StateInformationMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Replenishment interval used when a zero interval is configured.
pub const DEFAULT_REPLENISH_INTERVAL: Duration = Duration::from_secs(36);

/// Token bucket port.
#[async_trait]
pub trait TokenBucket: Send + Sync + fmt::Debug {
    /// Tokens that could be taken right now without waiting.
    fn available(&self) -> u32;

    /// Waits until a token is available and takes it.
    async fn acquire(&self);
}

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, StateInformationMiddleware>;

#[derive(Debug, Clone, Copy)]
struct Observation {
    remaining: u32,
    at: Instant,
}

/// `governor`-backed token bucket.
///
/// `governor` only reports the remaining burst when a token is taken, so
/// availability between acquisitions is estimated from the last report plus
/// the whole intervals elapsed since.
pub struct GovernorBucket {
    limiter: Limiter,
    burst: u32,
    interval: Duration,
    last: Mutex<Observation>,
}

impl GovernorBucket {
    /// Creates a full bucket.
    ///
    /// A zero `burst` is raised to one; a zero interval falls back to
    /// [`DEFAULT_REPLENISH_INTERVAL`].
    #[must_use]
    pub fn new(replenish_interval: Duration, burst: u32) -> Self {
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let interval = if replenish_interval.is_zero() {
            DEFAULT_REPLENISH_INTERVAL
        } else {
            replenish_interval
        };
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: RateLimiter::direct(quota).with_middleware::<StateInformationMiddleware>(),
            burst: burst.get(),
            interval,
            last: Mutex::new(Observation {
                remaining: burst.get(),
                at: Instant::now(),
            }),
        }
    }

    /// Maximum number of tokens.
    #[must_use]
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Time to replenish one token.
    #[must_use]
    pub fn replenish_interval(&self) -> Duration {
        self.interval
    }

    fn estimate(&self, now: Instant) -> u32 {
        let last = *self.last.lock();
        let elapsed = now.saturating_duration_since(last.at);
        let replenished = elapsed.as_nanos() / self.interval.as_nanos().max(1);
        let replenished = u32::try_from(replenished).unwrap_or(u32::MAX);
        last.remaining.saturating_add(replenished).min(self.burst)
    }
}

impl fmt::Debug for GovernorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GovernorBucket")
            .field("burst", &self.burst)
            .field("interval", &self.interval)
            .field("available", &self.available())
            .finish()
    }
}

#[async_trait]
impl TokenBucket for GovernorBucket {
    fn available(&self) -> u32 {
        self.estimate(Instant::now())
    }

    async fn acquire(&self) {
        let snapshot = self.limiter.until_ready().await;
        let remaining = snapshot.remaining_burst_capacity();
        debug!(remaining, "token acquired");
        *self.last.lock() = Observation {
            remaining,
            at: Instant::now(),
        };
    }
}

/// Token bucket whose level is set by hand.
///
/// Never waits: `acquire` takes a token if one is left and counts the call
/// either way. Used to drive the dispatcher deterministically.
#[derive(Debug, Default)]
pub struct ManualTokenBucket {
    available: AtomicU32,
    acquired: AtomicUsize,
}

impl ManualTokenBucket {
    /// Creates a bucket holding `available` tokens.
    #[must_use]
    pub fn new(available: u32) -> Self {
        Self {
            available: AtomicU32::new(available),
            acquired: AtomicUsize::new(0),
        }
    }

    /// Sets the token level, simulating replenishment or drain.
    pub fn set_available(&self, available: u32) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of completed `acquire` calls.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenBucket for ManualTokenBucket {
    fn available(&self) -> u32 {
        self.available.load(Ordering::SeqCst)
    }

    async fn acquire(&self) {
        let _ = self
            .available
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }
}
