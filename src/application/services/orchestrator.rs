//! # Orchestrator
//!
//! Demultiplexes the valued liquidation stream by symbol. The first
//! liquidation of a symbol spawns its aggregator task; later ones are
//! queued to it.
//!
//! The registry is bounded two ways:
//!
//! - a symbol with no arrivals for the idle window is retired
//! - past `max_symbols`, the least recently used symbol is retired
//!
//! Retiring a symbol closes its queue. Its aggregator flushes whatever is
//! pending and exits. A later arrival for the same symbol waits for that
//! aggregator to finish before a fresh one is spawned, so one symbol's
//! announcements never overtake each other.
//!
//! # Shutdown
//!
//! When the inbound stream closes, every symbol queue is closed, the
//! aggregators are awaited, and the orchestrator's handle on the
//! notification queue is dropped so the dispatcher can drain and stop.

use crate::application::services::aggregator::run_aggregator;
use crate::application::services::score_keeper::{PreparedNotification, ScoreKeeper};
use crate::config::AggregatorConfig;
use crate::domain::entities::Liquidation;
use crate::domain::value_objects::Symbol;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
struct SymbolHandle {
    sender: mpsc::Sender<Liquidation>,
    last_seen: Instant,
    task: JoinHandle<()>,
}

/// Symbol registry and aggregator supervisor.
#[derive(Debug)]
pub struct Orchestrator {
    keeper: Arc<ScoreKeeper>,
    notifications: mpsc::Sender<PreparedNotification>,
    config: AggregatorConfig,
    symbols: HashMap<Symbol, SymbolHandle>,
    /// Aggregators whose queue is closed but which may still be flushing.
    retiring: HashMap<Symbol, JoinHandle<()>>,
}

impl Orchestrator {
    /// Creates an orchestrator with no live symbols.
    #[must_use]
    pub fn new(
        keeper: Arc<ScoreKeeper>,
        notifications: mpsc::Sender<PreparedNotification>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            keeper,
            notifications,
            config,
            symbols: HashMap::new(),
            retiring: HashMap::new(),
        }
    }

    /// Number of live symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if no symbol is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns true if `symbol` has a live aggregator.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Queues `liquidation` to its symbol's aggregator, spawning one if
    /// needed.
    ///
    /// Waits while the symbol's queue is full, and while a retired
    /// aggregator for the symbol is still flushing.
    pub async fn route(&mut self, liquidation: Liquidation, now: Instant) {
        let symbol = liquidation.symbol.clone();
        let sender = self.sender_for(&symbol, now).await;

        if let Err(mpsc::error::SendError(liquidation)) = sender.send(liquidation).await {
            warn!(%symbol, "aggregator stopped unexpectedly, respawning");
            self.retire(&symbol);
            let sender = self.sender_for(&symbol, now).await;
            if sender.send(liquidation).await.is_err() {
                error!(%symbol, "aggregator unavailable, liquidation lost");
            }
        }
    }

    async fn sender_for(&mut self, symbol: &Symbol, now: Instant) -> mpsc::Sender<Liquidation> {
        if let Some(handle) = self.symbols.get_mut(symbol) {
            handle.last_seen = now;
            return handle.sender.clone();
        }

        while self.symbols.len() >= self.config.max_symbols.max(1) {
            if !self.evict_least_recent() {
                break;
            }
        }

        if let Some(task) = self.retiring.remove(symbol) {
            debug!(%symbol, "waiting for retired aggregator to flush");
            join(symbol, task).await;
        }

        let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
        let task = tokio::spawn(run_aggregator(
            symbol.clone(),
            receiver,
            self.config.flush_interval(),
            Arc::clone(&self.keeper),
            self.notifications.clone(),
        ));
        debug!(%symbol, live = self.symbols.len() + 1, "aggregator spawned");

        self.symbols.insert(
            symbol.clone(),
            SymbolHandle {
                sender: sender.clone(),
                last_seen: now,
                task,
            },
        );
        sender
    }

    /// Closes `symbol`'s queue and keeps its task until it finishes.
    fn retire(&mut self, symbol: &Symbol) {
        if let Some(handle) = self.symbols.remove(symbol) {
            self.retiring.insert(symbol.clone(), handle.task);
        }
    }

    fn evict_least_recent(&mut self) -> bool {
        let Some(symbol) = self
            .symbols
            .iter()
            .min_by_key(|(_, handle)| handle.last_seen)
            .map(|(symbol, _)| symbol.clone())
        else {
            return false;
        };
        self.retire(&symbol);
        info!(%symbol, "symbol limit reached, retired least recently used");
        true
    }

    /// Retires every symbol idle for at least the idle window as of `now`.
    ///
    /// Returns the number of symbols retired.
    pub fn evict_idle(&mut self, now: Instant) -> usize {
        let window = self.config.idle_eviction();
        let idle: Vec<Symbol> = self
            .symbols
            .iter()
            .filter(|(_, handle)| now.saturating_duration_since(handle.last_seen) >= window)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        for symbol in &idle {
            debug!(%symbol, "retiring idle symbol");
            self.retire(symbol);
        }
        idle.len()
    }

    /// Joins retired aggregators that have finished flushing.
    async fn reap_retired(&mut self) {
        let finished: Vec<Symbol> = self
            .retiring
            .iter()
            .filter(|(_, task)| task.is_finished())
            .map(|(symbol, _)| symbol.clone())
            .collect();
        for symbol in finished {
            if let Some(task) = self.retiring.remove(&symbol) {
                join(&symbol, task).await;
            }
        }
    }

    /// Closes every symbol queue and waits for the aggregators to finish.
    pub async fn shutdown(&mut self) {
        let live: Vec<Symbol> = self.symbols.keys().cloned().collect();
        for symbol in &live {
            self.retire(symbol);
        }
        for (symbol, task) in std::mem::take(&mut self.retiring) {
            join(&symbol, task).await;
        }
        info!(symbols = live.len(), "aggregators drained");
    }

    /// Routes `liquidations` until the stream closes, then shuts down.
    pub async fn run(mut self, mut liquidations: mpsc::Receiver<Liquidation>) {
        let sweep_every = self.config.flush_interval();
        let mut sweep = interval_at(Instant::now() + sweep_every, sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = liquidations.recv() => match received {
                    Some(liquidation) => self.route(liquidation, Instant::now()).await,
                    None => break,
                },
                _ = sweep.tick() => {
                    let retired = self.evict_idle(Instant::now());
                    if retired > 0 {
                        info!(retired, live = self.symbols.len(), "idle symbols retired");
                    }
                    self.reap_retired().await;
                }
            }
        }

        info!("liquidation stream closed, shutting down");
        self.shutdown().await;
    }
}

async fn join(symbol: &Symbol, task: JoinHandle<()>) {
    if let Err(error) = task.await {
        error!(%symbol, %error, "aggregator task failed");
    }
}
