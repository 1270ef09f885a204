//! # Runtime
//!
//! Wires the pipeline from an [`AppConfig`] and supervises its three
//! long-running tasks.
//!
//! ```text
//! run_feed ──▶ Orchestrator ──▶ Dispatcher
//! ```
//!
//! # Shutdown Order
//!
//! The feed is aborted first. That drops the liquidation queue, so the
//! orchestrator flushes every aggregator and exits, which in turn closes
//! the notification queue and lets the dispatcher drain.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::{Dispatcher, Orchestrator, ScoreKeeper};
use crate::config::AppConfig;
use crate::infrastructure::assets::load_deck;
use crate::infrastructure::feed::run_feed;
use crate::infrastructure::persistence::{HighScoreRepository, JsonFileHighScoreRepository};
use crate::infrastructure::publisher::{DryRunPublisher, HttpPublisher, Publisher};
use crate::infrastructure::rate_limit::{GovernorBucket, TokenBucket};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The running pipeline.
#[derive(Debug)]
pub struct Herald {
    feed: JoinHandle<()>,
    orchestrator: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Herald {
    /// Validates `config`, loads the decks and stored high scores, and
    /// spawns the pipeline tasks.
    ///
    /// # Errors
    ///
    /// - `ApplicationError::Config` if the configuration is invalid
    /// - `ApplicationError::Asset` if a text deck cannot be read
    /// - `ApplicationError::Repository` if the stored high scores cannot
    ///   be read
    /// - `ApplicationError::Publish` if the HTTP client cannot be built
    pub async fn start(config: &AppConfig) -> ApplicationResult<Self> {
        config.validate()?;

        let commentary = load_deck(&config.state.commentary_path).await?;
        let streak_labels = load_deck(&config.state.streaks_path).await?;

        let repository: Arc<dyn HighScoreRepository> = Arc::new(
            JsonFileHighScoreRepository::new(config.state.high_scores_path.clone()),
        );
        let keeper = Arc::new(ScoreKeeper::load(repository, commentary, streak_labels).await?);

        let publisher: Arc<dyn Publisher> = if config.publisher.dry_run {
            Arc::new(DryRunPublisher::new())
        } else {
            Arc::new(HttpPublisher::new(
                config.publisher.endpoint.clone(),
                config.publisher.bearer_token.clone(),
                config.publisher.timeout_ms,
            )?)
        };
        let bucket: Arc<dyn TokenBucket> = Arc::new(GovernorBucket::new(
            config.dispatcher.replenish_interval(),
            config.dispatcher.burst,
        ));

        let (notification_tx, notification_rx) = mpsc::channel(config.dispatcher.queue_capacity);
        let (liquidation_tx, liquidation_rx) = mpsc::channel(config.feed.queue_capacity);

        let dispatcher = tokio::spawn(
            Dispatcher::new(bucket, publisher, &config.dispatcher).run(notification_rx),
        );
        let orchestrator = tokio::spawn(
            Orchestrator::new(keeper, notification_tx, config.aggregator.clone())
                .run(liquidation_rx),
        );
        let feed = tokio::spawn(run_feed(config.feed.clone(), liquidation_tx));

        info!(
            feed = %config.feed.url,
            dry_run = config.publisher.dry_run,
            "pipeline started"
        );
        Ok(Self {
            feed,
            orchestrator,
            dispatcher,
        })
    }

    /// Stops the feed and waits for pending announcements to drain.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Internal` if the orchestrator or the
    /// dispatcher panicked.
    pub async fn shutdown(self) -> ApplicationResult<()> {
        self.feed.abort();
        if let Err(error) = self.feed.await {
            if !error.is_cancelled() {
                warn!(%error, "feed task failed");
            }
        }
        self.orchestrator
            .await
            .map_err(|error| ApplicationError::internal(format!("orchestrator: {error}")))?;
        self.dispatcher
            .await
            .map_err(|error| ApplicationError::internal(format!("dispatcher: {error}")))?;
        info!("pipeline stopped");
        Ok(())
    }
}
