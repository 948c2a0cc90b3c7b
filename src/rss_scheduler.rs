//! Periodic polling of RSS triggers
//!
//! The scheduler owns a set of [`RssTrigger`]s with independent poll
//! intervals. Each tick it polls the triggers whose interval has elapsed and
//! sends every non-empty result downstream as a [`TriggerBatch`].
//!
//! # Example
//!
//! ```no_run
//! use drive115_dl::config::{HttpConfig, RssTriggerConfig};
//! use drive115_dl::rss_scheduler::TriggerScheduler;
//! use drive115_dl::rss_trigger::RssTrigger;
//! use drive115_dl::static_data::MemoryStore;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let trigger = RssTrigger::new(
//!     RssTriggerConfig::new("rss-1", "https://example.com/feed.xml"),
//!     &HttpConfig::default(),
//! )?;
//! let (tx, mut rx) = mpsc::channel(16);
//! let scheduler = TriggerScheduler::new(vec![trigger], Arc::new(MemoryStore::new()), tx);
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(scheduler.run(shutdown.clone()));
//!
//! while let Some(batch) = rx.recv().await {
//!     println!("{}: {} new items", batch.node_id, batch.items.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::rss_trigger::{FeedItem, RssTrigger};
use crate::static_data::StaticDataStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Items emitted by one trigger in one poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerBatch {
    /// Trigger node that produced the items
    pub node_id: String,
    /// New items, in feed order
    pub items: Vec<FeedItem>,
}

/// Polls RSS triggers on their intervals
pub struct TriggerScheduler {
    triggers: Vec<RssTrigger>,

    /// Watermark storage shared by all triggers
    store: Arc<dyn StaticDataStore>,

    output: mpsc::Sender<TriggerBatch>,

    /// How often to look for due triggers
    tick: Duration,
}

impl TriggerScheduler {
    /// Creates a scheduler with a one second tick
    pub fn new(
        triggers: Vec<RssTrigger>,
        store: Arc<dyn StaticDataStore>,
        output: mpsc::Sender<TriggerBatch>,
    ) -> Self {
        Self {
            triggers,
            store,
            output,
            tick: Duration::from_secs(1),
        }
    }

    /// Override the tick between due-checks
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Run until `shutdown` is cancelled or the receiver is dropped
    ///
    /// Disabled triggers are skipped. A trigger is polled on the first tick
    /// and then whenever its `poll_interval` has elapsed since its previous
    /// poll. Poll failures are logged and retried on the next interval.
    /// Cancellation also abandons an in-flight fetch; that trigger's
    /// watermark is left where it was.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(triggers = self.triggers.len(), "RSS scheduler started");

        // Last poll per node id
        let mut last_polls: HashMap<String, Instant> = HashMap::new();

        'outer: loop {
            if shutdown.is_cancelled() {
                break;
            }

            let now = Instant::now();

            for trigger in &self.triggers {
                let config = trigger.config();
                if !config.enabled {
                    continue;
                }

                let due = last_polls
                    .get(&config.node_id)
                    .is_none_or(|last| now.duration_since(*last) >= config.poll_interval);
                if !due {
                    continue;
                }
                last_polls.insert(config.node_id.clone(), now);

                debug!(node = %config.node_id, url = %config.feed_url, "Polling RSS trigger");

                let polled = tokio::select! {
                    _ = shutdown.cancelled() => break 'outer,
                    polled = trigger.poll(self.store.as_ref(), Utc::now()) => polled,
                };

                match polled {
                    Ok(Some(items)) => {
                        let batch = TriggerBatch {
                            node_id: config.node_id.clone(),
                            items,
                        };
                        if self.output.send(batch).await.is_err() {
                            info!("Trigger receiver dropped");
                            break 'outer;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(
                            node = %config.node_id,
                            url = %config.feed_url,
                            error = %e,
                            "Failed to poll RSS trigger"
                        );
                    }
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.tick) => {}
            }
        }

        info!("RSS scheduler stopped");
    }
}
