//! # drive115-dl
//!
//! Building blocks for workflow hosts that talk to the 115 cloud drive.
//!
//! ## What's inside
//!
//! - **Offline link tasks** - resolve (and create) destination directories by
//!   path, then submit magnet/HTTP links as offline download tasks
//! - **RSS trigger** - poll RSS/Atom feeds against a persisted watermark and
//!   emit only items published since the previous poll
//! - **OpenAI-compatible proxy** - forward chat and image requests, return the
//!   provider's JSON as-is
//! - **Static data** - per-node key/value state in memory or SQLite
//!
//! The library installs no tracing subscriber; hosts choose their own.
//!
//! ## Quick Start
//!
//! ```no_run
//! use drive115_dl::{Config, DriveClient, DriveCredentials, WorkItem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.credentials.drive = Some(DriveCredentials::new("cid", "seid", "uid"));
//!
//!     let drive = DriveClient::from_config(&config)?;
//!     let results = drive
//!         .execute(
//!             "addLinkTasks",
//!             &[WorkItem::new("/Movies/2024", "magnet:?xt=urn:btih:...")],
//!         )
//!         .await?;
//!
//!     for result in results {
//!         println!("queued {}", result.info_hash);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Credentials and request authentication
pub mod credentials;
/// SQLite persistence for static data
pub mod db;
/// 115 drive operations
pub mod drive;
/// Error types
pub mod error;
/// Authenticated request primitive
pub mod http;
/// OpenAI-compatible API client
pub mod openai;
/// RSS trigger scheduler
pub mod rss_scheduler;
/// RSS/Atom trigger
pub mod rss_trigger;
/// Per-node key/value storage
pub mod static_data;

// Re-export commonly used types
pub use config::{Config, DriveConfig, DriveEndpoints, HttpConfig, RssTriggerConfig};
pub use credentials::{Authenticate, DriveCredentials, OpenAiCredentials};
pub use db::Database;
pub use drive::{DirectoryEntry, DriveClient, Operation, PathGroups, TaskResult, WorkItem};
pub use error::{DatabaseError, Error, Result};
pub use http::{ApiRequest, AuthenticatedCall, HttpCaller, HttpMethod};
pub use openai::{ChatMessage, ChatRequest, ImageRequest, OpenAiClient, Resource};
pub use rss_scheduler::{TriggerBatch, TriggerScheduler};
pub use rss_trigger::{FeedItem, PollOutcome, RssTrigger};
pub use static_data::{MemoryStore, StaticDataStore};

use tokio_util::sync::CancellationToken;

/// Run a trigger scheduler until a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use drive115_dl::{HttpConfig, MemoryStore, RssTrigger, RssTriggerConfig, TriggerScheduler};
/// use drive115_dl::run_with_shutdown;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let trigger = RssTrigger::new(
///         RssTriggerConfig::new("rss-1", "https://example.com/feed.xml"),
///         &HttpConfig::default(),
///     )?;
///     let (tx, _rx) = tokio::sync::mpsc::channel(16);
///     let scheduler = TriggerScheduler::new(vec![trigger], Arc::new(MemoryStore::new()), tx);
///
///     run_with_shutdown(scheduler).await;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(scheduler: TriggerScheduler) {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    let watcher = tokio::spawn(async move {
        wait_for_signal().await;
        signal_token.cancel();
    });

    scheduler.run(shutdown).await;
    watcher.abort();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
