//! RSS to drive example
//!
//! Polls a feed with a SQLite-backed watermark and queues each new item's
//! enclosure (or link) as a 115 offline task under a fixed folder.
//!
//! Usage:
//!   DRIVE115_CID=... DRIVE115_SEID=... DRIVE115_UID=... \
//!     cargo run --example rss_to_drive -- https://example.com/feed.xml /RSS

use drive115_dl::config::{Config, RssTriggerConfig};
use drive115_dl::{
    Database, DriveClient, DriveCredentials, RssTrigger, TriggerScheduler, WorkItem,
    run_with_shutdown,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let feed_url = args.next().ok_or("missing feed URL")?;
    let destination = args.next().unwrap_or_else(|| "/RSS".to_string());

    let mut trigger_config = RssTriggerConfig::new("rss-example", feed_url);
    trigger_config.poll_interval = Duration::from_secs(300);

    let mut config = Config::default();
    config.credentials.drive = Some(DriveCredentials::new(
        std::env::var("DRIVE115_CID")?,
        std::env::var("DRIVE115_SEID")?,
        std::env::var("DRIVE115_UID")?,
    ));
    config.triggers.push(trigger_config.clone());
    config.validate()?;

    let db = Database::new(&config.persistence.database_path).await?;
    let drive = DriveClient::from_config(&config)?;
    let trigger = RssTrigger::new(trigger_config, &config.http)?;

    let (tx, mut rx) = mpsc::channel(16);
    let scheduler = TriggerScheduler::new(vec![trigger], Arc::new(db), tx);

    // Forward batches to the drive until the scheduler stops
    let forwarder = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            let items: Vec<WorkItem> = batch
                .items
                .iter()
                .filter_map(|item| item.download_link())
                .map(|link| WorkItem::new(destination.as_str(), link))
                .collect();

            println!("{}: {} new item(s)", batch.node_id, items.len());
            match drive.dispatch(&items).await {
                Ok(results) => {
                    for result in results {
                        println!("  ✓ Queued {}", result.info_hash);
                    }
                }
                Err(e) => eprintln!("  ✗ Failed to queue batch: {}", e),
            }
        }
    });

    println!("Polling every 5 minutes, Ctrl+C to stop");
    run_with_shutdown(scheduler).await;
    forwarder.await?;

    Ok(())
}
