//! Add link tasks example
//!
//! This example demonstrates the offline-download workflow:
//! - Loading 115 session cookies from the environment
//! - Checking the session before doing any work
//! - Submitting links grouped by destination path
//!
//! Usage:
//!   DRIVE115_CID=... DRIVE115_SEID=... DRIVE115_UID=... \
//!     cargo run --example add_link_tasks -- "/Downloads/Linux" "magnet:?xt=urn:btih:..."

use drive115_dl::config::Config;
use drive115_dl::{DriveClient, DriveCredentials, WorkItem};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let credentials = DriveCredentials::new(
        std::env::var("DRIVE115_CID")?,
        std::env::var("DRIVE115_SEID")?,
        std::env::var("DRIVE115_UID")?,
    );

    // Arguments: <path> <link> [<path> <link> ...]
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.len() % 2 != 0 {
        eprintln!("usage: add_link_tasks <path> <link> [<path> <link> ...]");
        std::process::exit(2);
    }
    let items: Vec<WorkItem> = args
        .chunks(2)
        .map(|pair| WorkItem::new(pair[0].as_str(), pair[1].as_str()))
        .collect();

    let mut config = Config::default();
    config.credentials.drive = Some(credentials.clone());

    // Fail fast on an expired session
    let client = config.http.build_client()?;
    credentials.test(&client, &config.drive.endpoints).await?;
    println!("✓ Session accepted");

    let drive = DriveClient::from_config(&config)?;
    let results = drive.execute("addLinkTasks", &items).await?;

    // Results are grouped by destination path, not in argument order
    for result in &results {
        println!("✓ Queued {}", result.info_hash);
    }
    println!("Submitted {} task(s)", results.len());

    Ok(())
}
