//! RSS/Atom polling trigger with a persisted watermark.
//!
//! Each poll fetches the feed, keeps the items published at or after the
//! watermark, then moves the watermark to the poll time. The watermark moves
//! even when nothing matched, so an item is only ever considered by the poll
//! that first sees it inside the window. It does not move when the fetch
//! fails.

use crate::config::{HttpConfig, RssTriggerConfig};
use crate::error::{Error, Result};
use crate::static_data::StaticDataStore;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Static data key holding the last poll time (RFC 3339)
pub const WATERMARK_KEY: &str = "lastTimeChecked";

/// Represents an item from an RSS or Atom feed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Item title
    pub title: String,

    /// Item link/URL
    pub link: Option<String>,

    /// Unique identifier (GUID for RSS, id for Atom)
    pub guid: String,

    /// Publication date
    pub iso_date: Option<DateTime<Utc>>,

    /// Item description
    pub description: Option<String>,

    /// Enclosure URL (torrent, magnet, media file)
    pub enclosure_url: Option<String>,
}

impl FeedItem {
    /// Link best suited for an offline download task: the enclosure if the
    /// item has one, otherwise the item link
    pub fn download_link(&self) -> Option<&str> {
        self.enclosure_url.as_deref().or(self.link.as_deref())
    }
}

/// Result of one poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollOutcome {
    /// Items inside the window, in feed order
    pub items: Vec<FeedItem>,
    /// Watermark for the next poll
    pub watermark: DateTime<Utc>,
}

/// Parse a feed document, trying RSS first, then Atom
pub fn parse_feed(content: &str) -> Result<Vec<FeedItem>> {
    match parse_as_rss(content) {
        Ok(items) => {
            debug!("Successfully parsed as RSS, found {} items", items.len());
            Ok(items)
        }
        Err(rss_err) => {
            debug!("Failed to parse as RSS: {}, trying Atom", rss_err);
            match parse_as_atom(content) {
                Ok(items) => {
                    debug!("Successfully parsed as Atom, found {} items", items.len());
                    Ok(items)
                }
                Err(atom_err) => Err(Error::Feed(format!(
                    "Failed to parse feed as RSS or Atom. RSS error: {}. Atom error: {}",
                    rss_err, atom_err
                ))),
            }
        }
    }
}

/// Keep items published at or after `start`; undated items never qualify
pub fn items_since(items: Vec<FeedItem>, start: DateTime<Utc>) -> Vec<FeedItem> {
    items
        .into_iter()
        .filter(|item| item.iso_date.is_some_and(|date| date >= start))
        .collect()
}

/// Watermark as stored: UTC, whole seconds, `Z` suffix
pub fn format_watermark(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse feed content as RSS
fn parse_as_rss(content: &str) -> Result<Vec<FeedItem>> {
    let channel = content
        .parse::<rss::Channel>()
        .map_err(|e| Error::Feed(format!("RSS parse error: {}", e)))?;

    let items = channel
        .items()
        .iter()
        .map(|item| {
            // Prefer guid, fall back to link, then title
            let guid = item
                .guid()
                .map(|g| g.value().to_string())
                .or_else(|| item.link().map(|l| l.to_string()))
                .unwrap_or_else(|| item.title().unwrap_or("").to_string());

            FeedItem {
                title: item.title().unwrap_or("").to_string(),
                link: item.link().map(|l| l.to_string()),
                guid,
                iso_date: rss_item_date(item),
                description: item.description().map(|d| d.to_string()),
                enclosure_url: item.enclosure().map(|enc| enc.url().to_string()),
            }
        })
        .collect();

    Ok(items)
}

/// Parse feed content as Atom
fn parse_as_atom(content: &str) -> Result<Vec<FeedItem>> {
    let feed = atom_syndication::Feed::read_from(content.as_bytes())
        .map_err(|e| Error::Feed(format!("Atom parse error: {}", e)))?;

    let items = feed
        .entries()
        .iter()
        .map(|entry| {
            // Prefer published, fall back to updated
            let iso_date = entry
                .published()
                .or_else(|| Some(entry.updated()))
                .and_then(|dt| parse_date(&dt.to_rfc3339()));

            let enclosure_url = entry
                .links()
                .iter()
                .find(|link| link.rel() == "enclosure")
                .map(|link| link.href().to_string());

            let link = entry
                .links()
                .iter()
                .find(|link| link.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|link| link.href().to_string());

            let description = entry.summary().map(|s| s.as_str().to_string()).or_else(|| {
                entry
                    .content()
                    .and_then(|c| c.value().map(|v| v.to_string()))
            });

            FeedItem {
                title: entry.title().as_str().to_string(),
                link,
                guid: entry.id().to_string(),
                iso_date,
                description,
                enclosure_url,
            }
        })
        .collect();

    Ok(items)
}

/// `pubDate`, then any Dublin Core `dc:date`; the first that parses wins
fn rss_item_date(item: &rss::Item) -> Option<DateTime<Utc>> {
    let dc_dates = item
        .dublin_core_ext()
        .map(|dc| dc.dates())
        .unwrap_or_default();

    item.pub_date()
        .into_iter()
        .chain(dc_dates.iter().map(String::as_str))
        .find_map(parse_date)
}

/// RFC 2822 (RSS pubDate), RFC 3339 (Atom, dc:date), or a bare
/// `YYYY-MM-DD[THH:MM:SS]` read as UTC
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        });

    if parsed.is_none() {
        debug!(raw, "Unparsable feed item date");
    }
    parsed
}

/// Polls one feed on behalf of one trigger node
pub struct RssTrigger {
    /// HTTP client for fetching feeds
    http_client: reqwest::Client,

    /// Trigger settings
    config: RssTriggerConfig,
}

impl RssTrigger {
    /// Create a trigger with its own HTTP client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: RssTriggerConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self::with_client(http.build_client()?, config))
    }

    /// Create a trigger sharing an existing HTTP client
    pub fn with_client(http_client: reqwest::Client, config: RssTriggerConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Trigger settings
    pub fn config(&self) -> &RssTriggerConfig {
        &self.config
    }

    /// Fetch and parse the feed
    ///
    /// # Errors
    /// - [`Error::Config`] if the feed URL is empty
    /// - [`Error::FeedUnreachable`] if the host cannot be connected to
    /// - [`Error::Feed`] on HTTP status or parse failures
    pub async fn fetch(&self) -> Result<Vec<FeedItem>> {
        let url = self.config.feed_url.trim();
        if url.is_empty() {
            return Err(Error::config(
                "triggers.feed_url",
                "The parameter \"URL\" has to be set!",
            ));
        }

        debug!(node = %self.config.node_id, url, "Fetching feed");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_connect() {
                Error::FeedUnreachable {
                    url: url.to_string(),
                }
            } else {
                Error::Feed(format!("Failed to fetch feed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Feed(format!(
                "feed returned HTTP {}: {}",
                status.as_u16(),
                url
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| Error::Feed(format!("Failed to read feed content: {}", e)))?;

        parse_feed(&content)
    }

    /// Fetch, keep items at or after `start`, and report `now` as the next
    /// watermark
    pub async fn poll_since(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> Result<PollOutcome> {
        let items = items_since(self.fetch().await?, start);
        Ok(PollOutcome {
            items,
            watermark: now,
        })
    }

    /// One poll against a persisted watermark
    ///
    /// Reads the watermark for this node from `store` (falling back to the
    /// configured start date), polls, and writes `now` back. Returns `None`
    /// when no item qualified.
    pub async fn poll(
        &self,
        store: &dyn StaticDataStore,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<FeedItem>>> {
        let node_id = &self.config.node_id;
        let start = self.load_watermark(store).await?;

        let outcome = self.poll_since(start, now).await?;
        store
            .set(node_id, WATERMARK_KEY, &format_watermark(outcome.watermark))
            .await?;

        if outcome.items.is_empty() {
            debug!(node = %node_id, since = %start, "No new feed items");
            return Ok(None);
        }

        info!(
            node = %node_id,
            since = %start,
            count = outcome.items.len(),
            "New feed items"
        );
        Ok(Some(outcome.items))
    }

    async fn load_watermark(&self, store: &dyn StaticDataStore) -> Result<DateTime<Utc>> {
        let stored = store.get(&self.config.node_id, WATERMARK_KEY).await?;
        let Some(raw) = stored else {
            return Ok(self.config.start_date);
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Ok(dt.with_timezone(&Utc)),
            Err(e) => {
                warn!(
                    node = %self.config.node_id,
                    stored = %raw,
                    error = %e,
                    "Unparsable watermark, using configured start date"
                );
                Ok(self.config.start_date)
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
