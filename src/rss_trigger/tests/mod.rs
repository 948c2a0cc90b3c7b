use super::*;
use crate::static_data::MemoryStore;
use chrono::TimeZone;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WATERMARK_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Releases</title>
        <link>https://example.com</link>
        <description>Test RSS Feed</description>
        <item>
            <title>Old Release</title>
            <link>https://example.com/old</link>
            <guid>old</guid>
            <pubDate>Tue, 31 Dec 2019 12:00:00 +0000</pubDate>
        </item>
        <item>
            <title>New Release</title>
            <link>https://example.com/new</link>
            <guid>new</guid>
            <pubDate>Mon, 01 Jun 2020 08:30:00 +0000</pubDate>
            <enclosure url="magnet:?xt=urn:btih:abc" length="0" type="application/x-bittorrent"/>
        </item>
    </channel>
</rss>"#;

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

fn item(guid: &str, iso_date: Option<DateTime<Utc>>) -> FeedItem {
    FeedItem {
        title: guid.to_string(),
        link: None,
        guid: guid.to_string(),
        iso_date,
        description: None,
        enclosure_url: None,
    }
}

async fn serve_feed(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(&server)
        .await;
    server
}

fn trigger_for(server: &MockServer, node_id: &str) -> RssTrigger {
    RssTrigger::with_client(
        reqwest::Client::new(),
        RssTriggerConfig::new(node_id, format!("{}/rss", server.uri())),
    )
}

// ---------------------------------------------------------------
// parsing
// ---------------------------------------------------------------

#[test]
fn parse_rss_feed() {
    let items = parse_feed(WATERMARK_FEED).expect("Failed to parse RSS");

    assert_eq!(items.len(), 2, "Should parse 2 items");
    assert_eq!(items[0].title, "Old Release");
    assert_eq!(items[0].guid, "old");
    assert_eq!(items[0].iso_date, Some(utc(2019, 12, 31, 12, 0, 0)));
    assert_eq!(items[0].enclosure_url, None);
    assert_eq!(items[1].iso_date, Some(utc(2020, 6, 1, 8, 30, 0)));
    assert_eq!(
        items[1].enclosure_url.as_deref(),
        Some("magnet:?xt=urn:btih:abc")
    );
}

#[test]
fn parse_atom_feed() {
    let atom_content = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Test Atom Feed</title>
    <id>https://example.com/atom</id>
    <updated>2024-01-01T12:00:00Z</updated>
    <entry>
        <title>Test Release</title>
        <id>entry-1</id>
        <updated>2024-01-01T12:00:00Z</updated>
        <published>2024-01-01T10:00:00Z</published>
        <summary>A test release</summary>
        <link href="https://example.com/details/1" rel="alternate"/>
        <link href="https://example.com/download/1.torrent" rel="enclosure"/>
    </entry>
    <entry>
        <title>Another Release</title>
        <id>entry-2</id>
        <updated>2024-01-02T14:30:00+02:00</updated>
        <link href="https://example.com/details/2"/>
    </entry>
</feed>"#;

    let items = parse_feed(atom_content).expect("Failed to parse Atom");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].guid, "entry-1");
    assert_eq!(
        items[0].iso_date,
        Some(utc(2024, 1, 1, 10, 0, 0)),
        "published wins over updated"
    );
    assert_eq!(items[0].description.as_deref(), Some("A test release"));
    assert_eq!(items[0].link.as_deref(), Some("https://example.com/details/1"));
    assert_eq!(
        items[0].enclosure_url.as_deref(),
        Some("https://example.com/download/1.torrent")
    );

    assert_eq!(
        items[1].iso_date,
        Some(utc(2024, 1, 2, 12, 30, 0)),
        "updated is normalised to UTC"
    );
    assert_eq!(items[1].enclosure_url, None);
}

#[test]
fn parse_invalid_feed() {
    let err = parse_feed("This is not XML at all!").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("RSS error"));
    assert!(message.contains("Atom error"));
}

#[test]
fn rss_guid_falls_back_to_link_then_title() {
    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Test</title>
        <item>
            <title>With Link</title>
            <link>https://example.com/movie</link>
        </item>
        <item>
            <title>Title Only</title>
        </item>
    </channel>
</rss>"#;

    let items = parse_feed(feed).unwrap();
    assert_eq!(items[0].guid, "https://example.com/movie");
    assert_eq!(items[1].guid, "Title Only");
    assert_eq!(items[1].iso_date, None);
}

#[test]
fn rss_pub_date_accepts_rfc3339() {
    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Test</title>
        <item>
            <title>ISO dated</title>
            <pubDate>2021-03-04T05:06:07Z</pubDate>
        </item>
    </channel>
</rss>"#;

    let items = parse_feed(feed).unwrap();
    assert_eq!(items[0].iso_date, Some(utc(2021, 3, 4, 5, 6, 7)));
}

#[test]
fn rss_date_only_values_are_midnight_utc() {
    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Test</title>
        <item><title>old</title><guid>old</guid><pubDate>2019-12-31</pubDate></item>
        <item><title>new</title><guid>new</guid><pubDate>2020-06-01</pubDate></item>
    </channel>
</rss>"#;

    let items = parse_feed(feed).unwrap();
    assert_eq!(items[0].iso_date, Some(utc(2019, 12, 31, 0, 0, 0)));
    assert_eq!(items[1].iso_date, Some(utc(2020, 6, 1, 0, 0, 0)));

    let kept = items_since(items, utc(2020, 1, 1, 0, 0, 0));
    let guids: Vec<_> = kept.iter().map(|i| i.guid.as_str()).collect();
    assert_eq!(guids, ["new"]);
}

#[test]
fn rss_falls_back_to_dublin_core_date() {
    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
    <channel>
        <title>Test</title>
        <item>
            <title>dc only</title>
            <guid>dc</guid>
            <dc:date>2020-06-01T00:00:00Z</dc:date>
        </item>
        <item>
            <title>broken pubDate</title>
            <guid>broken</guid>
            <pubDate>sometime last week</pubDate>
            <dc:date>2020-06-02</dc:date>
        </item>
        <item>
            <title>no usable date</title>
            <guid>none</guid>
            <pubDate>sometime last week</pubDate>
        </item>
    </channel>
</rss>"#;

    let items = parse_feed(feed).unwrap();
    assert_eq!(items[0].iso_date, Some(utc(2020, 6, 1, 0, 0, 0)));
    assert_eq!(items[1].iso_date, Some(utc(2020, 6, 2, 0, 0, 0)));
    assert_eq!(items[2].iso_date, None);

    let kept = items_since(items, utc(2020, 1, 1, 0, 0, 0));
    let guids: Vec<_> = kept.iter().map(|i| i.guid.as_str()).collect();
    assert_eq!(guids, ["dc", "broken"]);
}

#[test]
fn download_link_prefers_enclosure() {
    let mut entry = item("x", None);
    assert_eq!(entry.download_link(), None);

    entry.link = Some("https://example.com/page".into());
    assert_eq!(entry.download_link(), Some("https://example.com/page"));

    entry.enclosure_url = Some("magnet:?xt=1".into());
    assert_eq!(entry.download_link(), Some("magnet:?xt=1"));
}

// ---------------------------------------------------------------
// watermark filtering
// ---------------------------------------------------------------

#[test]
fn items_since_is_inclusive_and_drops_undated() {
    let start = utc(2020, 1, 1, 0, 0, 0);
    let kept = items_since(
        vec![
            item("before", Some(utc(2019, 12, 31, 23, 59, 59))),
            item("exact", Some(start)),
            item("after", Some(utc(2020, 6, 1, 0, 0, 0))),
            item("undated", None),
        ],
        start,
    );

    let guids: Vec<_> = kept.iter().map(|i| i.guid.as_str()).collect();
    assert_eq!(guids, ["exact", "after"]);
}

#[test]
fn watermark_format_is_utc_seconds_with_z() {
    assert_eq!(
        format_watermark(utc(2020, 1, 1, 0, 0, 0)),
        "2020-01-01T00:00:00Z"
    );
}

// ---------------------------------------------------------------
// polling
// ---------------------------------------------------------------

#[tokio::test]
async fn poll_emits_only_items_after_watermark_and_advances_it() {
    let server = serve_feed(WATERMARK_FEED).await;
    let trigger = trigger_for(&server, "rss-1");
    let store = MemoryStore::new();
    store
        .set("rss-1", WATERMARK_KEY, "2020-01-01T00:00:00Z")
        .await
        .unwrap();
    let now = utc(2020, 7, 1, 12, 0, 0);

    let items = trigger.poll(&store, now).await.unwrap().expect("one new item");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].guid, "new");
    assert_eq!(
        store.get("rss-1", WATERMARK_KEY).await.unwrap().as_deref(),
        Some("2020-07-01T12:00:00Z")
    );
}

#[tokio::test]
async fn watermark_advances_even_when_nothing_matches() {
    let server = serve_feed(WATERMARK_FEED).await;
    let trigger = trigger_for(&server, "rss-1");
    let store = MemoryStore::new();
    store
        .set("rss-1", WATERMARK_KEY, "2021-01-01T00:00:00Z")
        .await
        .unwrap();

    let result = trigger.poll(&store, utc(2021, 2, 1, 0, 0, 0)).await.unwrap();

    assert_eq!(result, None);
    assert_eq!(
        store.get("rss-1", WATERMARK_KEY).await.unwrap().as_deref(),
        Some("2021-02-01T00:00:00Z")
    );
}

#[tokio::test]
async fn second_poll_does_not_repeat_items() {
    let server = serve_feed(WATERMARK_FEED).await;
    let trigger = trigger_for(&server, "rss-1");
    let store = MemoryStore::new();

    let first = trigger
        .poll(&store, utc(2020, 7, 1, 0, 0, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 2, "epoch start date admits everything");

    let second = trigger.poll(&store, utc(2020, 7, 2, 0, 0, 0)).await.unwrap();
    assert_eq!(second, None);
}

#[tokio::test]
async fn configured_start_date_applies_without_stored_watermark() {
    let server = serve_feed(WATERMARK_FEED).await;
    let mut config = RssTriggerConfig::new("rss-1", format!("{}/rss", server.uri()));
    config.start_date = utc(2020, 1, 1, 0, 0, 0);
    let trigger = RssTrigger::with_client(reqwest::Client::new(), config);

    let items = trigger
        .poll(&MemoryStore::new(), utc(2020, 7, 1, 0, 0, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].guid, "new");
}

#[tokio::test]
async fn unparsable_watermark_falls_back_to_start_date() {
    let server = serve_feed(WATERMARK_FEED).await;
    let trigger = trigger_for(&server, "rss-1");
    let store = MemoryStore::new();
    store.set("rss-1", WATERMARK_KEY, "yesterday").await.unwrap();

    let items = trigger
        .poll(&store, utc(2020, 7, 1, 0, 0, 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn poll_since_reports_now_as_watermark() {
    let server = serve_feed(WATERMARK_FEED).await;
    let trigger = trigger_for(&server, "rss-1");
    let now = utc(2030, 1, 1, 0, 0, 0);

    let outcome = trigger.poll_since(now, now).await.unwrap();
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.watermark, now);
}

#[tokio::test]
async fn failed_fetch_leaves_watermark_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let trigger = trigger_for(&server, "rss-1");
    let store = MemoryStore::new();
    store
        .set("rss-1", WATERMARK_KEY, "2020-01-01T00:00:00Z")
        .await
        .unwrap();

    let err = trigger
        .poll(&store, utc(2020, 7, 1, 0, 0, 0))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("HTTP 500"));
    assert_eq!(
        store.get("rss-1", WATERMARK_KEY).await.unwrap().as_deref(),
        Some("2020-01-01T00:00:00Z")
    );
}

#[tokio::test]
async fn empty_feed_url_is_a_config_error() {
    let trigger = RssTrigger::with_client(reqwest::Client::new(), RssTriggerConfig::new("rss", ""));
    let err = trigger.fetch().await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("The parameter \"URL\" has to be set!"));
}

#[tokio::test]
async fn refused_connection_names_the_url() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/rss", addr);
    let trigger = RssTrigger::with_client(reqwest::Client::new(), RssTriggerConfig::new("rss", &url));

    match trigger.fetch().await.unwrap_err() {
        Error::FeedUnreachable { url: reported } => assert_eq!(reported, url),
        other => panic!("expected unreachable feed, got {other:?}"),
    }
}

#[tokio::test]
async fn garbage_body_is_a_feed_error() {
    let server = serve_feed("<html>maintenance</html>").await;
    let err = trigger_for(&server, "rss").fetch().await.unwrap_err();
    assert!(matches!(err, Error::Feed(_)), "got {err:?}");
}
