use anyhow::{Context, Result};
use html2text::render::text_renderer::TrivialDecorator;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::BriefingError;
use crate::models::{host_of, NewsItem};

pub const DEFAULT_ITEMS_PER_FEED: usize = 20;

/// Technology feeds used when none are configured
pub fn default_feeds() -> Vec<String> {
    [
        "https://feeds.arstechnica.com/arstechnica/technology-lab",
        "https://www.theverge.com/rss/index.xml",
        "https://techcrunch.com/feed/",
        "https://www.technologyreview.com/feed/",
        "https://tecnoblog.net/feed/",
        "https://canaltech.com.br/rss/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub struct FeedClient {
    client: Client,
    max_items_per_feed: usize,
}

impl FeedClient {
    pub fn new(max_items_per_feed: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (compatible; TechBriefing/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            max_items_per_feed,
        })
    }

    /// Fetch and parse one feed, keeping at most the per-feed cap
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<NewsItem>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BriefingError::Api {
                status: status.as_u16(),
                message: format!("Failed to fetch {}", url),
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read feed body")?;

        parse_feed(&body, url, self.max_items_per_feed)
    }

    /// Fetch every feed in turn. A feed that fails to download or parse is
    /// logged and skipped.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<NewsItem> {
        let mut items = Vec::new();

        for url in urls {
            match self.fetch_feed(url).await {
                Ok(found) => {
                    debug!(%url, count = found.len(), "Fetched feed");
                    items.extend(found);
                }
                Err(e) => {
                    warn!(%url, error = %e, "Skipping feed");
                }
            }
        }

        info!(feeds = urls.len(), items = items.len(), "Fetched feed items");
        items
    }
}

/// Parse an RSS 2.0 or Atom document, trying RSS first
pub fn parse_feed(body: &[u8], url: &str, limit: usize) -> Result<Vec<NewsItem>> {
    if let Ok(channel) = rss::Channel::read_from(body) {
        return Ok(parse_rss_channel(&channel, url, limit));
    }

    if let Ok(feed) = atom_syndication::Feed::read_from(body) {
        return Ok(parse_atom_feed(&feed, url, limit));
    }

    Err(BriefingError::FeedParse(url.to_string()).into())
}

fn parse_rss_channel(channel: &rss::Channel, feed_url: &str, limit: usize) -> Vec<NewsItem> {
    let source = source_label(channel.title(), feed_url);

    channel
        .items()
        .iter()
        .take(limit)
        .map(|item| {
            NewsItem::new(
                item.title().unwrap_or_default().trim(),
                item.link().unwrap_or_default().trim(),
                html_to_text(item.description().unwrap_or_default()),
                source.clone(),
                item.pub_date().unwrap_or_default(),
            )
        })
        .collect()
}

fn parse_atom_feed(feed: &atom_syndication::Feed, feed_url: &str, limit: usize) -> Vec<NewsItem> {
    let source = source_label(feed.title().as_str(), feed_url);

    feed.entries()
        .iter()
        .take(limit)
        .map(|entry| {
            let url = entry
                .links()
                .first()
                .map(|l| l.href().trim().to_string())
                .unwrap_or_default();

            let summary = entry.summary().map(|s| s.as_str()).unwrap_or_default();
            let description = if summary.is_empty() {
                entry.content().and_then(|c| c.value()).unwrap_or_default()
            } else {
                summary
            };

            let published = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .to_rfc3339();

            NewsItem::new(
                entry.title().as_str().trim(),
                url,
                html_to_text(description),
                source.clone(),
                published,
            )
        })
        .collect()
}

fn source_label(title: &str, feed_url: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        host_of(feed_url)
    } else {
        title.to_string()
    }
}

/// Feed descriptions are usually HTML fragments; flatten them to one line
fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    html2text::from_read_with_decorator(html.as_bytes(), 10_000, TrivialDecorator::new())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example Tech</title>
    <link>https://tech.example.com</link>
    <description>Tech news</description>
    <item>
      <title>First story</title>
      <link>https://tech.example.com/1</link>
      <description>&lt;p&gt;Hello &lt;b&gt;world&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Sun, 01 Feb 2026 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://tech.example.com/2</link>
    </item>
    <item>
      <title>Third story</title>
      <link>https://tech.example.com/3</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:example:feed</id>
  <updated>2026-02-01T12:00:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <id>urn:example:1</id>
    <link href="https://atom.example.com/1"/>
    <updated>2026-02-01T12:00:00Z</updated>
    <summary>Short summary</summary>
  </entry>
  <entry>
    <title>Content only entry</title>
    <id>urn:example:2</id>
    <link href="https://atom.example.com/2"/>
    <published>2026-01-31T08:00:00Z</published>
    <updated>2026-02-01T11:00:00Z</updated>
    <content type="html">&lt;p&gt;Body &lt;b&gt;only&lt;/b&gt;&lt;/p&gt;</content>
  </entry>
</feed>"#;

    // ==================== RSS Tests ====================

    #[test]
    fn test_parse_rss_items() {
        let items = parse_feed(RSS.as_bytes(), "https://tech.example.com/rss", 10).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "First story");
        assert_eq!(items[0].url, "https://tech.example.com/1");
        assert_eq!(items[0].source, "Example Tech");
        assert_eq!(items[0].published, "Sun, 01 Feb 2026 10:00:00 GMT");
        assert_eq!(items[1].published, "");
    }

    #[test]
    fn test_rss_description_is_plain_text() {
        let items = parse_feed(RSS.as_bytes(), "https://tech.example.com/rss", 10).unwrap();

        let description = &items[0].description;
        assert!(description.contains("Hello"));
        assert!(description.contains("world"));
        assert!(!description.contains('<'));
    }

    #[test]
    fn test_per_feed_cap() {
        let items = parse_feed(RSS.as_bytes(), "https://tech.example.com/rss", 2).unwrap();
        assert_eq!(items.len(), 2);
    }

    // ==================== Atom Tests ====================

    #[test]
    fn test_parse_atom_entries() {
        let items = parse_feed(ATOM.as_bytes(), "https://atom.example.com/feed", 10).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Atom entry");
        assert_eq!(items[0].url, "https://atom.example.com/1");
        assert_eq!(items[0].description, "Short summary");
        assert_eq!(items[0].source, "Atom Example");
        assert!(items[0].published.starts_with("2026-02-01T12:00:00"));
    }

    #[test]
    fn test_atom_content_and_published_fallbacks() {
        let items = parse_feed(ATOM.as_bytes(), "https://atom.example.com/feed", 10).unwrap();

        // Without <summary> the HTML <content> is flattened instead
        assert_eq!(items[1].title, "Content only entry");
        assert_eq!(items[1].description, "Body only");
        // <published> wins over <updated> when both are present
        assert!(items[1].published.starts_with("2026-01-31T08:00:00"));
        // Only <updated> on the first entry
        assert!(items[0].published.starts_with("2026-02-01T12:00:00"));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_feed(b"<rss><channel><item>", "https://bad.example.com", 10).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BriefingError>(),
            Some(BriefingError::FeedParse(_))
        ));
    }

    #[test]
    fn test_source_label_falls_back_to_host() {
        assert_eq!(source_label("  ", "https://feeds.example.org/x"), "feeds.example.org");
    }

    // ==================== Fetch Tests ====================

    #[tokio::test]
    async fn test_fetch_all_skips_broken_feed() {
        let mut server = mockito::Server::new_async().await;
        let _good = server
            .mock("GET", "/good.xml")
            .with_status(200)
            .with_body(RSS)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/broken.xml")
            .with_status(200)
            .with_body("<not really a feed")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/missing.xml")
            .with_status(404)
            .create_async()
            .await;

        let client = FeedClient::new(DEFAULT_ITEMS_PER_FEED).unwrap();
        let urls = vec![
            format!("{}/broken.xml", server.url()),
            format!("{}/missing.xml", server.url()),
            format!("{}/good.xml", server.url()),
        ];
        let items = client.fetch_all(&urls).await;

        assert_eq!(items.len(), 3);
    }
}
