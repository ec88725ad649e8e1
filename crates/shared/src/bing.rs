use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::BriefingError;
use crate::models::{host_of, NewsItem};

pub const BING_NEWS_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/news/search";

/// One search to run against the news API
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub market: String,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, market: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            market: market.into(),
        }
    }
}

/// The Portuguese and English technology searches run every day
pub fn default_queries() -> Vec<SearchQuery> {
    vec![
        SearchQuery::new(
            r#"(technology OR "inteligência artificial" OR AI OR cloud OR chips OR startups OR cibersegurança)"#,
            "pt-BR",
        ),
        SearchQuery::new(
            "(technology OR AI OR cloud OR chips OR startups OR cybersecurity)",
            "en-US",
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct BingResponse {
    #[serde(default)]
    value: Option<Vec<BingArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingArticle {
    // Any of these may be missing or null; incomplete articles are dropped later by dedupe
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    provider: Option<Vec<BingProvider>>,
    #[serde(default)]
    date_published: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BingProvider {
    name: Option<String>,
}

impl From<BingArticle> for NewsItem {
    fn from(article: BingArticle) -> Self {
        let url = article.url.unwrap_or_default();
        let source = article
            .provider
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|p| p.name)
            .unwrap_or_else(|| host_of(&url));

        NewsItem::new(
            article.name.unwrap_or_default().trim(),
            url,
            article.description.unwrap_or_default(),
            source,
            article.date_published.unwrap_or_default(),
        )
    }
}

pub struct BingNewsClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl BingNewsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, BING_NEWS_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(25))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    /// Most recent articles from the last day for one query and market
    pub async fn search(&self, query: &SearchQuery, count: usize) -> Result<Vec<NewsItem>> {
        let url = format!(
            "{}?q={}&mkt={}&freshness=Day&sortBy=Date&count={}&originalImg=true",
            self.endpoint,
            urlencoding::encode(&query.query),
            urlencoding::encode(&query.market),
            count
        );

        let response = self
            .client
            .get(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch news from Bing")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(BriefingError::Api {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        let bing_response = response
            .json::<BingResponse>()
            .await
            .context("Failed to parse Bing News response")?;

        Ok(bing_response
            .value
            .unwrap_or_default()
            .into_iter()
            .map(NewsItem::from)
            .collect())
    }

    /// Run every query in turn. A failing query is logged and contributes nothing.
    pub async fn search_all(&self, queries: &[SearchQuery], count: usize) -> Vec<NewsItem> {
        let mut items = Vec::new();

        for query in queries {
            match self.search(query, count).await {
                Ok(found) => {
                    debug!(market = %query.market, count = found.len(), "Fetched search results");
                    items.extend(found);
                }
                Err(e) => {
                    warn!(market = %query.market, error = %e, "Search query failed, skipping");
                }
            }
        }

        items
    }
}
