use serde::{Deserialize, Serialize};

/// A single news item as it flows through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub source: String,
    pub published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

impl NewsItem {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            source: source.into(),
            published: published.into(),
            score: None,
        }
    }

    /// "title (source) — url", the line format used by every listing
    pub fn link_line(&self) -> String {
        format!("{} ({}) — {}", self.title, self.source, self.url)
    }
}

/// Headline and quick-mention slices of the ranked list
#[derive(Debug, Clone, Default, Serialize)]
pub struct Partition {
    pub top: Vec<NewsItem>,
    pub quick: Vec<NewsItem>,
}

impl Partition {
    /// Headlines followed by quick mentions
    pub fn all_items(&self) -> Vec<NewsItem> {
        self.top.iter().chain(self.quick.iter()).cloned().collect()
    }
}

/// Host part of a URL, or an empty string when it doesn't parse
pub fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default()
}
