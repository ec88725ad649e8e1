use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{NewsItem, Partition};

// Word characters are letters, numerics (including superscripts) and underscore.
// Combining marks count as separators, so a decomposed accent splits the word.
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_]+").expect("valid regex"));

/// Keyword weights used for relevance scoring. Mixed English and Portuguese
/// stems on purpose: "regula" also matches "regulation", and both count.
pub const DEFAULT_KEYWORD_WEIGHTS: &[(&str, i64)] = &[
    ("openai", 6),
    ("gpt", 5),
    ("nvidia", 6),
    ("microsoft", 5),
    ("azure", 4),
    ("google", 5),
    ("alphabet", 4),
    ("aws", 5),
    ("amazon", 3),
    ("apple", 4),
    ("meta", 4),
    ("llm", 5),
    ("chips", 5),
    ("gpu", 5),
    ("semiconductor", 4),
    ("cloud", 4),
    ("datacenter", 4),
    ("cybersecurity", 5),
    ("ciberseguran", 5),
    ("ataque", 4),
    ("breach", 5),
    ("regulation", 4),
    ("regula", 4),
    ("funding", 4),
    ("startup", 4),
    ("aquisição", 4),
    ("acquisition", 4),
];

#[derive(Debug, Clone)]
pub struct KeywordWeights {
    weights: Vec<(String, i64)>,
}

impl KeywordWeights {
    pub fn new(weights: &[(&str, i64)]) -> Self {
        Self {
            weights: weights
                .iter()
                .map(|(k, w)| (k.to_lowercase(), *w))
                .collect(),
        }
    }

    /// Sum of weights for every keyword contained anywhere in title + description
    pub fn score(&self, title: &str, description: &str) -> i64 {
        let text = format!("{} {}", title, description).to_lowercase();
        self.weights
            .iter()
            .filter(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, weight)| weight)
            .sum()
    }
}

impl Default for KeywordWeights {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_WEIGHTS)
    }
}

/// Dedup key: runs of non-word characters collapsed to one space, trimmed, lowercased
pub fn normalize_title(title: &str) -> String {
    NON_WORD.replace_all(title, " ").trim().to_lowercase()
}

/// Drop items without title or URL, then keep the first item for each normalized title
pub fn dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let total = items.len();

    let kept: Vec<NewsItem> = items
        .into_iter()
        .filter_map(|mut item| {
            item.title = item.title.trim().to_string();
            if item.title.is_empty() || item.url.trim().is_empty() {
                return None;
            }
            seen.insert(normalize_title(&item.title)).then_some(item)
        })
        .collect();

    debug!(total, kept = kept.len(), "Deduplicated news items");
    kept
}

/// Deduplicate and, when weights are given, score and sort by relevance.
///
/// The sort is descending on `(score, published)`, with the title standing in
/// for an empty `published`. Without weights the arrival order is kept.
pub fn merge_and_rank(items: Vec<NewsItem>, weights: Option<&KeywordWeights>) -> Vec<NewsItem> {
    let mut items = dedupe(items);

    let Some(weights) = weights else {
        return items;
    };

    for item in &mut items {
        item.score = Some(weights.score(&item.title, &item.description));
    }

    items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    items
}

fn sort_key(item: &NewsItem) -> (i64, &str) {
    let secondary = if item.published.is_empty() {
        item.title.as_str()
    } else {
        item.published.as_str()
    };
    (item.score.unwrap_or(0), secondary)
}

/// First `top` items as headlines, the next `quick` as quick mentions
pub fn partition(ranked: &[NewsItem], top: usize, quick: usize) -> Partition {
    let top_end = top.min(ranked.len());
    let quick_end = top.saturating_add(quick).min(ranked.len());

    Partition {
        top: ranked[..top_end].to_vec(),
        quick: ranked[top_end..quick_end].to_vec(),
    }
}
