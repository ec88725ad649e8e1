// Public modules
pub mod bing;
pub mod briefing;
pub mod config;
pub mod email;
pub mod error;
pub mod feeds;
pub mod models;
pub mod ranking;
pub mod summarizer;
pub mod teams;

// Re-export commonly used types
pub use bing::{default_queries, BingNewsClient, SearchQuery};
pub use briefing::BriefingGenerator;
pub use config::Config;
pub use error::BriefingError;
pub use feeds::{default_feeds, FeedClient};
pub use models::{NewsItem, Partition};
pub use ranking::{merge_and_rank, normalize_title, partition, KeywordWeights};
pub use summarizer::{summarize_or_fallback, AzureSummarizer, Summary};
pub use teams::{TeamsNotifier, WebhookFormat};
