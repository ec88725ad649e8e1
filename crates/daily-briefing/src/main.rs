use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shared::{
    default_feeds, default_queries, merge_and_rank, partition, summarize_or_fallback,
    BingNewsClient, BriefingGenerator, Config, FeedClient, KeywordWeights, NewsItem, Summary,
    TeamsNotifier, WebhookFormat,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Bing News search in each configured market
    Search,
    /// RSS/Atom feeds
    Feeds,
    /// Both of the above
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WebhookStyle {
    Card,
    Text,
}

impl From<WebhookStyle> for WebhookFormat {
    fn from(style: WebhookStyle) -> Self {
        match style {
            WebhookStyle::Card => WebhookFormat::Card,
            WebhookStyle::Text => WebhookFormat::Text,
        }
    }
}

#[derive(Parser)]
#[command(name = "daily-briefing")]
#[command(about = "Collect, rank and summarize today's tech news, then send the briefing")]
struct Args {
    /// Where to collect news from
    #[arg(short, long, value_enum, default_value = "search")]
    source: SourceKind,

    /// Feed URL to read (repeatable); overrides BRIEFING_FEEDS
    #[arg(short, long = "feed")]
    feeds: Vec<String>,

    /// Number of headlines
    #[arg(long, default_value = "8")]
    top: usize,

    /// Number of quick mentions after the headlines
    #[arg(long, default_value = "10")]
    quick: usize,

    /// Maximum items taken from a single feed
    #[arg(long, default_value_t = shared::feeds::DEFAULT_ITEMS_PER_FEED)]
    per_feed: usize,

    /// Search results requested per market
    #[arg(long, default_value = "50")]
    count: usize,

    /// Keep source order instead of keyword scoring
    #[arg(long)]
    no_score: bool,

    /// Directory for the dated briefing file
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Write the briefing file but skip email and Teams
    #[arg(long)]
    no_send: bool,

    /// Teams payload style
    #[arg(long, value_enum, default_value = "card")]
    webhook_format: WebhookStyle,
}

async fn collect_items(args: &Args, config: &Config) -> Result<Vec<NewsItem>> {
    let mut items = Vec::new();

    if matches!(args.source, SourceKind::Search | SourceKind::All) {
        let bing = BingNewsClient::new(config.bing_api_key()?)?;
        let found = bing.search_all(&default_queries(), args.count).await;
        println!("✓ Found {} search results", found.len());
        items.extend(found);
    }

    if matches!(args.source, SourceKind::Feeds | SourceKind::All) {
        let feeds = if !args.feeds.is_empty() {
            args.feeds.clone()
        } else if !config.feeds.is_empty() {
            config.feeds.clone()
        } else {
            default_feeds()
        };

        let client = FeedClient::new(args.per_feed)?;
        let found = client.fetch_all(&feeds).await;
        println!("✓ Read {} items from {} feeds", found.len(), feeds.len());
        items.extend(found);
    }

    Ok(items)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let today = config.today()?;

    println!("📰 Fetching news...");
    let raw_items = collect_items(&args, &config).await?;

    let weights = KeywordWeights::default();
    let ranked = merge_and_rank(raw_items, (!args.no_score).then_some(&weights));
    println!("✓ {} unique stories after deduplication", ranked.len());

    let parts = partition(&ranked, args.top, args.quick);

    println!("\n🤖 Summarizing with Azure OpenAI...");
    let summary = summarize_or_fallback(config.azure(), &parts, args.top).await;
    match &summary {
        Summary::Generated(_) => println!("✓ Summary ready"),
        Summary::Fallback { error, .. } => {
            println!("⚠ Summary failed, using plain headline list: {}", error)
        }
    }

    println!("\n📝 Rendering briefing...");
    let content = BriefingGenerator::generate(summary.text(), &parts.all_items(), today);
    let filepath = BriefingGenerator::save(&content, &args.output_dir, today)
        .context("Failed to save briefing file")?;
    println!("✓ Briefing saved to: {}", filepath.display());

    if args.no_send {
        println!("\n✅ Done (sending skipped).");
        return Ok(());
    }

    // A failed email stops the run before the Teams post; the file is already on disk
    println!("\n📧 Sending email...");
    let smtp = config.smtp()?;
    shared::email::send_briefing(&smtp, &BriefingGenerator::email_subject(today), &content)
        .await?;
    println!("✓ Email sent to {}", smtp.recipient);

    let teams = TeamsNotifier::new(config.teams_webhook_url.clone(), args.webhook_format.into())?;
    if teams.post_headlines(&parts.top, today).await? {
        println!("✓ Posted top headlines to Teams");
    }

    println!("\n✅ Done!");

    Ok(())
}
