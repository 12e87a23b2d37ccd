//! Command-line interface definitions for Feed Digest.
//!
//! All arguments can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the Feed Digest application.
///
/// # Examples
///
/// ```sh
/// # Tokens from the environment, defaults for everything else
/// SLACK_TOKEN=xoxb-... SLACK_CHANNEL_ID=C0123 feed_digest
///
/// # Explicit source list and watermark location
/// feed_digest -s ./rss_urls.csv -w /var/lib/feed_digest/last_date.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// CSV file listing the sources to poll
    #[arg(short, long, env = "SOURCES_CSV", default_value = "rss_urls.csv")]
    pub sources: String,

    /// File holding the per-source last-processed timestamps
    #[arg(short, long, env = "WATERMARK_FILE", default_value = "last_date.yaml")]
    pub watermark_file: String,

    /// Entries published at or before this instant are never notified (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long, env = "FLOOR_DATE", default_value = "2024-03-18 00:00:00")]
    pub floor_date: String,

    /// Slack bot token
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub slack_token: String,

    /// Slack channel receiving the notifications
    #[arg(long, env = "SLACK_CHANNEL_ID")]
    pub slack_channel: String,

    /// Slack Web API base URL
    #[arg(long, env = "SLACK_API_URL", default_value = "https://slack.com/api")]
    pub slack_api_url: String,

    /// Optional path to the LLM config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Chat template used for summaries
    #[arg(long, env = "SUMMARY_TEMPLATE", default_value = "content_summarizer")]
    pub template: String,

    /// User-Agent sent with every page and feed request
    #[arg(long, env = "USER_AGENT", default_value = crate::config::DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// CSS selector for one item on an HTML listing page
    #[arg(long, default_value = "div.collection-item-6")]
    pub listing_item: String,

    /// CSS selector for the date element inside a listing item
    #[arg(long, default_value = "div.text-block-30")]
    pub listing_date: String,

    /// CSS selector for the article links inside a listing item
    #[arg(long, default_value = "a.link-block-8[href]")]
    pub listing_link: String,

    /// CSS selector for the title element inside a listing link
    #[arg(long, default_value = "div")]
    pub listing_title: String,

    /// chrono format of listing dates
    #[arg(long, default_value = "%B %d, %Y")]
    pub listing_date_format: String,
}
