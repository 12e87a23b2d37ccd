//! Immutable run configuration.
//!
//! Built once in `main` from the parsed [`Cli`] and handed to the pipeline;
//! nothing downstream reads flags or environment variables directly.

use crate::cli::Cli;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use scraper::Selector;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.182 Safari/537.36";

/// Timestamp format shared by the watermark file and the floor-date option.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Structural pattern of an HTML listing page.
#[derive(Debug, Clone)]
pub struct ListingLayout {
    pub item: Selector,
    pub date: Selector,
    pub link: Selector,
    pub title: Selector,
    pub date_format: String,
}

impl ListingLayout {
    pub fn new(item: &str, date: &str, link: &str, title: &str, date_format: &str) -> Result<Self> {
        Ok(Self {
            item: parse_selector(item)?,
            date: parse_selector(date)?,
            link: parse_selector(link)?,
            title: parse_selector(title)?,
            date_format: date_format.to_string(),
        })
    }
}

impl Default for ListingLayout {
    fn default() -> Self {
        Self::new(
            "div.collection-item-6",
            "div.text-block-30",
            "a.link-block-8[href]",
            "div",
            "%B %d, %Y",
        )
        .expect("default listing selectors are valid CSS")
    }
}

/// Settings for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the orchestrator needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Entries at or before this instant are never admitted.
    pub floor: NaiveDateTime,
    pub listing: ListingLayout,
}

impl PipelineConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            floor: parse_floor_date(&cli.floor_date)?,
            listing: ListingLayout::new(
                &cli.listing_item,
                &cli.listing_date,
                &cli.listing_link,
                &cli.listing_title,
                &cli.listing_date_format,
            )?,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            floor: default_floor(),
            listing: ListingLayout::default(),
        }
    }
}

/// Slack destination.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub api_url: String,
    pub token: String,
    pub channel: String,
}

impl SlackConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.slack_channel.trim().is_empty() {
            return Err(Error::Config("Slack channel id is empty".to_string()));
        }
        Ok(Self {
            api_url: cli.slack_api_url.trim_end_matches('/').to_string(),
            token: cli.slack_token.clone(),
            channel: cli.slack_channel.clone(),
        })
    }
}

fn default_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 18)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Accepts `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_floor_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| Error::Config(format!("invalid floor date {s:?}: {e}")))
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Config(format!("invalid selector {css:?}: {e}")))
}
