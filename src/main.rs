//! # Feed Digest
//!
//! Polls a list of content sources (RSS/Atom feeds and HTML listing pages),
//! picks out entries published since the previous run, summarizes each one
//! through an LLM and posts the summary to a Slack channel.
//!
//! ## Usage
//!
//! ```sh
//! SLACK_TOKEN=xoxb-... SLACK_CHANNEL_ID=C0123 feed_digest -s rss_urls.csv
//! ```
//!
//! Meant to be run from cron or a systemd timer. Two runs must not overlap.
//!
//! ## Architecture
//!
//! 1. **Registry**: load the source list from CSV
//! 2. **Watermarks**: load the last-processed timestamp of every source
//! 3. **Discovery**: each source's adapter lists entries newer than its
//!    watermark and the fixed floor date
//! 4. **Resolution**: fetch each entry page and extract its main text
//! 5. **Delivery**: summarize and post one Slack message per entry
//! 6. **Commit**: after a complete sweep, advance every source's watermark

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod adapters;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod notifier;
mod pipeline;
mod resolver;
mod sources;
mod summarizer;
#[cfg(test)]
mod testing;
mod utils;
mod watermark;

use cli::Cli;
use config::{FetchConfig, PipelineConfig, SlackConfig};
use fetch::HttpFetcher;
use notifier::SlackNotifier;
use pipeline::Pipeline;
use summarizer::AwfulSummarizer;
use utils::ensure_writable_parent;
use watermark::WatermarkStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("feed_digest starting up");

    let args = Cli::parse();
    debug!(sources = %args.sources, watermark_file = %args.watermark_file, "Parsed CLI arguments");

    let pipeline_config = PipelineConfig::from_cli(&args)?;
    let slack_config = SlackConfig::from_cli(&args)?;
    let fetch_config = FetchConfig {
        user_agent: args.user_agent.clone(),
        timeout: std::time::Duration::from_secs(args.timeout_secs),
    };
    info!(floor = %pipeline_config.floor, "Loaded configuration");

    // Fail before notifying anything if the watermark can't be written later.
    let store = WatermarkStore::new(&args.watermark_file);
    if let Err(e) = ensure_writable_parent(store.path()).await {
        error!(
            path = %store.path().display(),
            error = %e,
            "Watermark location is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let registry = sources::load(Path::new(&args.sources))?;
    let summarizer = AwfulSummarizer::load(args.config.as_deref(), &args.template).await?;
    info!(template = %args.template, "Loaded summarizer");

    let pipeline = Pipeline::new(
        pipeline_config,
        HttpFetcher::new(&fetch_config)?,
        summarizer,
        SlackNotifier::new(slack_config),
    );

    let report = match pipeline.run(&registry, &store).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Sweep aborted; watermarks not advanced");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        notified = report.notified,
        unavailable = report.unavailable,
        "Execution complete"
    );

    Ok(())
}
