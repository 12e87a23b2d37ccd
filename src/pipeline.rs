//! The sweep: load watermarks, dispatch every source, notify every admitted
//! entry, then advance the watermarks.
//!
//! ```text
//! LOAD_WATERMARK -> for each source: DISPATCH(source) -> SAVE_WATERMARK(now) -> DONE
//! ```
//!
//! Everything runs sequentially: one source at a time, one entry at a time.
//! A fatal error (listing page unreachable, notifier failure) returns before
//! the watermark file is written, so the next run retries from the old
//! watermarks and may re-notify entries already sent in the aborted run.
//! A source that could not be read (feed down or unparseable, listing page
//! answering an error status) keeps its old watermark so entries published
//! during the outage are picked up once it recovers.

use crate::adapters::{Cutoff, Scan, feed, listing};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::models::{Content, DiscoveredEntry, Entry, EntryBody, Notification, SourceDescriptor, SourceKind};
use crate::notifier::Notify;
use crate::resolver;
use crate::summarizer::Summarize;
use crate::watermark::WatermarkStore;
use chrono::{NaiveDateTime, Utc};
use tracing::{error, info, instrument, warn};

/// Counters for one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sources: usize,
    /// Sources that could not be read this run; their watermarks stay put.
    pub unavailable: usize,
    pub notified: usize,
    pub degraded: usize,
    pub summary_failures: usize,
}

/// Orchestrator owning its collaborators and immutable configuration.
pub struct Pipeline<F, S, N> {
    config: PipelineConfig,
    fetcher: F,
    summarizer: S,
    notifier: N,
}

impl<F, S, N> Pipeline<F, S, N>
where
    F: Fetch,
    S: Summarize,
    N: Notify,
{
    pub fn new(config: PipelineConfig, fetcher: F, summarizer: S, notifier: N) -> Self {
        Self {
            config,
            fetcher,
            summarizer,
            notifier,
        }
    }

    /// Run one sweep over `sources`, stamping completed sources with the
    /// current UTC time.
    pub async fn run(&self, sources: &[SourceDescriptor], store: &WatermarkStore) -> Result<RunReport> {
        self.run_at(sources, store, Utc::now().naive_utc()).await
    }

    /// Run one sweep, recording `now` as the new watermark.
    ///
    /// `now` is taken before any source is read so entries published during
    /// the sweep are still picked up next time.
    ///
    /// # Arguments
    ///
    /// * `sources` - Registry rows, processed in order
    /// * `store` - Watermark file, read at the start and written once at the end
    /// * `now` - Timestamp stored for every source that was read successfully
    ///
    /// # Returns
    ///
    /// The [`RunReport`] of the sweep. On error no watermark is written.
    ///
    /// # Errors
    ///
    /// Fails when a listing page cannot be reached, when a notification
    /// cannot be delivered, or when the watermark file cannot be saved.
    #[instrument(level = "info", skip_all, fields(sources = sources.len(), %now))]
    pub async fn run_at(
        &self,
        sources: &[SourceDescriptor],
        store: &WatermarkStore,
        now: NaiveDateTime,
    ) -> Result<RunReport> {
        let mut watermarks = store.load().await;
        let mut report = RunReport::default();
        let mut completed = Vec::with_capacity(sources.len());

        for source in sources {
            let cutoff = Cutoff {
                floor: self.config.floor,
                watermark: watermarks.get(&source.name),
            };
            if self.dispatch(source, &cutoff, &mut report).await? {
                completed.push(source.name.as_str());
            } else {
                report.unavailable += 1;
            }
            report.sources += 1;
        }

        for name in completed {
            watermarks.advance(name, now);
        }
        store.save(&watermarks).await?;

        info!(
            sources = report.sources,
            unavailable = report.unavailable,
            notified = report.notified,
            degraded = report.degraded,
            summary_failures = report.summary_failures,
            "Sweep complete"
        );
        Ok(report)
    }

    #[instrument(level = "info", skip_all, fields(source = %source.name, kind = ?source.kind, watermark = %cutoff.watermark))]
    async fn dispatch(&self, source: &SourceDescriptor, cutoff: &Cutoff, report: &mut RunReport) -> Result<bool> {
        let scan = match source.kind {
            SourceKind::FeedStructured => feed::discover(&self.fetcher, source, cutoff).await,
            SourceKind::HtmlListing => {
                listing::discover(&self.fetcher, source, &self.config.listing, cutoff).await?
            }
        };
        let discovered = match scan {
            Scan::Complete(entries) => entries,
            Scan::Unavailable(reason) => {
                warn!(%reason, "Source unavailable; keeping its watermark");
                return Ok(false);
            }
        };

        for item in discovered {
            let entry = self.resolve(source, item).await;
            let summary = self.summarize(&entry, report).await;
            let notification = Notification::from_entry(&entry, summary);
            self.notifier.notify(&notification).await?;
            report.notified += 1;
        }
        Ok(true)
    }

    async fn resolve(&self, source: &SourceDescriptor, item: DiscoveredEntry) -> Entry {
        info!(url = %item.url, "Processing entry");
        let body = match item.body {
            EntryBody::Inline(text) => Content::Text(text),
            EntryBody::Remote(selector) => {
                resolver::resolve(&self.fetcher, &item.url, selector.as_ref()).await
            }
        };
        Entry {
            source_name: source.name.clone(),
            title: item.title,
            url: item.url,
            published_at: item.published_at,
            body,
        }
    }

    /// Summary text for an entry. Never fails: a degraded body yields a
    /// fixed notice and a summarizer error yields an empty summary.
    async fn summarize(&self, entry: &Entry, report: &mut RunReport) -> String {
        match &entry.body {
            Content::Text(text) => match self.summarizer.summarize(text).await {
                Ok(summary) => summary,
                Err(e) => {
                    error!(url = %entry.url, error = %e, "Summarization failed; sending empty summary");
                    report.summary_failures += 1;
                    String::new()
                }
            },
            Content::Degraded(reason) => {
                warn!(url = %entry.url, %reason, "Content unavailable; notifying without summary");
                report.degraded += 1;
                format!("Content unavailable: {reason}")
            }
        }
    }
}
