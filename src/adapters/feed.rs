//! Feed-structured sources (RSS 0.9/1.0/2.0, Atom, JSON Feed).
//!
//! The feed is fetched and parsed with `feed-rs`. A feed that cannot be
//! fetched or parsed is reported as [`Scan::Unavailable`] rather than
//! aborting the sweep.

use super::{Cutoff, Scan};
use crate::fetch::Fetch;
use crate::models::{DiscoveredEntry, EntryBody, SourceDescriptor};
use crate::resolver::visible_text;
use feed_rs::parser;
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};

/// Fetch and filter the entries of a feed source.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.access_url))]
pub async fn discover<F: Fetch>(
    fetcher: &F,
    source: &SourceDescriptor,
    cutoff: &Cutoff,
) -> Scan {
    let xml = match fetcher.fetch(&source.access_url).await {
        Ok(xml) => xml,
        Err(e) => {
            error!(error = %e, "Could not fetch feed; skipping source this run");
            return Scan::Unavailable(e.to_string());
        }
    };

    match parse_entries(&xml, source, cutoff) {
        Ok(entries) => {
            info!(admitted = entries.len(), "Scanned feed");
            Scan::Complete(entries)
        }
        Err(e) => {
            error!(error = %e, "Could not parse feed; skipping source this run");
            Scan::Unavailable(e.to_string())
        }
    }
}

/// Parse feed bytes and keep the entries `cutoff` admits, in feed order.
pub fn parse_entries(
    xml: &str,
    source: &SourceDescriptor,
    cutoff: &Cutoff,
) -> Result<Vec<DiscoveredEntry>, parser::ParseFeedError> {
    let feed = parser::parse(xml.as_bytes())?;
    debug!(entries = feed.entries.len(), "Parsed feed");

    let mut admitted = Vec::new();
    for entry in feed.entries {
        let Some(published) = entry.published.or(entry.updated) else {
            warn!(id = %entry.id, "Feed entry has no publish date; skipping");
            continue;
        };
        let published_at = published.naive_utc();
        if !cutoff.admits(published_at) {
            continue;
        }

        let Some(url) = entry.links.first().map(|l| l.href.clone()) else {
            warn!(id = %entry.id, "Feed entry has no link; skipping");
            continue;
        };
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());

        let body = if source.inline_content {
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            EntryBody::Inline(strip_markup(&description))
        } else {
            EntryBody::Remote(source.selector.clone())
        };

        debug!(%url, %published_at, "Admitted feed entry");
        admitted.push(DiscoveredEntry {
            title,
            url,
            published_at,
            body,
        });
    }
    Ok(admitted)
}

/// Feed descriptions are often HTML; keep only the readable text.
fn strip_markup(description: &str) -> String {
    let fragment = Html::parse_fragment(description);
    visible_text(fragment.root_element())
}
