//! Source adapters: turn a source's raw listing into admitted entries.
//!
//! | Kind | Module | Input |
//! |------|--------|-------|
//! | [`SourceKind::FeedStructured`] | [`feed`] | RSS/Atom/JSON feed |
//! | [`SourceKind::HtmlListing`] | [`listing`] | HTML page of dated link groups |
//!
//! Both adapters filter with the same [`Cutoff`] and return entries in the
//! order the source lists them. Neither sorts. A source that could not be
//! read comes back as [`Scan::Unavailable`] so its watermark stays put.
//!
//! [`SourceKind::FeedStructured`]: crate::models::SourceKind::FeedStructured
//! [`SourceKind::HtmlListing`]: crate::models::SourceKind::HtmlListing

pub mod feed;
pub mod listing;

use crate::models::DiscoveredEntry;
use chrono::NaiveDateTime;

/// Outcome of scanning one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// The source was read; these are its admitted entries.
    Complete(Vec<DiscoveredEntry>),
    /// The source could not be read this run.
    Unavailable(String),
}

impl Scan {
    pub fn is_complete(&self) -> bool {
        matches!(self, Scan::Complete(_))
    }

    /// Admitted entries; none when the source was unavailable.
    pub fn into_entries(self) -> Vec<DiscoveredEntry> {
        match self {
            Scan::Complete(entries) => entries,
            Scan::Unavailable(_) => Vec::new(),
        }
    }
}

/// Admission boundary for one source in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    /// Fixed absolute floor, shared by every source.
    pub floor: NaiveDateTime,
    /// The source's own watermark.
    pub watermark: NaiveDateTime,
}

impl Cutoff {
    /// Strictly after both the floor and the watermark.
    pub fn admits(&self, published_at: NaiveDateTime) -> bool {
        published_at > self.floor && published_at > self.watermark
    }
}
