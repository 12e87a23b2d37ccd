//! Data models shared by the adapters, the resolver and the pipeline.
//!
//! - [`SourceDescriptor`]: one configured content source
//! - [`DiscoveredEntry`]: an admitted entry as produced by an adapter
//! - [`Entry`]: a discovered entry with its body resolved
//! - [`Content`]: resolved body text, or the reason it could not be resolved
//! - [`Notification`]: the payload handed to the notifier

use chrono::NaiveDateTime;
use std::fmt;

/// How a source publishes its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// RSS/Atom/JSON feed with structured publish dates.
    FeedStructured,
    /// Plain HTML page listing dated links.
    HtmlListing,
}

/// How to locate an article's main content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Id,
    Class,
}

/// Selector for the main content element of an entry page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSelector {
    pub kind: SelectorKind,
    pub value: String,
}

impl ContentSelector {
    pub fn id(value: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Id,
            value: value.into(),
        }
    }

    pub fn class(value: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Class,
            value: value.into(),
        }
    }

    /// Render as a CSS attribute selector.
    ///
    /// Attribute form keeps ids and class names with unusual characters
    /// (dots, leading digits) valid CSS. A class value holding several
    /// whitespace-separated names requires all of them on the element.
    pub fn to_css(&self) -> String {
        match self.kind {
            SelectorKind::Id => format!("[id=\"{}\"]", escape_attr(&self.value)),
            SelectorKind::Class => self
                .value
                .split_whitespace()
                .map(|class| format!("[class~=\"{}\"]", escape_attr(class)))
                .collect(),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for ContentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SelectorKind::Id => write!(f, "#{}", self.value),
            SelectorKind::Class => write!(f, ".{}", self.value),
        }
    }
}

/// One row of the source registry. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub access_url: String,
    pub kind: SourceKind,
    pub selector: Option<ContentSelector>,
    /// Feed entries already embed the full text; skip the page fetch.
    pub inline_content: bool,
}

/// Where an entry's body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryBody {
    /// Text embedded in the feed entry itself.
    Inline(String),
    /// Fetch the entry URL and extract text, optionally scoped by a selector.
    Remote(Option<ContentSelector>),
}

/// An entry an adapter has admitted past the floor date and watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEntry {
    pub title: Option<String>,
    pub url: String,
    pub published_at: NaiveDateTime,
    pub body: EntryBody,
}

/// Why an entry's body could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    Fetch(String),
    ElementNotFound(String),
    InvalidSelector(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::Fetch(e) => write!(f, "fetch failed ({e})"),
            DegradeReason::ElementNotFound(sel) => write!(f, "no element matches {sel}"),
            DegradeReason::InvalidSelector(e) => write!(f, "invalid selector ({e})"),
        }
    }
}

/// Resolved body of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Degraded(DegradeReason),
}

/// An admitted entry with its body resolved. Never persisted.
#[derive(Debug, Clone)]
pub struct Entry {
    pub source_name: String,
    pub title: Option<String>,
    pub url: String,
    pub published_at: NaiveDateTime,
    pub body: Content,
}

/// Message delivered for each admitted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub source_name: String,
    pub title: Option<String>,
    pub summary: String,
    /// `YYYY-MM-DD`
    pub published_date: String,
    pub url: String,
}

impl Notification {
    pub fn from_entry(entry: &Entry, summary: String) -> Self {
        Self {
            source_name: entry.source_name.clone(),
            title: entry.title.clone(),
            summary,
            published_date: entry.published_at.format("%Y-%m-%d").to_string(),
            url: entry.url.clone(),
        }
    }

    /// Title to display; untitled entries fall back to their URL.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
