//! Source registry loaded from a CSV file.
//!
//! Expected headers:
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `Name` | Display name, also the watermark key |
//! | `RSS` | `true` for a feed, anything else for an HTML listing page |
//! | `RSS URL` | Feed or listing page URL |
//! | `Type` | `id` or `class` (empty means `class`) |
//! | `Element` | Selector value for the article body |
//! | `Inline Content` | Optional; `true` when feed entries embed their full text |

use crate::error::{Error, Result};
use crate::models::{ContentSelector, SourceDescriptor, SourceKind};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "RSS")]
    rss: String,
    #[serde(rename = "RSS URL")]
    url: String,
    #[serde(rename = "Type", default)]
    selector_type: String,
    #[serde(rename = "Element", default)]
    element: String,
    #[serde(rename = "Inline Content", default)]
    inline_content: String,
}

impl SourceRow {
    fn into_descriptor(self, line: usize) -> Result<SourceDescriptor> {
        let name = self.name.trim().to_string();
        let access_url = self.url.trim().to_string();
        if name.is_empty() {
            return Err(Error::Config(format!("row {line}: empty Name")));
        }
        if access_url.is_empty() {
            return Err(Error::Config(format!("row {line} ({name}): empty RSS URL")));
        }

        let kind = if is_true(&self.rss) {
            SourceKind::FeedStructured
        } else {
            SourceKind::HtmlListing
        };

        let element = self.element.trim();
        let selector = match self.selector_type.trim().to_ascii_lowercase().as_str() {
            _ if element.is_empty() => None,
            "id" => Some(ContentSelector::id(element)),
            "class" | "" => Some(ContentSelector::class(element)),
            other => {
                return Err(Error::Config(format!(
                    "row {line} ({name}): unknown selector Type {other:?}, expected \"id\" or \"class\""
                )));
            }
        };

        Ok(SourceDescriptor {
            name,
            access_url,
            kind,
            selector,
            inline_content: is_true(&self.inline_content),
        })
    }
}

fn is_true(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

/// Parse a source registry from any CSV reader, preserving row order.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<SourceDescriptor>> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    csv.deserialize::<SourceRow>()
        .enumerate()
        .map(|(i, row)| row?.into_descriptor(i + 2))
        .collect()
}

/// Load the source registry from `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Vec<SourceDescriptor>> {
    let file = std::fs::File::open(path)?;
    let sources = from_reader(file)?;
    info!(count = sources.len(), "Loaded source registry");
    Ok(sources)
}
