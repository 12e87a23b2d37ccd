//! Content resolution: turn an entry URL into the text that gets summarized.
//!
//! Failures never propagate. A fetch error, an unparsable selector or a
//! selector matching nothing all come back as [`Content::Degraded`] so the
//! pipeline can still notify the entry.

use crate::fetch::Fetch;
use crate::models::{Content, ContentSelector, DegradeReason};
use crate::utils::collapse_whitespace;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, error, instrument, warn};

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Elements whose text never counts as visible content.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Fetch `url` and extract its main text.
///
/// With a selector, the first matching element's text is returned; without
/// one, the visible text of the whole `<body>`.
///
/// # Arguments
///
/// * `fetcher` - HTTP client used to download the page
/// * `url` - Entry URL to resolve
/// * `selector` - Optional id/class locating the main content element
///
/// # Returns
///
/// [`Content::Text`] with whitespace-collapsed text, or [`Content::Degraded`]
/// when the page could not be fetched or the selector found nothing. This
/// function never fails.
#[instrument(level = "info", skip(fetcher))]
pub async fn resolve<F: Fetch>(
    fetcher: &F,
    url: &str,
    selector: Option<&ContentSelector>,
) -> Content {
    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => {
            error!(error = %e, "Error scraping web page");
            return Content::Degraded(DegradeReason::Fetch(e.to_string()));
        }
    };
    extract(&html, selector)
}

/// Extract text from an already fetched document.
pub fn extract(html: &str, selector: Option<&ContentSelector>) -> Content {
    let document = Html::parse_document(html);

    let Some(selector) = selector else {
        let root = document
            .select(&BODY)
            .next()
            .unwrap_or_else(|| document.root_element());
        let text = visible_text(root);
        debug!(bytes = text.len(), "Extracted full page text");
        return Content::Text(text);
    };

    let css = match Selector::parse(&selector.to_css()) {
        Ok(css) => css,
        Err(e) => {
            warn!(%selector, error = %e, "Content selector does not parse");
            return Content::Degraded(DegradeReason::InvalidSelector(e.to_string()));
        }
    };

    match document.select(&css).next() {
        Some(element) => {
            let text = visible_text(element);
            debug!(%selector, bytes = text.len(), "Extracted main content");
            Content::Text(text)
        }
        None => {
            warn!(%selector, "Could not find main content");
            Content::Degraded(DegradeReason::ElementNotFound(selector.to_string()))
        }
    }
}

/// Visible text under `element`, whitespace-collapsed, skipping scripts and styles.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    collect_text(element, &mut fragments);
    collapse_whitespace(&fragments.into_iter().filter(|s| !s.trim().is_empty()).join(" "))
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    if HIDDEN_TAGS.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(&**text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}
