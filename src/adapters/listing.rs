//! HTML listing pages: repeated items, each with a date and one or more links.
//!
//! The structural pattern comes from [`ListingLayout`]. Items whose date is
//! missing or unreadable are skipped; links without a title element are
//! kept and reported untitled.

use super::{Cutoff, Scan};
use crate::config::ListingLayout;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::models::{DiscoveredEntry, EntryBody, SourceDescriptor};
use crate::resolver::visible_text;
use chrono::{NaiveDate, NaiveTime};
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Fetch a listing page and return the links of every admitted item.
///
/// A page answering with an error status (moved, temporarily down) is
/// [`Scan::Unavailable`]. A listing page that cannot be reached at all
/// aborts the run.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.access_url))]
pub async fn discover<F: Fetch>(
    fetcher: &F,
    source: &SourceDescriptor,
    layout: &ListingLayout,
    cutoff: &Cutoff,
) -> Result<Scan> {
    info!("Processing URL");
    let html = match fetcher.fetch(&source.access_url).await {
        Ok(html) => html,
        Err(Error::Http(e)) if e.is_status() => {
            error!(error = %e, "Listing page returned an error status; skipping source this run");
            return Ok(Scan::Unavailable(e.to_string()));
        }
        Err(e) => {
            return Err(Error::Source {
                name: source.name.clone(),
                reason: e.to_string(),
            });
        }
    };

    let entries = parse_listing(&html, &source.access_url, layout, cutoff);
    info!(admitted = entries.len(), "Scanned listing page");
    Ok(Scan::Complete(entries))
}

/// Walk the listing items of `html` and keep the links `cutoff` admits.
pub fn parse_listing(
    html: &str,
    page_url: &str,
    layout: &ListingLayout,
    cutoff: &Cutoff,
) -> Vec<DiscoveredEntry> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let mut admitted = Vec::new();

    for (index, item) in document.select(&layout.item).enumerate() {
        let Some(date_el) = item.select(&layout.date).next() else {
            debug!(index, "Listing item has no date element; skipping");
            continue;
        };
        let date_text = visible_text(date_el);
        let date = match NaiveDate::parse_from_str(&date_text, &layout.date_format) {
            Ok(d) => d,
            Err(e) => {
                warn!(index, date = %date_text, error = %e, "Unparseable listing date; skipping item");
                continue;
            }
        };
        let published_at = date.and_time(NaiveTime::MIN);
        if !cutoff.admits(published_at) {
            continue;
        }

        for link in item.select(&layout.link) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let url = match &base {
                Some(base) => base
                    .join(href)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };

            let title = link
                .select(&layout.title)
                .next()
                .map(visible_text)
                .filter(|t| !t.is_empty());
            if title.is_none() {
                warn!(%url, "Listing link has no title text; passing through untitled");
            }

            debug!(%url, %published_at, "Admitted listing entry");
            admitted.push(DiscoveredEntry {
                title,
                url,
                published_at,
                body: EntryBody::Remote(None),
            });
        }
    }
    admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::fetch::HttpFetcher;
    use crate::models::SourceKind;
    use crate::testing::FakeFetcher;
    use chrono::NaiveDateTime;

    const PAGE: &str = r#"
<html><body>
  <div class="collection-item-6">
    <div class="text-block-30">March 20, 2024</div>
    <a class="link-block-8" href="/news/launch"><div>Launch day</div></a>
    <a class="link-block-8" href="https://other.example.com/recap"><span>no title div</span></a>
  </div>
  <div class="collection-item-6">
    <div class="text-block-30">Sometime soon</div>
    <a class="link-block-8" href="/news/teaser"><div>Teaser</div></a>
  </div>
  <div class="collection-item-6">
    <a class="link-block-8" href="/news/undated"><div>Undated</div></a>
  </div>
  <div class="collection-item-6">
    <div class="text-block-30">March 10, 2024</div>
    <a class="link-block-8" href="/news/old"><div>Old</div></a>
  </div>
  <div class="collection-item-6">
    <div class="text-block-30">March 19, 2024</div>
    <a class="other-link" href="/news/ignored"><div>Wrong class</div></a>
  </div>
</body></html>"#;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    fn cutoff(watermark: NaiveDateTime) -> Cutoff {
        Cutoff {
            floor: day(18),
            watermark,
        }
    }

    #[test]
    fn test_admits_dated_items_after_floor() {
        let layout = ListingLayout::default();
        let entries = parse_listing(PAGE, "https://vendor.example.com/news", &layout, &cutoff(NaiveDateTime::MIN));

        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://vendor.example.com/news/launch", "https://other.example.com/recap"]
        );
        assert!(entries.iter().all(|e| e.published_at == day(20)));
        assert!(entries.iter().all(|e| e.body == EntryBody::Remote(None)));
    }

    #[test]
    fn test_untitled_link_passes_through() {
        let layout = ListingLayout::default();
        let entries = parse_listing(PAGE, "https://vendor.example.com/news", &layout, &cutoff(NaiveDateTime::MIN));
        assert_eq!(entries[0].title.as_deref(), Some("Launch day"));
        assert_eq!(entries[1].title, None);
    }

    #[test]
    fn test_watermark_filters_items() {
        let layout = ListingLayout::default();
        let entries = parse_listing(PAGE, "https://vendor.example.com/news", &layout, &cutoff(day(20)));
        assert!(entries.is_empty());
    }

    #[test]
    fn test_custom_layout() {
        let html = r#"<ul><li class="post"><time>2024-04-02</time><a href="/p/1"><h3>First</h3></a></li></ul>"#;
        let layout = ListingLayout::new("li.post", "time", "a[href]", "h3", "%Y-%m-%d").unwrap();
        let entries = parse_listing(html, "https://example.com/", &layout, &cutoff(NaiveDateTime::MIN));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "https://example.com/p/1");
        assert_eq!(entries[0].title.as_deref(), Some("First"));
    }

    fn vendor(access_url: &str) -> SourceDescriptor {
        SourceDescriptor {
            name: "Vendor News".to_string(),
            access_url: access_url.to_string(),
            kind: SourceKind::HtmlListing,
            selector: None,
            inline_content: false,
        }
    }

    #[tokio::test]
    async fn test_listing_error_status_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/news")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let scan = discover(
            &fetcher,
            &vendor(&format!("{}/news", server.url())),
            &ListingLayout::default(),
            &cutoff(NaiveDateTime::MIN),
        )
        .await
        .unwrap();

        assert!(matches!(scan, Scan::Unavailable(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_listing_served_is_complete() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/news")
            .with_status(200)
            .with_body(PAGE)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let scan = discover(
            &fetcher,
            &vendor(&format!("{}/news", server.url())),
            &ListingLayout::default(),
            &cutoff(NaiveDateTime::MIN),
        )
        .await
        .unwrap();

        assert_eq!(scan.into_entries().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_listing_is_fatal() {
        let source = vendor("https://vendor.example.com/news");
        let err = discover(
            &FakeFetcher::default(),
            &source,
            &ListingLayout::default(),
            &cutoff(NaiveDateTime::MIN),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Source { ref name, .. } if name == "Vendor News"));
    }
}
