//! HTTP retrieval of feeds, listing pages and entry pages.
//!
//! [`Fetch`] is the seam the adapters and the content resolver depend on;
//! [`HttpFetcher`] is the reqwest-backed implementation used in production.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Retrieve the body of a URL as text.
pub trait Fetch {
    /// Fetch `url` and return its body. Non-2xx responses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// reqwest client with the configured User-Agent and timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        let res = async {
            let body = self
                .client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok::<_, Error>(body)
        }
        .await;

        let elapsed_ms = t0.elapsed().as_millis();
        match &res {
            Ok(body) => debug!(elapsed_ms, bytes = body.len(), "Fetched"),
            Err(e) => warn!(elapsed_ms, error = %e, "Fetch failed"),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", "feed-digest-test")
            .with_status(200)
            .with_body("<html><body>hi</body></html>")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig {
            user_agent: "feed-digest-test".to_string(),
            ..FetchConfig::default()
        })
        .unwrap();

        let body = fetcher.fetch(&format!("{}/page", server.url())).await.unwrap();
        assert_eq!(body, "<html><body>hi</body></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let res = fetcher.fetch(&format!("{}/missing", server.url())).await;
        assert!(matches!(res, Err(Error::Http(_))));
    }
}
