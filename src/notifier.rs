//! Notification delivery to Slack.
//!
//! Each notification becomes one `chat.postMessage` call carrying a single
//! mrkdwn section block. Slack answers HTTP 200 even for rejected requests,
//! so the `ok` field of the response body is checked as well.

use crate::config::SlackConfig;
use crate::error::{Error, Result};
use crate::models::Notification;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

/// Deliver a formatted message to the configured destination.
pub trait Notify {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Posts notifications to one Slack channel with a bot token.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    config: SlackConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Request body for `chat.postMessage`.
    pub fn payload(&self, n: &Notification) -> Value {
        json!({
            "channel": self.config.channel,
            "text": format!("{}: {}", n.source_name, n.display_title()),
            "blocks": [{
                "type": "section",
                "text": { "type": "mrkdwn", "text": message_text(n) }
            }]
        })
    }
}

/// Slack mrkdwn rendering of a notification.
pub fn message_text(n: &Notification) -> String {
    format!(
        "*{}*\n<{}|*{}*>\n\n*Summary:* {}\n\nPublished on {}",
        n.source_name,
        n.url,
        n.display_title(),
        n.summary,
        n.published_date
    )
}

impl Notify for SlackNotifier {
    #[instrument(level = "info", skip_all, fields(source = %notification.source_name, url = %notification.url))]
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let endpoint = format!("{}/chat.postMessage", self.config.api_url);
        let body = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.token)
            .json(&self.payload(notification))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        // Proxies in front of the API can answer 200 with an HTML page.
        let resp: SlackResponse = serde_json::from_str(&body)?;

        if !resp.ok {
            let reason = resp.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::Notify(format!("Slack rejected message: {reason}")));
        }
        info!("Sent message to Slack");
        Ok(())
    }
}
