//! In-memory collaborators for tests.

use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::models::Notification;
use crate::notifier::Notify;
use crate::summarizer::Summarize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned bodies by URL; unknown URLs fail like a dead host.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Source {
                name: url.to_string(),
                reason: "connection refused".to_string(),
            })
    }
}

/// Summarizes by prefixing the input; fails on inputs containing `fail_on`.
#[derive(Debug, Default)]
pub struct FakeSummarizer {
    pub fail_on: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl Summarize for FakeSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());
        match &self.fail_on {
            Some(needle) if text.contains(needle.as_str()) => {
                Err(Error::Summarize("model unavailable".to_string()))
            }
            _ => Ok(format!("summary of: {text}")),
        }
    }
}

/// Records notifications; optionally fails on a given title.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub fail_on_title: Option<String>,
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notify for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if notification.title.is_some() && notification.title == self.fail_on_title {
            return Err(Error::Notify("invalid_auth".to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
