//! LLM-backed summarization.
//!
//! [`Summarize`] is the seam the pipeline depends on. [`AwfulSummarizer`]
//! sends the text through `awful_aj::api::ask` against an OpenAI-compatible
//! endpoint, using a chat template whose system prompt asks for a summary.
//! There is no retry layer: a failed call yields an error the pipeline turns
//! into an empty summary.

use crate::error::{Error, Result};
use crate::utils::truncate_for_log;
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Reduce arbitrary text to a short summary.
pub trait Summarize {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarizer backed by an `awful_aj` config and chat template.
#[derive(Debug)]
pub struct AwfulSummarizer {
    /// API endpoint, key and model settings.
    config: AwfulJadeConfig,
    /// Chat template carrying the summarization system prompt.
    template: ChatTemplate,
}

impl AwfulSummarizer {
    pub fn new(config: AwfulJadeConfig, template: ChatTemplate) -> Self {
        Self { config, template }
    }

    /// Load the LLM config from `config_path` (or the default config
    /// directory) and the named chat template.
    #[instrument(level = "info")]
    pub async fn load(config_path: Option<&str>, template_name: &str) -> Result<Self> {
        let config_path = match config_path {
            Some(p) => p.to_string(),
            None => awful_aj::config_dir()
                .map_err(|e| Error::Summarize(e.to_string()))?
                .join("config.yaml")
                .to_string_lossy()
                .into_owned(),
        };
        let config = awful_aj::config::load_config(&config_path)
            .map_err(|e| Error::Summarize(format!("loading {config_path}: {e}")))?;
        let template = awful_aj::template::load_template(template_name)
            .await
            .map_err(|e| Error::Summarize(format!("loading template {template_name}: {e}")))?;
        debug!(%config_path, template = %template_name, "Loaded summarizer");
        Ok(Self::new(config, template))
    }
}

impl Summarize for AwfulSummarizer {
    #[instrument(level = "info", skip_all, fields(bytes = text.len()))]
    async fn summarize(&self, text: &str) -> Result<String> {
        let t0 = Instant::now();
        let prompt = format!("Please summarize this content: \n\n{text}");
        let res = ask(&self.config, prompt, &self.template, None, None).await;
        let elapsed_ms = t0.elapsed().as_millis();

        match res {
            Ok(summary) => {
                debug!(elapsed_ms, summary = %truncate_for_log(&summary, 200), "Summarized");
                Ok(summary.trim().to_string())
            }
            Err(e) => {
                warn!(elapsed_ms, error = %e, "API call failed");
                Err(Error::Summarize(e.to_string()))
            }
        }
    }
}
