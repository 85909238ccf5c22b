//! Insights collaborator
//!
//! Forwards a principal's file metadata to an OpenAI-compatible chat
//! completion endpoint and hands the answer back untouched.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::file::FileMetadata;

const SYSTEM_PROMPT: &str = "You are an AI assistant that analyzes file metadata and provides \
recommendations as to which file should be opened at the current time and some \
insights/suggestions about better organization of files.";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait InsightsProvider: Send + Sync {
    async fn analyze(&self, metadata: &[FileMetadata]) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

pub struct ChatCompletionsInsights {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsInsights {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl InsightsProvider for ChatCompletionsInsights {
    async fn analyze(&self, metadata: &[FileMetadata]) -> anyhow::Result<String> {
        let payload = serde_json::to_string(metadata)?;
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: format!(
                        "Analyze the following metadata and provide insights: {}",
                        payload
                    ),
                },
            ],
            temperature: 0.5,
            max_tokens: 1024,
            top_p: 1.0,
            stream: false,
        };

        let response: ChatCompletionResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("insights request failed")?
            .error_for_status()
            .context("insights provider returned an error status")?
            .json::<ChatCompletionResponse>()
            .await
            .context("insights response was not valid JSON")?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("insights provider returned no choices"))
    }
}

/// Stand-in when no API key is configured.
pub struct DisabledInsights;

#[async_trait]
impl InsightsProvider for DisabledInsights {
    async fn analyze(&self, _metadata: &[FileMetadata]) -> anyhow::Result<String> {
        Err(anyhow!("insights provider is not configured"))
    }
}

pub fn from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn InsightsProvider>> {
    match &config.insights_api_key {
        Some(key) => Ok(Arc::new(ChatCompletionsInsights::new(
            &config.insights_base_url,
            key.clone(),
            config.insights_model.clone(),
            Duration::from_secs(config.insights_timeout_secs),
        )?)),
        None => {
            tracing::warn!("INSIGHTS_API_KEY not set, insights are disabled");
            Ok(Arc::new(DisabledInsights))
        }
    }
}
