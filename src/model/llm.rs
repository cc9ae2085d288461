//! Chat-completion client for OpenRouter and OpenAI-compatible endpoints

use super::TextModel;
use crate::config::LlmConfig;
use crate::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Where completions are sent
#[derive(Debug, Clone)]
pub enum LlmProvider {
    OpenRouter {
        api_key: String,
        model: String,
    },
    OpenAI {
        api_key: String,
        model: String,
        base_url: String,
    },
    /// Any OpenAI-compatible server (Ollama, vLLM, ...)
    Compatible {
        api_key: Option<String>,
        model: String,
        base_url: String,
    },
}

impl LlmProvider {
    pub(crate) fn endpoint(&self) -> String {
        let base = match self {
            LlmProvider::OpenRouter { .. } => OPENROUTER_BASE_URL,
            LlmProvider::OpenAI { base_url, .. } | LlmProvider::Compatible { base_url, .. } => {
                base_url.as_str()
            }
        };
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        let key = match self {
            LlmProvider::OpenRouter { api_key, .. } | LlmProvider::OpenAI { api_key, .. } => {
                Some(api_key.as_str())
            }
            LlmProvider::Compatible { api_key, .. } => api_key.as_deref(),
        };
        key.filter(|k| !k.is_empty())
    }

    pub fn model(&self) -> &str {
        match self {
            LlmProvider::OpenRouter { model, .. }
            | LlmProvider::OpenAI { model, .. }
            | LlmProvider::Compatible { model, .. } => model,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// LLM client with generation parameters
pub struct LlmModel {
    http: Client,
    provider: LlmProvider,
    temperature: f64,
    max_tokens: u32,
}

impl LlmModel {
    pub fn new(provider: LlmProvider) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            provider,
            temperature: 0.7,
            max_tokens: 500,
        })
    }

    pub fn openrouter(api_key: String, model: String) -> Result<Self> {
        Self::new(LlmProvider::OpenRouter { api_key, model })
    }

    pub fn with_params(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Build from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let model = config.model.clone();
        let provider = match config.provider.to_lowercase().as_str() {
            "openrouter" => LlmProvider::OpenRouter {
                api_key: config.api_key.clone(),
                model,
            },
            "openai" | "gpt" => LlmProvider::OpenAI {
                api_key: config.api_key.clone(),
                model,
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            },
            "compatible" | "ollama" => LlmProvider::Compatible {
                api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
                model,
                base_url: config.base_url.clone().ok_or_else(|| {
                    BotError::Config("base_url is required for compatible providers".into())
                })?,
            },
            other => {
                return Err(BotError::Config(format!("Unknown LLM provider: {}", other)));
            }
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }
}

#[async_trait]
impl TextModel for LlmModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.provider.model(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = self.provider.endpoint();
        debug!("POST {} model={}", url, request.model);

        let mut req = self.http.post(&url).json(&request);
        if let Some(key) = self.provider.api_key() {
            req = req.bearer_auth(key);
        }

        let resp: ChatResponse = req.send().await?.error_for_status()?.json().await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BotError::Api("Empty LLM response".into()))
    }
}
