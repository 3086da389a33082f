use std::sync::Arc;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, error};

use crate::config::Credentials;
use crate::retry::RetryPolicy;

pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Anthropic,
    OpenAi,
}

impl Backend {
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Backend::Anthropic
        } else {
            Backend::OpenAi
        }
    }
}

/// One stateless completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest<'_> {
    /// Single user turn; both APIs accept this shape
    fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                {
                    "role": "user",
                    "content": self.prompt
                }
            ]
        })
    }
}

/// HTTP client for the Anthropic Messages and OpenAI Chat Completions APIs
pub struct LlmClient {
    http: reqwest::Client,
    backend: Backend,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmClient {
    pub fn new(http: reqwest::Client, model: &str, credentials: &Credentials) -> Result<Self> {
        let backend = Backend::for_model(model);
        let api_key = match backend {
            Backend::Anthropic => credentials.anthropic_api_key.clone().ok_or_else(|| {
                eyre::eyre!("ANTHROPIC_API_KEY (or CLAUDE_API_KEY) not set (required for model {model})")
            })?,
            Backend::OpenAi => credentials
                .openai_api_key
                .clone()
                .ok_or_else(|| eyre::eyre!("OPENAI_API_KEY not set (required for model {model})"))?,
        };
        Ok(Self {
            http,
            backend,
            model: model.to_string(),
            api_key,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self.request(prompt).body();
        debug!("Generating with {} ({} prompt chars)", self.model, prompt.chars().count());

        let builder = match self.backend {
            Backend::Anthropic => self
                .http
                .post(ANTHROPIC_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01"),
            Backend::OpenAi => self.http.post(OPENAI_URL).bearer_auth(&self.api_key),
        };

        let resp = builder
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("{:?} API returned {status}: {body}", self.backend);
        }

        let json: serde_json::Value = resp.json().await?;
        match self.backend {
            Backend::Anthropic => extract_anthropic_text(&json),
            Backend::OpenAi => extract_openai_text(&json),
        }
    }
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    let text = json
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|blocks| {
            blocks.iter().find_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str()
                } else {
                    None
                }
            })
        })
        .filter(|t| !t.trim().is_empty());
    match text {
        Some(t) => Ok(t.to_string()),
        None => bail!("unexpected Anthropic API response format"),
    }
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}

/// Generation with pacing and bounded retry. Never fails: exhaustion yields `None`.
#[derive(Clone)]
pub struct ResilientGenerator {
    inner: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
}

impl ResilientGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub async fn generate(&self, prompt: &str) -> Option<String> {
        let result = self
            .policy
            .run("generation", || async move { self.inner.generate(prompt).await })
            .await;
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                error!(
                    "generation failed after {} attempts: {e}",
                    self.policy.attempts()
                );
                None
            }
        }
    }
}
