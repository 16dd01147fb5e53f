use crate::error::{RepoPulseError, Result};
use crate::insight::Usage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.3;
const SYSTEM_PROMPT: &str = "You write concise, technical engineering summaries.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// gpt-4o-mini list price per prompt token, USD
const PROMPT_RATE: f64 = 0.15 / 1_000_000.0;
/// gpt-4o-mini list price per completion token, USD
const COMPLETION_RATE: f64 = 0.60 / 1_000_000.0;

/// OpenAI chat-completions client
pub struct OpenAiClient {
    api_key: String,
    client: Client,
    model: String,
}

/// Generated text plus the provider-reported usage counters
#[derive(Debug)]
pub struct Completion {
    pub content: String,
    pub usage: Usage,
}

impl OpenAiClient {
    /// Create a new OpenAI API client
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            client,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one completion over the assembled prompt
    ///
    /// Low fixed temperature keeps runs comparable. No retries: a non-success
    /// response surfaces verbatim as a typed error.
    pub async fn complete(&self, prompt: String) -> Result<Completion> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
        };

        debug!(model = %self.model, "requesting completion");

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RepoPulseError::openai_api(status, message));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(Completion {
            content,
            usage: body.usage.unwrap_or_default(),
        })
    }
}

/// Monetary cost of a generation at list price, rounded to six decimals
pub fn compute_cost(usage: &Usage) -> f64 {
    let raw = usage.prompt_tokens as f64 * PROMPT_RATE
        + usage.completion_tokens as f64 * COMPLETION_RATE;
    (raw * 1_000_000.0).round() / 1_000_000.0
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}
