/// OpenAI-compatible chat-completions judge for pairwise relevance comparisons.
use std::time::Duration;

use async_trait::async_trait;
use pairrank_core::{Candidate, Judge, JudgeError, Winner};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parse::parse_verdict;
use crate::prompt::build_prompt;

/// Configuration for the LLM endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f64,
    /// Extra attempts after a retryable failure. 0 disables retries.
    pub max_retries: usize,
    pub retry_delay: Duration,
}

/// The verdict is a single digit; anything longer is wasted spend.
const MAX_VERDICT_TOKENS: u32 = 10;

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

pub struct LlmJudge {
    client: Client,
    config: LlmConfig,
}

impl LlmJudge {
    pub fn new(client: Client, config: LlmConfig) -> Self {
        LlmJudge { client, config }
    }

    /// Send one HTTP request and parse the verdict out of the reply.
    async fn send_comparison_request(&self, prompt: &str) -> Result<Winner, JudgeError> {
        let config = &self.config;
        let request = ChatCompletionRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: config.temperature,
            max_tokens: MAX_VERDICT_TOKENS,
        };

        let url = format!("{}/v1/chat/completions", config.endpoint.trim_end_matches('/'));

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(ref key) = config.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let resp = req_builder
            .send()
            .await
            .map_err(|e| JudgeError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status,
                body: truncate(&body, 200),
            });
        }

        let data: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| JudgeError::InvalidResponse(e.to_string()))?;

        let content = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| JudgeError::InvalidResponse("no choices in response".into()))?
            .message
            .content
            .unwrap_or_default();

        parse_verdict(&content).ok_or_else(|| JudgeError::Unparseable(truncate(&content, 200)))
    }
}

#[async_trait]
impl Judge for LlmJudge {
    /// Retries up to `max_retries` times on network errors, 429 and 5xx.
    /// An unparseable verdict is returned as-is; asking again costs money
    /// and the comparator already has a fallback.
    async fn judge(&self, a: &Candidate, b: &Candidate, query: &str) -> Result<Winner, JudgeError> {
        let prompt = build_prompt(query, a, b);
        let max_retries = self.config.max_retries;

        let mut attempt = 0;
        loop {
            match self.send_comparison_request(&prompt).await {
                Ok(winner) => return Ok(winner),
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    debug!(a = %a.id, b = %b.id, attempt, max_retries, error = %err, "retrying comparison");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
