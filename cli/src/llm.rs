//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use propdocx::{GenerationError, GenerationRequest, TextGenerator};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Text generator backed by a chat-completions HTTP endpoint.
pub struct ChatCompletionsGenerator {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl ChatCompletionsGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
            runtime,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        log::debug!("POST {} (model {})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        parse_completion(status, &text)
    }
}

impl TextGenerator for ChatCompletionsGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.runtime.block_on(self.complete(request))
    }
}

fn map_transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Upstream(e.to_string())
    }
}

/// Map an HTTP status and body to generated text or an upstream error.
fn parse_completion(status: StatusCode, body: &str) -> Result<String, GenerationError> {
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::PAYMENT_REQUIRED {
        return Err(GenerationError::QuotaExceeded);
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return Err(GenerationError::Timeout);
    }
    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        return Err(GenerationError::Upstream(format!("HTTP {}: {}", status, snippet)));
    }

    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Upstream(format!("unexpected response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_ok() {
        let body = r###"{"choices":[{"message":{"role":"assistant","content":"## Summary"}}]}"###;
        assert_eq!(parse_completion(StatusCode::OK, body).unwrap(), "## Summary");
    }

    #[test]
    fn test_parse_completion_empty() {
        let body = r#"{"choices":[{"message":{"content":"  "}}]}"#;
        assert_eq!(
            parse_completion(StatusCode::OK, body),
            Err(GenerationError::EmptyResponse)
        );
        assert_eq!(
            parse_completion(StatusCode::OK, r#"{"choices":[]}"#),
            Err(GenerationError::EmptyResponse)
        );
    }

    #[test]
    fn test_parse_completion_errors() {
        assert_eq!(
            parse_completion(StatusCode::TOO_MANY_REQUESTS, "{}"),
            Err(GenerationError::QuotaExceeded)
        );
        assert_eq!(
            parse_completion(StatusCode::GATEWAY_TIMEOUT, ""),
            Err(GenerationError::Timeout)
        );
        assert!(matches!(
            parse_completion(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            Err(GenerationError::Upstream(msg)) if msg.contains("boom")
        ));
        assert!(matches!(
            parse_completion(StatusCode::OK, "not json"),
            Err(GenerationError::Upstream(_))
        ));
    }
}
