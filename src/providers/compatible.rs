//! OpenAI-compatible chat completions client.
//!
//! Groq and OpenAI both expose `POST {base}/chat/completions` with the same
//! request/response shape, so one client covers both.

use super::traits::Provider;
use super::sanitize_api_error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Content returned when the provider answers without any text.
pub const EMPTY_COMPLETION: &str = "No response generated.";

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
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: &str,
        base_url: &str,
        api_key: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            max_tokens,
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat_with_system(
        &self,
        system_prompt: Option<&str>,
        message: &str,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: message,
        });

        let body = ChatRequest {
            model,
            messages,
            temperature,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "{} API error ({status}): {}",
                self.name,
                sanitize_api_error(&text)
            );
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION.to_string());

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            "groq",
            &server.uri(),
            "gsk_test",
            1024,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn completions_url_strips_trailing_slash() {
        let p = OpenAiCompatibleProvider::new(
            "openai",
            "https://api.openai.com/v1/",
            "k",
            150,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(p.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn chat_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "max_tokens": 1024,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  hello!  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .chat_with_system(Some("be brief"), "hi", "llama-3.1-8b-instant", 0.7)
            .await
            .unwrap();
        assert_eq!(reply, "hello!");
    }

    #[tokio::test]
    async fn chat_without_system_prompt_sends_only_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"role": "user", "content": "ping"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "pong"}}]
            })))
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .chat_with_system(None, "ping", "m", 0.0)
            .await
            .unwrap();
        assert_eq!(reply, "pong");
    }

    #[tokio::test]
    async fn empty_choices_yield_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let reply = provider_for(&server)
            .chat_with_system(None, "x", "m", 0.7)
            .await
            .unwrap();
        assert_eq!(reply, EMPTY_COMPLETION);
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key gsk_abcdef123"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .chat_with_system(None, "x", "m", 0.7)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("401"));
        assert!(err.contains("groq"));
        assert!(!err.contains("gsk_abcdef123"));
    }
}
