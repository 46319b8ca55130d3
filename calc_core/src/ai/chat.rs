//! Streaming chat client for the shop assistant.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::quiz::{Quiz, QuizRequest};
use super::sse::{SseEvent, SseParser};
use crate::errors::{CalcError, CalcResult};

/// Current application version (from Cargo.toml)
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const CHAT_FUNCTION: &str = "cnc-ai-chat";
const QUIZ_FUNCTION: &str = "cnc-quiz";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Map a non-success gateway status to an error.
///
/// Returns `None` for 2xx. The body's `error` field, when present, becomes
/// the message.
pub fn status_error(status: u16, body: &str) -> Option<CalcError> {
    if (200..300).contains(&status) {
        return None;
    }
    let error = match status {
        429 => CalcError::RateLimited,
        402 => CalcError::QuotaExceeded,
        _ => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| {
                    let trimmed = body.trim();
                    if trimmed.is_empty() {
                        format!("Gateway returned HTTP {}", status)
                    } else {
                        trimmed.to_string()
                    }
                });
            CalcError::Gateway { status, message }
        }
    };
    Some(error)
}

fn network_error(e: reqwest::Error) -> CalcError {
    CalcError::Network { reason: e.to_string() }
}

/// Client for the hosted assistant functions.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> CalcResult<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(CalcError::missing_field("backend_url"));
        }
        let http = reqwest::Client::builder()
            .user_agent(format!("Shopfloor/{}", CURRENT_VERSION))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(network_error)?;
        Ok(ChatClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// `{base}/functions/v1/{name}`
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    async fn post(&self, function: &str, body: serde_json::Value) -> CalcResult<reqwest::Response> {
        let url = self.function_url(function);
        tracing::debug!(%url, "gateway request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let error = status_error(status, &text).unwrap_or(CalcError::Gateway {
            status,
            message: text,
        });
        tracing::warn!(%url, status, error = %error, "gateway request failed");
        Err(error)
    }

    /// Send the conversation and stream the reply.
    ///
    /// `on_delta` is called with each text piece as it arrives; the full
    /// reply is returned once the stream ends.
    pub async fn stream_chat<F>(&self, messages: &[ChatMessage], mut on_delta: F) -> CalcResult<String>
    where
        F: FnMut(&str),
    {
        if messages.is_empty() {
            return Err(CalcError::missing_field("messages"));
        }
        let response = self.post(CHAT_FUNCTION, json!({ "messages": messages })).await?;

        let mut parser = SseParser::new();
        let mut reply = String::new();
        let mut stream = response.bytes_stream();

        let mut handle = |events: Vec<SseEvent>, reply: &mut String| {
            for event in events {
                if let SseEvent::Delta(text) = event {
                    on_delta(&text);
                    reply.push_str(&text);
                }
            }
        };

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(network_error)?;
            handle(parser.push_bytes(&chunk), &mut reply);
            if parser.is_done() {
                break;
            }
        }
        handle(parser.finish(), &mut reply);

        tracing::debug!(chars = reply.chars().count(), "chat reply complete");
        Ok(reply)
    }

    /// Ask the quiz function for a new quiz.
    pub async fn generate_quiz(&self, request: &QuizRequest) -> CalcResult<Quiz> {
        request.validate()?;
        let response = self.post(QUIZ_FUNCTION, serde_json::to_value(request)?).await?;
        let text = response.text().await.map_err(network_error)?;
        Quiz::from_gateway_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(status_error(200, "").is_none());
        assert_eq!(status_error(429, ""), Some(CalcError::RateLimited));
        assert_eq!(status_error(402, ""), Some(CalcError::QuotaExceeded));
        assert_eq!(
            status_error(500, r#"{"error":"model overloaded"}"#),
            Some(CalcError::Gateway {
                status: 500,
                message: "model overloaded".to_string()
            })
        );
        assert_eq!(
            status_error(503, ""),
            Some(CalcError::Gateway {
                status: 503,
                message: "Gateway returned HTTP 503".to_string()
            })
        );
    }

    #[test]
    fn test_function_url() {
        let client = ChatClient::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(
            client.function_url("cnc-ai-chat"),
            "https://example.supabase.co/functions/v1/cnc-ai-chat"
        );
        assert!(ChatClient::new("  ", "key").is_err());
    }

    #[test]
    fn test_message_json_shape() {
        let json = serde_json::to_value(ChatMessage::user("Hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Hi"}));
    }

    #[tokio::test]
    async fn test_empty_conversation_rejected() {
        let client = ChatClient::new("http://127.0.0.1:9", "key").unwrap();
        let err = client.stream_chat(&[], |_| {}).await.unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }
}
