/// LLM Client — the single point of entry for all hosted-model calls.
///
/// ARCHITECTURAL RULE: No other module may call the AI gateway directly.
/// All model interactions MUST go through this module.
///
/// The gateway speaks the chat-completions wire format and fronts a
/// vision-capable model, so both text-only and text+image requests share
/// one request shape.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The model used for all calls. Intentionally hardcoded to prevent drift.
pub const MODEL: &str = "google/gemini-2.5-flash";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM response contained no JSON object")]
    NoJsonObject,
}

/// One part of a multimodal user turn.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// An image or document reference, as a data URL or a fetchable URL.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    error: GatewayErrorBody,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the chat-completions gateway with retry logic and JSON-extraction helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    gateway_url: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(gateway_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            gateway_url,
            api_key,
        }
    }

    /// Text-only call: optional system instruction plus one user turn.
    /// Returns the assistant's text content.
    pub async fn chat(
        &self,
        system: Option<&str>,
        user: &str,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::new();
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(system.to_string()),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: MessageContent::Text(user.to_string()),
        });
        self.send(messages, temperature).await
    }

    /// Multimodal call: one user turn made of text and image parts.
    /// Used for document parsing (raw bytes as a data URL) and photo detection.
    pub async fn chat_multimodal(
        &self,
        parts: Vec<ContentPart>,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let messages = vec![ChatMessage {
            role: "user",
            content: MessageContent::Parts(parts),
        }];
        self.send(messages, temperature).await
    }

    /// Makes the gateway call, retrying on 429 and 5xx with exponential backoff.
    async fn send(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages,
            temperature,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.gateway_url)
                .header("authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("AI gateway returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GatewayError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            let content = chat_response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or(LlmError::EmptyContent)?;

            debug!("LLM call succeeded ({} chars)", content.len());

            return Ok(content);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Extracts the first balanced `{...}` object from model output.
///
/// Models wrap JSON in prose or code fences; the contract is to take the first
/// balanced brace-delimited substring and parse that. Brace counting ignores
/// braces inside JSON string literals and escaped quotes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        let input = r#"{"key": "value"}"#;
        assert_eq!(extract_json_object(input), Some(r#"{"key": "value"}"#));
    }

    #[test]
    fn test_extract_from_code_fence() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_object(input), Some("{\"key\": \"value\"}"));
    }

    #[test]
    fn test_extract_from_surrounding_prose() {
        let input = "Here is the structured CV you asked for:\n{\"name\": \"Ada\"}\nLet me know if you need anything else.";
        assert_eq!(extract_json_object(input), Some("{\"name\": \"Ada\"}"));
    }

    #[test]
    fn test_extract_nested_object() {
        let input = r#"sure: {"contact": {"email": "a@b.c"}, "name": "Ada"} done"#;
        assert_eq!(
            extract_json_object(input),
            Some(r#"{"contact": {"email": "a@b.c"}, "name": "Ada"}"#)
        );
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let input = r#"{"summary": "worked on {cool} stuff \" really"}"#;
        assert_eq!(extract_json_object(input), Some(input));
    }

    #[test]
    fn test_no_object_returns_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("unbalanced { oops"), None);
    }

    #[test]
    fn test_content_part_serialization() {
        let part = ContentPart::image_url("data:image/png;base64,AAAA");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,AAAA");
    }
}
