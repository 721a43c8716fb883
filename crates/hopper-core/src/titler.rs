//! Short titles for new items.
//!
//! Title generation is best effort: a network-backed generator asks an
//! OpenAI-compatible chat endpoint for a title and falls back to a truncated
//! description on any failure.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::TitleSettings;

pub const FALLBACK_TITLE_LENGTH: usize = 60;

const SYSTEM_PROMPT: &str = "Generate a concise, action-oriented title (max 8 words) \
    for this work item. Respond with only the title.";

pub trait TitleGenerator {
    /// Always returns a non-empty title.
    fn generate_title(&self, description: &str) -> String;
}

/// First 60 characters of the description, trimmed.
pub fn fallback_title(description: &str) -> String {
    let truncated: String = description.chars().take(FALLBACK_TITLE_LENGTH).collect();
    let trimmed = truncated.trim();
    if trimmed.is_empty() {
        "(untitled)".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TruncatingTitler;

impl TitleGenerator for TruncatingTitler {
    fn generate_title(&self, description: &str) -> String {
        fallback_title(description)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TitlePayload {
    title: String,
}

pub struct OpenAiTitler {
    /// `None` when the HTTP client could not be built; titles then fall back.
    client: Option<Client>,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiTitler {
    pub fn new(settings: &TitleSettings, api_key: impl Into<String>) -> Self {
        let client = match Client::builder().timeout(settings.timeout).build() {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "failed to build HTTP client; titles will be truncated");
                None
            }
        };
        Self {
            client,
            api_key: api_key.into(),
            model: settings.model.clone(),
            endpoint: format!("{}/chat/completions", settings.api_base),
        }
    }

    fn request_title(&self, description: &str) -> Result<String, String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| "no HTTP client".to_string())?;
        let messages = [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: description,
            },
        ];
        let body = json!({
            "model": self.model,
            "messages": messages,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "title_response",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string",
                                "description": "A concise, action-oriented title (max 8 words)"
                            }
                        },
                        "required": ["title"],
                        "additionalProperties": false
                    }
                }
            }
        });

        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|err| format!("request failed: {err}"))?;
        if !response.status().is_success() {
            return Err(format!("title API error: {}", response.status()));
        }
        let parsed: ChatResponse = response
            .json()
            .map_err(|err| format!("malformed response: {err}"))?;
        parse_title_content(&parsed)
    }
}

fn parse_title_content(response: &ChatResponse) -> Result<String, String> {
    let content = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .ok_or_else(|| "response has no content".to_string())?;
    let payload: TitlePayload =
        serde_json::from_str(content).map_err(|err| format!("malformed title payload: {err}"))?;
    let title = payload.title.trim();
    if title.is_empty() {
        return Err("empty title".to_string());
    }
    Ok(title.to_string())
}

impl TitleGenerator for OpenAiTitler {
    fn generate_title(&self, description: &str) -> String {
        match self.request_title(description) {
            Ok(title) => {
                debug!(model = %self.model, "generated title");
                title
            }
            Err(err) => {
                warn!(error = %err, "title generation failed; using truncated description");
                fallback_title(description)
            }
        }
    }
}

/// Network titles need both an API key and titles left enabled.
pub fn title_generator(settings: &TitleSettings) -> Box<dyn TitleGenerator> {
    match (&settings.api_key, settings.enabled) {
        (Some(key), true) => Box::new(OpenAiTitler::new(settings, key.clone())),
        _ => Box::new(TruncatingTitler),
    }
}
