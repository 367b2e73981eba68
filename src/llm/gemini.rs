//! Google Gemini provider implementation

use super::types::ChatRequest;
use super::{ChatService, LlmError};
use crate::health_prompt::{build_health_prompt, clean_markdown};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(api_key: String, url: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unavailable(format!("Failed to create HTTP client: {e}")))?;

        let model_id = model_from_url(&url).unwrap_or("gemini").to_string();

        Ok(Self {
            client,
            api_key,
            url,
            model_id,
        })
    }

    fn translate_request(request: &ChatRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: build_health_prompt(request),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.9,
                top_k: 50,
                top_p: 0.95,
                max_output_tokens: 1024,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| GeminiSafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
                })
                .collect(),
        }
    }

    fn extract_text(resp: GeminiResponse) -> Result<String, LlmError> {
        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .unwrap_or_default();

        let cleaned = clean_markdown(&text);
        if cleaned.is_empty() {
            return Err(LlmError::bad_response("No text generated"));
        }
        Ok(cleaned)
    }
}

/// `.../models/<model>:generateContent` -> `<model>`
fn model_from_url(url: &str) -> Option<&str> {
    let tail = url.rsplit('/').next()?;
    tail.split(':').next().filter(|m| !m.is_empty())
}

fn validate(request: &ChatRequest) -> Result<(), LlmError> {
    if request.message.trim().is_empty() {
        return Err(LlmError::invalid_request("Missing message"));
    }
    if !request.age.is_finite() || !(0.0..=crate::age::MAX_AGE_YEARS).contains(&request.age) {
        return Err(LlmError::invalid_request("Age must be between 0 and 120"));
    }
    Ok(())
}

#[async_trait]
impl ChatService for GeminiService {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        validate(request)?;
        let gemini_request = Self::translate_request(request);

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::new(super::LlmErrorKind::Unknown, format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {}", e.without_url())))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |error_resp| error_resp.error.message);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::bad_response(format!("Failed to parse response: {e}")))?;

        Self::extract_text(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
