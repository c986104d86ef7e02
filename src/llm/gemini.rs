//! Gemini cloud model: non-streaming `generateContent` via Google AI API.
//!
//! One request shape covers all three payload kinds; only the `parts`
//! array differs:
//! - text:       [{text}]
//! - inline:     [{text}, {inlineData: {mimeType, data(base64)}}]
//! - reference:  [{fileData: {mimeType, fileUri}}, {text}]
//!
//! Key differences from the streaming providers:
//! - API key in URL query param, not header
//! - The whole response arrives at once; text is the concatenation of
//!   `candidates[0].content.parts[*].text`
//! - Upstream error messages (`error.message`) are passed through verbatim

use super::provider::CloudModel;
use crate::error::CloudModelError;
use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MAX_TOKENS: u32 = 8192;

/// Hosted Gemini model.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, parts: Vec<Value>, label: &str) -> Result<String, CloudModelError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            log::warn!("[GEMINI] No GEMINI_API_KEY set, cannot dispatch {}", label);
            CloudModelError::MissingApiKey
        })?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );
        log::info!("[GEMINI] Request ({}) to model {}", label, self.model);

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&json!({
                "contents": [{ "role": "user", "parts": parts }],
                "generationConfig": { "maxOutputTokens": GEMINI_MAX_TOKENS }
            }))
            .send()
            .await
            .map_err(|e| {
                log::error!("[GEMINI] HTTP request failed: {}", e);
                CloudModelError::Http(e.without_url().to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CloudModelError::Http(e.without_url().to_string()))?;
        log::info!("[GEMINI] {} in {}ms ({})", status, start.elapsed().as_millis(), label);

        if !status.is_success() {
            let message = extract_error_message(&body)
                .unwrap_or_else(|| format!("Gemini API returned {}", status));
            log::error!("[GEMINI] API error {}: {}", status, message);
            return Err(CloudModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = extract_text(&body)?;
        log::debug!("[GEMINI] Response ({} chars): {}", text.len(), text);
        Ok(text)
    }
}

#[async_trait]
impl CloudModel for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, CloudModelError> {
        self.generate(vec![json!({ "text": prompt })], "text").await
    }

    async fn generate_with_data(
        &self,
        prompt: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<String, CloudModelError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        log::info!("[GEMINI] Inline payload: {} bytes, {}", data.len(), mime_type);
        self.generate(
            vec![
                json!({ "text": prompt }),
                json!({ "inlineData": { "mimeType": mime_type, "data": encoded } }),
            ],
            mime_type,
        )
        .await
    }

    async fn generate_with_uri(
        &self,
        prompt: &str,
        uri: &str,
        mime_type: &str,
    ) -> Result<String, CloudModelError> {
        log::info!("[GEMINI] File reference: {}", uri);
        self.generate(
            vec![
                json!({ "fileData": { "mimeType": mime_type, "fileUri": uri } }),
                json!({ "text": prompt }),
            ],
            "file reference",
        )
        .await
    }
}

/// Concatenate text parts of the first candidate.
///
/// Gemini format: candidates[0].content.parts[*].text
fn extract_text(body: &str) -> Result<String, CloudModelError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| CloudModelError::InvalidResponse(e.to_string()))?;
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array);

    let text: String = parts
        .into_iter()
        .flatten()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        if let Some(reason) = json
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str)
        {
            log::warn!("[GEMINI] Prompt blocked: {}", reason);
        }
        return Err(CloudModelError::EmptyResponse);
    }
    Ok(text)
}

/// Pull `error.message` out of a Gemini error body.
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}
