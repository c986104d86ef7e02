//! Model capability traits: the common interface for both backends.
//!
//! The gateway only ever talks to these traits. Which implementation sits
//! behind them (llama.cpp, Gemini, a test fake) is decided once at startup.

use crate::error::{CloudModelError, LocalModelError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where an explanation is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessingMode {
    /// Local inference only.
    OnDevice,
    /// Network dispatch to the hosted model.
    Cloud,
}

impl ProcessingMode {
    pub fn is_cloud(self) -> bool {
        self == ProcessingMode::Cloud
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessingMode::OnDevice => "On-Device",
            ProcessingMode::Cloud => "Cloud",
        }
    }
}

/// On-device language model.
#[async_trait]
pub trait LocalModel: Send + Sync {
    /// Whether the model is loaded and ready. Probed once by the gateway.
    async fn is_available(&self) -> bool;

    async fn generate(&self, prompt: &str) -> Result<String, LocalModelError>;
}

/// Hosted language model, one entry point per payload shape.
#[async_trait]
pub trait CloudModel: Send + Sync {
    /// Prompt text only.
    async fn generate_text(&self, prompt: &str) -> Result<String, CloudModelError>;

    /// Prompt plus inline bytes with a declared MIME type.
    async fn generate_with_data(
        &self,
        prompt: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<String, CloudModelError>;

    /// Prompt plus a remote reference the model fetches itself.
    async fn generate_with_uri(
        &self,
        prompt: &str,
        uri: &str,
        mime_type: &str,
    ) -> Result<String, CloudModelError>;
}

/// Provider metadata for settings and diagnostics output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub mode: ProcessingMode,
    pub env_key: Option<String>,
}

/// All known providers and their display info.
pub fn all_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            id: "local".to_string(),
            name: "On-Device (private, works offline)".to_string(),
            mode: ProcessingMode::OnDevice,
            env_key: None,
        },
        ProviderInfo {
            id: "gemini".to_string(),
            name: "Gemini Flash (images, video, documents, code)".to_string(),
            mode: ProcessingMode::Cloud,
            env_key: Some("GEMINI_API_KEY".to_string()),
        },
    ]
}
