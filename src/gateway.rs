//! Explanation backend gateway: routes one request to one backend.
//!
//! Priority, first match wins:
//! 1. YouTube override → cloud video-by-reference, whatever the mode.
//!    If that call fails, one text-only attempt carrying the URL.
//! 2. OnDevice + Text → local model. Unavailable, failed or slow local
//!    generation degrades to the offline placeholder, never an error.
//! 3. Everything else → cloud, prompt and payload shape chosen by kind.
//!
//! Every dispatch is bounded by the request timeout, the YouTube
//! fallback included. The gateway holds no request state; the local
//! availability probe is the only thing it remembers.

use crate::error::ExplainError;
use crate::input::{heuristics, Classification, ContentKind};
use crate::llm::prompts;
use crate::llm::provider::{CloudModel, LocalModel, ProcessingMode};
use crate::settings::Settings;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::OnceCell;

/// MIME type declared for videos the model fetches by URL.
const YOUTUBE_MIME: &str = "video/mp4";

pub struct ExplanationGateway {
    local: Arc<dyn LocalModel>,
    cloud: Arc<dyn CloudModel>,
    request_timeout: Duration,
    probe_timeout: Duration,
    local_ready: OnceCell<bool>,
}

impl ExplanationGateway {
    pub fn new(local: Arc<dyn LocalModel>, cloud: Arc<dyn CloudModel>, settings: &Settings) -> Self {
        Self::with_timeouts(
            local,
            cloud,
            settings.request_timeout,
            settings.local_probe_timeout,
        )
    }

    pub fn with_timeouts(
        local: Arc<dyn LocalModel>,
        cloud: Arc<dyn CloudModel>,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            local,
            cloud,
            request_timeout,
            probe_timeout,
            local_ready: OnceCell::new(),
        }
    }

    /// Produce the Markdown explanation for `request` in `mode`.
    pub async fn dispatch(
        &self,
        request: &Classification,
        mode: ProcessingMode,
    ) -> Result<String, ExplainError> {
        let start = Instant::now();
        log::info!(
            "[GATEWAY] Dispatch {:?} (youtube={}, mode={})",
            request.kind.tag(),
            request.is_youtube(),
            mode.label()
        );

        let result = self.route(request, mode).await;

        match &result {
            Ok(markdown) => log::info!(
                "[GATEWAY] Done in {}ms ({} chars)",
                start.elapsed().as_millis(),
                markdown.len()
            ),
            Err(e) => log::warn!(
                "[GATEWAY] Failed after {}ms: {}",
                start.elapsed().as_millis(),
                e
            ),
        }
        result
    }

    /// Whether the local model answered its readiness probe.
    ///
    /// Probed once, on first use; the answer is kept for the gateway's
    /// lifetime.
    pub async fn local_available(&self) -> bool {
        *self
            .local_ready
            .get_or_init(|| async {
                match tokio::time::timeout(self.probe_timeout, self.local.is_available()).await {
                    Ok(ready) => {
                        log::info!("[GATEWAY] On-device model available: {}", ready);
                        ready
                    }
                    Err(_) => {
                        log::warn!(
                            "[GATEWAY] On-device probe timed out after {}ms",
                            self.probe_timeout.as_millis()
                        );
                        false
                    }
                }
            })
            .await
    }

    async fn route(
        &self,
        request: &Classification,
        mode: ProcessingMode,
    ) -> Result<String, ExplainError> {
        if let Some(url) = &request.youtube {
            return self.explain_youtube(url.as_str()).await;
        }
        match (&request.kind, mode) {
            (ContentKind::Text(body), ProcessingMode::OnDevice) => {
                Ok(self.explain_on_device(body).await)
            }
            (kind, _) => self.explain_in_cloud(kind).await,
        }
    }

    /// Both attempts share one deadline; a timed-out reference call is
    /// not retried.
    async fn explain_youtube(&self, url: &str) -> Result<String, ExplainError> {
        let deadline = Instant::now() + self.request_timeout;
        let prompt = prompts::video_prompt();
        let first = self
            .timed_until(deadline, self.cloud.generate_with_uri(&prompt, url, YOUTUBE_MIME))
            .await;
        match first {
            Ok(markdown) => Ok(markdown),
            Err(ExplainError::Timeout(limit)) => Err(ExplainError::Timeout(limit)),
            Err(e) => {
                log::warn!("[GATEWAY] Video reference failed ({}), retrying as text", e);
                let fallback = prompts::video_link_fallback_prompt(url);
                self.timed_until(deadline, self.cloud.generate_text(&fallback))
                    .await
            }
        }
    }

    async fn explain_on_device(&self, body: &str) -> String {
        match self.generate_on_device(body).await {
            Ok(markdown) => markdown,
            Err(e) => {
                log::warn!("[GATEWAY] On-device: {}, serving placeholder", e);
                prompts::offline_placeholder(body)
            }
        }
    }

    async fn generate_on_device(&self, body: &str) -> Result<String, ExplainError> {
        if !self.local_available().await {
            return Err(ExplainError::Unavailable);
        }
        let prompt = prompts::text_prompt(body);
        log::debug!("[GATEWAY] Local prompt: {}", prompt);
        let markdown = self.timed(self.local.generate(&prompt)).await?;
        if markdown.trim().is_empty() {
            return Err(ExplainError::GenerationFailed(
                "on-device model returned nothing".to_string(),
            ));
        }
        Ok(markdown)
    }

    async fn explain_in_cloud(&self, kind: &ContentKind) -> Result<String, ExplainError> {
        let cloud = self.cloud.as_ref();
        match kind {
            ContentKind::Text(body) => {
                let prompt = prompts::text_prompt(body);
                self.timed(cloud.generate_text(&prompt)).await
            }
            ContentKind::Link(url) => {
                let prompt = prompts::link_prompt(url);
                self.timed(cloud.generate_text(&prompt)).await
            }
            ContentKind::ImageBytes(data) => {
                let prompt = prompts::image_prompt();
                let mime = heuristics::image_mime(data);
                self.timed(cloud.generate_with_data(&prompt, data, mime))
                    .await
            }
            ContentKind::VideoBytes(data) => {
                let prompt = prompts::video_prompt();
                let mime = heuristics::video_mime(data);
                self.timed(cloud.generate_with_data(&prompt, data, mime))
                    .await
            }
            ContentKind::Document {
                data,
                media_type,
                file_name,
            } => {
                let prompt = prompts::document_prompt(file_name);
                self.timed(cloud.generate_with_data(&prompt, data, media_type))
                    .await
            }
            ContentKind::Code {
                source,
                file_name,
                language,
            } => {
                let prompt = prompts::code_prompt(file_name, language, source);
                self.timed(cloud.generate_text(&prompt)).await
            }
        }
    }

    async fn timed<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, ExplainError>
    where
        E: Into<ExplainError>,
    {
        self.timed_until(Instant::now() + self.request_timeout, call)
            .await
    }

    async fn timed_until<T, E>(
        &self,
        deadline: Instant,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, ExplainError>
    where
        E: Into<ExplainError>,
    {
        match tokio::time::timeout_at(deadline, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(ExplainError::Timeout(self.request_timeout)),
        }
    }
}
