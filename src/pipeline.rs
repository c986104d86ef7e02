//! Explanation pipeline: one orchestrator per shared item.
//!
//! The orchestrator owns the request, the processing mode, the session
//! cache and the history latch, and publishes a single observable
//! [`ExplanationState`]:
//!
//!   Idle → Loading → Result | Error
//!   Error → Loading          (retry)
//!   Result | Error → Loading (mode change, refresh)
//!
//! State and cache writes happen under the session lock. The gateway call
//! and the history write run outside it. Gateway calls are stamped with a
//! generation token so a slow response can never overwrite a newer one.

use crate::cache::SessionCache;
use crate::error::ExplainError;
use crate::gateway::ExplanationGateway;
use crate::history::{HistoryRecord, HistoryStore};
use crate::input::{classify, Classification, ContentKind};
use crate::llm::provider::ProcessingMode;
use crate::llm::types::ExplanationResult;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// What an observer sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationState {
    Idle,
    Loading { label: String },
    Result(ExplanationResult),
    Error { message: String },
}

impl ExplanationState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ExplanationState::Loading { .. })
    }
}

/// Progress text shown while a request is in flight.
pub fn loading_label(kind: &ContentKind) -> &'static str {
    match kind {
        ContentKind::Text(_) => "Processing...",
        ContentKind::Link(_) => "Reading Link...",
        ContentKind::ImageBytes(_) => "Analyzing Image...",
        ContentKind::VideoBytes(_) => "Analyzing Video...",
        ContentKind::Document { .. } => "Reading Document...",
        ContentKind::Code { .. } => "Reviewing Code...",
    }
}

struct Session {
    request: Option<Arc<Classification>>,
    mode: ProcessingMode,
    cache: SessionCache,
    /// One-shot latch: at most one history record per request.
    history_saved: bool,
    generation: u64,
    dismissed: bool,
    display_input: String,
}

/// Drives one explanation request through the gateway.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Orchestrator {
    session: Arc<Mutex<Session>>,
    gateway: Arc<ExplanationGateway>,
    history: Arc<dyn HistoryStore>,
    state: Arc<watch::Sender<ExplanationState>>,
}

impl Orchestrator {
    /// Orchestrator for a freshly shared item. `None` means nothing usable
    /// was shared; `start` then reports "No input found.".
    pub fn new(
        kind: Option<ContentKind>,
        gateway: Arc<ExplanationGateway>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let request = kind.map(|k| Arc::new(classify(k)));
        let (mode, display_input) = match &request {
            Some(r) => (r.default_mode(), r.kind.display_input()),
            None => (ProcessingMode::Cloud, String::new()),
        };
        if let Some(r) = &request {
            log::info!(
                "[PIPELINE] New request {:?}, mode {}",
                r.kind.tag(),
                mode.label()
            );
        }
        Self::build(
            Session {
                request,
                mode,
                cache: SessionCache::new(),
                history_saved: false,
                generation: 0,
                dismissed: false,
                display_input,
            },
            ExplanationState::Idle,
            gateway,
            history,
        )
    }

    /// Orchestrator showing a saved explanation.
    ///
    /// Starts in `Result`, never calls the gateway for the restored
    /// content and never appends to history again.
    pub fn from_history(
        record: &HistoryRecord,
        gateway: Arc<ExplanationGateway>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let mode = if record.used_cloud {
            ProcessingMode::Cloud
        } else {
            ProcessingMode::OnDevice
        };
        log::info!("[PIPELINE] Restored {} from history", record.id);
        Self::build(
            Session {
                request: None,
                mode,
                cache: SessionCache::new(),
                history_saved: true,
                generation: 0,
                dismissed: false,
                display_input: record.original_input_summary.clone(),
            },
            ExplanationState::Result(ExplanationResult::new(record.result_markdown.as_str())),
            gateway,
            history,
        )
    }

    fn build(
        session: Session,
        initial: ExplanationState,
        gateway: Arc<ExplanationGateway>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            session: Arc::new(Mutex::new(session)),
            gateway,
            history,
            state: Arc::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: ExplanationState) {
        self.state.send_replace(state);
    }

    /// Watch state changes. Receivers do not keep the orchestrator alive.
    pub fn subscribe(&self) -> watch::Receiver<ExplanationState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ExplanationState {
        self.state.borrow().clone()
    }

    pub fn mode(&self) -> ProcessingMode {
        self.lock().mode
    }

    pub fn shows_mode_picker(&self) -> bool {
        self.lock()
            .request
            .as_ref()
            .is_some_and(|r| r.shows_mode_picker())
    }

    /// Summary of the input shown above the explanation.
    pub fn display_input(&self) -> String {
        self.lock().display_input.clone()
    }

    /// Produce an explanation for the current mode.
    ///
    /// A cached result for the mode is shown without a gateway call.
    /// Otherwise the gateway runs and, on success, the result is cached
    /// and saved to history unless this request already saved one.
    pub async fn start(&self) {
        let (request, mode, generation) = {
            let mut session = self.lock();
            if session.dismissed {
                log::debug!("[PIPELINE] start ignored, orchestrator dismissed");
                return;
            }
            let Some(request) = session.request.clone() else {
                self.publish(ExplanationState::Error {
                    message: ExplainError::EmptyInput.user_message(),
                });
                return;
            };

            session.generation += 1;
            if let Some(markdown) = session.cache.get(session.mode) {
                log::info!("[PIPELINE] Cache hit ({})", session.mode.label());
                self.publish(ExplanationState::Result(ExplanationResult::new(markdown)));
                return;
            }

            self.publish(ExplanationState::Loading {
                label: loading_label(&request.kind).to_string(),
            });
            (request, session.mode, session.generation)
        };

        let outcome = self.gateway.dispatch(&request, mode).await;

        let markdown = {
            let mut session = self.lock();
            if session.dismissed || session.generation != generation {
                log::info!(
                    "[PIPELINE] Dropping stale result (generation {} superseded)",
                    generation
                );
                return;
            }

            match outcome {
                Ok(markdown) => {
                    session.cache.insert(mode, markdown.clone());
                    self.publish(ExplanationState::Result(ExplanationResult::new(
                        markdown.as_str(),
                    )));
                    if session.history_saved {
                        return;
                    }
                    // Claimed now, released again if the write fails.
                    session.history_saved = true;
                    markdown
                }
                Err(e) => {
                    log::warn!("[PIPELINE] Explanation failed: {}", e);
                    self.publish(ExplanationState::Error {
                        message: e.user_message(),
                    });
                    return;
                }
            }
        };

        self.save_to_history(request, markdown, mode).await;
    }

    /// Thumbnailing and the file rewrite run on the blocking pool, with
    /// the session unlocked.
    async fn save_to_history(
        &self,
        request: Arc<Classification>,
        markdown: String,
        mode: ProcessingMode,
    ) {
        let history = Arc::clone(&self.history);
        let saved = tokio::task::spawn_blocking(move || {
            let record = HistoryRecord::new(&request.kind, &markdown, mode.is_cloud());
            history.append(record)
        })
        .await;

        let failure = match saved {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("history task failed: {}", e),
        };
        log::error!("[PIPELINE] History save failed: {}", failure);
        self.lock().history_saved = false;
    }

    pub async fn retry(&self) {
        self.start().await;
    }

    /// Forget cached results and run again.
    pub async fn refresh(&self) {
        self.lock().cache.clear();
        self.start().await;
    }

    /// Change the processing mode and run in it.
    ///
    /// Inputs with a fixed mode (anything but plain text) ignore this.
    pub async fn switch_mode(&self, mode: ProcessingMode) {
        {
            let mut session = self.lock();
            let allowed = session
                .request
                .as_ref()
                .is_some_and(|r| r.shows_mode_picker());
            if !allowed {
                log::warn!(
                    "[PIPELINE] Mode switch to {} ignored, mode is fixed",
                    mode.label()
                );
                return;
            }
            session.mode = mode;
        }
        self.start().await;
    }

    /// Close the session. An in-flight call that completes afterwards
    /// writes neither state, cache nor history.
    pub fn dismiss(&self) {
        let mut session = self.lock();
        session.dismissed = true;
        session.generation += 1;
        log::debug!("[PIPELINE] Dismissed");
    }
}
