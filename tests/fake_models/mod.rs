//! Scripted model backends for integration tests.
//!
//! Both fakes record every call so tests can assert on routing, prompt
//! content and call counts. Delays use `tokio::time::sleep`, so tests
//! running with a paused clock stay instant.

#![allow(dead_code)]

use async_trait::async_trait;
use plainly_lib::error::{CloudModelError, HistoryError, LocalModelError};
use plainly_lib::gateway::ExplanationGateway;
use plainly_lib::history::{HistoryRecord, HistoryStore, MemoryHistoryStore};
use plainly_lib::llm::provider::{CloudModel, LocalModel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

// ── Cloud ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    Text { prompt: String },
    Data { prompt: String, bytes: usize, mime: String },
    Uri { prompt: String, uri: String, mime: String },
}

impl CloudCall {
    pub fn prompt(&self) -> &str {
        match self {
            CloudCall::Text { prompt } | CloudCall::Data { prompt, .. } | CloudCall::Uri { prompt, .. } => {
                prompt
            }
        }
    }
}

pub struct FakeCloud {
    calls: Mutex<Vec<CloudCall>>,
    reply: Mutex<Result<String, CloudModelError>>,
    uri_error: Option<CloudModelError>,
    delay: Duration,
}

impl FakeCloud {
    pub fn replying(markdown: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: Mutex::new(Ok(markdown.to_string())),
            uri_error: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(err: CloudModelError) -> Self {
        let fake = Self::replying("");
        *fake.reply.lock().unwrap() = Err(err);
        fake
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every by-reference call, leaving the other entry points alone.
    pub fn failing_uri(mut self, err: CloudModelError) -> Self {
        self.uri_error = Some(err);
        self
    }

    pub fn set_reply(&self, reply: Result<String, CloudModelError>) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> Vec<CloudCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer(&self, call: CloudCall) -> Result<String, CloudModelError> {
        let is_uri = matches!(call, CloudCall::Uri { .. });
        self.calls.lock().unwrap().push(call);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if is_uri {
            if let Some(err) = &self.uri_error {
                return Err(err.clone());
            }
        }
        self.reply.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudModel for FakeCloud {
    async fn generate_text(&self, prompt: &str) -> Result<String, CloudModelError> {
        self.answer(CloudCall::Text {
            prompt: prompt.to_string(),
        })
        .await
    }

    async fn generate_with_data(
        &self,
        prompt: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<String, CloudModelError> {
        self.answer(CloudCall::Data {
            prompt: prompt.to_string(),
            bytes: data.len(),
            mime: mime_type.to_string(),
        })
        .await
    }

    async fn generate_with_uri(
        &self,
        prompt: &str,
        uri: &str,
        mime_type: &str,
    ) -> Result<String, CloudModelError> {
        self.answer(CloudCall::Uri {
            prompt: prompt.to_string(),
            uri: uri.to_string(),
            mime: mime_type.to_string(),
        })
        .await
    }
}

// ── Local ────────────────────────────────────────────────────────────

pub struct FakeLocal {
    available: bool,
    reply: Result<String, LocalModelError>,
    delay: Duration,
    probe_delay: Duration,
    probes: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeLocal {
    pub fn replying(markdown: &str) -> Self {
        Self {
            available: true,
            reply: Ok(markdown.to_string()),
            delay: Duration::ZERO,
            probe_delay: Duration::ZERO,
            probes: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            reply: Err(LocalModelError::Unavailable("no model".to_string())),
            ..Self::replying("")
        }
    }

    pub fn failing(err: LocalModelError) -> Self {
        Self {
            reply: Err(err),
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn generate_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalModel for FakeLocal {
    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !self.probe_delay.is_zero() {
            tokio::time::sleep(self.probe_delay).await;
        }
        self.available
    }

    async fn generate(&self, prompt: &str) -> Result<String, LocalModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

// ── History stores ───────────────────────────────────────────────────

/// Memory store whose `append` blocks until the test releases it.
pub struct GatedHistoryStore {
    inner: MemoryHistoryStore,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedHistoryStore {
    /// Returns the store, a receiver signalled when `append` starts, and
    /// a sender that lets it finish.
    pub fn new() -> (Arc<Self>, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(Self {
            inner: MemoryHistoryStore::new(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        (store, entered_rx, release_tx)
    }
}

impl HistoryStore for GatedHistoryStore {
    fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let _ = self.entered.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        self.inner.append(record)
    }

    fn list(&self) -> Vec<HistoryRecord> {
        self.inner.list()
    }

    fn remove(&self, id: Uuid) -> Result<bool, HistoryError> {
        self.inner.remove(id)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.inner.clear()
    }
}

/// Memory store whose first `failures` appends fail.
pub struct FlakyHistoryStore {
    inner: MemoryHistoryStore,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl FlakyHistoryStore {
    pub fn failing_times(failures: usize) -> Self {
        Self {
            inner: MemoryHistoryStore::new(),
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl HistoryStore for FlakyHistoryStore {
    fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(HistoryError::NoDataDir);
        }
        self.inner.append(record)
    }

    fn list(&self) -> Vec<HistoryRecord> {
        self.inner.list()
    }

    fn remove(&self, id: Uuid) -> Result<bool, HistoryError> {
        self.inner.remove(id)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.inner.clear()
    }
}

// ── Wiring ───────────────────────────────────────────────────────────

/// Everything one test needs, sharing the same fakes.
pub struct Harness {
    pub local: Arc<FakeLocal>,
    pub cloud: Arc<FakeCloud>,
    pub gateway: Arc<ExplanationGateway>,
    pub history: Arc<MemoryHistoryStore>,
}

impl Harness {
    pub fn new(local: FakeLocal, cloud: FakeCloud) -> Self {
        let local = Arc::new(local);
        let cloud = Arc::new(cloud);
        let gateway = Arc::new(ExplanationGateway::with_timeouts(
            local.clone(),
            cloud.clone(),
            REQUEST_TIMEOUT,
            PROBE_TIMEOUT,
        ));
        Self {
            local,
            cloud,
            gateway,
            history: Arc::new(MemoryHistoryStore::new()),
        }
    }
}
