//! Plainly: share anything, get a critical explanation.
//!
//! Library root. Wires the domains together; no business logic lives here.
//!
//!   - input/: content kinds, classification, ingestion
//!   - llm/: prompts and model backends (on-device, Gemini)
//!   - gateway.rs: routes one request to one backend
//!   - pipeline.rs: per-request orchestrator and observable state
//!   - cache.rs / history.rs: session cache and durable history
//!   - settings.rs: environment, keychain, timeouts

pub mod cache;
pub mod error;
pub mod gateway;
pub mod history;
pub mod input;
pub mod llm;
pub mod pipeline;
pub mod settings;

pub use error::ExplainError;
pub use gateway::ExplanationGateway;
pub use history::{HistoryRecord, HistoryStore, JsonFileHistoryStore, MemoryHistoryStore};
pub use input::{classify, Classification, ContentKind, ContentKindTag};
pub use llm::{ExplanationResult, ProcessingMode};
pub use pipeline::{ExplanationState, Orchestrator};
pub use settings::Settings;

/// Install the process-wide logger. `RUST_LOG` overrides the default
/// `info` level. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
