//! LLM domain: prompts and model backends.
//!
//! Public API for the model layer of Plainly.
//! External code should only use the items exported here.
//!
//! Backends:
//!   - On-device llama.cpp (local.rs, feature `local-llm`)
//!   - Google Gemini Flash (gemini.rs)
//!
//! Shared:
//!   - provider.rs: capability traits + ProcessingMode
//!   - prompts.rs: one prompt builder per content kind

pub mod gemini;
pub mod local;
pub mod prompts;
pub mod provider;
pub mod types;

pub use gemini::GeminiClient;
pub use local::UnavailableLocalModel;
#[cfg(feature = "local-llm")]
pub use local::LlamaLocalModel;
pub use provider::{CloudModel, LocalModel, ProcessingMode};
pub use types::ExplanationResult;
