//! On-device model backends.
//!
//! - `UnavailableLocalModel`: the default when no local model is built
//!   in or configured. Always reports unavailable, so the gateway serves
//!   the offline placeholder.
//! - `LlamaLocalModel` (feature `local-llm`): a GGUF model run through
//!   llama.cpp on a blocking worker thread.

use super::provider::LocalModel;
use crate::error::LocalModelError;
use async_trait::async_trait;

/// Local model stand-in for builds or devices without one.
#[derive(Debug, Default, Clone)]
pub struct UnavailableLocalModel {
    reason: String,
}

impl UnavailableLocalModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LocalModel for UnavailableLocalModel {
    async fn is_available(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str) -> Result<String, LocalModelError> {
        Err(LocalModelError::Unavailable(self.reason.clone()))
    }
}

#[cfg(feature = "local-llm")]
pub use llama::LlamaLocalModel;

#[cfg(feature = "local-llm")]
mod llama {
    use super::*;
    use llama_cpp_2::context::params::LlamaContextParams;
    use llama_cpp_2::llama_backend::LlamaBackend;
    use llama_cpp_2::llama_batch::LlamaBatch;
    use llama_cpp_2::model::params::LlamaModelParams;
    use llama_cpp_2::model::{AddBos, LlamaModel, Special};
    use llama_cpp_2::sampling::LlamaSampler;
    use std::num::NonZeroU32;
    use std::path::Path;
    use std::sync::Arc;

    const CONTEXT_TOKENS: u32 = 8192;
    const MAX_NEW_TOKENS: i32 = 1024;
    const SAMPLER_SEED: u32 = 1234;

    /// GGUF model loaded once at startup and shared across requests.
    pub struct LlamaLocalModel {
        backend: Arc<LlamaBackend>,
        model: Arc<LlamaModel>,
    }

    impl LlamaLocalModel {
        pub fn load(path: &Path) -> Result<Self, LocalModelError> {
            let start = std::time::Instant::now();
            let backend =
                LlamaBackend::init().map_err(|e| LocalModelError::Unavailable(e.to_string()))?;
            let model = LlamaModel::load_from_file(&backend, path, &LlamaModelParams::default())
                .map_err(|e| {
                    LocalModelError::Unavailable(format!("{}: {}", path.display(), e))
                })?;
            log::info!(
                "[LOCAL] Loaded {} in {}ms",
                path.display(),
                start.elapsed().as_millis()
            );
            Ok(Self {
                backend: Arc::new(backend),
                model: Arc::new(model),
            })
        }
    }

    #[async_trait]
    impl LocalModel for LlamaLocalModel {
        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, prompt: &str) -> Result<String, LocalModelError> {
            let backend = Arc::clone(&self.backend);
            let model = Arc::clone(&self.model);
            let prompt = prompt.to_string();
            tokio::task::spawn_blocking(move || run_generation(&backend, &model, &prompt))
                .await
                .map_err(|e| LocalModelError::GenerationFailed(e.to_string()))?
        }
    }

    fn run_generation(
        backend: &LlamaBackend,
        model: &LlamaModel,
        prompt: &str,
    ) -> Result<String, LocalModelError> {
        let failed = |e: &dyn std::fmt::Display| LocalModelError::GenerationFailed(e.to_string());

        let ctx_params = LlamaContextParams::default().with_n_ctx(NonZeroU32::new(CONTEXT_TOKENS));
        let mut ctx = model
            .new_context(backend, ctx_params)
            .map_err(|e| failed(&e))?;

        let tokens = model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| failed(&e))?;
        let prompt_len = tokens.len() as i32;
        if prompt_len + MAX_NEW_TOKENS > CONTEXT_TOKENS as i32 {
            return Err(LocalModelError::GenerationFailed(format!(
                "prompt too long for on-device context ({} tokens)",
                prompt_len
            )));
        }

        let mut batch = LlamaBatch::new(CONTEXT_TOKENS as usize, 1);
        let last = prompt_len - 1;
        for (i, token) in (0_i32..).zip(tokens) {
            batch.add(token, i, &[0], i == last).map_err(|e| failed(&e))?;
        }
        ctx.decode(&mut batch).map_err(|e| failed(&e))?;

        let mut sampler =
            LlamaSampler::chain_simple([LlamaSampler::dist(SAMPLER_SEED), LlamaSampler::greedy()]);
        let mut decoder = encoding_rs::UTF_8.new_decoder();
        let mut output = String::new();
        let mut n_cur = batch.n_tokens();

        while n_cur < prompt_len + MAX_NEW_TOKENS {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);
            if model.is_eog_token(token) {
                break;
            }
            let bytes = model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| failed(&e))?;
            let mut piece = String::with_capacity(32);
            let _ = decoder.decode_to_string(&bytes, &mut piece, false);
            output.push_str(&piece);

            batch.clear();
            batch.add(token, n_cur, &[0], true).map_err(|e| failed(&e))?;
            n_cur += 1;
            ctx.decode(&mut batch).map_err(|e| failed(&e))?;
        }

        log::info!("[LOCAL] Generated {} tokens", n_cur - prompt_len);
        if output.trim().is_empty() {
            return Err(LocalModelError::GenerationFailed(
                "model produced no text".to_string(),
            ));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_model_reports_reason() {
        let model = UnavailableLocalModel::new("no model configured");
        assert!(!model.is_available().await);
        assert_eq!(
            model.generate("hi").await,
            Err(LocalModelError::Unavailable("no model configured".to_string()))
        );
    }
}
