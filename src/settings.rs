//! Settings and API key resolution.
//!
//! Handles:
//! - Environment loading (.env.local → .env)
//! - Gemini API key storage (OS keychain via keyring crate + env var)
//! - Timeouts, model name and history location
//! - Cloud connection testing

use crate::llm::provider::CloudModel;
use std::path::PathBuf;
use std::time::Duration;

const KEYCHAIN_SERVICE: &str = "plainly";
const KEYCHAIN_USER: &str = "gemini";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LOCAL_PROBE_TIMEOUT_SECS: u64 = 3;
pub const HISTORY_FILE: &str = "explanation_history.json";

/// Resolved runtime configuration. Built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub request_timeout: Duration,
    pub local_probe_timeout: Duration,
    pub history_path: Option<PathBuf>,
    pub local_model_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: crate::llm::gemini::DEFAULT_GEMINI_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            local_probe_timeout: Duration::from_secs(DEFAULT_LOCAL_PROBE_TIMEOUT_SECS),
            history_path: default_history_path(),
            local_model_path: None,
        }
    }
}

impl Settings {
    /// Resolve settings from the process environment and the keychain.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), load_api_key)
    }

    /// Resolve settings from an arbitrary variable source.
    ///
    /// `keychain` is only consulted when the API key variable is unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        keychain: impl FnOnce() -> Option<String>,
    ) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = non_empty(API_KEY_ENV).or_else(keychain);
        Self {
            gemini_api_key,
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            request_timeout: secs_var(
                non_empty("PLAINLY_REQUEST_TIMEOUT_SECS"),
                "PLAINLY_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout,
            ),
            local_probe_timeout: secs_var(
                non_empty("PLAINLY_LOCAL_PROBE_TIMEOUT_SECS"),
                "PLAINLY_LOCAL_PROBE_TIMEOUT_SECS",
                defaults.local_probe_timeout,
            ),
            history_path: non_empty("PLAINLY_HISTORY_PATH")
                .map(PathBuf::from)
                .or(defaults.history_path),
            local_model_path: non_empty("PLAINLY_LOCAL_MODEL").map(PathBuf::from),
        }
    }
}

fn secs_var(raw: Option<String>, name: &str, default: Duration) -> Duration {
    match raw {
        None => default,
        Some(v) => match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                log::warn!(
                    "[SETTINGS] Invalid {}={:?}, using {}s",
                    name,
                    v,
                    default.as_secs()
                );
                default
            }
        },
    }
}

/// `<data dir>/plainly/explanation_history.json`, if the platform has one.
pub fn default_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("plainly").join(HISTORY_FILE))
}

/// Load `.env.local`, falling back to `.env`, from the working directory.
pub fn load_env_files() {
    'env_load: for env_file in [".env.local", ".env"] {
        let path = PathBuf::from(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => log::info!("[SETTINGS] Loaded {}", path.display()),
                Err(e) => log::warn!("[SETTINGS] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }
}

/// Read the Gemini API key from the OS keychain.
fn load_api_key() -> Option<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER).ok()?;
    match entry.get_password() {
        Ok(key) if !key.is_empty() => {
            log::info!("[SETTINGS] Loaded Gemini key from OS keychain");
            Some(key)
        }
        _ => None,
    }
}

/// Save the Gemini API key to the OS keychain.
pub fn save_api_key(api_key: &str) -> Result<(), String> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err("API key is empty".to_string());
    }
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER)
        .map_err(|e| format!("Keyring error: {}", e))?;
    entry
        .set_password(api_key)
        .map_err(|e| format!("Failed to save key: {}", e))?;
    log::info!("[SETTINGS] Gemini API key saved to OS keychain");
    Ok(())
}

/// Send a minimal prompt and report whether the cloud model answered.
pub async fn test_cloud_connection(cloud: &dyn CloudModel) -> Result<(), String> {
    let start = std::time::Instant::now();
    let reply = cloud
        .generate_text("Reply with just: ok")
        .await
        .map_err(|e| e.to_string())?;
    log::info!(
        "[SETTINGS] Cloud test answered in {}ms: {:?}",
        start.elapsed().as_millis(),
        reply.trim()
    );
    Ok(())
}
