//! Content classification: YouTube override and processing mode policy.
//!
//! Upstream ingestion already decided text vs. link vs. media vs. file.
//! The only non-trivial decision left here is whether a `Text` or `Link`
//! payload contains a YouTube URL. If it does, the request becomes a
//! video-by-reference explanation: cloud only, no mode picker.
//!
//! The pattern is searched, not anchored, so a YouTube link inside a
//! longer passage still wins over the surrounding prose.

use super::ContentKind;
use crate::llm::provider::ProcessingMode;
use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

/// Host forms: youtube.com / youtu.be, optional www. or m., optional
/// /watch?v= | /embed/ | /v/ path, then the id and any trailing noise.
const YOUTUBE_PATTERN: &str = r"(?i)((?:https?:)?//)?((?:www|m)\.)?(youtube\.com|youtu\.be)(/(?:[\w\-]+\?v=|embed/|v/)?)([\w\-]+)(\S+)?";

/// Result of classifying one shared item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ContentKind,
    /// Set when a Text or Link payload carries a YouTube URL.
    pub youtube: Option<Url>,
}

impl Classification {
    pub fn is_youtube(&self) -> bool {
        self.youtube.is_some()
    }

    pub fn default_mode(&self) -> ProcessingMode {
        default_mode(&self.kind, self.is_youtube())
    }

    pub fn shows_mode_picker(&self) -> bool {
        shows_mode_picker(&self.kind, self.is_youtube())
    }
}

fn youtube_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| match Regex::new(YOUTUBE_PATTERN) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("[CLASSIFY] YouTube pattern failed to compile: {}", e);
            None
        }
    })
    .as_ref()
}

/// Find the first YouTube URL in `text`.
///
/// The matched span must parse as an absolute URL with a scheme and a
/// host; bare `youtube.com/...` mentions without a scheme do not count.
pub fn extract_youtube_url(text: &str) -> Option<Url> {
    let re = youtube_regex()?;
    let span = re.find(text.trim())?.as_str();
    let url = Url::parse(span).ok()?;
    if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
        return None;
    }
    Some(url)
}

pub fn is_youtube_url(text: &str) -> bool {
    extract_youtube_url(text).is_some()
}

/// Classify a shared item, resolving the YouTube override.
pub fn classify(kind: ContentKind) -> Classification {
    let youtube = match &kind {
        ContentKind::Text(body) => extract_youtube_url(body),
        ContentKind::Link(url) => extract_youtube_url(url),
        _ => None,
    };
    if let Some(url) = &youtube {
        log::info!("[CLASSIFY] {:?} reclassified as YouTube video: {}", kind.tag(), url);
    } else {
        log::debug!("[CLASSIFY] Content kind: {:?}", kind.tag());
    }
    Classification { kind, youtube }
}

/// Default processing mode for a kind.
///
/// Only plain text without a YouTube link runs on device; everything
/// else needs the cloud model.
pub fn default_mode(kind: &ContentKind, youtube_override: bool) -> ProcessingMode {
    match kind {
        ContentKind::Text(_) if !youtube_override => ProcessingMode::OnDevice,
        _ => ProcessingMode::Cloud,
    }
}

/// Whether the user may choose between on-device and cloud.
pub fn shows_mode_picker(kind: &ContentKind, youtube_override: bool) -> bool {
    matches!(kind, ContentKind::Text(_)) && !youtube_override
}
