//! Input ingestion: turning whatever the user shared into one ContentKind.
//!
//! A single shared payload can advertise several compatible
//! representations at once (a PDF is also a file URL, a screenshot is also
//! an image file). The precedence below decides which one wins:
//!
//!   document > code > video > image > link > plain-text file > text
//!
//! File URLs must never be caught by the link branch, which is why links
//! sit below every file-backed representation.

use super::heuristics;
use super::ContentKind;
use crate::error::IngestError;
use reqwest::Url;
use std::path::Path;

/// One representation offered by the share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareRepresentation {
    Pdf { data: Vec<u8>, file_name: String },
    SourceCode { source: String, file_name: String },
    Movie(Vec<u8>),
    Image(Vec<u8>),
    WebUrl(String),
    PlainTextFile { text: String, file_name: String },
    Text(String),
}

impl ShareRepresentation {
    /// Lower is preferred.
    fn precedence(&self) -> u8 {
        match self {
            ShareRepresentation::Pdf { .. } => 0,
            ShareRepresentation::SourceCode { .. } => 1,
            ShareRepresentation::Movie(_) => 2,
            ShareRepresentation::Image(_) => 3,
            ShareRepresentation::WebUrl(_) => 4,
            ShareRepresentation::PlainTextFile { .. } => 5,
            ShareRepresentation::Text(_) => 6,
        }
    }

    fn into_content(self) -> ContentKind {
        match self {
            ShareRepresentation::Pdf { data, file_name } => ContentKind::Document {
                data,
                media_type: "application/pdf".to_string(),
                file_name,
            },
            ShareRepresentation::SourceCode { source, file_name } => {
                let language = heuristics::code_language(Path::new(&file_name))
                    .unwrap_or("plain text")
                    .to_string();
                ContentKind::Code {
                    source,
                    file_name,
                    language,
                }
            }
            ShareRepresentation::Movie(data) => ContentKind::VideoBytes(data),
            ShareRepresentation::Image(data) => ContentKind::ImageBytes(data),
            ShareRepresentation::WebUrl(url) => ContentKind::Link(url),
            ShareRepresentation::PlainTextFile { text, file_name } => ContentKind::Document {
                data: text.into_bytes(),
                media_type: "text/plain".to_string(),
                file_name,
            },
            ShareRepresentation::Text(text) => ContentKind::Text(text),
        }
    }
}

/// Pick the highest-precedence representation of one shared item.
///
/// Returns `None` when nothing usable was offered.
pub fn resolve_shared_item(representations: Vec<ShareRepresentation>) -> Option<ContentKind> {
    let chosen = representations
        .into_iter()
        .filter(|r| !matches!(r, ShareRepresentation::Text(t) if t.trim().is_empty()))
        .min_by_key(ShareRepresentation::precedence)?;
    log::debug!("[INGEST] Chosen representation precedence: {}", chosen.precedence());
    Some(chosen.into_content())
}

/// Normalize text typed into the app's own input box.
///
/// Blank input yields nothing. A string that is exactly an http(s) URL
/// with a host becomes a link; anything else is text.
pub fn from_typed_text(raw: &str) -> Option<ContentKind> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Some(ContentKind::Link(trimmed.to_string()))
        }
        _ => Some(ContentKind::Text(trimmed.to_string())),
    }
}

/// Read a file from disk and classify it by extension.
pub fn from_path(path: &Path) -> Result<ContentKind, IngestError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    let read = |p: &Path| {
        std::fs::read(p).map_err(|source| IngestError::Read {
            path: p.display().to_string(),
            source,
        })
    };

    if let Some(media_type) = heuristics::document_media_type(path) {
        let data = read(path)?;
        return Ok(ContentKind::Document {
            data,
            media_type: media_type.to_string(),
            file_name,
        });
    }
    if let Some(language) = heuristics::code_language(path) {
        let bytes = read(path)?;
        let source = String::from_utf8(bytes).map_err(|_| IngestError::NotUtf8(file_name.clone()))?;
        return Ok(ContentKind::Code {
            source,
            file_name,
            language: language.to_string(),
        });
    }
    if heuristics::is_video_path(path) {
        return Ok(ContentKind::VideoBytes(read(path)?));
    }
    if heuristics::is_image_path(path) {
        return Ok(ContentKind::ImageBytes(read(path)?));
    }
    Err(IngestError::Unsupported(file_name))
}
