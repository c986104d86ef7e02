//! Input domain: what the user shared and how it is classified.
//!
//! Public API for everything upstream of the explanation pipeline:
//!   - ContentKind / ContentKindTag: the closed set of shareable content
//!   - classify.rs: YouTube override + processing mode policy
//!   - ingest.rs: share-sheet precedence, typed text, files on disk
//!   - heuristics.rs: code language and media type detection

pub mod classify;
pub mod heuristics;
pub mod ingest;

pub use classify::{classify, default_mode, shows_mode_picker, Classification};
pub use ingest::{from_path, from_typed_text, resolve_shared_item, ShareRepresentation};

use serde::{Deserialize, Serialize};

/// One shared item, with its payload.
///
/// Exactly one variant is active per request and the payload is never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    Text(String),
    Link(String),
    ImageBytes(Vec<u8>),
    VideoBytes(Vec<u8>),
    Document {
        data: Vec<u8>,
        media_type: String,
        file_name: String,
    },
    Code {
        source: String,
        file_name: String,
        language: String,
    },
}

/// Payload-free projection of [`ContentKind`], persisted with history records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKindTag {
    Text,
    #[serde(rename = "url")]
    Link,
    Image,
    Video,
    Document,
    Code,
}

impl ContentKind {
    pub fn tag(&self) -> ContentKindTag {
        match self {
            ContentKind::Text(_) => ContentKindTag::Text,
            ContentKind::Link(_) => ContentKindTag::Link,
            ContentKind::ImageBytes(_) => ContentKindTag::Image,
            ContentKind::VideoBytes(_) => ContentKindTag::Video,
            ContentKind::Document { .. } => ContentKindTag::Document,
            ContentKind::Code { .. } => ContentKindTag::Code,
        }
    }

    /// Text shown above the explanation while it loads and after.
    pub fn display_input(&self) -> String {
        match self {
            ContentKind::Text(body) => body.clone(),
            ContentKind::Link(url) => url.clone(),
            ContentKind::ImageBytes(_) => "Uploaded Image".to_string(),
            ContentKind::VideoBytes(_) => "Uploaded Video".to_string(),
            ContentKind::Document { file_name, .. } | ContentKind::Code { file_name, .. } => {
                file_name.clone()
            }
        }
    }
}

impl ContentKindTag {
    /// Human-readable label, used for history rows and icon selection.
    pub fn label(self) -> &'static str {
        match self {
            ContentKindTag::Text => "Text",
            ContentKindTag::Link => "Link",
            ContentKindTag::Image => "Image",
            ContentKindTag::Video => "Video",
            ContentKindTag::Document => "Document",
            ContentKindTag::Code => "Code",
        }
    }
}
