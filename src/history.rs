//! Explanation history: a durable, newest-first log of past results.
//!
//! Records are stored as one pretty-printed JSON array in
//! `<data dir>/plainly/explanation_history.json` (macOS:
//! `~/Library/Application Support/plainly/explanation_history.json`).
//!
//! The store is shared by every orchestrator in the process and injected
//! as `Arc<dyn HistoryStore>`; tests use `MemoryHistoryStore`.
//! A missing or corrupt file reads as an empty history. Other read
//! failures fail the write instead of overwriting the file.

use crate::error::HistoryError;
use crate::input::{ContentKind, ContentKindTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Longest edge of a stored image thumbnail, in pixels.
const THUMBNAIL_EDGE: u32 = 256;
const TEXT_TITLE_CHARS: usize = 40;

/// One saved explanation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub original_input_summary: String,
    pub result_markdown: String,
    pub used_cloud: bool,
    pub kind: ContentKindTag,
    #[serde(default, with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Vec<u8>>,
}

impl HistoryRecord {
    /// Build the record for a successful explanation of `kind`.
    pub fn new(kind: &ContentKind, result_markdown: &str, used_cloud: bool) -> Self {
        let (title, summary) = match kind {
            ContentKind::Text(body) => (body.chars().take(TEXT_TITLE_CHARS).collect(), body.clone()),
            ContentKind::Link(url) => (url.clone(), url.clone()),
            ContentKind::ImageBytes(_) => ("Image".to_string(), "Image File Upload".to_string()),
            ContentKind::VideoBytes(_) => ("Video Clip".to_string(), "Video File Upload".to_string()),
            ContentKind::Document { file_name, .. } | ContentKind::Code { file_name, .. } => {
                (file_name.clone(), file_name.clone())
            }
        };
        let thumbnail = match kind {
            ContentKind::ImageBytes(data) => make_thumbnail(data),
            _ => None,
        };

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            title,
            original_input_summary: summary,
            result_markdown: result_markdown.to_string(),
            used_cloud,
            kind: kind.tag(),
            thumbnail,
        }
    }
}

/// Downscale an image to a small JPEG. `None` if it cannot be decoded.
pub fn make_thumbnail(data: &[u8]) -> Option<Vec<u8>> {
    let decoded = match image::load_from_memory(data) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("[HISTORY] Thumbnail skipped, image not decodable: {}", e);
            return None;
        }
    };
    let thumb = image::DynamicImage::ImageRgb8(
        decoded.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE).to_rgb8(),
    );
    let mut jpeg = Vec::new();
    match thumb.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg) {
        Ok(()) => Some(jpeg),
        Err(e) => {
            log::warn!("[HISTORY] Thumbnail encode failed: {}", e);
            None
        }
    }
}

/// Durable log of explanations.
///
/// Every write is atomic and durable before the call returns.
pub trait HistoryStore: Send + Sync {
    /// Insert as the newest record.
    fn append(&self, record: HistoryRecord) -> Result<(), HistoryError>;

    /// All records, newest first.
    fn list(&self) -> Vec<HistoryRecord>;

    /// Returns whether a record with `id` existed.
    fn remove(&self, id: Uuid) -> Result<bool, HistoryError>;

    fn clear(&self) -> Result<(), HistoryError>;

    fn get(&self, id: Uuid) -> Option<HistoryRecord> {
        self.list().into_iter().find(|r| r.id == id)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── JSON file store ──────────────────────────────────────────────────

/// History persisted to a single JSON file.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the configured path, or the platform default.
    pub fn open(path: Option<PathBuf>) -> Result<Self, HistoryError> {
        let path = path
            .or_else(crate::settings::default_history_path)
            .ok_or(HistoryError::NoDataDir)?;
        log::info!("[HISTORY] Using {}", path.display());
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or corrupt file is an empty history; any other read
    /// failure is an error, so a write never clobbers a log it could not
    /// read.
    fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                log::warn!("[HISTORY] Ignoring unreadable {}: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    /// Write via a sibling temp file, flush it to disk, then rename, so
    /// readers never see a half-written log.
    fn save(&self, items: &[HistoryRecord]) -> Result<(), HistoryError> {
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |source: std::io::Error| HistoryError::Io { path, source }
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let json = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = File::create(&tmp).map_err(io_err(&tmp))?;
        file.write_all(json.as_bytes()).map_err(io_err(&tmp))?;
        file.sync_all().map_err(io_err(&tmp))?;
        drop(file);
        std::fs::rename(&tmp, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        let _guard = lock(&self.write_lock);
        let mut items = self.load()?;
        log::info!("[HISTORY] Saving {} ({:?})", record.id, record.kind);
        items.insert(0, record);
        self.save(&items)
    }

    fn list(&self) -> Vec<HistoryRecord> {
        let _guard = lock(&self.write_lock);
        self.load().unwrap_or_else(|e| {
            log::error!("[HISTORY] {}", e);
            Vec::new()
        })
    }

    fn remove(&self, id: Uuid) -> Result<bool, HistoryError> {
        let _guard = lock(&self.write_lock);
        let mut items = self.load()?;
        let before = items.len();
        items.retain(|r| r.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.save(&items)?;
        log::info!("[HISTORY] Removed {}", id);
        Ok(true)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let _guard = lock(&self.write_lock);
        self.save(&[])?;
        log::info!("[HISTORY] Cleared");
        Ok(())
    }
}

// ── In-memory store ──────────────────────────────────────────────────

/// Process-local history, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryHistoryStore {
    items: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        lock(&self.items).insert(0, record);
        Ok(())
    }

    fn list(&self) -> Vec<HistoryRecord> {
        lock(&self.items).clone()
    }

    fn remove(&self, id: Uuid) -> Result<bool, HistoryError> {
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|r| r.id != id);
        Ok(items.len() != before)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        lock(&self.items).clear();
        Ok(())
    }
}

/// Thumbnails are stored as base64 strings inside the JSON log.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, ser: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => ser.serialize_some(&base64::engine::general_purpose::STANDARD.encode(b)),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(de)?;
        encoded
            .map(|s| {
                base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
