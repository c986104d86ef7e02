//! Content type heuristics for shared files and byte payloads.
//!
//! Maps file extensions to code languages and document media types, and
//! sniffs MIME types from magic bytes. These feed the payload shapes the
//! cloud model expects (declared MIME type alongside raw bytes).

use std::path::Path;

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Source code extensions and the language name given to the model.
const CODE_LANGUAGES: &[(&str, &str)] = &[
    ("rs", "rust"),
    ("py", "python"),
    ("js", "javascript"),
    ("mjs", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("jsx", "javascript"),
    ("swift", "swift"),
    ("kt", "kotlin"),
    ("java", "java"),
    ("go", "go"),
    ("rb", "ruby"),
    ("php", "php"),
    ("c", "c"),
    ("h", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("hpp", "cpp"),
    ("cs", "csharp"),
    ("m", "objective-c"),
    ("scala", "scala"),
    ("sh", "shell"),
    ("bash", "shell"),
    ("zsh", "shell"),
    ("sql", "sql"),
    ("lua", "lua"),
    ("dart", "dart"),
    ("html", "html"),
    ("css", "css"),
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "bmp", "tiff"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv", "avi"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Language name for a source file, if the extension is a known one.
pub fn code_language(path: &Path) -> Option<&'static str> {
    let ext = extension(path)?;
    CODE_LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// Declared media type for a document file.
pub fn document_media_type(path: &Path) -> Option<&'static str> {
    match extension(path)?.as_str() {
        "pdf" => Some("application/pdf"),
        "txt" | "text" | "log" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "json" => Some("application/json"),
        _ => None,
    }
}

pub fn is_image_path(path: &Path) -> bool {
    extension(path).is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

pub fn is_video_path(path: &Path) -> bool {
    extension(path).is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.as_str()))
}

/// MIME type of an image payload, from its magic bytes.
pub fn image_mime(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(format) => format.to_mime_type(),
        Err(_) => DEFAULT_IMAGE_MIME,
    }
}

/// MIME type of a video payload.
///
/// ISO-BMFF files carry a brand at bytes 8..12 after the `ftyp` box
/// marker; `qt  ` means QuickTime. Anything else is sent as MP4.
pub fn video_mime(data: &[u8]) -> &'static str {
    if data.len() >= 12 && &data[4..8] == b"ftyp" && &data[8..12] == b"qt  " {
        return "video/quicktime";
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "video/webm";
    }
    DEFAULT_VIDEO_MIME
}
