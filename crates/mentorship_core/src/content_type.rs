//! Deterministic content-type inference from file extensions.
//!
//! The table is fixed here instead of delegating to a platform MIME database
//! so that uploads resolve to the same type on every host.

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
];

/// Lower-cased extension of the last path segment, if it has one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let segment = file_name.rsplit('/').next().unwrap_or(file_name);
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == extension)
        .map(|(_, content_type)| *content_type)
}

/// Content type for a file name, falling back to [`DEFAULT_CONTENT_TYPE`].
pub fn infer_content_type(file_name: &str) -> &'static str {
    extension_of(file_name)
        .and_then(|extension| content_type_for_extension(&extension))
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// First extension registered for a content type. Parameters such as
/// `; charset=utf-8` are ignored.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = essence(content_type);
    EXTENSION_TABLE
        .iter()
        .find(|(_, candidate)| *candidate == essence)
        .map(|(extension, _)| *extension)
}

/// Picks the explicit content type when one is given, otherwise infers it
/// from the file name.
pub fn resolve_content_type(explicit: Option<&str>, file_name: &str) -> String {
    match explicit.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => infer_content_type(file_name).to_string(),
    }
}

/// Whether a payload of this type can be returned as a text body without
/// corrupting it.
pub fn is_text_content_type(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence.starts_with("text/")
        || matches!(
            essence.as_str(),
            "application/json" | "application/xml" | "application/javascript"
        )
        || essence.ends_with("+json")
        || (essence.ends_with("+xml") && !essence.starts_with("image/"))
}

pub fn is_binary_content_type(content_type: &str) -> bool {
    !is_text_content_type(content_type)
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
