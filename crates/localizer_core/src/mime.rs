use std::collections::HashMap;

/// Built-in content-type to extension pairs.
///
/// `jpe` is deliberately not listed: `image/jpeg` maps to `jpg`.
const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("image/apng", "apng"),
    ("image/avif", "avif"),
    ("image/bmp", "bmp"),
    ("image/gif", "gif"),
    ("image/heic", "heic"),
    ("image/heif", "heif"),
    ("image/jpeg", "jpg"),
    ("image/jxl", "jxl"),
    ("image/pjpeg", "jpg"),
    ("image/png", "png"),
    ("image/svg+xml", "svg"),
    ("image/tiff", "tiff"),
    ("image/vnd.microsoft.icon", "ico"),
    ("image/webp", "webp"),
    ("image/x-icon", "ico"),
    ("image/x-ms-bmp", "bmp"),
    ("image/x-png", "png"),
    ("application/json", "json"),
    ("application/octet-stream", "bin"),
    ("application/pdf", "pdf"),
    ("text/html", "html"),
    ("text/plain", "txt"),
    ("video/mp4", "mp4"),
];

/// Lookup table from MIME essence (`type/subtype`) to a file extension without the dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTable {
    entries: HashMap<String, String>,
}

impl MimeTable {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, mime: &str, extension: &str) -> Self {
        self.insert(mime, extension);
        self
    }

    pub fn insert(&mut self, mime: &str, extension: &str) {
        self.entries.insert(
            mime.trim().to_ascii_lowercase(),
            extension.trim_start_matches('.').to_string(),
        );
    }

    /// Guess an extension from a raw `Content-Type` value; parameters such as
    /// `charset` are ignored and matching is case-insensitive.
    pub fn extension_for(&self, content_type: &str) -> Option<&str> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        self.entries.get(&essence).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MimeTable {
    fn default() -> Self {
        DEFAULT_ENTRIES
            .iter()
            .fold(Self::empty(), |table, (mime, ext)| table.with_entry(mime, ext))
    }
}
