use std::path::Path;

use unicode_normalization::UnicodeNormalization;
use url::Url;

use crate::disposition::{parse_content_disposition_filename, percent_decode};
use crate::MimeTable;

/// Stem used when normalization leaves nothing behind.
const FALLBACK_STEM: &str = "image";

/// Longest stem kept, in bytes; leaves room for a collision prefix and an
/// extension within the usual 255-byte filename limit.
pub const MAX_STEM_LEN: usize = 120;

/// Normalizes a string into a filename-safe slug.
///
/// NFKD-decomposes, drops everything outside ASCII (diacritics included),
/// keeps word characters, whitespace and hyphens, trims, collapses runs of
/// whitespace/hyphens into a single `-` and lowercases.
pub fn slugify(value: &str) -> String {
    let kept: String = value
        .nfkd()
        .filter(char::is_ascii)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                slug.push('-');
            }
            in_separator = true;
        } else {
            slug.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    slug
}

/// Candidate filename for a fetched image.
///
/// The last path segment of `final_url` is preferred; when the URL has none,
/// the `Content-Disposition` filename is used. A name without an extension
/// gets one guessed from `content_type`.
pub fn derive_remote_filename(
    final_url: &str,
    content_type: Option<&str>,
    content_disposition: Option<&str>,
    mime: &MimeTable,
) -> String {
    let raw = url_file_segment(final_url)
        .or_else(|| content_disposition.and_then(parse_content_disposition_filename))
        .unwrap_or_default();
    normalize_filename(&raw, content_type, mime)
}

/// Candidate filename for an image read from disk: its normalized base name.
pub fn local_filename(path: &Path, mime: &MimeTable) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    normalize_filename(&base, None, mime)
}

/// Slugifies stem and extension separately and rejoins them.
pub fn normalize_filename(raw: &str, content_type: Option<&str>, mime: &MimeTable) -> String {
    let (stem, extension) = split_extension(raw);
    let stem = truncate_slug(slugify(stem), MAX_STEM_LEN);
    let extension = extension
        .map(slugify)
        .map(|ext| truncate_slug(ext, MAX_STEM_LEN))
        .filter(|ext| !ext.is_empty())
        .or_else(|| {
            content_type
                .and_then(|ct| mime.extension_for(ct))
                .map(ToOwned::to_owned)
        });

    let stem = if stem.is_empty() { FALLBACK_STEM } else { &stem };
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

/// Slugs are ASCII, so any byte index is a char boundary.
fn truncate_slug(mut slug: String, max_len: usize) -> String {
    if slug.len() > max_len {
        slug.truncate(max_len);
        let trimmed = slug.trim_end_matches('-').len();
        slug.truncate(trimmed);
    }
    slug
}

/// Splits at the last dot, ignoring leading dots (`.hidden` has no extension).
fn split_extension(name: &str) -> (&str, Option<&str>) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => {
            let idx = leading + idx;
            (&name[..idx], Some(&name[idx + 1..]))
        }
        None => (name, None),
    }
}

fn url_file_segment(url: &str) -> Option<String> {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(ToOwned::to_owned),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            path.rsplit('/').next().map(ToOwned::to_owned)
        }
    }?;

    let decoded = percent_decode(&segment);
    if decoded.trim().is_empty() {
        None
    } else {
        Some(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("x.png"), ("x", Some("png")));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_extension("noext"), ("noext", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing", Some("")));
    }

    #[test]
    fn url_segment_ignores_query_and_fragment() {
        assert_eq!(
            url_file_segment("https://a.com/img/x.png?w=100#top").as_deref(),
            Some("x.png")
        );
    }

    #[test]
    fn url_segment_is_percent_decoded() {
        assert_eq!(
            url_file_segment("https://a.com/my%20photo.jpg").as_deref(),
            Some("my photo.jpg")
        );
    }

    #[test]
    fn truncation_drops_dangling_separator() {
        assert_eq!(truncate_slug("abc-def".to_string(), 4), "abc");
        assert_eq!(truncate_slug("short".to_string(), 10), "short");
    }

    #[test]
    fn url_without_segment_yields_none() {
        assert_eq!(url_file_segment("https://a.com/"), None);
        assert_eq!(url_file_segment("https://a.com"), None);
        assert_eq!(url_file_segment("https://a.com/dir/"), None);
    }
}
