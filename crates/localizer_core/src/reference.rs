use url::Url;

/// URL schemes that mark a reference as remote.
///
/// `ftp` references are classified as remote so they are never mistaken for
/// local paths, but the HTTP fetcher rejects them with
/// `FailureKind::UnsupportedScheme`, which follows the usual error policy.
pub const REMOTE_SCHEMES: &[&str] = &["http", "https", "ftp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Remote,
    Local,
}

/// A reference is remote when it parses as an absolute URL with a recognized scheme.
///
/// Anything else, including Windows drive paths such as `C:\img.png`, is local.
pub fn classify_reference(reference: &str) -> ReferenceKind {
    match Url::parse(reference.trim()) {
        Ok(url) if REMOTE_SCHEMES.contains(&url.scheme()) => ReferenceKind::Remote,
        _ => ReferenceKind::Local,
    }
}

/// `base_url + "/" + reference`, without doubling a trailing slash on the base.
pub fn join_base_url(base_url: &str, reference: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), reference)
}
