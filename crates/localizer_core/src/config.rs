use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::{join_document_path, DeduplicationVariant, MimeTable};

/// Everything one localization run needs to know about its document and policy.
#[derive(Debug, Clone)]
pub struct LocalizerConfig {
    /// Path of the document whose images are localized; images go next to it.
    pub document_path: PathBuf,
    /// Prefix for relative references when local processing is disabled.
    pub base_url: Option<String>,
    /// References bypassed unconditionally, compared verbatim.
    pub skip_list: HashSet<String>,
    pub skip_all_errors: bool,
    /// Directory, relative to the document, that receives the image files.
    pub image_dir_name: PathBuf,
    /// Replaces `image_dir_name` in document paths only.
    pub image_public_path: Option<String>,
    /// Seconds; zero or negative waits forever.
    pub fetch_timeout_secs: f64,
    pub deduplication: DeduplicationVariant,
    pub process_local_images: bool,
    pub mime_table: MimeTable,
}

impl LocalizerConfig {
    pub fn for_document(document_path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: document_path.into(),
            base_url: None,
            skip_list: HashSet::new(),
            skip_all_errors: false,
            image_dir_name: PathBuf::from("images"),
            image_public_path: None,
            fetch_timeout_secs: -1.0,
            deduplication: DeduplicationVariant::Disabled,
            process_local_images: false,
            mime_table: MimeTable::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = (!base_url.is_empty()).then_some(base_url);
        self
    }

    pub fn with_skip_list<I, S>(mut self, skip_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_list = skip_list.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_all_errors(mut self, skip_all_errors: bool) -> Self {
        self.skip_all_errors = skip_all_errors;
        self
    }

    pub fn with_image_dir_name(mut self, image_dir_name: impl Into<PathBuf>) -> Self {
        self.image_dir_name = image_dir_name.into();
        self
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        let public_path = public_path.into();
        self.image_public_path = (!public_path.is_empty()).then_some(public_path);
        self
    }

    pub fn with_fetch_timeout_secs(mut self, secs: f64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    pub fn with_deduplication(mut self, deduplication: DeduplicationVariant) -> Self {
        self.deduplication = deduplication;
        self
    }

    pub fn with_process_local_images(mut self, process_local_images: bool) -> Self {
        self.process_local_images = process_local_images;
        self
    }

    pub fn with_mime_table(mut self, mime_table: MimeTable) -> Self {
        self.mime_table = mime_table;
        self
    }

    /// Per-fetch timeout; `None` means unbounded.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.fetch_timeout_secs)
    }

    /// Directory the document lives in.
    pub fn document_dir(&self) -> &Path {
        self.document_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Real directory where image bytes are written.
    pub fn image_dir(&self) -> PathBuf {
        self.document_dir().join(&self.image_dir_name)
    }

    /// Forward-slash directory prefix used in document paths.
    pub fn document_image_dir(&self) -> String {
        match &self.image_public_path {
            Some(public) => public.replace('\\', "/"),
            None => forward_slash_path(&self.image_dir_name),
        }
    }

    pub fn document_path_for(&self, filename: &str) -> String {
        join_document_path(&self.document_image_dir(), filename)
    }

    /// Where a local reference is read from: absolute paths as-is, relative
    /// ones against the document's directory.
    pub fn local_image_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.document_dir().join(path)
        }
    }
}

/// Seconds to a timeout; zero, negative or unrepresentable values mean none.
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn forward_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::CurDir => None,
            Component::RootDir => Some(String::new()),
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_line_defaults() {
        let config = LocalizerConfig::for_document("notes/post.md");
        assert_eq!(config.image_dir(), PathBuf::from("notes/images"));
        assert_eq!(config.document_image_dir(), "images");
        assert_eq!(config.fetch_timeout(), None);
        assert_eq!(config.deduplication, DeduplicationVariant::Disabled);
        assert!(!config.process_local_images);
        assert!(!config.skip_all_errors);
    }

    #[test]
    fn non_positive_timeouts_are_unbounded() {
        let config = LocalizerConfig::for_document("post.md");
        assert_eq!(config.clone().with_fetch_timeout_secs(0.0).fetch_timeout(), None);
        assert_eq!(config.clone().with_fetch_timeout_secs(-3.0).fetch_timeout(), None);
        assert_eq!(config.clone().with_fetch_timeout_secs(f64::NAN).fetch_timeout(), None);
        assert_eq!(
            config.with_fetch_timeout_secs(1.5).fetch_timeout(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn public_path_only_changes_document_paths() {
        let config = LocalizerConfig::for_document("/blog/post.md")
            .with_image_dir_name("assets/img")
            .with_public_path("/static/img");
        assert_eq!(config.image_dir(), PathBuf::from("/blog/assets/img"));
        assert_eq!(config.document_path_for("x.png"), "/static/img/x.png");
    }

    #[test]
    fn nested_image_dir_uses_forward_slashes() {
        let config = LocalizerConfig::for_document("post.md").with_image_dir_name("./assets/img");
        assert_eq!(config.document_path_for("x.png"), "assets/img/x.png");
    }

    #[test]
    fn empty_optional_strings_are_unset() {
        let config = LocalizerConfig::for_document("post.md")
            .with_public_path("")
            .with_base_url("");
        assert_eq!(config.image_public_path, None);
        assert_eq!(config.base_url, None);
    }

    #[test]
    fn local_paths_resolve_against_document_dir() {
        let config = LocalizerConfig::for_document("/blog/post.md");
        assert_eq!(config.local_image_path("pics/a.png"), PathBuf::from("/blog/pics/a.png"));
        assert_eq!(config.local_image_path("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
    }
}
