//! Where the document comes from and where its rewritten copy is written.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use localizer_core::{classify_reference, derive_remote_filename, MimeTable, ReferenceKind};
use localizer_engine::Fetcher;
use localizer_logging::localizer_info;
use url::Url;

use crate::skip_list::expand_home;

/// A document on disk, plus the URL it was downloaded from when it was remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    /// Directory URL of the downloaded document, without a trailing slash.
    pub base_url: Option<String>,
}

/// Resolves `location` to a file, downloading it into `download_dir` when it
/// is a URL.
pub async fn obtain_document(
    location: &str,
    fetcher: &dyn Fetcher,
    timeout: Option<Duration>,
    download_dir: &Path,
) -> Result<Document> {
    if classify_reference(location) == ReferenceKind::Local {
        return Ok(Document {
            path: expand_home(location),
            base_url: None,
        });
    }

    localizer_info!("Downloading document from \"{}\"...", location);
    let output = fetcher
        .fetch(location, timeout)
        .await
        .with_context(|| format!("failed to download document {location}"))?;

    let mime = MimeTable::empty()
        .with_entry("text/markdown", "md")
        .with_entry("text/x-markdown", "md")
        .with_entry("text/plain", "md");
    let filename = derive_remote_filename(
        &output.metadata.final_url,
        output.metadata.content_type.as_deref(),
        output.metadata.content_disposition.as_deref(),
        &mime,
    );
    let path = download_dir.join(filename);
    fs::write(&path, &output.bytes)
        .with_context(|| format!("failed to save downloaded document to {:?}", path))?;

    Ok(Document {
        path,
        base_url: Some(base_url_of(&output.metadata.final_url)),
    })
}

/// `https://a.com/blog/post.md?x=1` -> `https://a.com/blog`.
pub fn base_url_of(url: &str) -> String {
    match Url::parse(url).and_then(|parsed| parsed.join(".")) {
        Ok(dir) => dir.as_str().trim_end_matches('/').to_string(),
        Err(_) => url.rsplit_once('/').map_or(url, |(dir, _)| dir).to_string(),
    }
}

/// Where the rewritten document goes.
///
/// Defaults to the document itself. An `output` directory receives a file
/// named like the document. Unless `remove_source` is set, a target that is
/// the source or already exists is replaced by `<stem>_<stamp>.<ext>` in the
/// same directory, so nothing is overwritten.
pub fn output_path(
    document: &Path,
    output: Option<&Path>,
    remove_source: bool,
    stamp: &str,
) -> PathBuf {
    let file_name = document.file_name().unwrap_or(document.as_os_str());
    let candidate = match output {
        Some(out) if out.is_dir() => out.join(file_name),
        Some(out) => out.to_path_buf(),
        None => document.to_path_buf(),
    };

    let clobbers = candidate == document || candidate.exists();
    if !clobbers || remove_source {
        return candidate;
    }

    let stem = document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamped = match document.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    candidate
        .parent()
        .map_or_else(|| PathBuf::from(&stamped), |dir| dir.join(&stamped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use localizer_engine::{FetchSettings, ReqwestFetcher};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STAMP: &str = "20240305_140709";

    #[test]
    fn source_is_never_overwritten_by_default() {
        let temp = TempDir::new().unwrap();
        let document = temp.path().join("post.md");
        fs::write(&document, "x").unwrap();

        assert_eq!(
            output_path(&document, None, false, STAMP),
            temp.path().join("post_20240305_140709.md")
        );
    }

    #[test]
    fn remove_source_allows_in_place_rewrite() {
        let temp = TempDir::new().unwrap();
        let document = temp.path().join("post.md");
        fs::write(&document, "x").unwrap();

        assert_eq!(output_path(&document, None, true, STAMP), document);
    }

    #[test]
    fn existing_output_gets_timestamped_name_next_to_it() {
        let temp = TempDir::new().unwrap();
        let document = temp.path().join("post.md");
        let out_dir = temp.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        let existing = out_dir.join("taken.md");
        fs::write(&existing, "old").unwrap();

        assert_eq!(
            output_path(&document, Some(&existing), false, STAMP),
            out_dir.join("post_20240305_140709.md")
        );
        assert_eq!(output_path(&document, Some(&existing), true, STAMP), existing);
    }

    #[test]
    fn output_directory_receives_document_name() {
        let temp = TempDir::new().unwrap();
        let document = temp.path().join("src").join("post.md");
        let out_dir = temp.path().join("out");
        fs::create_dir(&out_dir).unwrap();

        assert_eq!(
            output_path(&document, Some(&out_dir), false, STAMP),
            out_dir.join("post.md")
        );
    }

    #[test]
    fn fresh_output_path_is_used_as_given() {
        let temp = TempDir::new().unwrap();
        let document = temp.path().join("post.md");
        let out = temp.path().join("new.md");

        assert_eq!(output_path(&document, Some(&out), false, STAMP), out);
    }

    #[test]
    fn base_url_is_the_document_directory() {
        assert_eq!(base_url_of("https://a.com/blog/post.md?x=1"), "https://a.com/blog");
        assert_eq!(base_url_of("https://a.com/post.md"), "https://a.com");
    }

    #[tokio::test]
    async fn local_document_is_used_in_place() {
        let fetcher = ReqwestFetcher::new(FetchSettings::default());
        let temp = TempDir::new().unwrap();
        let document = obtain_document("notes/post.md", &fetcher, None, temp.path())
            .await
            .unwrap();

        assert_eq!(
            document,
            Document {
                path: PathBuf::from("notes/post.md"),
                base_url: None,
            }
        );
    }

    #[tokio::test]
    async fn remote_document_is_downloaded_with_its_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blog/post.md"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"![a](pics/a.png)\n".to_vec(), "text/markdown"),
            )
            .mount(&server)
            .await;

        let fetcher = ReqwestFetcher::new(FetchSettings::default());
        let temp = TempDir::new().unwrap();
        let url = format!("{}/blog/post.md", server.uri());
        let document = obtain_document(&url, &fetcher, None, temp.path())
            .await
            .unwrap();

        assert_eq!(document.path, temp.path().join("post.md"));
        assert_eq!(document.base_url, Some(format!("{}/blog", server.uri())));
        assert_eq!(
            fs::read_to_string(&document.path).unwrap(),
            "![a](pics/a.png)\n"
        );
    }
}
