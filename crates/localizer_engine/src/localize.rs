use std::fs;
use std::io;
use std::path::PathBuf;

use localizer_core::{
    classify_reference, derive_remote_filename, join_base_url, join_document_path,
    local_filename, DedupDecision, Deduplicator, LocalizerConfig, PathResolver, ReferenceKind,
    ReferenceOutcome, ReplacementMapping, SkipReason,
};
use localizer_logging::{localizer_debug, localizer_error, localizer_info, localizer_warn};
use thiserror::Error;

use crate::fetch::Fetcher;
use crate::persist::{ImageFileWriter, PersistError};
use crate::FetchError;

#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("can't download image {reference:?}: {source}")]
    Fetch {
        reference: String,
        #[source]
        source: FetchError,
    },
    #[error("can't read local image {reference:?} from {path:?}: {source}")]
    LocalRead {
        reference: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("BUG: image {0:?} was already processed in this run")]
    DuplicateReference(String),
}

impl LocalizeError {
    /// Whether `skip_all_errors` may turn this failure into a skipped reference.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LocalizeError::Fetch { .. } | LocalizeError::LocalRead { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceReport {
    pub reference: String,
    pub outcome: ReferenceOutcome,
}

/// Result of a completed run: the mapping to substitute plus what happened to
/// every reference, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizeReport {
    pub mapping: ReplacementMapping,
    pub outcomes: Vec<ReferenceReport>,
}

impl LocalizeReport {
    pub fn files_written(&self) -> usize {
        self.count(|outcome| matches!(outcome, ReferenceOutcome::Mapped { written: true, .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ReferenceOutcome::Skipped(_)))
    }

    pub fn recovered_failures(&self) -> usize {
        self.count(|outcome| matches!(outcome, ReferenceOutcome::Recovered { .. }))
    }

    fn count(&self, predicate: impl Fn(&ReferenceOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

enum ImageSource {
    Remote(String),
    Local(PathBuf),
}

struct Download {
    filename: String,
    bytes: Vec<u8>,
}

/// One localization pass over a document's references.
///
/// Owns all per-run state (mapping, deduplication table, directory status);
/// references are handled strictly one after another.
pub struct LocalizeRun<'a> {
    config: &'a LocalizerConfig,
    fetcher: &'a dyn Fetcher,
    deduplicator: Option<Box<dyn Deduplicator>>,
    writer: ImageFileWriter,
    document_dir: String,
    mapping: ReplacementMapping,
    outcomes: Vec<ReferenceReport>,
}

impl<'a> LocalizeRun<'a> {
    pub fn new(config: &'a LocalizerConfig, fetcher: &'a dyn Fetcher) -> Self {
        Self {
            config,
            fetcher,
            deduplicator: config.deduplication.build(),
            writer: ImageFileWriter::new(config.image_dir()),
            document_dir: config.document_image_dir(),
            mapping: ReplacementMapping::new(),
            outcomes: Vec::new(),
        }
    }

    /// Replaces the deduplicator chosen by the configuration.
    pub fn with_deduplicator(mut self, deduplicator: Option<Box<dyn Deduplicator>>) -> Self {
        self.deduplicator = deduplicator;
        self
    }

    /// Processes `references` in order.
    ///
    /// Any fatal error aborts the run and no mapping is returned; files already
    /// written stay on disk.
    pub async fn run<S: AsRef<str>>(
        mut self,
        references: &[S],
    ) -> Result<LocalizeReport, LocalizeError> {
        let total = references.len();
        for (idx, reference) in references.iter().enumerate() {
            let reference = reference.as_ref();
            let outcome = self.process(idx + 1, total, reference).await?;
            self.outcomes.push(ReferenceReport {
                reference: reference.to_string(),
                outcome,
            });
        }

        Ok(LocalizeReport {
            mapping: self.mapping,
            outcomes: self.outcomes,
        })
    }

    async fn process(
        &mut self,
        number: usize,
        total: usize,
        reference: &str,
    ) -> Result<ReferenceOutcome, LocalizeError> {
        if self.mapping.contains_reference(reference) {
            localizer_error!("BUG: already downloaded image \"{}\"...", reference);
            return Err(LocalizeError::DuplicateReference(reference.to_string()));
        }

        if self.config.skip_list.contains(reference) {
            localizer_debug!(
                "Image {} [\"{}\"] was skipped, because it's in the skip list...",
                number,
                reference
            );
            return Ok(ReferenceOutcome::Skipped(SkipReason::SkipList));
        }

        let Some(source) = self.classify(number, reference) else {
            return Ok(ReferenceOutcome::Skipped(SkipReason::LocalNotAllowed));
        };

        let download = match self.obtain(number, total, reference, &source).await {
            Ok(download) => download,
            Err(err) if err.is_recoverable() && self.config.skip_all_errors => {
                localizer_warn!(
                    "Can't get image {}, error: [{}], but processing will be continued, \
                     because `skip_all_errors` flag is set",
                    number,
                    err
                );
                return Ok(ReferenceOutcome::Recovered {
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        };

        self.store(reference, download)
    }

    fn classify(&self, number: usize, reference: &str) -> Option<ImageSource> {
        match classify_reference(reference) {
            ReferenceKind::Remote => Some(ImageSource::Remote(reference.to_string())),
            ReferenceKind::Local if self.config.process_local_images => Some(ImageSource::Local(
                self.config.local_image_path(reference),
            )),
            ReferenceKind::Local => {
                localizer_warn!("Image {} [\"{}\"] has incorrect URL...", number, reference);
                match self.config.base_url.as_deref() {
                    Some(base_url) => {
                        localizer_debug!("Trying to add base URL \"{}\"...", base_url);
                        Some(ImageSource::Remote(join_base_url(base_url, reference)))
                    }
                    None => {
                        localizer_info!("Image downloading will be skipped...");
                        None
                    }
                }
            }
        }
    }

    async fn obtain(
        &self,
        number: usize,
        total: usize,
        reference: &str,
        source: &ImageSource,
    ) -> Result<Download, LocalizeError> {
        match source {
            ImageSource::Remote(url) => {
                localizer_info!("Downloading image {} of {} from \"{}\"...", number, total, url);
                let output = self
                    .fetcher
                    .fetch(url, self.config.fetch_timeout())
                    .await
                    .map_err(|source| LocalizeError::Fetch {
                        reference: reference.to_string(),
                        source,
                    })?;
                if output.metadata.tls_verification_skipped {
                    localizer_warn!("Image \"{}\" was fetched without TLS verification", url);
                }
                let filename = derive_remote_filename(
                    &output.metadata.final_url,
                    output.metadata.content_type.as_deref(),
                    output.metadata.content_disposition.as_deref(),
                    &self.config.mime_table,
                );
                Ok(Download {
                    filename,
                    bytes: output.bytes,
                })
            }
            ImageSource::Local(path) => {
                localizer_info!("Reading image {} of {} from {:?}...", number, total, path);
                let bytes = fs::read(path).map_err(|source| LocalizeError::LocalRead {
                    reference: reference.to_string(),
                    path: path.clone(),
                    source,
                })?;
                Ok(Download {
                    filename: local_filename(path, &self.config.mime_table),
                    bytes,
                })
            }
        }
    }

    fn store(
        &mut self,
        reference: &str,
        download: Download,
    ) -> Result<ReferenceOutcome, LocalizeError> {
        let mut filename = download.filename;

        if let Some(deduplicator) = self.deduplicator.as_mut() {
            match deduplicator.deduplicate(reference, &filename, &download.bytes, &self.mapping) {
                DedupDecision::Reuse(existing) => {
                    let document_path = join_document_path(&self.document_dir, &existing);
                    localizer_debug!(
                        "Image \"{}\" duplicates already stored \"{}\"",
                        reference,
                        document_path
                    );
                    self.mapping.insert(reference, document_path.clone());
                    return Ok(ReferenceOutcome::Mapped {
                        document_path,
                        written: false,
                    });
                }
                DedupDecision::Fresh(name) => filename = name,
            }
        }

        let resolved =
            PathResolver::new(&self.document_dir, &self.mapping).resolve(reference, &filename);
        if resolved.filename != filename {
            localizer_debug!(
                "Filename \"{}\" is taken, image \"{}\" renamed to \"{}\"",
                filename,
                reference,
                resolved.filename
            );
        }

        self.writer.write(&resolved.filename, &download.bytes)?;
        if let Some(deduplicator) = self.deduplicator.as_mut() {
            deduplicator.confirm(&resolved.filename);
        }
        self.mapping.insert(reference, resolved.document_path.clone());

        Ok(ReferenceOutcome::Mapped {
            document_path: resolved.document_path,
            written: true,
        })
    }
}

/// Runs a complete localization with the deduplicator chosen by `config`.
pub async fn localize_images<S: AsRef<str>>(
    references: &[S],
    config: &LocalizerConfig,
    fetcher: &dyn Fetcher,
) -> Result<LocalizeReport, LocalizeError> {
    LocalizeRun::new(config, fetcher).run(references).await
}
