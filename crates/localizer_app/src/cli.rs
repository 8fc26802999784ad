//! Command-line surface of `localize-images`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use localizer_core::{timeout_from_secs, DeduplicationVariant, LocalizerConfig};
use localizer_engine::{localize_images, FetchSettings, ReqwestFetcher};
use localizer_logging::{localizer_debug, localizer_info};
use log::LevelFilter;

use crate::document::{obtain_document, output_path, Document};
use crate::markdown::{extract_image_references, rewrite_image_references};
use crate::skip_list::{expand_home, parse_skip_list};
use crate::template::{expand_template, timestamp, TemplateVars};

/// Downloads the images referenced by a Markdown document and rewrites the
/// document to point at the local copies.
#[derive(Debug, Parser)]
#[command(name = "localize-images", version)]
#[command(about = "Make a Markdown document's images local", long_about = None)]
pub struct Cli {
    /// Path or URL of the document in Markdown format.
    pub document: String,

    /// Skip references from the comma-separated list (or file with a leading '@').
    #[arg(short = 's', long, value_name = "LIST")]
    pub skip_list: Option<String>,

    /// Folder, relative to the document, in which to store images
    /// (variables: $article_name, $time, $date, $dt, $base_url).
    #[arg(short = 'd', long, default_value = "images")]
    pub images_dirname: String,

    /// Public path used in the document instead of the images folder
    /// (variables: $article_name, $time, $date, $dt, $base_url).
    #[arg(short = 'p', long)]
    pub images_publicpath: Option<String>,

    /// Skip all images that cannot be fetched or read instead of aborting.
    #[arg(short = 'a', long)]
    pub skip_all_incorrect: bool,

    /// Seconds to wait for one download; zero or negative waits forever.
    #[arg(short = 't', long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub downloading_timeout: f64,

    /// Store identical images once, comparing content hashes.
    #[arg(short = 'D', long, conflicts_with = "dedup_with_names")]
    pub dedup_with_hash: bool,

    /// Name stored images after their content hash.
    #[arg(long)]
    pub dedup_with_names: bool,

    /// Copy images referenced by local paths too.
    #[arg(short = 'l', long)]
    pub process_local_images: bool,

    /// Base URL prepended to local references that are not processed as files.
    #[arg(short = 'b', long)]
    pub base_url: Option<String>,

    /// File or directory for the rewritten document (default: next to the source).
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Replace the source document, or delete it after writing elsewhere.
    #[arg(short = 'R', long)]
    pub remove_source: bool,

    /// Print the reference to document path mapping as JSON.
    #[arg(long)]
    pub print_mapping: bool,

    /// Also write log records to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log debug details.
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log warnings and errors only.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    fn deduplication(&self) -> DeduplicationVariant {
        if self.dedup_with_hash {
            DeduplicationVariant::ContentHash
        } else if self.dedup_with_names {
            DeduplicationVariant::NameHash
        } else {
            DeduplicationVariant::Disabled
        }
    }

    /// Builds the run configuration for `document`, whose rewritten copy goes
    /// to `output`. Reads the skip-list file when one is given.
    ///
    /// An explicit `--base-url` wins over the one of a downloaded document.
    pub fn to_config(
        &self,
        document: &Document,
        output: &Path,
        now: NaiveDateTime,
    ) -> Result<LocalizerConfig> {
        let skip_list = match self.skip_list.as_deref() {
            Some(raw) => parse_skip_list(raw)?,
            None => Vec::new(),
        };
        let base_url = self
            .base_url
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| document.base_url.clone());

        let article_name = output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let template_base = base_url.clone().unwrap_or_else(|| {
            document
                .path
                .parent()
                .map(|dir| dir.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default()
        });
        let vars = TemplateVars::new(article_name, &template_base, now);

        let mut config = LocalizerConfig::for_document(document.path.clone())
            .with_skip_list(skip_list)
            .with_skip_all_errors(self.skip_all_incorrect)
            .with_image_dir_name(expand_template(&self.images_dirname, &vars))
            .with_fetch_timeout_secs(self.downloading_timeout)
            .with_deduplication(self.deduplication())
            .with_process_local_images(self.process_local_images);
        if let Some(public_path) = &self.images_publicpath {
            let public_path = expand_template(public_path, &vars);
            localizer_info!("Image public path: {}", public_path);
            config = config.with_public_path(public_path);
        }
        if let Some(base_url) = base_url {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    localizer_info!("Processing started...");
    let now = Local::now().naive_local();
    let fetcher = ReqwestFetcher::new(FetchSettings::default());

    let document = obtain_document(
        &cli.document,
        &fetcher,
        timeout_from_secs(cli.downloading_timeout),
        Path::new("."),
    )
    .await?;
    localizer_info!("File {:?} will be processed...", document.path);

    let requested_output = cli.output.as_deref().map(expand_home);
    let output = output_path(
        &document.path,
        requested_output.as_deref(),
        cli.remove_source,
        &timestamp(now),
    );
    let config = cli.to_config(&document, &output, now)?;

    let text = fs::read_to_string(&document.path)
        .with_context(|| format!("failed to read document {:?}", document.path))?;
    let references = extract_image_references(&text);
    localizer_info!("Found {} image reference(s)", references.len());

    let report = localize_images(&references, &config, &fetcher).await?;
    for entry in &report.outcomes {
        localizer_debug!("\"{}\": {}", entry.reference, entry.outcome);
    }

    let rewritten = rewrite_image_references(&text, &report.mapping);
    localizer_info!("Writing document to {:?}...", output);
    fs::write(&output, rewritten).with_context(|| format!("failed to write {:?}", output))?;

    if cli.remove_source && output != document.path {
        localizer_info!("Removing source file {:?}...", document.path);
        fs::remove_file(&document.path)
            .with_context(|| format!("failed to remove {:?}", document.path))?;
    }

    if cli.print_mapping {
        println!("{}", serde_json::to_string_pretty(&report.mapping)?);
    }

    localizer_info!(
        "Processing finished successfully: {} written, {} skipped, {} failed",
        report.files_written(),
        report.skipped(),
        report.recovered_failures()
    );
    Ok(())
}
