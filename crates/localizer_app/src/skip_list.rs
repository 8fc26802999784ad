//! Parsing of the `--skip-list` argument.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use localizer_logging::localizer_info;

/// Turns the raw `--skip-list` value into references.
///
/// A leading `@` names a file with one reference per line; anything else is a
/// comma-separated list. Entries are trimmed and empty ones dropped.
pub fn parse_skip_list(raw: &str) -> Result<Vec<String>> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let path = expand_home(path);
            localizer_info!("Reading skip list from a file {:?}...", path);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read skip list file {:?}", path))?;
            Ok(collect_entries(content.lines()))
        }
        None => Ok(collect_entries(raw.split(','))),
    }
}

fn collect_entries<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<String> {
    entries
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if path == "~" {
        return home();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home().join(rest),
        None => PathBuf::from(path),
    }
}
