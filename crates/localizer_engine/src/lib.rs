//! Localizer engine: fetching, file writing and the per-document localization run.
mod fetch;
mod localize;
mod persist;
mod types;

pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use localize::{localize_images, LocalizeError, LocalizeReport, LocalizeRun, ReferenceReport};
pub use persist::{ensure_image_dir, ImageFileWriter, PersistError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
