use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use localizer_logging::localizer_info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("image directory {path:?} is not usable: {message}")]
    ImageDir { path: PathBuf, message: String },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ensure the image directory exists; create it (and parents) if missing.
pub fn ensure_image_dir(dir: &Path) -> Result<(), PersistError> {
    let dir_error = |message: String| PersistError::ImageDir {
        path: dir.to_path_buf(),
        message,
    };

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(dir_error("path is not a directory".into())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| dir_error(e.to_string()))
        }
        Err(err) => Err(dir_error(err.to_string())),
    }
}

/// Writes image bytes into one directory, creating it on first use.
///
/// Files are written in place; an interrupted write can leave a truncated file.
pub struct ImageFileWriter {
    dir: PathBuf,
    dir_ready: bool,
}

impl ImageFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            dir_ready: false,
        }
    }

    pub fn write(&mut self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        if !self.dir_ready {
            ensure_image_dir(&self.dir)?;
            self.dir_ready = true;
        }

        let target = self.dir.join(filename);
        localizer_info!("Image will be written to the file {:?}...", target);
        write_file(&target, content).map_err(|source| PersistError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

fn write_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.flush()
}
