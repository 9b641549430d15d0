//! Writing compiled files to disk.

use std::fs;
use std::path::{Path, PathBuf};

use quire_storage::{File, Publisher, StorageError};

use crate::BACKEND;

/// Writes compiled files below an output directory.
///
/// The output directory is removed and recreated before the first file is
/// written, so stale files from a previous build never survive.
#[derive(Debug, Clone)]
pub struct FsPublisher {
    output_dir: PathBuf,
}

impl FsPublisher {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn reset_output_dir(&self) -> Result<(), StorageError> {
        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir).map_err(|e| io_error(e, &self.output_dir))?;
        }
        fs::create_dir_all(&self.output_dir).map_err(|e| io_error(e, &self.output_dir))
    }
}

impl Publisher for FsPublisher {
    fn write(&self, files: &mut dyn Iterator<Item = File>) -> Result<usize, StorageError> {
        self.reset_output_dir()?;

        let mut count = 0;
        for file in files {
            let path = self.output_dir.join(file.location.to_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| io_error(e, parent))?;
            }
            fs::write(&path, &file.content).map_err(|e| io_error(e, &path))?;

            tracing::debug!(location = %file.location, bytes = file.content.len(), "Wrote file");
            count += 1;
        }

        tracing::info!(dir = %self.output_dir.display(), files = count, "Published site");
        Ok(count)
    }
}

fn io_error(err: std::io::Error, path: &Path) -> StorageError {
    StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
}
