//! Source discovery by filesystem walking.

use std::fs;
use std::path::{Path, PathBuf};

use quire_location::{Location, PatternSet};
use quire_storage::{Loader, SourceFile, StorageError};

use crate::BACKEND;

/// Loads source files from a directory tree.
///
/// Entries are visited depth-first with each directory's entries sorted by
/// name, so the resulting order (and therefore the page order of the composed
/// site) is stable across platforms. Names starting with `.` are skipped.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
    ignore: PatternSet,
}

impl FsLoader {
    /// Create a loader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: PatternSet::default(),
        }
    }

    /// Skip files whose location matches `ignore`.
    ///
    /// Locations are matched relative to the loaded directory. Only file
    /// locations are tested, so a negated pattern can keep a single file of
    /// an otherwise ignored folder (`drafts/*` with `|drafts/keep.md`).
    #[must_use]
    pub fn with_ignore(mut self, ignore: PatternSet) -> Self {
        self.ignore = ignore;
        self
    }

    /// Root directory of this loader.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(
        &self,
        dir: &Path,
        location: &Location,
        files: &mut Vec<SourceFile>,
    ) -> Result<(), StorageError> {
        let mut entries = fs::read_dir(dir)
            .map_err(|e| io_error(e, dir))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| io_error(e, dir))?;
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let is_dir = entry
                .file_type()
                .map_err(|e| io_error(e, &path))?
                .is_dir();

            if is_dir {
                self.walk(&path, &location.child(name), files)?;
            } else {
                let file_location = location.with_file_name(name);
                if self.is_ignored(&file_location) {
                    tracing::debug!(location = %file_location, "Ignoring file");
                    continue;
                }
                let content = fs::read(&path).map_err(|e| io_error(e, &path))?;
                files.push(SourceFile::new(file_location, content));
            }
        }

        Ok(())
    }

    fn is_ignored(&self, location: &Location) -> bool {
        !self.ignore.is_empty() && self.ignore.matches(location)
    }
}

impl Loader for FsLoader {
    fn load(&self, location: &Location) -> Result<Vec<SourceFile>, StorageError> {
        let dir = self.root.join(location.to_path());
        if !dir.is_dir() {
            return Err(StorageError::not_found(dir).with_backend(BACKEND));
        }

        let mut files = Vec::new();
        self.walk(&dir, &Location::default(), &mut files)?;

        tracing::info!(dir = %dir.display(), files = files.len(), "Loaded source files");
        Ok(files)
    }
}

fn io_error(err: std::io::Error, path: &Path) -> StorageError {
    StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
}
