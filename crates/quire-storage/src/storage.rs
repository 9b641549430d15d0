//! Loader and publisher traits and the shared error type.

use std::path::PathBuf;

use quire_location::Location;

use crate::{File, SourceFile};

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Resource already exists.
    AlreadyExists,
    /// Invalid path or pattern.
    InvalidPath,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => StorageErrorKind::AlreadyExists,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Source of documents for site composition.
pub trait Loader: Send + Sync {
    /// Load every file below `location`.
    ///
    /// Returned locations are relative to `location`; the default (empty)
    /// location means the loader's root. An empty result is a valid, empty
    /// site.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory can't be listed or a file
    /// can't be read.
    fn load(&self, location: &Location) -> Result<Vec<SourceFile>, StorageError>;
}

/// Destination for compiled output.
pub trait Publisher {
    /// Write every file produced by `files`, in order.
    ///
    /// The iterator is consumed lazily, so a caller can stop production early
    /// (for example on the first compile error) without the publisher having
    /// written anything past that point.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on the first write failure.
    fn write(&self, files: &mut dyn Iterator<Item = File>) -> Result<usize, StorageError>;
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_storage_error_with_path() {
        let err = StorageError::new(StorageErrorKind::NotFound).with_path("/foo/bar");

        assert_eq!(err.path.as_deref(), Some(Path::new("/foo/bar")));
    }

    #[test]
    fn test_storage_error_with_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound).with_source(io_err);

        assert!(err.downcast_source::<std::io::Error>().is_some());
    }

    #[test]
    fn test_storage_error_io_kinds() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let other = std::io::Error::other("boom");

        assert_eq!(StorageError::io(not_found, None).kind, StorageErrorKind::NotFound);
        assert_eq!(
            StorageError::io(denied, None).kind,
            StorageErrorKind::PermissionDenied
        );
        assert_eq!(StorageError::io(other, None).kind, StorageErrorKind::Other);
    }

    #[test]
    fn test_storage_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_storage_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_path("/foo/bar")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (path: /foo/bar)"
        );
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
