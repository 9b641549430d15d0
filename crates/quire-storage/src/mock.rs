//! In-memory loader and publisher for testing.

use std::sync::RwLock;

use quire_location::Location;

use crate::{File, Loader, Publisher, SourceFile, StorageError, StorageErrorKind};

/// Mock loader for testing.
///
/// Holds source files in memory, in insertion order. Paths given to the
/// builder methods are parsed with [`Location::parse`].
///
/// # Example
///
/// ```ignore
/// use quire_storage::{Loader, MockLoader};
///
/// let loader = MockLoader::new()
///     .with_file("index.md", "# Home")
///     .with_file("_layouts/main.html", "<body>{{ content }}</body>");
///
/// let files = loader.load(&Location::default()).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockLoader {
    files: RwLock<Vec<SourceFile>>,
    fail_with: RwLock<Option<String>>,
}

impl MockLoader {
    /// Create a new empty mock loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: &str, content: impl Into<String>) -> Self {
        self.with_bytes(path, content.into().into_bytes())
    }

    /// Add a binary file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_bytes(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files
            .write()
            .unwrap()
            .push(SourceFile::new(Location::parse(path), content));
        self
    }

    /// Make every subsequent `load` fail with the given message.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        *self.fail_with.write().unwrap() = Some(message.into());
        self
    }
}

impl Loader for MockLoader {
    fn load(&self, location: &Location) -> Result<Vec<SourceFile>, StorageError> {
        if let Some(message) = self.fail_with.read().unwrap().as_deref() {
            return Err(StorageError::new(StorageErrorKind::Other)
                .with_backend("Mock")
                .with_source(std::io::Error::other(message.to_owned())));
        }

        let files = self.files.read().unwrap();
        let loaded = files
            .iter()
            .filter_map(|file| {
                let relative = file.location.relative_to(location).ok()?;
                Some(SourceFile::new(relative, file.content.clone()))
            })
            .collect();

        Ok(loaded)
    }
}

/// Mock publisher that keeps written files in memory.
#[derive(Debug, Default)]
pub struct MockPublisher {
    written: RwLock<Vec<File>>,
}

impl MockPublisher {
    /// Create a new empty mock publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files written so far, in write order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn written(&self) -> Vec<File> {
        self.written.read().unwrap().clone()
    }
}

impl Publisher for MockPublisher {
    fn write(&self, files: &mut dyn Iterator<Item = File>) -> Result<usize, StorageError> {
        let mut written = self.written.write().unwrap();
        let before = written.len();
        written.extend(files);
        Ok(written.len() - before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_root_keeps_order() {
        let loader = MockLoader::new()
            .with_file("b.md", "B")
            .with_file("a.md", "A");

        let files = loader.load(&Location::default()).unwrap();

        let ids: Vec<String> = files.iter().map(|f| f.location.to_id()).collect();
        assert_eq!(ids, ["b.md", "a.md"]);
    }

    #[test]
    fn test_load_subdirectory_is_relative() {
        let loader = MockLoader::new()
            .with_file("index.md", "Home")
            .with_file("guide/intro.md", "Intro");

        let files = loader.load(&Location::directory(["guide"])).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].location.to_id(), "intro.md");
    }

    #[test]
    fn test_load_failure() {
        let loader = MockLoader::new().with_failure("disk on fire");

        let err = loader.load(&Location::default()).unwrap_err();

        assert_eq!(err.to_string(), "[Mock] Error: disk on fire");
    }

    #[test]
    fn test_publisher_records_files() {
        let publisher = MockPublisher::new();
        let files = vec![File::new(Location::parse("index.html"), "<p>Home</p>")];

        let count = publisher.write(&mut files.into_iter()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(publisher.written()[0].content, b"<p>Home</p>");
    }
}
