//! Source and output file values.

use quire_location::Location;

/// A document handed to the engine by a [`Loader`](crate::Loader).
///
/// The location is relative to the loaded directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub location: Location,
    pub content: Vec<u8>,
}

impl SourceFile {
    #[must_use]
    pub fn new(location: Location, content: impl Into<Vec<u8>>) -> Self {
        Self {
            location,
            content: content.into(),
        }
    }

    /// Content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the UTF-8 error if the content is binary.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

/// A finished document ready to be written by a [`Publisher`](crate::Publisher).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub location: Location,
    pub content: Vec<u8>,
}

impl File {
    #[must_use]
    pub fn new(location: Location, content: impl Into<Vec<u8>>) -> Self {
        Self {
            location,
            content: content.into(),
        }
    }
}
