//! Filesystem backend for Quire.
//!
//! - [`FsLoader`] walks a source directory and returns every file as a
//!   [`SourceFile`](quire_storage::SourceFile), skipping hidden entries and
//!   anything matched by the configured ignore patterns.
//! - [`FsPublisher`] writes compiled files below an output directory.
//!
//! # Example
//!
//! ```ignore
//! use quire_location::{Location, PatternSet};
//! use quire_storage::Loader;
//! use quire_storage_fs::FsLoader;
//!
//! let loader = FsLoader::new("site").with_ignore(PatternSet::new(["*.tmp"])?);
//! let files = loader.load(&Location::default())?;
//! ```

mod loader;
mod publisher;

pub use loader::FsLoader;
pub use publisher::FsPublisher;

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";
