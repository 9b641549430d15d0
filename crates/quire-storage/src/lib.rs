//! Loader and publisher abstractions for Quire.
//!
//! The engine never touches the filesystem directly. Source documents come in
//! through a [`Loader`] as [`SourceFile`]s, and compiled output leaves through
//! a [`Publisher`] as [`File`]s. This keeps composition and compilation
//! testable without I/O and lets other backends (archives, object stores) plug
//! in.
//!
//! # Architecture
//!
//! - [`Loader`] / [`Publisher`] traits
//! - [`StorageError`] shared by all backends
//! - [`MockLoader`] and [`MockPublisher`] for tests (behind the `mock` feature)
//!
//! The filesystem backend lives in `quire-storage-fs`.

mod file;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use file::{File, SourceFile};
#[cfg(feature = "mock")]
pub use mock::{MockLoader, MockPublisher};
pub use storage::{Loader, Publisher, StorageError, StorageErrorKind};
