//! CLI error types.

use quire_compiler::CompileError;
use quire_config::ConfigError;
use quire_location::LocationError;
use quire_site::CompositionError;
use quire_storage::StorageError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Composition(#[from] CompositionError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Pattern(#[from] LocationError),

    #[error("Invalid site configuration '{file}': {message}")]
    SiteConfiguration { file: String, message: String },

    #[error("{failed} of {total} pages failed to compile")]
    PagesFailed { failed: usize, total: usize },
}
