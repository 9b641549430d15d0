//! Compilation errors.

use quire_meta::MetadataError;

use crate::BoxError;

/// Error produced while compiling a page.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The content transformer failed.
    #[error("Failed to transform '{id}': {source}")]
    Transform {
        id: String,
        #[source]
        source: BoxError,
    },
    /// Neither the fragment table nor any provider knows the name.
    #[error("Fragment '{name}' referenced from '{url}' does not exist")]
    MissingFragment { name: String, url: String },
    /// Expanding a fragment tag failed.
    #[error("Failed to resolve fragment '{name}' in '{url}': {source}")]
    FragmentResolution {
        name: String,
        url: String,
        #[source]
        source: Box<CompileError>,
    },
    /// Fragments include each other deeper than the configured limit.
    #[error("Fragment '{name}' in '{url}' nests deeper than {limit} levels")]
    FragmentRecursionLimit {
        name: String,
        url: String,
        limit: usize,
    },
    /// A layout body lacks the content placeholder.
    #[error("Layout '{name}' does not contain the content placeholder")]
    LayoutMissingContentPlaceholder { name: String },
    /// Fragment tag parameters are not a YAML mapping.
    #[error("Invalid parameters for fragment '{name}': {source}")]
    InvalidParameters {
        name: String,
        #[source]
        source: MetadataError,
    },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    /// A plugin or fragment provider failed.
    #[error("Plugin '{plugin}' failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: BoxError,
    },
    /// Compiling a page failed; wraps the underlying error.
    #[error("Failed to compile '{url}': {source}")]
    Page {
        url: String,
        #[source]
        source: Box<CompileError>,
    },
    /// Fragment tag markers cannot form a valid pattern.
    #[error("Invalid fragment tags '{open}' and '{close}': {reason}")]
    InvalidTags {
        open: String,
        close: String,
        reason: String,
    },
}

impl CompileError {
    /// The innermost error, unwrapping page and fragment wrappers.
    #[must_use]
    pub fn innermost(&self) -> &CompileError {
        match self {
            Self::FragmentResolution { source, .. } | Self::Page { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// URL of the failing page, if this error was produced for a page.
    #[must_use]
    pub fn page_url(&self) -> Option<&str> {
        match self {
            Self::Page { url, .. } => Some(url),
            _ => None,
        }
    }
}
