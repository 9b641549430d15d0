//! Composition errors.

use quire_location::Location;
use quire_meta::MetadataError;

/// Error that aborts site composition.
///
/// Every variant names the offending entity and the source location(s) that
/// triggered it.
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    /// Two fragment files normalize to the same name.
    #[error("Duplicate fragment '{name}' defined in '{first}' and '{second}'")]
    DuplicateFragment {
        name: String,
        first: Location,
        second: Location,
    },
    /// Two layout files normalize to the same name.
    #[error("Duplicate layout '{name}' defined in '{first}' and '{second}'")]
    DuplicateLayout {
        name: String,
        first: Location,
        second: Location,
    },
    /// Two content files map to the same page (e.g. `about.md` and `about/index.md`).
    #[error("Duplicate page '{location}' defined in '{first}' and '{second}'")]
    DuplicatePage {
        location: Location,
        first: Location,
        second: Location,
    },
    /// A page or layout references a layout that does not exist.
    #[error("Layout '{name}' requested by '{requested_by}' does not exist")]
    MissingLayout { name: String, requested_by: Location },
    /// A layout's `layout` value is not a string.
    #[error("Layout reference in '{location}' must be a string, found {found}")]
    InvalidLayoutReference {
        location: Location,
        found: &'static str,
    },
    /// A layout chain references itself.
    #[error("Layout cycle: {}", .chain.join(" -> "))]
    LayoutCycle { chain: Vec<String> },
    /// Front matter could not be parsed.
    #[error("Invalid front matter in '{location}': {source}")]
    InvalidFrontMatter {
        location: Location,
        #[source]
        source: MetadataError,
    },
    /// A page, layout or fragment is not valid UTF-8.
    #[error("'{location}' is not valid UTF-8: {source}")]
    InvalidEncoding {
        location: Location,
        #[source]
        source: std::str::Utf8Error,
    },
}
