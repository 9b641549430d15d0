//! Document metadata for Quire.
//!
//! [`Metadata`] is an ordered, string-keyed map of [`Value`]s. It carries front
//! matter of pages, layouts and fragments, fragment tag parameters and the
//! site-wide configuration that sits at the root of every inheritance chain.
//!
//! # Inheritance
//!
//! [`Metadata::merge_over`] layers a child over its parent:
//!
//! - every *defined* child value (not null, not an empty string) replaces the
//!   parent's value or is appended after the parent's keys;
//! - a child list containing the [`INHERIT_SENTINEL`] (`"$"`) gets the parent's
//!   list spliced in at the sentinel's position.
//!
//! ```
//! use quire_meta::Metadata;
//!
//! let parent = Metadata::from_yaml("tags: [a, b]\ntitle: Site").unwrap();
//! let child = Metadata::from_yaml("tags: [x, $, y]\ntitle: ''").unwrap();
//!
//! let merged = child.merge_over(&parent).unwrap();
//! assert_eq!(merged.get("title").unwrap().as_str(), Some("Site"));
//! assert_eq!(merged.get("tags").unwrap().to_string(), "[x, a, b, y]");
//! ```

mod front_matter;
mod metadata;
mod value;
mod yaml;

pub use front_matter::{FRONT_MATTER_DELIMITER, split_front_matter};
pub use metadata::{INHERIT_SENTINEL, Metadata};
pub use value::Value;

/// Error returned by metadata parsing and merging.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A value had an unexpected shape, e.g. the list sentinel was used
    /// against a parent value that is not a list.
    #[error("Metadata value '{key}' must be a {expected}, found {found}")]
    TypeMismatch {
        /// Key of the offending entry.
        key: String,
        /// Expected value kind.
        expected: &'static str,
        /// Actual value kind.
        found: &'static str,
    },
    /// YAML syntax error.
    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The YAML document is valid but is not a mapping.
    #[error("Metadata must be a mapping, found {0}")]
    NotAMap(&'static str),
    /// Front matter was opened but never closed.
    #[error("Front matter opened with '---' is never closed")]
    UnterminatedFrontMatter,
}
