//! Site model and composition for Quire.
//!
//! A [`Site`] is the in-memory form of a source tree:
//!
//! - a tree of [`Page`]s rooted at the main page,
//! - a table of named [`Fragment`]s (reusable snippets, `_includes/`),
//! - a table of named [`Layout`]s (wrapping templates, `_layouts/`),
//! - the site configuration [`Metadata`](quire_meta::Metadata),
//! - top-level [`Asset`]s.
//!
//! [`SiteComposer`] builds a site from the flat file list returned by a
//! [`Loader`](quire_storage::Loader). Layout chains are resolved once at
//! composition time into `Arc`-linked, acyclic ancestor lists.
//!
//! # Example
//!
//! ```ignore
//! use quire_meta::Metadata;
//! use quire_site::{ComposerSettings, SiteComposer};
//!
//! let composer = SiteComposer::new(ComposerSettings::default(), Metadata::new());
//! let site = composer.compose(files, "https://example.com")?;
//! for page in site.pages() {
//!     println!("{}", page.url());
//! }
//! ```

mod composer;
mod error;
mod frame;
mod site;

pub use composer::{ComposerSettings, SiteComposer};
pub use error::CompositionError;
pub use frame::{Asset, Fragment, Layout, Page};
pub use site::{Pages, Site};
