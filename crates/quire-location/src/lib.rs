//! Document locations for Quire.
//!
//! A [`Location`] names every document the engine touches: source files handed
//! over by a loader, pages in the composed site tree and files produced by the
//! compiler. It is an ordered list of directory segments plus an optional
//! terminal file name, compared case-insensitively.
//!
//! Three string encodings are observable outside the engine:
//!
//! - identifier: `dir1::dir2::page.md` (see [`Location::to_id`])
//! - URL path: `/dir1/dir2/page.html`, index files collapse to `/dir1/dir2/`
//!   (see [`Location::to_url`])
//! - native path (see [`Location::to_path`])
//!
//! Glob filtering is provided by [`PatternSet`].

mod location;
mod pattern;

pub use location::{INDEX_FILE_NAME, ID_SEPARATOR, Location, LocationError};
pub use pattern::{NEGATION_MARKER, PatternSet};
