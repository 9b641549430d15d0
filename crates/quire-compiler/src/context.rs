//! The content transformer contract.

use quire_meta::Metadata;
use quire_site::{Page, Site};

/// Boxed error returned by transformers, providers and plugins.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a transformer may read while rendering one document.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub site: &'a Site,
    /// Page being compiled. `None` only when a caller resolves text outside
    /// of any page.
    pub page: Option<&'a Page>,
    /// Effective metadata: the page's data over the site configuration for
    /// pages and layouts, the merged tag parameters for fragments.
    pub data: &'a Metadata,
    /// URL of the page the text belongs to.
    pub url: &'a str,
}

/// Converts raw text into HTML.
///
/// Called for page bodies, layout bodies and fragment bodies after their
/// fragment tags were expanded. Implementations must be thread-safe: pages
/// may be compiled in parallel.
pub trait ContentTransformer: Send + Sync {
    /// Transform `raw`.
    ///
    /// `id` identifies the document (page key, layout or fragment name) and
    /// tags any error reported for it.
    fn transform(&self, raw: &str, id: &str, ctx: &RenderContext<'_>) -> Result<String, BoxError>;
}
