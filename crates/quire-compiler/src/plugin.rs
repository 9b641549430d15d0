//! Compiler extension points.

use quire_meta::Metadata;
use quire_site::Site;

use crate::BoxError;

/// Hooks invoked by the [`Compiler`](crate::Compiler), in registration order.
///
/// Both hooks default to doing nothing.
pub trait CompilerPlugin: Send + Sync {
    /// Plugin name used in error messages.
    fn name(&self) -> &str;

    /// Called once before any page is compiled. May append pages or assets.
    fn pre_compile(&self, site: &mut Site) -> Result<(), BoxError> {
        let _ = site;
        Ok(())
    }

    /// Filter a page's final HTML before it leaves the compiler.
    fn write_page_content(
        &self,
        html: String,
        data: &Metadata,
        url: &str,
    ) -> Result<String, BoxError> {
        let _ = (data, url);
        Ok(html)
    }
}
