//! Markdown content transformer for Quire.
//!
//! [`MarkdownTransformer`] converts CommonMark with GitHub Flavored Markdown
//! extensions to HTML. It is the default [`ContentTransformer`] of the
//! `quire` CLI.
//!
//! Fragment tags are expanded before transformation, so the Markdown pass
//! never sees them; the layout placeholder `{{ content }}` passes through
//! untouched.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quire_compiler::{Compiler, CompilerSettings, FragmentProviders};
//! use quire_renderer::MarkdownTransformer;
//!
//! let compiler = Compiler::new(
//!     Arc::new(MarkdownTransformer::new()),
//!     Arc::new(FragmentProviders::new()),
//!     &CompilerSettings::default(),
//! )?;
//! ```

use pulldown_cmark::{Options, Parser, html};
use quire_compiler::{BoxError, ContentTransformer, RenderContext};

/// Markdown to HTML transformer.
#[derive(Clone, Debug)]
pub struct MarkdownTransformer {
    gfm: bool,
}

impl MarkdownTransformer {
    /// Create a transformer with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// When enabled the parser supports tables, strikethrough (`~~text~~`),
    /// task lists (`- [ ] item`) and alerts.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render Markdown to HTML without a compilation context.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);

        output.truncate(output.trim_end_matches('\n').len());
        output
    }
}

impl Default for MarkdownTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTransformer for MarkdownTransformer {
    fn transform(&self, raw: &str, _id: &str, _ctx: &RenderContext<'_>) -> Result<String, BoxError> {
        Ok(self.render(raw))
    }
}
