//! Page compilation and layout wrapping.

use std::fmt;
use std::sync::Arc;

use quire_site::{Asset, Layout, Page, Site};
use quire_storage::File;
use rayon::prelude::*;

use crate::{
    CompileError, CompilerPlugin, ContentTransformer, FragmentExtension, FragmentResolver,
    RenderContext,
};

/// Tag markers and limits used by the [`Compiler`].
#[derive(Clone, Debug)]
pub struct CompilerSettings {
    /// Opening marker of fragment tags.
    pub open_tag: String,
    /// Closing marker of fragment tags.
    pub close_tag: String,
    /// Token in layout bodies replaced by the wrapped content.
    pub content_placeholder: String,
    /// Maximum nesting of fragments including fragments.
    pub max_fragment_depth: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            open_tag: "{%".to_owned(),
            close_tag: "%}".to_owned(),
            content_placeholder: "{{ content }}".to_owned(),
            max_fragment_depth: 64,
        }
    }
}

/// Compiles the pages of a [`Site`] into output [`File`]s.
pub struct Compiler {
    transformer: Arc<dyn ContentTransformer>,
    resolver: FragmentResolver,
    plugins: Vec<Box<dyn CompilerPlugin>>,
    content_placeholder: String,
}

impl Compiler {
    /// Create a compiler.
    ///
    /// `extension` resolves fragment names missing from the site; pass an
    /// empty [`FragmentProviders`](crate::FragmentProviders) if there are none.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidTags`] if the tag markers are invalid.
    pub fn new(
        transformer: Arc<dyn ContentTransformer>,
        extension: Arc<dyn FragmentExtension>,
        settings: &CompilerSettings,
    ) -> Result<Self, CompileError> {
        let resolver = FragmentResolver::new(
            Arc::clone(&transformer),
            extension,
            &settings.open_tag,
            &settings.close_tag,
            settings.max_fragment_depth,
        )?;

        Ok(Self {
            transformer,
            resolver,
            plugins: Vec::new(),
            content_placeholder: settings.content_placeholder.clone(),
        })
    }

    /// Register a plugin. Plugins run in registration order.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl CompilerPlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Run pre-compile hooks and return the lazy output sequence.
    ///
    /// Files are produced depth-first: each page, then its assets, then its
    /// sub-pages; the site's top-level assets come last. A page that fails
    /// yields one [`CompileError::Page`] and its sub-pages and assets are
    /// skipped. Iteration may continue past an error.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Plugin`] if a pre-compile hook fails.
    pub fn compile<'a>(&'a self, site: &'a mut Site) -> Result<CompiledFiles<'a>, CompileError> {
        self.pre_compile(site)?;

        let site: &'a Site = site;
        let mut pending: Vec<Pending<'a>> = site.assets().iter().rev().map(Pending::Asset).collect();
        pending.push(Pending::Page(site.main_page()));

        Ok(CompiledFiles {
            compiler: self,
            site,
            pending,
        })
    }

    /// Compile every page eagerly, sibling subtrees in parallel.
    ///
    /// Returns the same results in the same order as [`Compiler::compile`].
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Plugin`] if a pre-compile hook fails.
    pub fn compile_parallel(
        &self,
        site: &mut Site,
    ) -> Result<Vec<Result<File, CompileError>>, CompileError> {
        self.pre_compile(site)?;

        let site: &Site = site;
        let mut files = self.compile_subtree(site, site.main_page());
        files.extend(site.assets().iter().map(|asset| Ok(asset_file(asset))));

        tracing::info!(
            files = files.len(),
            failed = files.iter().filter(|file| file.is_err()).count(),
            "Compiled site"
        );
        Ok(files)
    }

    /// Render one page: expand fragments, transform, wrap in layouts and run
    /// plugin filters.
    ///
    /// Does not store the result on the page.
    ///
    /// # Errors
    ///
    /// Returns the first error; it is not wrapped with the page URL.
    pub fn render_page(&self, site: &Site, page: &Page) -> Result<String, CompileError> {
        let url = page.url();
        let key = page.key();
        let data = page.data().merge_over(site.configuration())?;

        let resolved = self
            .resolver
            .resolve_all(page.raw_content(), site, Some(page), &url)?;
        let ctx = RenderContext {
            site,
            page: Some(page),
            data: &data,
            url: &url,
        };
        let mut html = self
            .transformer
            .transform(&resolved, &key, &ctx)
            .map_err(|source| CompileError::Transform { id: key, source })?;

        if let Some(layout) = page.layout() {
            for layout in layout.chain() {
                html = self.wrap(site, page, &url, layout, &html)?;
            }
        }

        for plugin in &self.plugins {
            html = plugin
                .write_page_content(html, &data, &url)
                .map_err(|source| CompileError::Plugin {
                    plugin: plugin.name().to_owned(),
                    source,
                })?;
        }

        Ok(html)
    }

    /// Render `layout` and substitute `inner` at its content placeholder.
    fn wrap(
        &self,
        site: &Site,
        page: &Page,
        url: &str,
        layout: &Layout,
        inner: &str,
    ) -> Result<String, CompileError> {
        let data = page
            .data()
            .merge_over(&layout.data().merge_over(site.configuration())?)?;

        let resolved = self
            .resolver
            .resolve_all(layout.raw_content(), site, Some(page), url)?;
        let ctx = RenderContext {
            site,
            page: Some(page),
            data: &data,
            url,
        };
        let body = self
            .transformer
            .transform(&resolved, layout.name(), &ctx)
            .map_err(|source| CompileError::Transform {
                id: layout.name().to_owned(),
                source,
            })?;

        if !body.contains(&self.content_placeholder) {
            return Err(CompileError::LayoutMissingContentPlaceholder {
                name: layout.name().to_owned(),
            });
        }

        Ok(body.replace(&self.content_placeholder, inner))
    }

    fn pre_compile(&self, site: &mut Site) -> Result<(), CompileError> {
        for plugin in &self.plugins {
            plugin
                .pre_compile(site)
                .map_err(|source| CompileError::Plugin {
                    plugin: plugin.name().to_owned(),
                    source,
                })?;
            tracing::debug!(plugin = plugin.name(), "Ran pre-compile hook");
        }
        Ok(())
    }

    /// Compile a page, store its content and build its output file.
    fn emit_page(&self, site: &Site, page: &Page) -> Result<File, CompileError> {
        let url = page.url();
        let html = self
            .render_page(site, page)
            .map_err(|source| CompileError::Page {
                url: url.clone(),
                source: Box::new(source),
            })?;

        if page.set_content(html).is_err() {
            tracing::warn!(url = %url, "Page already compiled, keeping previous content");
        }
        let content = page.content().unwrap_or_default();

        tracing::debug!(url = %url, bytes = content.len(), "Compiled page");
        Ok(File::new(page.location().clone(), content))
    }

    fn compile_subtree(&self, site: &Site, page: &Page) -> Vec<Result<File, CompileError>> {
        let file = match self.emit_page(site, page) {
            Ok(file) => file,
            Err(err) => return vec![Err(err)],
        };

        let mut files = vec![Ok(file)];
        files.extend(page.assets().iter().map(|asset| Ok(asset_file(asset))));

        let subtrees: Vec<Vec<Result<File, CompileError>>> = page
            .sub_pages()
            .par_iter()
            .map(|sub_page| self.compile_subtree(site, sub_page))
            .collect();
        files.extend(subtrees.into_iter().flatten());

        files
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("Compiler")
            .field("resolver", &self.resolver)
            .field("plugins", &plugins)
            .field("content_placeholder", &self.content_placeholder)
            .finish_non_exhaustive()
    }
}

enum Pending<'a> {
    Page(&'a Page),
    Asset(&'a Asset),
}

/// Lazy sequence of compiled files returned by [`Compiler::compile`].
pub struct CompiledFiles<'a> {
    compiler: &'a Compiler,
    site: &'a Site,
    pending: Vec<Pending<'a>>,
}

impl Iterator for CompiledFiles<'_> {
    type Item = Result<File, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.pending.pop()? {
            Pending::Asset(asset) => Some(Ok(asset_file(asset))),
            Pending::Page(page) => {
                let result = self.compiler.emit_page(self.site, page);
                if result.is_ok() {
                    self.pending
                        .extend(page.sub_pages().iter().rev().map(Pending::Page));
                    self.pending
                        .extend(page.assets().iter().rev().map(Pending::Asset));
                }
                Some(result)
            }
        }
    }
}

impl fmt::Debug for CompiledFiles<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFiles")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

fn asset_file(asset: &Asset) -> File {
    File::new(asset.location.clone(), asset.content.clone())
}
