//! Frames: pages, layouts and fragments.
//!
//! All three carry raw (unexpanded) content and a [`Metadata`] block. Pages
//! form the output tree; layouts and fragments live in site-wide tables and
//! are looked up by name.

use std::sync::{Arc, OnceLock};

use quire_location::{INDEX_FILE_NAME, Location};
use quire_meta::Metadata;

/// Opaque binary file carried alongside a page or the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output location, identical to the source location.
    pub location: Location,
    pub content: Vec<u8>,
}

impl Asset {
    #[must_use]
    pub fn new(location: Location, content: impl Into<Vec<u8>>) -> Self {
        Self {
            location,
            content: content.into(),
        }
    }
}

/// A wrapping template with a content placeholder.
///
/// A layout may itself be wrapped by a parent layout. The chain is linked
/// through `Arc`s and is acyclic by construction: a layout can only reference
/// a parent that was fully built before it.
#[derive(Debug)]
pub struct Layout {
    name: String,
    raw_content: String,
    data: Metadata,
    parent: Option<Arc<Layout>>,
    source: Location,
}

impl Layout {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        raw_content: impl Into<String>,
        data: Metadata,
        parent: Option<Arc<Layout>>,
    ) -> Self {
        Self {
            name: name.into(),
            raw_content: raw_content.into(),
            data,
            parent,
            source: Location::default(),
        }
    }

    /// Set the source file this layout was read from.
    #[must_use]
    pub fn with_source(mut self, source: Location) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Front matter, without the consumed `layout` key.
    #[must_use]
    pub fn data(&self) -> &Metadata {
        &self.data
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Layout>> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn source(&self) -> &Location {
        &self.source
    }

    /// Iterate this layout and its ancestors, innermost first.
    pub fn chain(&self) -> impl Iterator<Item = &Layout> {
        std::iter::successors(Some(self), |layout| layout.parent.as_deref())
    }
}

/// A named, reusable snippet referenced by fragment tags.
#[derive(Debug, Clone)]
pub struct Fragment {
    name: String,
    raw_content: String,
    data: Metadata,
    source: Location,
}

impl Fragment {
    #[must_use]
    pub fn new(name: impl Into<String>, raw_content: impl Into<String>, data: Metadata) -> Self {
        Self {
            name: name.into(),
            raw_content: raw_content.into(),
            data,
            source: Location::default(),
        }
    }

    /// Set the source file this fragment was read from.
    #[must_use]
    pub fn with_source(mut self, source: Location) -> Self {
        self.source = source;
        self
    }

    /// Namespaced name (`dir::name`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Default parameters declared in the fragment's front matter.
    #[must_use]
    pub fn data(&self) -> &Metadata {
        &self.data
    }

    #[must_use]
    pub fn source(&self) -> &Location {
        &self.source
    }
}

/// A node of the page tree.
///
/// Each page owns its sub-pages (in discovery order) and its assets. The
/// rendered content is written once by the compiler.
#[derive(Debug, Clone)]
pub struct Page {
    name: String,
    location: Location,
    source: Option<Location>,
    raw_content: String,
    data: Metadata,
    layout: Option<Arc<Layout>>,
    sub_pages: Vec<Page>,
    assets: Vec<Asset>,
    content: OnceLock<String>,
}

impl Page {
    /// Create a page emitted at `location`.
    ///
    /// The page name is the last directory segment of the location.
    #[must_use]
    pub fn new(location: Location, raw_content: impl Into<String>, data: Metadata) -> Self {
        Self {
            name: location.segments().last().cloned().unwrap_or_default(),
            location,
            source: None,
            raw_content: raw_content.into(),
            data,
            layout: None,
            sub_pages: Vec::new(),
            assets: Vec::new(),
            content: OnceLock::new(),
        }
    }

    /// Create an empty page standing in for a folder without an index file.
    #[must_use]
    pub fn placeholder(directory: &Location) -> Self {
        Self::new(
            directory.with_file_name(INDEX_FILE_NAME),
            String::new(),
            Metadata::new(),
        )
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Arc<Layout>) -> Self {
        self.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_sub_page(mut self, page: Page) -> Self {
        self.sub_pages.push(page);
        self
    }

    #[must_use]
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Folder name of the page; empty for the main page.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output location.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Site-relative URL of the page.
    #[must_use]
    pub fn url(&self) -> String {
        self.location.to_url(None)
    }

    /// Identity key passed to content transformers.
    #[must_use]
    pub fn key(&self) -> String {
        self.location.to_id()
    }

    /// Source file, or `None` for a synthesized placeholder.
    #[must_use]
    pub fn source(&self) -> Option<&Location> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.source.is_none()
    }

    #[must_use]
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Front matter, without the consumed `layout` key.
    #[must_use]
    pub fn data(&self) -> &Metadata {
        &self.data
    }

    #[must_use]
    pub fn layout(&self) -> Option<&Arc<Layout>> {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn sub_pages(&self) -> &[Page] {
        &self.sub_pages
    }

    pub fn sub_pages_mut(&mut self) -> &mut Vec<Page> {
        &mut self.sub_pages
    }

    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut Vec<Asset> {
        &mut self.assets
    }

    /// Rendered content, once compiled.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.get().map(String::as_str)
    }

    /// Store the rendered content.
    ///
    /// # Errors
    ///
    /// Returns the rejected content if the page was already compiled.
    pub fn set_content(&self, content: String) -> Result<(), String> {
        self.content.set(content)
    }

    /// Fill a placeholder with the content of its source file.
    pub(crate) fn populate(
        &mut self,
        source: Location,
        raw_content: String,
        data: Metadata,
        layout: Option<Arc<Layout>>,
    ) {
        self.source = Some(source);
        self.raw_content = raw_content;
        self.data = data;
        self.layout = layout;
    }

    pub(crate) fn set_layout(&mut self, layout: Option<Arc<Layout>>) {
        self.layout = layout;
    }

    /// Find or create the descendant page for the given folder names,
    /// synthesizing placeholder pages for missing folders.
    pub(crate) fn descendant_or_placeholder(&mut self, names: &[String]) -> &mut Page {
        let Some((first, rest)) = names.split_first() else {
            return self;
        };

        let index = match self.child_index(first) {
            Some(index) => index,
            None => {
                let directory = self.location.child(first.clone());
                self.sub_pages.push(Page::placeholder(&directory));
                self.sub_pages.len() - 1
            }
        };

        self.sub_pages[index].descendant_or_placeholder(rest)
    }

    /// Find an existing descendant, stopping at the deepest page found.
    pub(crate) fn deepest_descendant_mut(&mut self, names: &[String]) -> (&mut Page, usize) {
        let Some((first, rest)) = names.split_first() else {
            return (self, 0);
        };

        match self.child_index(first) {
            Some(index) => {
                let (page, depth) = self.sub_pages[index].deepest_descendant_mut(rest);
                (page, depth + 1)
            }
            None => (self, 0),
        }
    }

    fn child_index(&self, name: &str) -> Option<usize> {
        self.sub_pages
            .iter()
            .position(|page| page.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(name: &str, parent: Option<Arc<Layout>>) -> Arc<Layout> {
        Arc::new(Layout::new(name, "{{ content }}", Metadata::new(), parent))
    }

    #[test]
    fn test_layout_chain_innermost_first() {
        let base = layout("base", None);
        let docs = layout("docs", Some(Arc::clone(&base)));
        let api = layout("api", Some(docs));

        let names: Vec<&str> = api.chain().map(Layout::name).collect();

        assert_eq!(names, ["api", "docs", "base"]);
    }

    #[test]
    fn test_placeholder_page() {
        let page = Page::placeholder(&Location::directory(["guide", "setup"]));

        assert!(page.is_placeholder());
        assert_eq!(page.name(), "setup");
        assert_eq!(page.url(), "/guide/setup/");
        assert_eq!(page.key(), "guide::setup::index.html");
        assert_eq!(page.raw_content(), "");
    }

    #[test]
    fn test_set_content_once() {
        let page = Page::placeholder(&Location::default());

        assert!(page.content().is_none());
        page.set_content("first".to_owned()).unwrap();
        assert_eq!(page.set_content("second".to_owned()), Err("second".to_owned()));
        assert_eq!(page.content(), Some("first"));
    }

    #[test]
    fn test_descendant_or_placeholder_creates_missing_folders() {
        let mut root = Page::placeholder(&Location::default());
        let names = vec!["guide".to_owned(), "setup".to_owned()];

        root.descendant_or_placeholder(&names);
        root.descendant_or_placeholder(&["Guide".to_owned()]);

        assert_eq!(root.sub_pages().len(), 1);
        let guide = &root.sub_pages()[0];
        assert_eq!(guide.url(), "/guide/");
        assert_eq!(guide.sub_pages()[0].url(), "/guide/setup/");
    }

    #[test]
    fn test_deepest_descendant() {
        let mut root = Page::placeholder(&Location::default())
            .with_sub_page(Page::placeholder(&Location::directory(["guide"])));
        let names = vec!["guide".to_owned(), "img".to_owned()];

        let (page, depth) = root.deepest_descendant_mut(&names);

        assert_eq!(depth, 1);
        assert_eq!(page.name(), "guide");
    }
}
