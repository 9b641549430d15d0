//! The composed [`Site`].

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use quire_location::Location;
use quire_meta::Metadata;

use crate::{Asset, CompositionError, Fragment, Layout, Page};

/// A composed site, ready for compilation.
///
/// Fragment and layout tables are keyed case-insensitively and keep their
/// insertion order. They are read-only once composition finishes, so a
/// `&Site` can be shared across threads compiling different pages.
#[derive(Debug)]
pub struct Site {
    base_url: String,
    main_page: Page,
    fragments: IndexMap<String, Fragment>,
    layouts: IndexMap<String, Arc<Layout>>,
    configuration: Metadata,
    assets: Vec<Asset>,
}

impl Site {
    #[must_use]
    pub fn new(base_url: impl Into<String>, main_page: Page, configuration: Metadata) -> Self {
        Self {
            base_url: base_url.into(),
            main_page,
            fragments: IndexMap::new(),
            layouts: IndexMap::new(),
            configuration,
            assets: Vec::new(),
        }
    }

    /// Register a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DuplicateFragment`] if a fragment with the
    /// same name (ignoring case) already exists.
    pub fn add_fragment(&mut self, fragment: Fragment) -> Result<(), CompositionError> {
        match self.fragments.entry(fragment.name().to_lowercase()) {
            Entry::Occupied(existing) => Err(CompositionError::DuplicateFragment {
                name: fragment.name().to_owned(),
                first: existing.get().source().clone(),
                second: fragment.source().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(fragment);
                Ok(())
            }
        }
    }

    /// Register a layout.
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DuplicateLayout`] if a layout with the
    /// same name (ignoring case) already exists.
    pub fn add_layout(&mut self, layout: Arc<Layout>) -> Result<(), CompositionError> {
        match self.layouts.entry(layout.name().to_lowercase()) {
            Entry::Occupied(existing) => Err(CompositionError::DuplicateLayout {
                name: layout.name().to_owned(),
                first: existing.get().source().clone(),
                second: layout.source().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(layout);
                Ok(())
            }
        }
    }

    pub fn add_asset(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    /// Base URL the site is published under.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn main_page(&self) -> &Page {
        &self.main_page
    }

    /// Mutable access to the page tree, for plugins that inject pages before
    /// compilation.
    pub fn main_page_mut(&mut self) -> &mut Page {
        &mut self.main_page
    }

    /// Look up a fragment by name, ignoring case.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&Fragment> {
        self.fragments.get(&name.to_lowercase())
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.values()
    }

    /// Look up a layout by name, ignoring case.
    #[must_use]
    pub fn layout(&self, name: &str) -> Option<&Arc<Layout>> {
        self.layouts.get(&name.to_lowercase())
    }

    pub fn layouts(&self) -> impl Iterator<Item = &Arc<Layout>> {
        self.layouts.values()
    }

    /// Site-wide configuration, the root of metadata inheritance.
    #[must_use]
    pub fn configuration(&self) -> &Metadata {
        &self.configuration
    }

    /// Top-level assets not attached to any page.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Iterate all pages depth-first, parents before children.
    #[must_use]
    pub fn pages(&self) -> Pages<'_> {
        Pages {
            stack: vec![&self.main_page],
        }
    }

    /// Find a page by its output location.
    #[must_use]
    pub fn find_page(&self, location: &Location) -> Option<&Page> {
        self.pages().find(|page| page.location() == location)
    }
}

/// Depth-first iterator over a site's pages.
pub struct Pages<'a> {
    stack: Vec<&'a Page>,
}

impl<'a> Iterator for Pages<'a> {
    type Item = &'a Page;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.stack.pop()?;
        self.stack.extend(page.sub_pages().iter().rev());
        Some(page)
    }
}
