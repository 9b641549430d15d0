//! Building a [`Site`] from loaded source files.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use quire_location::Location;
use quire_meta::{Metadata, Value, split_front_matter};
use quire_storage::SourceFile;

use crate::{Asset, CompositionError, Fragment, Layout, Page, Site};

/// Metadata key naming the layout a page or layout is wrapped in.
const LAYOUT_KEY: &str = "layout";

/// Separator joining folder names into fragment and layout names.
const NAME_SEPARATOR: &str = "::";

/// Folder names and file conventions used to partition a source tree.
#[derive(Clone, Debug)]
pub struct ComposerSettings {
    /// Top-level folder holding fragments.
    pub fragments_dir: String,
    /// Top-level folder holding layouts.
    pub layouts_dir: String,
    /// File stem of a folder's own page.
    pub index_name: String,
    /// Extensions (without dot) of files that become pages. Everything else
    /// outside the fragment and layout folders is an asset.
    pub page_extensions: Vec<String>,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            fragments_dir: "_includes".to_owned(),
            layouts_dir: "_layouts".to_owned(),
            index_name: "index".to_owned(),
            page_extensions: ["md", "markdown", "html", "htm"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Builds [`Site`]s from flat file lists.
///
/// Partitioning rules:
///
/// - files under `fragments_dir` become fragments named by their path below
///   the folder without extension (`_includes/nav/top.md` is `nav::top`);
/// - files under `layouts_dir` become layouts, named the same way;
/// - other files with a page extension become pages: `dir/index.md` is the
///   page of `dir`, `dir/about.md` is the page `about` below `dir`;
/// - any other file is an asset of the deepest page owning its folder, or a
///   site-level asset when no such page exists.
///
/// Folders without an index file get an empty placeholder page. Sub-pages keep
/// the order in which their files (or first descendant files) appear in the
/// input.
///
/// A page's layout is its front matter `layout`, falling back to the
/// configuration's `layout`.
#[derive(Debug)]
pub struct SiteComposer {
    settings: ComposerSettings,
    configuration: Metadata,
}

/// Parsed layout waiting for its parent to be resolved.
struct LayoutDraft {
    name: String,
    raw_content: String,
    data: Metadata,
    parent: Option<String>,
    source: Location,
}

impl SiteComposer {
    #[must_use]
    pub fn new(settings: ComposerSettings, configuration: Metadata) -> Self {
        Self {
            settings,
            configuration,
        }
    }

    /// Compose a site.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompositionError`] found; the site is unusable if
    /// any structural rule is violated.
    pub fn compose<I>(&self, files: I, base_url: &str) -> Result<Site, CompositionError>
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let mut fragments = Vec::new();
        let mut layouts = Vec::new();
        let mut pages = Vec::new();
        let mut assets = Vec::new();

        for file in files {
            match file.location.segments().first() {
                Some(first) if first.eq_ignore_ascii_case(&self.settings.fragments_dir) => {
                    fragments.push(file);
                }
                Some(first) if first.eq_ignore_ascii_case(&self.settings.layouts_dir) => {
                    layouts.push(file);
                }
                _ if self.is_page_file(&file.location) => pages.push(file),
                _ => assets.push(file),
            }
        }

        let mut site = Site::new(
            base_url,
            Page::placeholder(&Location::default()),
            self.configuration.clone(),
        );

        for file in fragments {
            let fragment = self.read_fragment(&file)?;
            tracing::debug!(name = fragment.name(), source = %file.location, "Composed fragment");
            site.add_fragment(fragment)?;
        }

        for layout in self.build_layouts(layouts)? {
            tracing::debug!(name = layout.name(), source = %layout.source(), "Composed layout");
            site.add_layout(layout)?;
        }

        for file in pages {
            self.add_page(&mut site, &file)?;
        }
        self.apply_default_layout(&mut site)?;

        for file in assets {
            attach_asset(&mut site, file);
        }

        tracing::info!(
            pages = site.pages().count(),
            fragments = site.fragments().count(),
            layouts = site.layouts().count(),
            assets = site.assets().len(),
            "Composed site"
        );
        Ok(site)
    }

    fn is_page_file(&self, location: &Location) -> bool {
        location.extension().is_some_and(|ext| {
            self.settings
                .page_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }

    fn read_fragment(&self, file: &SourceFile) -> Result<Fragment, CompositionError> {
        let (data, body) = read_frame(file)?;
        Ok(Fragment::new(entity_name(&file.location), body, data).with_source(file.location.clone()))
    }

    /// Parse layout files and link every layout to its parent.
    fn build_layouts(&self, files: Vec<SourceFile>) -> Result<Vec<Arc<Layout>>, CompositionError> {
        let mut drafts: IndexMap<String, LayoutDraft> = IndexMap::new();

        for file in files {
            let (mut data, raw_content) = read_frame(&file)?;
            let parent = take_layout_name(&mut data, &file.location)?;
            let name = entity_name(&file.location);

            if let Some(existing) = drafts.get(&name.to_lowercase()) {
                return Err(CompositionError::DuplicateLayout {
                    name,
                    first: existing.source.clone(),
                    second: file.location,
                });
            }

            drafts.insert(
                name.to_lowercase(),
                LayoutDraft {
                    name,
                    raw_content,
                    data,
                    parent,
                    source: file.location,
                },
            );
        }

        let mut resolved = HashMap::new();
        let mut layouts = Vec::with_capacity(drafts.len());
        for (key, draft) in &drafts {
            layouts.push(resolve_layout(key, draft, &drafts, &mut resolved, &mut Vec::new())?);
        }

        Ok(layouts)
    }

    fn add_page(&self, site: &mut Site, file: &SourceFile) -> Result<(), CompositionError> {
        let (mut data, raw_content) = read_frame(file)?;
        let layout_name = take_layout_name(&mut data, &file.location)?;

        let mut names = file.location.segments().to_vec();
        let stem = file.location.file_stem().unwrap_or_default();
        if !stem.eq_ignore_ascii_case(&self.settings.index_name) {
            names.push(stem.to_owned());
        }

        let layout = match layout_name {
            Some(name) => Some(lookup_layout(site, &name, &file.location)?),
            None => None,
        };

        let page = site.main_page_mut().descendant_or_placeholder(&names);
        if let Some(first) = page.source() {
            return Err(CompositionError::DuplicatePage {
                location: page.location().clone(),
                first: first.clone(),
                second: file.location.clone(),
            });
        }

        tracing::debug!(url = %page.url(), source = %file.location, "Composed page");
        page.populate(file.location.clone(), raw_content, data, layout);
        Ok(())
    }

    /// Give every page without an explicit layout the configured default.
    fn apply_default_layout(&self, site: &mut Site) -> Result<(), CompositionError> {
        let requested_by = site.main_page().location().clone();
        let Some(name) = self.default_layout_name(&requested_by)? else {
            return Ok(());
        };

        let layout = lookup_layout(site, &name, &requested_by)?;
        Self::apply_layout_to_tree(&layout, site.main_page_mut());
        Ok(())
    }

    fn apply_layout_to_tree(layout: &Arc<Layout>, page: &mut Page) {
        if page.layout().is_none() {
            page.set_layout(Some(Arc::clone(layout)));
        }
        for sub_page in page.sub_pages_mut() {
            Self::apply_layout_to_tree(layout, sub_page);
        }
    }

    fn default_layout_name(&self, requested_by: &Location) -> Result<Option<String>, CompositionError> {
        match self.configuration.get_ignore_case(LAYOUT_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(name)) if name.is_empty() => Ok(None),
            Some(Value::String(name)) => Ok(Some(name.clone())),
            Some(other) => Err(CompositionError::InvalidLayoutReference {
                location: requested_by.clone(),
                found: other.kind(),
            }),
        }
    }
}

/// Decode a source file and split off its front matter.
fn read_frame(file: &SourceFile) -> Result<(Metadata, String), CompositionError> {
    let text = file
        .text()
        .map_err(|source| CompositionError::InvalidEncoding {
            location: file.location.clone(),
            source,
        })?;

    let (data, body) =
        split_front_matter(text).map_err(|source| CompositionError::InvalidFrontMatter {
            location: file.location.clone(),
            source,
        })?;

    Ok((data, body.to_owned()))
}

/// Name of a fragment or layout: path below the top-level folder plus the
/// file stem, joined with `::`.
fn entity_name(location: &Location) -> String {
    location
        .segments()
        .iter()
        .skip(1)
        .map(String::as_str)
        .chain(location.file_stem())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Pop the `layout` directive from front matter.
fn take_layout_name(
    data: &mut Metadata,
    location: &Location,
) -> Result<Option<String>, CompositionError> {
    match data.take_ignore_case(LAYOUT_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(name)) if name.is_empty() => Ok(None),
        Some(Value::String(name)) => Ok(Some(name)),
        Some(other) => Err(CompositionError::InvalidLayoutReference {
            location: location.clone(),
            found: other.kind(),
        }),
    }
}

fn lookup_layout(
    site: &Site,
    name: &str,
    requested_by: &Location,
) -> Result<Arc<Layout>, CompositionError> {
    site.layout(name)
        .cloned()
        .ok_or_else(|| CompositionError::MissingLayout {
            name: name.to_owned(),
            requested_by: requested_by.clone(),
        })
}

/// Build the layout stored under `key`, building its ancestors first.
///
/// `visiting` holds the chain currently being built and detects cycles.
fn resolve_layout(
    key: &str,
    draft: &LayoutDraft,
    drafts: &IndexMap<String, LayoutDraft>,
    resolved: &mut HashMap<String, Arc<Layout>>,
    visiting: &mut Vec<String>,
) -> Result<Arc<Layout>, CompositionError> {
    if let Some(layout) = resolved.get(key) {
        return Ok(Arc::clone(layout));
    }

    if visiting.iter().any(|name| name.eq_ignore_ascii_case(&draft.name)) {
        let mut chain = visiting.clone();
        chain.push(draft.name.clone());
        return Err(CompositionError::LayoutCycle { chain });
    }

    visiting.push(draft.name.clone());
    let parent = match &draft.parent {
        Some(parent_name) => {
            let parent_key = parent_name.to_lowercase();
            let Some(parent_draft) = drafts.get(&parent_key) else {
                return Err(CompositionError::MissingLayout {
                    name: parent_name.clone(),
                    requested_by: draft.source.clone(),
                });
            };
            Some(resolve_layout(&parent_key, parent_draft, drafts, resolved, visiting)?)
        }
        None => None,
    };
    visiting.pop();

    let layout = Arc::new(
        Layout::new(
            draft.name.clone(),
            draft.raw_content.clone(),
            draft.data.clone(),
            parent,
        )
        .with_source(draft.source.clone()),
    );
    resolved.insert(key.to_owned(), Arc::clone(&layout));
    Ok(layout)
}

/// Attach an asset to the deepest page owning its folder.
fn attach_asset(site: &mut Site, file: SourceFile) {
    let asset = Asset::new(file.location, file.content);
    let folders = asset.location.segments().to_vec();

    let (page, depth) = site.main_page_mut().deepest_descendant_mut(&folders);
    if depth > 0 {
        tracing::debug!(asset = %asset.location, page = %page.url(), "Attached asset");
        page.assets_mut().push(asset);
    } else {
        tracing::debug!(asset = %asset.location, "Attached site asset");
        site.add_asset(asset);
    }
}
