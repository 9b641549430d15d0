//! Fallback resolution for fragment names missing from the site.

use std::collections::HashMap;
use std::fmt;

use quire_meta::Metadata;
use quire_site::Page;

use crate::BoxError;

/// Hook consulted for fragment names absent from the site's fragment table.
pub trait FragmentExtension: Send + Sync {
    /// Render the fragment `name`, or return `Ok(None)` if unknown.
    ///
    /// `data` holds the tag parameters merged with the ambient `$name`
    /// blocks of the page and the configuration.
    fn resolve_unknown(
        &self,
        name: &str,
        data: &Metadata,
        page: Option<&Page>,
    ) -> Result<Option<String>, BoxError>;
}

type Provider = Box<dyn Fn(&Metadata, Option<&Page>) -> Result<String, BoxError> + Send + Sync>;

/// Registry of virtual fragments provided by plugins.
///
/// Names are matched case-insensitively. Registering a name twice replaces
/// the earlier provider.
#[derive(Default)]
pub struct FragmentProviders {
    providers: HashMap<String, Provider>,
}

impl FragmentProviders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for `name`.
    #[must_use]
    pub fn with_provider<F>(mut self, name: &str, provider: F) -> Self
    where
        F: Fn(&Metadata, Option<&Page>) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        if self
            .providers
            .insert(name.to_lowercase(), Box::new(provider))
            .is_some()
        {
            tracing::warn!(name, "Replacing fragment provider");
        }
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(&name.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for FragmentProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FragmentProviders")
            .field("providers", &names)
            .finish()
    }
}

impl FragmentExtension for FragmentProviders {
    fn resolve_unknown(
        &self,
        name: &str,
        data: &Metadata,
        page: Option<&Page>,
    ) -> Result<Option<String>, BoxError> {
        self.providers
            .get(&name.to_lowercase())
            .map(|provider| provider(data, page))
            .transpose()
    }
}
