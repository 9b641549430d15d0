//! Fragment tag expansion.

use std::fmt;
use std::sync::Arc;

use quire_meta::{Metadata, MetadataError, Value};
use quire_site::{Page, Site};
use regex::Regex;

use crate::{CompileError, ContentTransformer, FragmentExtension, RenderContext};

/// Prefix of the metadata key holding ambient parameters for a fragment.
const AMBIENT_PREFIX: char = '$';

/// Expands fragment tags in raw text.
///
/// A tag is the text between an open and a close marker (`{%` and `%}` by
/// default). Its trimmed interior is a fragment name, optionally followed by
/// whitespace and a YAML mapping of parameters, in flow style or one key
/// per line:
///
/// ```text
/// {% nav::top %}
/// {% card {title: Intro, width: 2} %}
/// {% card
///   title: Intro
///   width: 2
/// %}
/// ```
///
/// Tags are matched non-greedily and replaced left to right. The rendered
/// replacement is scanned again, so fragments may emit further tags.
///
/// # Parameters
///
/// The data passed to a fragment is layered, highest precedence first:
///
/// 1. the tag's own parameters;
/// 2. the `$name` map in the requesting page's metadata;
/// 3. the `$name` map in the site configuration;
/// 4. the fragment's front matter defaults.
pub struct FragmentResolver {
    transformer: Arc<dyn ContentTransformer>,
    extension: Arc<dyn FragmentExtension>,
    pattern: Regex,
    open_tag: String,
    close_tag: String,
    max_depth: usize,
}

impl FragmentResolver {
    /// Create a resolver for the given tag markers.
    ///
    /// `max_depth` bounds how deep fragments may include other fragments.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidTags`] if a marker is empty.
    pub fn new(
        transformer: Arc<dyn ContentTransformer>,
        extension: Arc<dyn FragmentExtension>,
        open_tag: &str,
        close_tag: &str,
        max_depth: usize,
    ) -> Result<Self, CompileError> {
        let invalid = |reason: String| CompileError::InvalidTags {
            open: open_tag.to_owned(),
            close: close_tag.to_owned(),
            reason,
        };

        if open_tag.is_empty() || close_tag.is_empty() {
            return Err(invalid("markers must not be empty".to_owned()));
        }

        let pattern = Regex::new(&format!(
            "(?s){}.*?{}",
            regex::escape(open_tag),
            regex::escape(close_tag)
        ))
        .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            transformer,
            extension,
            pattern,
            open_tag: open_tag.to_owned(),
            close_tag: close_tag.to_owned(),
            max_depth,
        })
    }

    /// Expand every fragment tag in `raw`.
    ///
    /// The result is all or nothing: the first failing tag aborts expansion.
    ///
    /// # Errors
    ///
    /// Failures are wrapped in [`CompileError::FragmentResolution`] carrying
    /// the tag's fragment name and `url`. Exceeding the depth limit yields
    /// [`CompileError::FragmentRecursionLimit`] directly.
    pub fn resolve_all(
        &self,
        raw: &str,
        site: &Site,
        page: Option<&Page>,
        url: &str,
    ) -> Result<String, CompileError> {
        self.resolve_at_depth(raw, site, page, url, 0)
    }

    fn resolve_at_depth(
        &self,
        raw: &str,
        site: &Site,
        page: Option<&Page>,
        url: &str,
        depth: usize,
    ) -> Result<String, CompileError> {
        let mut output = String::with_capacity(raw.len());
        let mut last = 0;

        for tag in self.pattern.find_iter(raw) {
            let interior = &raw[tag.start() + self.open_tag.len()..tag.end() - self.close_tag.len()];
            let (name, params) = split_tag(interior);

            let replacement = self
                .expand(name, params, site, page, url, depth)
                .map_err(|source| match source {
                    limit @ CompileError::FragmentRecursionLimit { .. } => limit,
                    source => CompileError::FragmentResolution {
                        name: name.to_owned(),
                        url: url.to_owned(),
                        source: Box::new(source),
                    },
                })?;

            output.push_str(&raw[last..tag.start()]);
            output.push_str(&replacement);
            last = tag.end();
        }

        output.push_str(&raw[last..]);
        Ok(output)
    }

    fn expand(
        &self,
        name: &str,
        params: &str,
        site: &Site,
        page: Option<&Page>,
        url: &str,
        depth: usize,
    ) -> Result<String, CompileError> {
        if depth >= self.max_depth {
            return Err(CompileError::FragmentRecursionLimit {
                name: name.to_owned(),
                url: url.to_owned(),
                limit: self.max_depth,
            });
        }

        let params = Metadata::from_yaml(params).map_err(|source| CompileError::InvalidParameters {
            name: name.to_owned(),
            source,
        })?;
        let data = ambient_parameters(name, params, site, page)?;

        let rendered = if let Some(fragment) = site.fragment(name) {
            let data = data.merge_over(fragment.data())?;
            let ctx = RenderContext {
                site,
                page,
                data: &data,
                url,
            };
            self.transformer
                .transform(fragment.raw_content(), fragment.name(), &ctx)
                .map_err(|source| CompileError::Transform {
                    id: fragment.name().to_owned(),
                    source,
                })?
        } else {
            self.extension
                .resolve_unknown(name, &data, page)
                .map_err(|source| CompileError::Plugin {
                    plugin: name.to_owned(),
                    source,
                })?
                .ok_or_else(|| CompileError::MissingFragment {
                    name: name.to_owned(),
                    url: url.to_owned(),
                })?
        };

        tracing::trace!(name, url, depth, "Expanded fragment");
        self.resolve_at_depth(&rendered, site, page, url, depth + 1)
    }
}

impl fmt::Debug for FragmentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentResolver")
            .field("open_tag", &self.open_tag)
            .field("close_tag", &self.close_tag)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Split a tag interior into the fragment name and its parameter text.
fn split_tag(interior: &str) -> (&str, &str) {
    let interior = interior.trim();
    match interior.find(char::is_whitespace) {
        Some(index) => (&interior[..index], &interior[index..]),
        None => (interior, ""),
    }
}

/// Layer tag parameters over the `$name` blocks of the page and configuration.
fn ambient_parameters(
    name: &str,
    params: Metadata,
    site: &Site,
    page: Option<&Page>,
) -> Result<Metadata, MetadataError> {
    let key = format!("{AMBIENT_PREFIX}{name}");

    let mut data = params;
    if let Some(page) = page {
        data = data.merge_over(&ambient_block(&key, page.data())?)?;
    }
    data.merge_over(&ambient_block(&key, site.configuration())?)
}

fn ambient_block(key: &str, source: &Metadata) -> Result<Metadata, MetadataError> {
    match source.get_ignore_case(key) {
        None | Some(Value::Null) => Ok(Metadata::new()),
        Some(Value::Map(block)) => Ok(block.clone()),
        Some(other) => Err(MetadataError::TypeMismatch {
            key: key.to_owned(),
            expected: "map",
            found: other.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quire_location::Location;
    use quire_site::Fragment;

    use super::*;
    use crate::{BoxError, FragmentProviders};

    /// Renders `<data key>` markers from the context data, leaves the rest.
    struct DataTransformer;

    impl ContentTransformer for DataTransformer {
        fn transform(&self, raw: &str, _id: &str, ctx: &RenderContext<'_>) -> Result<String, BoxError> {
            let mut out = raw.to_owned();
            for (key, value) in ctx.data {
                out = out.replace(&format!("<data {key}>"), &value.to_string());
            }
            if out.contains("<fail>") {
                return Err("transformer refused".into());
            }
            Ok(out)
        }
    }

    fn resolver_with(extension: FragmentProviders, max_depth: usize) -> FragmentResolver {
        FragmentResolver::new(
            Arc::new(DataTransformer),
            Arc::new(extension),
            "{%",
            "%}",
            max_depth,
        )
        .unwrap()
    }

    fn resolver() -> FragmentResolver {
        resolver_with(FragmentProviders::new(), 64)
    }

    fn fragment(name: &str, raw: &str, data: &str) -> Fragment {
        Fragment::new(name, raw, Metadata::from_yaml(data).unwrap())
            .with_source(Location::new(format!("{name}.md"), ["_includes"]))
    }

    fn site_with(configuration: &str, fragments: Vec<Fragment>) -> Site {
        let mut site = Site::new(
            "",
            Page::placeholder(&Location::default()),
            Metadata::from_yaml(configuration).unwrap(),
        );
        for fragment in fragments {
            site.add_fragment(fragment).unwrap();
        }
        site
    }

    fn page(data: &str) -> Page {
        Page::new(
            Location::new("index.html", ["p"]),
            "",
            Metadata::from_yaml(data).unwrap(),
        )
    }

    #[test]
    fn test_text_without_tags_is_unchanged() {
        let site = site_with("", vec![]);
        let text = "<p>No {tags} here %} {{ content }}</p>";

        let resolved = resolver().resolve_all(text, &site, None, "/").unwrap();

        assert_eq!(resolved, text);
    }

    #[test]
    fn test_resolved_output_is_stable() {
        let site = site_with("", vec![fragment("i1", "Some Value", "")]);
        let resolver = resolver();

        let once = resolver.resolve_all("a {% i1 %} b", &site, None, "/").unwrap();
        let twice = resolver.resolve_all(&once, &site, None, "/").unwrap();

        assert_eq!(once, "a Some Value b");
        assert_eq!(twice, once);
    }

    #[test]
    fn test_caller_parameters_override_fragment_defaults() {
        let site = site_with("", vec![fragment("i1", "Some Value\n<data p1>", "p1: A")]);

        let defaults = resolver().resolve_all("{% i1 %}", &site, None, "/").unwrap();
        let overridden = resolver()
            .resolve_all("{% i1 p1: B %}", &site, None, "/")
            .unwrap();

        assert_eq!(defaults, "Some Value\nA");
        assert_eq!(overridden, "Some Value\nB");
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let site = site_with("", vec![fragment("Nav::Top", "TOP", "")]);

        let resolved = resolver().resolve_all("{%nav::top%}", &site, None, "/").unwrap();

        assert_eq!(resolved, "TOP");
    }

    #[test]
    fn test_multiline_parameters() {
        let site = site_with("", vec![fragment("card", "<data title>/<data width>", "")]);
        let text = "{% card\n  title: Intro\n  width: 2\n%}";

        let resolved = resolver().resolve_all(text, &site, None, "/").unwrap();

        assert_eq!(resolved, "Intro/2");
    }

    #[test]
    fn test_flow_style_parameters() {
        let site = site_with("", vec![fragment("card", "<data title>/<data width>", "")]);

        let resolved = resolver()
            .resolve_all("{% card {title: Intro, width: 2} %}", &site, None, "/")
            .unwrap();

        assert_eq!(resolved, "Intro/2");
    }

    #[test]
    fn test_ambient_parameter_precedence() {
        let site = site_with(
            "$card: {a: config, b: config, c: config}",
            vec![fragment("card", "<data a> <data b> <data c> <data d>", "d: default\nc: default")],
        );
        let page = page("$card: {a: page, b: page}");

        let resolved = resolver()
            .resolve_all("{% card a: tag %}", &site, Some(&page), "/p/")
            .unwrap();

        assert_eq!(resolved, "tag page config default");
    }

    #[test]
    fn test_ambient_list_inherits_with_sentinel() {
        let site = site_with(
            "$menu: {items: [home]}",
            vec![fragment("menu", "<data items>", "")],
        );
        let page = page("$menu: {items: [$, docs]}");

        let resolved = resolver()
            .resolve_all("{% menu %}", &site, Some(&page), "/p/")
            .unwrap();

        assert_eq!(resolved, "[home, docs]");
    }

    #[test]
    fn test_ambient_block_must_be_a_map() {
        let site = site_with("$card: flat", vec![fragment("card", "x", "")]);

        let err = resolver().resolve_all("{% card %}", &site, None, "/").unwrap_err();

        assert!(matches!(
            err.innermost(),
            CompileError::Metadata(MetadataError::TypeMismatch { key, .. }) if key == "$card"
        ));
    }

    #[test]
    fn test_nested_fragments_are_expanded() {
        let site = site_with(
            "",
            vec![
                fragment("outer", "[{% inner v: <data v> %}]", ""),
                fragment("inner", "(<data v>)", ""),
            ],
        );

        let resolved = resolver()
            .resolve_all("{% outer v: 7 %} and {% inner v: 1 %}", &site, None, "/")
            .unwrap();

        assert_eq!(resolved, "[(7)] and (1)");
    }

    #[test]
    fn test_missing_fragment_is_wrapped() {
        let site = site_with("", vec![]);

        let err = resolver()
            .resolve_all("ok {% ghost %}", &site, None, "/guide/")
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to resolve fragment 'ghost' in '/guide/': \
             Fragment 'ghost' referenced from '/guide/' does not exist"
        );
        assert!(matches!(err.innermost(), CompileError::MissingFragment { .. }));
    }

    #[test]
    fn test_error_names_first_failing_tag() {
        let site = site_with("", vec![fragment("bad", "<fail>", ""), fragment("good", "g", "")]);

        let err = resolver()
            .resolve_all("{% good %}{% bad %}{% ghost %}", &site, None, "/")
            .unwrap_err();

        assert!(matches!(
            err,
            CompileError::FragmentResolution { ref name, .. } if name == "bad"
        ));
        assert!(matches!(
            err.innermost(),
            CompileError::Transform { id, .. } if id == "bad"
        ));
    }

    #[test]
    fn test_nested_failure_is_wrapped_per_level() {
        let site = site_with("", vec![fragment("outer", "{% ghost %}", "")]);

        let err = resolver().resolve_all("{% outer %}", &site, None, "/").unwrap_err();

        let CompileError::FragmentResolution { name, source, .. } = err else {
            panic!("expected fragment resolution error");
        };
        assert_eq!(name, "outer");
        assert!(matches!(
            *source,
            CompileError::FragmentResolution { ref name, .. } if name == "ghost"
        ));
    }

    #[test]
    fn test_unknown_name_uses_provider() {
        let providers = FragmentProviders::new().with_provider("year", |data, page| {
            let owner = page.map_or("none", Page::name);
            Ok(format!("{owner}:{}", data.get("v").map(Value::to_string).unwrap_or_default()))
        });
        let site = site_with("$year: {v: 2024}", vec![]);
        let page = page("");

        let resolved = resolver_with(providers, 64)
            .resolve_all("{% year %}", &site, Some(&page), "/p/")
            .unwrap();

        assert_eq!(resolved, "p:2024");
    }

    #[test]
    fn test_provider_output_is_rescanned() {
        let providers = FragmentProviders::new().with_provider("wrap", |_, _| Ok("<{% leaf %}>".to_owned()));
        let site = site_with("", vec![fragment("leaf", "L", "")]);

        let resolved = resolver_with(providers, 64)
            .resolve_all("{% wrap %}", &site, None, "/")
            .unwrap();

        assert_eq!(resolved, "<L>");
    }

    #[test]
    fn test_self_including_fragment_hits_limit() {
        let site = site_with("", vec![fragment("loop", "again {% loop %}", "")]);

        let err = resolver_with(FragmentProviders::new(), 8)
            .resolve_all("{% loop %}", &site, None, "/x/")
            .unwrap_err();

        assert!(matches!(
            err,
            CompileError::FragmentRecursionLimit { ref name, limit: 8, .. } if name == "loop"
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        let site = site_with("", vec![fragment("card", "x", "")]);

        let err = resolver()
            .resolve_all("{% card [1, 2] %}", &site, None, "/")
            .unwrap_err();

        assert!(matches!(
            err.innermost(),
            CompileError::InvalidParameters { name, .. } if name == "card"
        ));
    }

    #[test]
    fn test_custom_markers() {
        let site = site_with("", vec![fragment("x", "X", "")]);
        let resolver = FragmentResolver::new(
            Arc::new(DataTransformer),
            Arc::new(FragmentProviders::new()),
            "[[",
            "]]",
            4,
        )
        .unwrap();

        let resolved = resolver.resolve_all("a [[ x ]] {% x %}", &site, None, "/").unwrap();

        assert_eq!(resolved, "a X {% x %}");
    }

    #[test]
    fn test_empty_markers_rejected() {
        let err = FragmentResolver::new(
            Arc::new(DataTransformer),
            Arc::new(FragmentProviders::new()),
            "",
            "%}",
            4,
        )
        .unwrap_err();

        assert!(matches!(err, CompileError::InvalidTags { .. }));
    }
}
