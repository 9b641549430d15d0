//! The [`Location`] value type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Separator used by the flat identifier form.
pub const ID_SEPARATOR: &str = "::";

/// File name that collapses to its directory URL.
pub const INDEX_FILE_NAME: &str = "index.html";

/// Marks the first segment of a location parsed from an absolute URL.
const SCHEME_SUFFIX: &str = ":/";

/// Error returned by location arithmetic.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// More ancestor levels were requested than the location has.
    #[error("'{location}' has fewer than {levels} ancestor levels")]
    TooManyLevels {
        /// Location the ancestor was requested for.
        location: Location,
        /// Requested number of levels.
        levels: usize,
    },
    /// The location is not inside the given directory.
    #[error("'{location}' is not inside '{ancestor}'")]
    NotAnAncestor {
        /// Location that was tested.
        location: Location,
        /// Directory it was expected to be inside.
        ancestor: Location,
    },
    /// A file location was used where a directory is required.
    #[error("'{0}' is a file and can't contain other locations")]
    NotADirectory(Location),
    /// A glob pattern failed to compile.
    #[error("Invalid location pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Pattern as written, including any negation marker.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: glob::PatternError,
    },
}

/// Immutable hierarchical address of a document.
///
/// A location is a list of directory segments and an optional file name.
/// Segments and file names compare case-insensitively, so `Dir::Page.md`
/// and `dir::page.MD` are the same location.
///
/// A leading empty segment is preserved. It appears when a path is rooted
/// above the site root (for example `/page3/index.md` parsed without a root)
/// and renders as a leading `::` in the identifier.
#[derive(Debug, Clone, Default)]
pub struct Location {
    segments: Vec<String>,
    file_name: Option<String>,
}

impl Location {
    /// Create a location from a file name and its directory segments.
    ///
    /// An empty `file_name` produces a directory location.
    #[must_use]
    pub fn new<I, S>(file_name: impl Into<String>, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file_name: String = file_name.into();
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            file_name: (!file_name.is_empty()).then_some(file_name),
        }
    }

    /// Create a directory location.
    #[must_use]
    pub fn directory<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(String::new(), segments)
    }

    /// Create a location from a filesystem path.
    ///
    /// When `root` is given and `path` starts with it, the root is stripped
    /// first. Both `/` and `\` are treated as separators. The last component is
    /// taken as a file name when it has an extension.
    #[must_use]
    pub fn from_path(path: &Path, root: Option<&Path>) -> Self {
        let relative = root
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        let text = relative.to_string_lossy();
        Self::from_parts(text.split(['/', '\\']).collect())
    }

    /// Create a location from a URL or URL path.
    ///
    /// The scheme of an absolute URL becomes the first segment (`https:/`), so
    /// that [`Location::to_url`] renders it back unchanged. The part after the
    /// last `/` is the file name; a trailing `/` means a directory.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (Some(format!("{scheme}{SCHEME_SUFFIX}")), rest),
            None => (None, url.trim_start_matches('/')),
        };

        let mut parts: Vec<&str> = rest.split('/').collect();
        let file_name = parts.pop().unwrap_or_default();
        let segments = scheme
            .into_iter()
            .chain(parts.into_iter().filter(|p| !p.is_empty()).map(str::to_owned));

        Self::new(file_name, segments)
    }

    /// Parse any of the string forms: URL, `::` identifier or delimited path.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.contains("://") {
            Self::from_url(text)
        } else if text.contains(ID_SEPARATOR) {
            Self::from_parts(text.split(ID_SEPARATOR).collect())
        } else {
            Self::from_parts(text.split(['/', '\\']).collect())
        }
    }

    fn from_parts(mut parts: Vec<&str>) -> Self {
        let rooted = parts.len() > 1 && parts[0].is_empty();
        let file_name = match parts.last() {
            Some(last) if Path::new(last).extension().is_some() => parts.pop().unwrap_or_default(),
            _ => "",
        };

        let segments = parts
            .iter()
            .enumerate()
            .filter(|&(i, part)| (rooted && i == 0) || !part.is_empty())
            .map(|(_, part)| (*part).to_owned());

        Self::new(file_name, segments)
    }

    /// Directory segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Terminal file name, if this is a file location.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// File name without its extension.
    #[must_use]
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name.as_deref()?;
        Some(name.rsplit_once('.').map_or(name, |(stem, _)| stem))
    }

    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let (_, ext) = self.file_name.as_deref()?.rsplit_once('.')?;
        Some(ext)
    }

    /// Whether this location names a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }

    /// Whether this location has neither segments nor a file name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.file_name.is_none()
    }

    /// Return a copy with the file name replaced.
    #[must_use]
    pub fn with_file_name(&self, file_name: impl Into<String>) -> Self {
        Self::new(file_name, self.segments.iter().cloned())
    }

    /// Return the directory one level below this one.
    ///
    /// Any file name is dropped.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self {
            segments,
            file_name: None,
        }
    }

    /// Append `other` below this location.
    ///
    /// The result has this location's segments followed by `other`'s, and
    /// `other`'s file name. This location's own file name is ignored.
    #[must_use]
    pub fn join(&self, other: &Location) -> Self {
        let segments = self.segments.iter().chain(&other.segments).cloned();
        Self {
            segments: segments.collect(),
            file_name: other.file_name.clone(),
        }
    }

    /// Get the ancestor directory `levels` steps up.
    ///
    /// For a file location the first step drops the file name, so the parent
    /// of `dir1::dir2::page.html` is `dir1::dir2`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::TooManyLevels`] if the location is not deep enough.
    pub fn parent(&self, levels: usize) -> Result<Self, LocationError> {
        let mut remaining = levels;
        if remaining > 0 && self.is_file() {
            remaining -= 1;
        }

        if remaining > self.segments.len() {
            return Err(LocationError::TooManyLevels {
                location: self.clone(),
                levels,
            });
        }

        let keep = self.segments.len() - remaining;
        let file_name = if levels == 0 {
            self.file_name.clone()
        } else {
            None
        };

        Ok(Self {
            segments: self.segments[..keep].to_vec(),
            file_name,
        })
    }

    /// Test whether this location is inside the `directory` location.
    ///
    /// A directory is considered inside itself.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::NotADirectory`] if `directory` names a file.
    pub fn is_in(&self, directory: &Location) -> Result<bool, LocationError> {
        if directory.is_file() {
            return Err(LocationError::NotADirectory(directory.clone()));
        }

        let depth = directory.segments.len();
        Ok(depth <= self.segments.len()
            && self.segments[..depth]
                .iter()
                .zip(&directory.segments)
                .all(|(a, b)| a.eq_ignore_ascii_case(b)))
    }

    /// Get this location relative to an ancestor directory.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::NotAnAncestor`] if `ancestor` does not contain
    /// this location, or [`LocationError::NotADirectory`] if it names a file.
    pub fn relative_to(&self, ancestor: &Location) -> Result<Self, LocationError> {
        if !self.is_in(ancestor)? {
            return Err(LocationError::NotAnAncestor {
                location: self.clone(),
                ancestor: ancestor.clone(),
            });
        }

        Ok(Self {
            segments: self.segments[ancestor.segments.len()..].to_vec(),
            file_name: self.file_name.clone(),
        })
    }

    /// Render the flat identifier (`dir1::dir2::file.md`).
    #[must_use]
    pub fn to_id(&self) -> String {
        let mut id = self.segments.join(ID_SEPARATOR);
        if let Some(file_name) = &self.file_name {
            if !self.segments.is_empty() {
                id.push_str(ID_SEPARATOR);
            }
            id.push_str(file_name);
        }
        id
    }

    /// Render the URL form.
    ///
    /// Without a host the URL starts with `/`. A file named [`INDEX_FILE_NAME`]
    /// collapses to its directory URL ending in `/`; the site root collapses to
    /// `/`, or to the bare host when one is given.
    ///
    /// Locations parsed from absolute URLs render with their scheme and ignore
    /// `host`.
    #[must_use]
    pub fn to_url(&self, host: Option<&str>) -> String {
        let segments: Vec<&str> = self
            .segments
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        let has_scheme = segments.first().is_some_and(|s| s.ends_with(SCHEME_SUFFIX));

        let mut body = segments.join("/");
        match self.file_name.as_deref() {
            Some(name) if !name.eq_ignore_ascii_case(INDEX_FILE_NAME) => {
                if !body.is_empty() {
                    body.push('/');
                }
                body.push_str(name);
            }
            _ => {
                if !body.is_empty() {
                    body.push('/');
                }
            }
        }

        if has_scheme {
            return body;
        }

        match host {
            Some(host) if body.is_empty() => host.trim_end_matches('/').to_owned(),
            Some(host) => format!("{}/{body}", host.trim_end_matches('/')),
            None => format!("/{body}"),
        }
    }

    /// Render as a native relative path.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        let mut path: PathBuf = self
            .segments
            .iter()
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(file_name) = &self.file_name {
            path.push(file_name);
        }
        path
    }

    /// Render with `/` separators, used for glob matching.
    pub(crate) fn to_match_path(&self) -> String {
        let mut parts: Vec<&str> = self
            .segments
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(file_name) = &self.file_name {
            parts.push(file_name);
        }
        parts.join("/")
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        let same_file = match (&self.file_name, &other.file_name) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (None, None) => true,
            _ => false,
        };

        same_file
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for segment in &self.segments {
            segment.to_ascii_lowercase().hash(state);
        }
        self.file_name
            .as_ref()
            .map(|name| name.to_ascii_lowercase())
            .hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_id())
    }
}

impl FromStr for Location {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_to_id() {
        assert_eq!(
            Location::new("page.html", ["dir1", "dir2"]).to_id(),
            "dir1::dir2::page.html"
        );
        assert_eq!(Location::new("page.html", Vec::<String>::new()).to_id(), "page.html");
        assert_eq!(Location::directory(["dir1", "dir2"]).to_id(), "dir1::dir2");
        assert_eq!(Location::default().to_id(), "");
    }

    #[test]
    fn test_from_path_relative_to_root() {
        let loc = Location::from_path(
            Path::new("/srv/site/dir1/dir2/page.md"),
            Some(Path::new("/srv/site")),
        );

        assert_eq!(loc.segments(), ["dir1", "dir2"]);
        assert_eq!(loc.file_name(), Some("page.md"));
        assert_eq!(loc.to_id(), "dir1::dir2::page.md");
    }

    #[test]
    fn test_from_path_keeps_leading_empty_segment() {
        let loc = Location::from_path(Path::new("/page3/subpage3/index.md"), None);

        assert_eq!(loc.to_id(), "::page3::subpage3::index.md");
    }

    #[test]
    fn test_from_path_windows_separators() {
        let loc = Location::from_path(Path::new(r"dir1\dir2\page.md"), None);

        assert_eq!(loc.to_id(), "dir1::dir2::page.md");
    }

    #[test]
    fn test_from_path_directory() {
        let loc = Location::from_path(Path::new("/root/dir1/dir2"), Some(Path::new("/root")));

        assert!(!loc.is_file());
        assert_eq!(loc.to_id(), "dir1::dir2");
    }

    #[test]
    fn test_from_url_with_scheme() {
        let loc = Location::from_url("http://example.com");
        assert_eq!(loc.segments(), ["http:/"]);
        assert_eq!(loc.file_name(), Some("example.com"));

        let loc = Location::from_url("https://example.com/url1/");
        assert_eq!(loc.segments(), ["https:/", "example.com", "url1"]);
        assert_eq!(loc.file_name(), None);
    }

    #[test]
    fn test_from_url_path() {
        let loc = Location::from_url("/url1/file1.txt");

        assert_eq!(loc.segments(), ["url1"]);
        assert_eq!(loc.file_name(), Some("file1.txt"));
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            Location::parse("dir1::dir2::file1.txt"),
            Location::new("file1.txt", ["dir1", "dir2"])
        );
        assert_eq!(
            Location::parse("dir1/dir2/file1.txt"),
            Location::new("file1.txt", ["dir1", "dir2"])
        );
        assert_eq!(Location::parse("dir1/dir2"), Location::directory(["dir1", "dir2"]));
        assert_eq!(
            Location::parse("::page3::index.md").to_id(),
            "::page3::index.md"
        );
    }

    #[test]
    fn test_to_url() {
        assert_eq!(
            Location::new("page.html", ["dir1", "dir2"]).to_url(None),
            "/dir1/dir2/page.html"
        );
        assert_eq!(
            Location::new("index.html", ["dir1", "dir2"]).to_url(None),
            "/dir1/dir2/"
        );
        assert_eq!(Location::new("index.html", Vec::<String>::new()).to_url(None), "/");
        assert_eq!(Location::new("page.html", Vec::<String>::new()).to_url(None), "/page.html");
    }

    #[test]
    fn test_to_url_with_host() {
        assert_eq!(
            Location::new("page.html", ["dir1", "dir2"]).to_url(Some("www.site.com")),
            "www.site.com/dir1/dir2/page.html"
        );
        assert_eq!(
            Location::new("index.html", Vec::<String>::new()).to_url(Some("www.site.com")),
            "www.site.com"
        );
        assert_eq!(
            Location::new("index.html", ["a"]).to_url(Some("https://site.com/")),
            "https://site.com/a/"
        );
    }

    #[test]
    fn test_to_url_keeps_scheme() {
        let loc = Location::new("file1.txt", ["http:/", "www.example.com"]);

        assert_eq!(loc.to_url(None), "http://www.example.com/file1.txt");
        assert_eq!(
            Location::from_url("https://example.com/a/b.html").to_url(None),
            "https://example.com/a/b.html"
        );
    }

    #[test]
    fn test_to_path() {
        let loc = Location::new("page.html", ["dir1", "dir2"]);

        assert_eq!(loc.to_path(), PathBuf::from("dir1/dir2/page.html"));
    }

    #[test]
    fn test_equality_ignores_case() {
        let a = Location::new("Page.HTML", ["Dir1"]);
        let b = Location::new("page.html", ["dir1"]);

        assert_eq!(a, b);
        assert_ne!(a, Location::directory(["dir1"]));

        let set: HashSet<Location> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_parent() {
        let file = Location::new("page.html", ["dir1", "dir2"]);
        let dir = Location::directory(["dir1", "dir2"]);

        assert_eq!(file.parent(1).unwrap().to_id(), "dir1::dir2");
        assert_eq!(dir.parent(1).unwrap().to_id(), "dir1");
        assert_eq!(file.parent(2).unwrap().to_id(), "dir1");
        assert_eq!(dir.parent(2).unwrap().to_id(), "");
        assert_eq!(file.parent(0).unwrap(), file);
    }

    #[test]
    fn test_parent_too_many_levels() {
        let dir = Location::directory(["dir1"]);

        assert!(matches!(
            dir.parent(2),
            Err(LocationError::TooManyLevels { levels: 2, .. })
        ));
    }

    #[test]
    fn test_is_in() {
        let l1 = Location::new("page.html", ["dir1", "dir2"]);
        let l2 = Location::directory(["dir1", "dir2"]);
        let l3 = Location::directory(["dir0", "dir1", "dir2"]);
        let l4 = Location::directory(["dir0", "dir1", "dir2", "dir3", "dir4"]);

        assert!(l1.is_in(&l2).unwrap());
        assert!(!l1.is_in(&l3).unwrap());
        assert!(l4.is_in(&l3).unwrap());
        assert!(!l3.is_in(&l4).unwrap());
        assert!(Location::new("a.md", ["DIR1"]).is_in(&Location::directory(["dir1"])).unwrap());
    }

    #[test]
    fn test_is_in_file_fails() {
        let l1 = Location::new("page.html", ["dir1", "dir2"]);
        let l2 = Location::directory(["dir1", "dir2"]);

        assert!(matches!(l2.is_in(&l1), Err(LocationError::NotADirectory(_))));
    }

    #[test]
    fn test_relative_to() {
        let l1 = Location::new("page.html", ["dir1", "dir2"]);
        let l2 = Location::directory(["dir1", "dir2"]);
        let l3 = Location::directory(["dir0", "dir1", "dir2"]);
        let l4 = Location::directory(["dir0", "dir1", "dir2", "dir3", "dir4"]);

        assert_eq!(l1.relative_to(&l2).unwrap().to_id(), "page.html");
        assert_eq!(l4.relative_to(&l3).unwrap().to_id(), "dir3::dir4");
        assert!(matches!(
            l1.relative_to(&l3),
            Err(LocationError::NotAnAncestor { .. })
        ));
    }

    #[test]
    fn test_join() {
        let base = Location::directory(["dir1"]);
        let rel = Location::new("page.html", ["dir2"]);

        assert_eq!(base.join(&rel).to_id(), "dir1::dir2::page.html");
    }

    #[test]
    fn test_file_stem_and_extension() {
        let loc = Location::new("page.sub.md", ["dir"]);

        assert_eq!(loc.file_stem(), Some("page.sub"));
        assert_eq!(loc.extension(), Some("md"));
        assert_eq!(Location::directory(["dir"]).file_stem(), None);
    }
}
