//! The [`Metadata`] map and its merge rules.

use indexmap::IndexMap;

use crate::{MetadataError, Value};

/// List element that splices in the parent's list during a merge.
pub const INHERIT_SENTINEL: &str = "$";

/// Ordered string-keyed map of metadata values.
///
/// Keys are stored case-sensitively and unique. Directive lookups made by the
/// engine (`layout`, `$fragment`) go through [`Metadata::get_ignore_case`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: IndexMap<String, Value>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a value by exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Get a value by key, preferring an exact match and falling back to the
    /// first key that matches ignoring ASCII case.
    #[must_use]
    pub fn get_ignore_case(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).or_else(|| {
            self.entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace a value, keeping the key's position if it exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove and return a value ("pop" a consumed directive), matching the
    /// key ignoring ASCII case. Order of the remaining keys is preserved.
    pub fn take_ignore_case(&mut self, key: &str) -> Option<Value> {
        let index = self
            .entries
            .get_index_of(key)
            .or_else(|| self.entries.keys().position(|k| k.eq_ignore_ascii_case(key)))?;
        self.entries.shift_remove_index(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Layer `self` (the child) over `parent` and return the result.
    ///
    /// The result starts as a copy of `parent`. Each defined child entry then
    /// replaces the parent's value in place or is appended. Undefined child
    /// values (null, empty string) never replace anything. A child list that
    /// contains [`INHERIT_SENTINEL`] has the parent's same-keyed list spliced
    /// in where the sentinel stood; when the parent has no such key the
    /// sentinel is simply dropped.
    ///
    /// Nested maps are replaced, not merged recursively.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::TypeMismatch`] if a sentinel list meets a
    /// parent value that is not a list.
    pub fn merge_over(&self, parent: &Metadata) -> Result<Metadata, MetadataError> {
        let mut merged = parent.clone();

        for (key, value) in &self.entries {
            if !value.is_defined() {
                continue;
            }

            let value = match value {
                Value::List(items) if items.iter().any(is_sentinel) => {
                    splice_parent_list(key, items, parent.entries.get(key))?
                }
                other => other.clone(),
            };

            merged.entries.insert(key.clone(), value);
        }

        Ok(merged)
    }
}

fn is_sentinel(value: &Value) -> bool {
    value.as_str() == Some(INHERIT_SENTINEL)
}

fn splice_parent_list(
    key: &str,
    items: &[Value],
    parent: Option<&Value>,
) -> Result<Value, MetadataError> {
    let inherited: &[Value] = match parent {
        None | Some(Value::Null) => &[],
        Some(Value::List(list)) => list,
        Some(other) => {
            return Err(MetadataError::TypeMismatch {
                key: key.to_owned(),
                expected: "list",
                found: other.kind(),
            });
        }
    };

    let mut spliced = Vec::with_capacity(items.len() + inherited.len());
    for item in items {
        if is_sentinel(item) {
            spliced.extend_from_slice(inherited);
        } else {
            spliced.push(item.clone());
        }
    }

    Ok(Value::List(spliced))
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn meta(yaml: &str) -> Metadata {
        Metadata::from_yaml(yaml).unwrap()
    }

    #[test]
    fn test_merge_child_overrides_parent() {
        let parent = meta("a: 1\nb: 2");
        let child = meta("b: 3\nc: 4");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(merged.get("b"), Some(&Value::Integer(3)));
        assert_eq!(merged.get("c"), Some(&Value::Integer(4)));
    }

    #[test]
    fn test_merge_undefined_values_never_override() {
        let parent = meta("title: Site\nauthor: Someone");
        let child = meta("title: ''\nauthor: ~\nextra: ''");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.get("title").unwrap().as_str(), Some("Site"));
        assert_eq!(merged.get("author").unwrap().as_str(), Some("Someone"));
        assert!(!merged.contains_key("extra"));
    }

    #[test]
    fn test_merge_false_and_zero_are_defined() {
        let parent = meta("toc: true\ndepth: 3");
        let child = meta("toc: false\ndepth: 0");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.get("toc"), Some(&Value::Bool(false)));
        assert_eq!(merged.get("depth"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_merge_splices_parent_list_at_sentinel() {
        let parent = meta("list: [p1, p2]");
        let child = meta("list: [c1, $, c2]");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.get("list").unwrap().to_string(), "[c1, p1, p2, c2]");
    }

    #[test]
    fn test_merge_sentinel_at_start() {
        let parent = meta("list: [p1]");
        let child = meta("list: [$, c1]");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.get("list").unwrap().to_string(), "[p1, c1]");
    }

    #[test]
    fn test_merge_sentinel_without_parent_key() {
        let child = meta("list: [c1, $]");

        let merged = child.merge_over(&Metadata::new()).unwrap();

        assert_eq!(merged.get("list").unwrap().to_string(), "[c1]");
    }

    #[test]
    fn test_merge_sentinel_against_non_list_fails() {
        let parent = meta("list: scalar");
        let child = meta("list: [c1, $]");

        let err = child.merge_over(&parent).unwrap_err();

        assert!(matches!(
            err,
            MetadataError::TypeMismatch { ref key, expected: "list", found: "string" } if key == "list"
        ));
    }

    #[test]
    fn test_merge_list_without_sentinel_replaces() {
        let parent = meta("list: [p1, p2]");
        let child = meta("list: [c1]");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.get("list").unwrap().to_string(), "[c1]");
    }

    #[test]
    fn test_merge_nested_map_replaces() {
        let parent = meta("seo: {og: true, twitter: true}");
        let child = meta("seo: {og: false}");

        let merged = child.merge_over(&parent).unwrap();

        assert_eq!(merged.get("seo").unwrap().to_string(), "{og: false}");
    }

    #[test]
    fn test_get_ignore_case() {
        let data = meta("Layout: main\nlayout: exact");

        assert_eq!(data.get_ignore_case("layout").unwrap().as_str(), Some("exact"));
        assert_eq!(data.get_ignore_case("LAYOUT").unwrap().as_str(), Some("main"));
        assert!(data.get("LAYOUT").is_none());
    }

    #[test]
    fn test_take_ignore_case_preserves_order() {
        let mut data = meta("a: 1\nLayout: main\nb: 2");

        let taken = data.take_ignore_case("layout");

        assert_eq!(taken.unwrap().as_str(), Some("main"));
        assert_eq!(data.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert!(data.take_ignore_case("layout").is_none());
    }
}
