//! YAML parsing into [`Metadata`].

use crate::{Metadata, MetadataError, Value};

impl Metadata {
    /// Parse a YAML mapping.
    ///
    /// Blank input and an explicit YAML null produce empty metadata. Non-string
    /// keys are rendered to strings; tagged values are unwrapped.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Parse`] for malformed YAML and
    /// [`MetadataError::NotAMap`] if the document is not a mapping.
    pub fn from_yaml(content: &str) -> Result<Self, MetadataError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        match convert(serde_yaml::from_str(content)?) {
            Value::Null => Ok(Self::default()),
            Value::Map(map) => Ok(map),
            other => Err(MetadataError::NotAMap(other.kind())),
        }
    }
}

fn convert(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::String(n.to_string()),
        },
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::List(items.into_iter().map(convert).collect()),
        Yaml::Mapping(mapping) => Value::Map(
            mapping
                .into_iter()
                .map(|(k, v)| (convert(k).to_string(), convert(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => convert(tagged.value),
    }
}
