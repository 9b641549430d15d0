//! Front matter extraction.

use crate::{Metadata, MetadataError};

/// Line that opens and closes a front matter block.
pub const FRONT_MATTER_DELIMITER: &str = "---";

/// Split a leading front matter block off `raw`.
///
/// Front matter is a YAML mapping between two `---` lines at the very top of
/// the text. Returns the parsed metadata and the remaining body. Text that does
/// not start with a delimiter line has empty metadata and is returned whole.
///
/// # Errors
///
/// Returns [`MetadataError::UnterminatedFrontMatter`] if the closing delimiter
/// is missing, or a parse error for invalid YAML inside the block.
pub fn split_front_matter(raw: &str) -> Result<(Metadata, &str), MetadataError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == FRONT_MATTER_DELIMITER => {
            let yaml_start = first.len();
            let mut offset = yaml_start;

            for line in lines {
                if line.trim_end() == FRONT_MATTER_DELIMITER {
                    let data = Metadata::from_yaml(&text[yaml_start..offset])?;
                    return Ok((data, &text[offset + line.len()..]));
                }
                offset += line.len();
            }

            Err(MetadataError::UnterminatedFrontMatter)
        }
        _ => Ok((Metadata::new(), text)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Value;

    #[test]
    fn test_split_front_matter() {
        let (data, body) =
            split_front_matter("---\ntitle: Home\nlayout: main\n---\n# Heading\n").unwrap();

        assert_eq!(data.get("title"), Some(&Value::from("Home")));
        assert_eq!(data.get("layout"), Some(&Value::from("main")));
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn test_split_without_front_matter() {
        let (data, body) = split_front_matter("# Heading\n---\n").unwrap();

        assert!(data.is_empty());
        assert_eq!(body, "# Heading\n---\n");
    }

    #[test]
    fn test_split_empty_front_matter() {
        let (data, body) = split_front_matter("---\n---\nBody").unwrap();

        assert!(data.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_crlf_and_bom() {
        let (data, body) = split_front_matter("\u{feff}---\r\nk: v\r\n---\r\nBody").unwrap();

        assert_eq!(data.get("k"), Some(&Value::from("v")));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_closing_at_end_of_text() {
        let (data, body) = split_front_matter("---\nk: v\n---").unwrap();

        assert_eq!(data.len(), 1);
        assert_eq!(body, "");
    }

    #[test]
    fn test_split_unterminated() {
        let err = split_front_matter("---\ntitle: Home\n# Heading").unwrap_err();

        assert!(matches!(err, MetadataError::UnterminatedFrontMatter));
    }
}
