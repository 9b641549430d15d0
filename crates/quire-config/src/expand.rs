//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the configuration key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_default_value() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("QUIRE_EXPAND_UNSET");
        }

        let expanded = expand_env("${QUIRE_EXPAND_UNSET:-https://fallback.dev}", "site.base_url");

        assert_eq!(expanded.unwrap(), "https://fallback.dev");
    }

    #[test]
    fn test_expand_missing_variable() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("QUIRE_EXPAND_MISSING");
        }

        let err = expand_env("${QUIRE_EXPAND_MISSING}", "site.base_url").unwrap_err();

        assert!(err.to_string().contains("QUIRE_EXPAND_MISSING"));
        assert!(err.to_string().contains("site.base_url"));
    }

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("plain", "field").unwrap(), "plain");
    }
}
