//! Configuration management for Quire.
//!
//! Parses `quire.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.base_url`
//!
//! ## Example
//!
//! ```toml
//! [site]
//! base_url = "${SITE_URL:-https://example.com}"
//!
//! [build]
//! source_dir = "site"
//! output_dir = "_site"
//! ignore = ["drafts/*", "|drafts/keep.md"]
//!
//! [compose]
//! fragments_dir = "_includes"
//! layouts_dir = "_layouts"
//!
//! [compile]
//! max_fragment_depth = 32
//! parallel = true
//! ```

mod expand;

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override site base URL.
    pub base_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quire.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site configuration.
    pub site: SiteConfig,
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Site composition conventions.
    pub compose: ComposeConfig,
    /// Page compilation settings.
    pub compile: CompileConfig,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL the site is published under. Empty for site-relative links.
    pub base_url: String,
}

/// Raw build configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    ignore: Vec<String>,
    configuration_file: Option<String>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default)]
pub struct BuildConfig {
    /// Directory holding the site sources.
    pub source_dir: PathBuf,
    /// Directory the compiled site is written to. Cleared on every build.
    pub output_dir: PathBuf,
    /// Location patterns of source files to skip. A leading `|` negates.
    pub ignore: Vec<String>,
    /// Name of the site configuration document in the source root.
    pub configuration_file: String,
}

/// Folder and file conventions used to compose a site.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Top-level source folder holding fragments.
    pub fragments_dir: String,
    /// Top-level source folder holding layouts.
    pub layouts_dir: String,
    /// File stem of a folder's own page.
    pub index_name: String,
    /// Extensions of files compiled as pages.
    pub page_extensions: Vec<String>,
}

impl Default for ComposeConfig {
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

/// Page compilation settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Opening marker of fragment tags.
    pub open_tag: String,
    /// Closing marker of fragment tags.
    pub close_tag: String,
    /// Placeholder replaced by the wrapped content in layouts.
    pub content_placeholder: String,
    /// Maximum nesting of fragments including fragments.
    pub max_fragment_depth: usize,
    /// Compile sibling page subtrees in parallel.
    pub parallel: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            open_tag: "{%".to_owned(),
            close_tag: "%}".to_owned(),
            content_placeholder: "{{ content }}".to_owned(),
            max_fragment_depth: 64,
            parallel: false,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.base_url`").
        field: String,
        /// Error message (e.g., "${`SITE_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root; leading `..` of a relative path is kept.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

/// Join a relative path to the current directory, then normalize it.
fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize_path(path);
    }
    let cwd = std::env::current_dir().unwrap_or_default();
    normalize_path(&cwd.join(path))
}

/// Absolute path with its deepest existing ancestor canonicalized.
///
/// Resolves symlinks where the filesystem allows it, so containment checks
/// compare like with like even when a directory does not exist yet.
fn comparable_path(path: &Path) -> PathBuf {
    let absolute = absolute_path(path);
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |resolved, name| resolved.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quire.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated after the overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir = absolute_path(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir = absolute_path(output_dir);
        }
        if let Some(base_url) = &settings.base_url {
            self.site.base_url.clone_from(base_url);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            site: SiteConfig::default(),
            build: BuildConfigRaw::default(),
            compose: ComposeConfig::default(),
            compile: CompileConfig::default(),
            build_resolved: BuildConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = absolute_path(path.parent().unwrap_or(Path::new(".")));
        config.resolve_paths(&config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically at the end of [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        self.validate_build()?;
        self.validate_compose()?;
        self.validate_compile()?;
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        let url = &self.site.base_url;
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "site.base_url must start with http:// or https://".to_owned(),
            ));
        }
        Ok(())
    }

    /// The output directory is wiped on every build, so it must not contain
    /// the sources.
    fn validate_build(&self) -> Result<(), ConfigError> {
        let build = &self.build_resolved;
        require_non_empty(&build.configuration_file, "build.configuration_file")?;

        if comparable_path(&build.source_dir).starts_with(comparable_path(&build.output_dir)) {
            return Err(ConfigError::Validation(format!(
                "build.output_dir ({}) must not contain build.source_dir ({})",
                build.output_dir.display(),
                build.source_dir.display()
            )));
        }
        Ok(())
    }

    fn validate_compose(&self) -> Result<(), ConfigError> {
        let compose = &self.compose;
        require_non_empty(&compose.fragments_dir, "compose.fragments_dir")?;
        require_non_empty(&compose.layouts_dir, "compose.layouts_dir")?;
        require_non_empty(&compose.index_name, "compose.index_name")?;

        if compose.fragments_dir.eq_ignore_ascii_case(&compose.layouts_dir) {
            return Err(ConfigError::Validation(
                "compose.fragments_dir and compose.layouts_dir must differ".to_owned(),
            ));
        }
        if compose.page_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "compose.page_extensions cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_compile(&self) -> Result<(), ConfigError> {
        let compile = &self.compile;
        require_non_empty(&compile.open_tag, "compile.open_tag")?;
        require_non_empty(&compile.close_tag, "compile.close_tag")?;
        require_non_empty(&compile.content_placeholder, "compile.content_placeholder")?;

        if compile.max_fragment_depth == 0 {
            return Err(ConfigError::Validation(
                "compile.max_fragment_depth must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.base_url = expand::expand_env(&self.site.base_url, "site.base_url")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| {
            normalize_path(&config_dir.join(path.unwrap_or(default)))
        };

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "site"),
            output_dir: resolve(self.build.output_dir.as_deref(), "_site"),
            ignore: self.build.ignore.clone(),
            configuration_file: self
                .build
                .configuration_file
                .clone()
                .unwrap_or_else(|| "_config.yml".to_owned()),
        };
    }
}
