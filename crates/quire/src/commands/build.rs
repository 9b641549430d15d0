//! `quire build` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use quire_compiler::{CompileError, Compiler, CompilerSettings, FragmentProviders};
use quire_config::{CliSettings, Config};
use quire_location::{Location, PatternSet};
use quire_meta::{Metadata, Value};
use quire_renderer::MarkdownTransformer;
use quire_site::{ComposerSettings, SiteComposer};
use quire_storage::{File, Loader, Publisher, SourceFile, StorageError};
use quire_storage_fs::{FsLoader, FsPublisher};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover quire.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory, cleared before writing (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// URL the site is published under (overrides config).
    #[arg(long, env = "QUIRE_BASE_URL")]
    base_url: Option<String>,

    /// Report every failing page instead of stopping at the first.
    #[arg(short, long)]
    keep_going: bool,

    /// Enable verbose output (phase summaries and timing logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, loading, composition or publishing
    /// fails, or if any page fails to compile.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            base_url: self.base_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let build = &config.build_resolved;

        let loader =
            FsLoader::new(build.source_dir.clone()).with_ignore(PatternSet::new(&build.ignore)?);
        let publisher = FsPublisher::new(build.output_dir.clone());

        output.info(&format!("Source: {}", loader.root().display()));
        output.info(&format!("Output: {}", publisher.output_dir().display()));
        let options = BuildOptions::from_config(&config, self.keep_going);

        let report = build_site(&loader, &publisher, &options)?;

        if !report.failures.is_empty() {
            for failure in &report.failures {
                output.error(&failure.to_string());
                if let Some(url) = failure.page_url() {
                    output.detail(&format!("page: {url}"));
                }
            }
            return Err(CliError::PagesFailed {
                failed: report.failures.len(),
                total: report.pages,
            });
        }

        output.success(&format!(
            "Built {} pages ({} files) to {}",
            report.pages,
            report.written,
            publisher.output_dir().display()
        ));
        Ok(())
    }
}

/// Everything the build pipeline needs besides its loader and publisher.
#[derive(Debug, Clone, Default)]
pub(crate) struct BuildOptions {
    pub composer: ComposerSettings,
    pub compiler: CompilerSettings,
    pub base_url: String,
    pub configuration_file: String,
    pub parallel: bool,
    pub keep_going: bool,
}

impl BuildOptions {
    fn from_config(config: &Config, keep_going: bool) -> Self {
        let compose = &config.compose;
        let compile = &config.compile;

        Self {
            composer: ComposerSettings {
                fragments_dir: compose.fragments_dir.clone(),
                layouts_dir: compose.layouts_dir.clone(),
                index_name: compose.index_name.clone(),
                page_extensions: compose.page_extensions.clone(),
            },
            compiler: CompilerSettings {
                open_tag: compile.open_tag.clone(),
                close_tag: compile.close_tag.clone(),
                content_placeholder: compile.content_placeholder.clone(),
                max_fragment_depth: compile.max_fragment_depth,
            },
            base_url: config.site.base_url.clone(),
            configuration_file: config.build_resolved.configuration_file.clone(),
            parallel: compile.parallel,
            keep_going,
        }
    }
}

/// Outcome of a build that did not abort.
#[derive(Debug)]
pub(crate) struct BuildReport {
    /// Pages in the composed site.
    pub pages: usize,
    /// Files handed to the publisher.
    pub written: usize,
    /// Pages that failed to compile. Only populated with `keep_going`.
    pub failures: Vec<CompileError>,
}

/// Run the whole pipeline: load, compose, compile and publish.
///
/// Without `keep_going` the first page failure stops publishing and is
/// returned as the error. Files compiled before it have already been written.
pub(crate) fn build_site(
    loader: &dyn Loader,
    publisher: &dyn Publisher,
    options: &BuildOptions,
) -> Result<BuildReport, CliError> {
    let mut files = loader.load(&Location::default())?;
    let configuration = take_site_configuration(&mut files, &options.configuration_file)?;

    let ignore = ignore_patterns(&configuration, &options.configuration_file)?;
    if !ignore.is_empty() {
        files.retain(|file| !ignore.matches(&file.location));
    }

    let mut site = SiteComposer::new(options.composer.clone(), configuration)
        .compose(files, &options.base_url)?;
    let pages = site.pages().count();

    let compiler = Compiler::new(
        Arc::new(MarkdownTransformer::new()),
        Arc::new(FragmentProviders::new()),
        &options.compiler,
    )?;

    let (written, mut failures) = if options.parallel {
        let results = compiler.compile_parallel(&mut site)?;
        publish(publisher, results.into_iter(), options.keep_going)?
    } else {
        let results = compiler.compile(&mut site)?;
        publish(publisher, results, options.keep_going)?
    };

    if !options.keep_going && !failures.is_empty() {
        return Err(failures.swap_remove(0).into());
    }

    tracing::info!(pages, written, failed = failures.len(), "Build finished");
    Ok(BuildReport {
        pages,
        written,
        failures,
    })
}

fn publish<I>(
    publisher: &dyn Publisher,
    results: I,
    keep_going: bool,
) -> Result<(usize, Vec<CompileError>), StorageError>
where
    I: Iterator<Item = Result<File, CompileError>>,
{
    let mut outcomes = Outcomes {
        results,
        keep_going,
        failures: Vec::new(),
    };
    let written = publisher.write(&mut outcomes)?;
    Ok((written, outcomes.failures))
}

/// Successful files of a compile, collecting failures on the side.
struct Outcomes<I> {
    results: I,
    keep_going: bool,
    failures: Vec<CompileError>,
}

impl<I> Iterator for Outcomes<I>
where
    I: Iterator<Item = Result<File, CompileError>>,
{
    type Item = File;

    fn next(&mut self) -> Option<File> {
        loop {
            match self.results.next()? {
                Ok(file) => return Some(file),
                Err(err) => {
                    tracing::debug!(error = %err, "Page failed");
                    self.failures.push(err);
                    if !self.keep_going {
                        return None;
                    }
                }
            }
        }
    }
}

/// Remove the site configuration document from the source root and parse it.
///
/// A missing document is an empty configuration.
fn take_site_configuration(
    files: &mut Vec<SourceFile>,
    file_name: &str,
) -> Result<Metadata, CliError> {
    let Some(index) = files.iter().position(|file| {
        file.location.segments().is_empty()
            && file
                .location
                .file_name()
                .is_some_and(|name| name.eq_ignore_ascii_case(file_name))
    }) else {
        return Ok(Metadata::new());
    };

    let file = files.remove(index);
    let invalid = |message: String| CliError::SiteConfiguration {
        file: file_name.to_owned(),
        message,
    };

    let text = file.text().map_err(|err| invalid(err.to_string()))?;
    let configuration = Metadata::from_yaml(text).map_err(|err| invalid(err.to_string()))?;

    tracing::debug!(file = file_name, keys = configuration.len(), "Loaded site configuration");
    Ok(configuration)
}

/// Extra ignore patterns from the site configuration's `ignore` key.
fn ignore_patterns(configuration: &Metadata, file_name: &str) -> Result<PatternSet, CliError> {
    let invalid = |found: &str| CliError::SiteConfiguration {
        file: file_name.to_owned(),
        message: format!("ignore must be a string or a list of strings, found {found}"),
    };

    let patterns: Vec<&str> = match configuration.get_ignore_case("ignore") {
        None | Some(Value::Null) => return Ok(PatternSet::default()),
        Some(Value::String(pattern)) => vec![pattern.as_str()],
        Some(Value::List(items)) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(|| invalid(item.kind())))
            .collect::<Result<_, _>>()?,
        Some(other) => return Err(invalid(other.kind())),
    };

    Ok(PatternSet::new(patterns)?)
}
