//! Page compilation for Quire.
//!
//! The [`Compiler`] turns a composed [`Site`](quire_site::Site) into output
//! files. For every page it:
//!
//! 1. expands fragment tags (`{% name params %}`) with the [`FragmentResolver`];
//! 2. runs the [`ContentTransformer`] over the expanded text;
//! 3. wraps the result in each layout of the page's chain, innermost first,
//!    substituting the `{{ content }}` placeholder;
//! 4. passes the HTML through every [`CompilerPlugin`].
//!
//! Output is a lazy, depth-first sequence: [`Compiler::compile`] does no work
//! until the returned iterator is advanced, and dropping the iterator stops
//! compilation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quire_compiler::{Compiler, CompilerSettings, FragmentProviders};
//!
//! let compiler = Compiler::new(
//!     Arc::new(transformer),
//!     Arc::new(FragmentProviders::new()),
//!     &CompilerSettings::default(),
//! )?;
//!
//! for file in compiler.compile(&mut site)? {
//!     let file = file?;
//!     println!("{}", file.location);
//! }
//! ```

mod compiler;
mod context;
mod error;
mod fragments;
mod plugin;
mod providers;

pub use compiler::{CompiledFiles, Compiler, CompilerSettings};
pub use context::{BoxError, ContentTransformer, RenderContext};
pub use error::CompileError;
pub use fragments::FragmentResolver;
pub use plugin::CompilerPlugin;
pub use providers::{FragmentExtension, FragmentProviders};
