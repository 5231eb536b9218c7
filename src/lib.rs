//! WeaveDoc - Plugin-Composed Documentation Generator
//!
//! Documentation generation assembled entirely from plugins. The pipeline
//! only knows its stages as extension points; which implementation runs at
//! each point is decided per run from the loaded plugins, their ordering
//! constraints and conditions over the run settings.
//!
//! ## Quick Start
//!
//! ```ignore
//! use weavedoc::{DocumentationGenerator, RunSettings, SourceSet, default_plugins};
//!
//! let config = weavedoc::ConfigLoader::load()?;
//! let generator = DocumentationGenerator::new(&default_plugins(&config.plugins), config.run)?;
//! let report = generator.generate(vec![SourceSet::from_path(path)?]).await?;
//! ```
//!
//! ## Modules
//!
//! - [`plugability`]: points, extensions, registry and per-run resolution
//! - [`pipeline`]: core stage points and the generator driving them
//! - [`base`]: default stage implementations and renderers
//! - [`model`]: source sets, documentables and pages
//! - [`config`]: layered configuration

pub mod base;
pub mod cli;
pub mod config;
pub mod constants;
pub mod model;
pub mod pipeline;
pub mod plugability;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, OutputFormat, PluginSettings, RunSettings};

// Error Types
pub use types::error::{DocError, PluginError, PluginErrorCategory, Result};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use plugability::{
    Cardinality, ExtensionOptions, ExtensionPoint, ExtensionRef, Plugin, PluginDeclarer,
    PluginRegistry, Provider, ResolutionScope, RunContext,
};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use base::{BaseExtensions, BasePlugin, DryRunPlugin};
pub use model::{Documentable, PageNode, SourceSet};
pub use pipeline::{
    CoreExtensions, CorePlugin, DocumentationGenerator, GenerationReport, default_plugins,
};
