//! Plugin composition engine
//!
//! ## Phases
//!
//! 1. **Declaration**: each `Plugin` records points and extensions on a
//!    `PluginDeclarer`. Nothing is resolved yet.
//! 2. **Freeze**: `PluginRegistry::load` validates every declaration and
//!    produces an immutable registry.
//! 3. **Resolution**: a `RunContext` resolves points lazily on first query,
//!    evaluating conditions and ordering once per run.

mod context;
mod extension;
mod plugin;
mod point;
mod registry;
mod resolver;

#[cfg(test)]
mod test_support;

pub use context::{ResolutionScope, RunContext};
pub use extension::{Condition, ExtensionOptions, ExtensionRef, Factory, Provider};
pub use plugin::{Plugin, PluginDeclarer};
pub use point::{Cardinality, ExtensionPoint};
pub use registry::{
    ExtensionSummary, PluginRegistry, PluginSummary, PointSummary, RegistrySummary,
};
pub use resolver::{Candidate, resolve_order};
