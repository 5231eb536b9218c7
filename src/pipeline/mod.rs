//! Documentation pipeline
//!
//! The core plugin's stage points, the stage capability traits and the
//! generator that runs them.

mod core;
mod generation;
mod stages;

use std::sync::Arc;

pub use self::core::{CoreExtensions, CorePlugin};
pub use generation::{DocumentationGenerator, GenerationReport};
pub use stages::{
    DocumentableMerger, DocumentableToPageTranslator, DocumentableTransformer, PageTransformer,
    RenderedFile, Renderer, SourceToDocumentableTranslator,
};

use crate::base::BasePlugin;
use crate::config::PluginSettings;
use crate::plugability::Plugin;
use tracing::info;

/// Built-in plugins in load order, minus the disabled ones
pub fn default_plugins(settings: &PluginSettings) -> Vec<Arc<dyn Plugin>> {
    let builtin: Vec<Arc<dyn Plugin>> = vec![Arc::new(CorePlugin), Arc::new(BasePlugin)];

    builtin
        .into_iter()
        .filter(|plugin| {
            let enabled = settings.is_enabled(plugin.name());
            if !enabled {
                info!("Plugin '{}' disabled by configuration", plugin.name());
            }
            enabled
        })
        .collect()
}
