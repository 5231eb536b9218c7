//! Core plugin
//!
//! Declares the pipeline's extension points. It registers no extensions:
//! every stage implementation comes from other plugins.

use super::stages::{
    DocumentableMerger, DocumentableToPageTranslator, DocumentableTransformer, PageTransformer,
    Renderer, SourceToDocumentableTranslator,
};
use crate::constants::plugins;
use crate::plugability::{ExtensionPoint, Plugin, PluginDeclarer};
use crate::types::Result;

/// Handles of the core points
pub struct CoreExtensions;

impl CoreExtensions {
    pub fn source_to_documentable_translator() -> ExtensionPoint<dyn SourceToDocumentableTranslator>
    {
        ExtensionPoint::single(plugins::CORE, "sourceToDocumentableTranslator")
    }

    pub fn documentable_transformer() -> ExtensionPoint<dyn DocumentableTransformer> {
        ExtensionPoint::multi(plugins::CORE, "documentableTransformer")
    }

    pub fn documentable_merger() -> ExtensionPoint<dyn DocumentableMerger> {
        ExtensionPoint::single(plugins::CORE, "documentableMerger")
    }

    pub fn documentable_to_page_translator() -> ExtensionPoint<dyn DocumentableToPageTranslator> {
        ExtensionPoint::single(plugins::CORE, "documentableToPageTranslator")
    }

    pub fn page_transformer() -> ExtensionPoint<dyn PageTransformer> {
        ExtensionPoint::multi(plugins::CORE, "pageTransformer")
    }

    pub fn renderer() -> ExtensionPoint<dyn Renderer> {
        ExtensionPoint::single(plugins::CORE, "renderer")
    }
}

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        plugins::CORE
    }

    fn declare(&self, declarer: &mut PluginDeclarer) -> Result<()> {
        declarer.declare(&CoreExtensions::source_to_documentable_translator());
        declarer.declare(&CoreExtensions::documentable_transformer());
        declarer.declare(&CoreExtensions::documentable_merger());
        declarer.declare(&CoreExtensions::documentable_to_page_translator());
        declarer.declare(&CoreExtensions::page_transformer());
        declarer.declare(&CoreExtensions::renderer());
        Ok(())
    }
}
