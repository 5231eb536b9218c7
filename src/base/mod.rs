//! Base plugin
//!
//! Default implementations of every core stage, plus the points the base
//! stages themselves are assembled from. Defaults are registered as
//! fallbacks, so any plugin registering a concrete extension at the same
//! point replaces them.
//!
//! ## Points
//!
//! | Point | Cardinality | Consumed by |
//! |-------|-------------|-------------|
//! | `pageMergerStrategy` | Multi | `pageMerger` |
//! | `commentsToContentConverter` | Single | `defaultPageTranslator` |
//! | `locationProviderFactory` | Single | renderers |
//! | `outputWriter` | Single | renderers |
//! | `htmlPreprocessors` | Multi | `htmlRenderer` |

mod location;
mod merger;
mod page_merger;
mod pages;
mod preprocessors;
mod renderers;
mod transformers;
mod translator;
mod writer;

use std::sync::Arc;

pub use location::{
    DefaultLocationProvider, DefaultLocationProviderFactory, LocationProvider,
    LocationProviderFactory,
};
pub use merger::DefaultDocumentableMerger;
pub use page_merger::{FallbackMerger, PageMerger, PageMergerStrategy, SameMethodNameMerger};
pub use pages::{CommentsToContentConverter, DefaultPageTranslator, DocTagToContentConverter};
pub use preprocessors::{
    NavigationPageInstaller, ResourceInstaller, RootCreator, SearchPageInstaller,
    StyleAndScriptsAppender,
};
pub use renderers::{HtmlRenderer, MarkdownRenderer};
pub use transformers::{EmptyPackagesFilter, PrivateMemberFilter};
pub use translator::{DefaultSourceTranslator, ROOT_PACKAGE, parse_doc};
pub use writer::{FileWriter, MemoryWriter, OutputWriter};

use crate::config::OutputFormat;
use crate::constants::plugins;
use crate::pipeline::{
    CoreExtensions, DocumentableMerger, DocumentableToPageTranslator, DocumentableTransformer,
    PageTransformer, Renderer, SourceToDocumentableTranslator,
};
use crate::plugability::{ExtensionOptions, ExtensionPoint, Plugin, PluginDeclarer, Provider};
use crate::types::Result;

/// Handles of the base points
pub struct BaseExtensions;

impl BaseExtensions {
    pub fn page_merger_strategy() -> ExtensionPoint<dyn PageMergerStrategy> {
        ExtensionPoint::multi(plugins::BASE, "pageMergerStrategy")
    }

    pub fn comments_to_content_converter() -> ExtensionPoint<dyn CommentsToContentConverter> {
        ExtensionPoint::single(plugins::BASE, "commentsToContentConverter")
    }

    pub fn location_provider_factory() -> ExtensionPoint<dyn LocationProviderFactory> {
        ExtensionPoint::single(plugins::BASE, "locationProviderFactory")
    }

    pub fn output_writer() -> ExtensionPoint<dyn OutputWriter> {
        ExtensionPoint::single(plugins::BASE, "outputWriter")
    }

    pub fn html_preprocessors() -> ExtensionPoint<dyn PageTransformer> {
        ExtensionPoint::multi(plugins::BASE, "htmlPreprocessors")
    }
}

pub struct BasePlugin;

impl BasePlugin {
    fn declare_stages(declarer: &mut PluginDeclarer) {
        declarer.register_extension(
            &CoreExtensions::source_to_documentable_translator(),
            "defaultTranslator",
            Provider::factory(|scope| {
                let module_name = scope.settings().module_name.clone();
                Ok(Arc::new(DefaultSourceTranslator::new(module_name))
                    as Arc<dyn SourceToDocumentableTranslator>)
            }),
            ExtensionOptions::fallback(),
        );

        let private_filter = declarer.register_extension(
            &CoreExtensions::documentable_transformer(),
            "privateMemberFilter",
            Provider::instance(Arc::new(PrivateMemberFilter) as Arc<dyn DocumentableTransformer>),
            ExtensionOptions::new().when(|scope| !scope.settings().include_private),
        );
        declarer.register_extension(
            &CoreExtensions::documentable_transformer(),
            "emptyPackagesFilter",
            Provider::instance(Arc::new(EmptyPackagesFilter) as Arc<dyn DocumentableTransformer>),
            ExtensionOptions::new().after(private_filter.id),
        );

        declarer.register_extension(
            &CoreExtensions::documentable_merger(),
            "defaultMerger",
            Provider::instance(Arc::new(DefaultDocumentableMerger) as Arc<dyn DocumentableMerger>),
            ExtensionOptions::fallback(),
        );

        declarer.register_extension(
            &CoreExtensions::documentable_to_page_translator(),
            "defaultPageTranslator",
            Provider::factory(|scope| {
                let comments = scope.single(&BaseExtensions::comments_to_content_converter())?;
                Ok(Arc::new(DefaultPageTranslator::new(comments))
                    as Arc<dyn DocumentableToPageTranslator>)
            }),
            ExtensionOptions::fallback(),
        );

        declarer.register_extension(
            &CoreExtensions::page_transformer(),
            "pageMerger",
            Provider::factory(|scope| {
                let strategies = scope.multi(&BaseExtensions::page_merger_strategy())?;
                Ok(Arc::new(PageMerger::new(strategies)) as Arc<dyn PageTransformer>)
            }),
            ExtensionOptions::new(),
        );
    }

    fn declare_renderers(declarer: &mut PluginDeclarer) {
        declarer.register_extension(
            &CoreExtensions::renderer(),
            "htmlRenderer",
            Provider::factory(|scope| {
                let renderer = HtmlRenderer::new(
                    scope.multi(&BaseExtensions::html_preprocessors())?,
                    scope.single(&BaseExtensions::location_provider_factory())?,
                    scope.single(&BaseExtensions::output_writer())?,
                    scope.settings().option("footer").map(str::to_string),
                );
                Ok(Arc::new(renderer) as Arc<dyn Renderer>)
            }),
            ExtensionOptions::new().when(|scope| scope.settings().format == OutputFormat::Html),
        );
        declarer.register_extension(
            &CoreExtensions::renderer(),
            "markdownRenderer",
            Provider::factory(|scope| {
                let renderer = MarkdownRenderer::new(
                    scope.single(&BaseExtensions::location_provider_factory())?,
                    scope.single(&BaseExtensions::output_writer())?,
                );
                Ok(Arc::new(renderer) as Arc<dyn Renderer>)
            }),
            ExtensionOptions::new()
                .when(|scope| scope.settings().format == OutputFormat::Markdown),
        );

        let chain: [(&str, Arc<dyn PageTransformer>); 5] = [
            ("rootCreator", Arc::new(RootCreator)),
            ("navigationPageInstaller", Arc::new(NavigationPageInstaller)),
            ("searchPageInstaller", Arc::new(SearchPageInstaller)),
            ("resourceInstaller", Arc::new(ResourceInstaller)),
            ("styleAndScriptsAppender", Arc::new(StyleAndScriptsAppender)),
        ];
        let names: Vec<&str> = chain.iter().map(|(name, _)| *name).collect();
        for (index, (name, preprocessor)) in chain.into_iter().enumerate() {
            let mut options = ExtensionOptions::new();
            if let Some(next) = names.get(index + 1) {
                options = options.before(declarer.id(next));
            }
            declarer.register_extension(
                &BaseExtensions::html_preprocessors(),
                name,
                Provider::instance(preprocessor),
                options,
            );
        }
    }
}

impl Plugin for BasePlugin {
    fn name(&self) -> &str {
        plugins::BASE
    }

    fn declare(&self, declarer: &mut PluginDeclarer) -> Result<()> {
        let strategies = BaseExtensions::page_merger_strategy();
        declarer.declare(&strategies);
        declarer.declare(&BaseExtensions::comments_to_content_converter());
        declarer.declare(&BaseExtensions::location_provider_factory());
        declarer.declare(&BaseExtensions::output_writer());
        declarer.declare(&BaseExtensions::html_preprocessors());

        Self::declare_stages(declarer);
        Self::declare_renderers(declarer);

        let fallback_merger = declarer.id("fallbackMerger");
        declarer.register_extension(
            &strategies,
            "sameMethodNameMerger",
            Provider::instance(Arc::new(SameMethodNameMerger) as Arc<dyn PageMergerStrategy>),
            ExtensionOptions::new().before(fallback_merger),
        );
        declarer.register_extension(
            &strategies,
            "fallbackMerger",
            Provider::instance(Arc::new(FallbackMerger) as Arc<dyn PageMergerStrategy>),
            ExtensionOptions::new(),
        );

        declarer.register_extension(
            &BaseExtensions::comments_to_content_converter(),
            "docTagToContentConverter",
            Provider::instance(
                Arc::new(DocTagToContentConverter) as Arc<dyn CommentsToContentConverter>
            ),
            ExtensionOptions::fallback(),
        );
        declarer.register_extension(
            &BaseExtensions::location_provider_factory(),
            "defaultLocationProvider",
            Provider::instance(
                Arc::new(DefaultLocationProviderFactory) as Arc<dyn LocationProviderFactory>
            ),
            ExtensionOptions::fallback(),
        );
        declarer.register_extension(
            &BaseExtensions::output_writer(),
            "fileWriter",
            Provider::factory(|scope| {
                let root = scope.settings().output_dir.clone();
                Ok(Arc::new(FileWriter::new(root)) as Arc<dyn OutputWriter>)
            }),
            ExtensionOptions::fallback(),
        );

        Ok(())
    }
}

// =============================================================================
// Dry Run
// =============================================================================

/// Keeps every rendered file in memory instead of writing to disk
pub struct DryRunPlugin {
    writer: Arc<MemoryWriter>,
}

impl DryRunPlugin {
    pub fn new() -> Self {
        Self {
            writer: Arc::new(MemoryWriter::new()),
        }
    }

    /// Files rendered so far
    pub fn writer(&self) -> Arc<MemoryWriter> {
        Arc::clone(&self.writer)
    }
}

impl Default for DryRunPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for DryRunPlugin {
    fn name(&self) -> &str {
        plugins::DRY_RUN
    }

    fn declare(&self, declarer: &mut PluginDeclarer) -> Result<()> {
        declarer.register_extension(
            &BaseExtensions::output_writer(),
            "memoryWriter",
            Provider::instance(Arc::clone(&self.writer) as Arc<dyn OutputWriter>),
            ExtensionOptions::new(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunSettings;
    use crate::pipeline::CorePlugin;
    use crate::plugability::{PluginRegistry, RunContext};
    use crate::types::ExtensionId;

    fn context(plugins: Vec<Arc<dyn Plugin>>, settings: RunSettings) -> RunContext {
        let registry = PluginRegistry::load(&plugins).unwrap();
        RunContext::new(Arc::new(registry), settings)
    }

    fn base_plugins() -> Vec<Arc<dyn Plugin>> {
        vec![Arc::new(CorePlugin), Arc::new(BasePlugin)]
    }

    fn names(ids: Vec<ExtensionId>) -> Vec<String> {
        ids.iter().map(|id| id.name().to_string()).collect()
    }

    #[test]
    fn test_html_preprocessors_follow_chain() {
        let ctx = context(base_plugins(), RunSettings::default());
        let ids = ctx
            .resolved_ids(BaseExtensions::html_preprocessors().id())
            .unwrap();
        assert_eq!(
            names(ids),
            [
                "rootCreator",
                "navigationPageInstaller",
                "searchPageInstaller",
                "resourceInstaller",
                "styleAndScriptsAppender",
            ]
        );
    }

    #[test]
    fn test_renderer_follows_format() {
        let renderer = CoreExtensions::renderer();

        let html = context(base_plugins(), RunSettings::default());
        assert_eq!(
            names(html.resolved_ids(renderer.id()).unwrap()),
            ["htmlRenderer"]
        );

        let settings = RunSettings {
            format: OutputFormat::Markdown,
            ..RunSettings::default()
        };
        let markdown = context(base_plugins(), settings);
        assert_eq!(
            names(markdown.resolved_ids(renderer.id()).unwrap()),
            ["markdownRenderer"]
        );
        assert!(markdown.single(&renderer).is_ok());
    }

    #[test]
    fn test_private_filter_follows_settings() {
        let point = CoreExtensions::documentable_transformer();

        let default = context(base_plugins(), RunSettings::default());
        assert_eq!(
            names(default.resolved_ids(point.id()).unwrap()),
            ["privateMemberFilter", "emptyPackagesFilter"]
        );

        let settings = RunSettings {
            include_private: true,
            ..RunSettings::default()
        };
        let everything = context(base_plugins(), settings);
        assert_eq!(
            names(everything.resolved_ids(point.id()).unwrap()),
            ["emptyPackagesFilter"]
        );
    }

    #[test]
    fn test_merge_strategies_order() {
        let ctx = context(base_plugins(), RunSettings::default());
        let ids = ctx
            .resolved_ids(BaseExtensions::page_merger_strategy().id())
            .unwrap();
        assert_eq!(names(ids), ["sameMethodNameMerger", "fallbackMerger"]);
    }

    #[test]
    fn test_dry_run_supersedes_file_writer() {
        let mut plugins = base_plugins();
        plugins.push(Arc::new(DryRunPlugin::new()));
        let ctx = context(plugins, RunSettings::default());

        let ids = ctx
            .resolved_ids(BaseExtensions::output_writer().id())
            .unwrap();
        assert_eq!(ids, [ExtensionId::new("dry-run", "memoryWriter")]);

        let without = context(base_plugins(), RunSettings::default());
        let ids = without
            .resolved_ids(BaseExtensions::output_writer().id())
            .unwrap();
        assert_eq!(ids, [ExtensionId::new("base", "fileWriter")]);
    }

    #[test]
    fn test_page_translator_resolves_converter() {
        let ctx = context(base_plugins(), RunSettings::default());
        assert!(
            ctx.single(&CoreExtensions::documentable_to_page_translator())
                .is_ok()
        );
        let converter = BaseExtensions::comments_to_content_converter();
        assert_eq!(
            names(ctx.resolved_ids(converter.id()).unwrap()),
            ["docTagToContentConverter"]
        );
    }
}
