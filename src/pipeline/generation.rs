//! Documentation generation
//!
//! Drives one run through the core stages:
//!
//! ```text
//! SourceSet ─translate─▶ Documentable ─transform─┐   (per source set, in parallel)
//!                                                ▼
//!                            merge ─▶ pages ─transform─▶ render
//! ```
//!
//! Every stage implementation is resolved from the run's `RunContext`, so
//! which extension runs is decided by the loaded plugins and the settings.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::sync::Arc;

use tracing::{debug, info};

use super::core::CoreExtensions;
use super::stages::RenderedFile;
use crate::config::{OutputFormat, RunSettings};
use crate::constants::pipeline::TRANSLATION_CONCURRENCY;
use crate::model::{Documentable, SourceSet};
use crate::plugability::{Plugin, PluginRegistry, RunContext};
use crate::types::{DocError, Result};

/// Outcome of one generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub format: OutputFormat,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_sets: Vec<String>,
    pub pages: usize,
    pub files: Vec<RenderedFile>,
}

pub struct DocumentationGenerator {
    registry: Arc<PluginRegistry>,
    settings: RunSettings,
}

impl DocumentationGenerator {
    /// Load and freeze `plugins`, in order
    pub fn new(plugins: &[Arc<dyn Plugin>], settings: RunSettings) -> Result<Self> {
        let registry = PluginRegistry::load(plugins)?;
        Ok(Self::with_registry(Arc::new(registry), settings))
    }

    pub fn with_registry(registry: Arc<PluginRegistry>, settings: RunSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run the pipeline once over `source_sets` with a fresh run context
    pub async fn generate(&self, source_sets: Vec<SourceSet>) -> Result<GenerationReport> {
        if source_sets.is_empty() {
            return Err(DocError::pipeline("translate", "no source sets given"));
        }

        let started_at = Utc::now();
        let ctx = Arc::new(RunContext::new(
            Arc::clone(&self.registry),
            self.settings.clone(),
        ));
        let names: Vec<String> = source_sets.iter().map(|s| s.name.clone()).collect();
        info!(
            "[{}] Generating {} documentation for {} source set(s)",
            ctx.run_id(),
            self.settings.format,
            names.len()
        );

        let modules = Self::translate_all(&ctx, source_sets).await?;

        let merger = ctx.single(&CoreExtensions::documentable_merger())?;
        let module = merger.merge(modules)?;
        debug!("[{}] Merged module '{}'", ctx.run_id(), module.name);

        let translator = ctx.single(&CoreExtensions::documentable_to_page_translator())?;
        let mut root = translator.translate(&module)?;
        for transformer in ctx.multi(&CoreExtensions::page_transformer())? {
            transformer.transform(&mut root)?;
        }
        let pages = root.count();

        let renderer = ctx.single(&CoreExtensions::renderer())?;
        let files = renderer.render(root).await?;

        let finished_at = Utc::now();
        info!(
            "[{}] Rendered {} page(s) into {} file(s) in {}ms",
            ctx.run_id(),
            pages,
            files.len(),
            (finished_at - started_at).num_milliseconds()
        );

        Ok(GenerationReport {
            run_id: ctx.run_id().to_string(),
            format: self.settings.format,
            started_at,
            finished_at,
            source_sets: names,
            pages,
            files,
        })
    }

    /// Translate and transform each source set on a blocking worker
    async fn translate_all(
        ctx: &Arc<RunContext>,
        source_sets: Vec<SourceSet>,
    ) -> Result<Vec<Documentable>> {
        stream::iter(source_sets)
            .map(|source_set| {
                let ctx = Arc::clone(ctx);
                async move {
                    let handle =
                        tokio::task::spawn_blocking(move || Self::translate_one(&ctx, &source_set));
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(DocError::pipeline("translate", e.to_string())),
                    }
                }
            })
            .buffered(TRANSLATION_CONCURRENCY)
            .try_collect()
            .await
    }

    fn translate_one(ctx: &RunContext, source_set: &SourceSet) -> Result<Documentable> {
        let translator = ctx.single(&CoreExtensions::source_to_documentable_translator())?;
        let mut module = translator.translate(source_set)?;
        for transformer in ctx.multi(&CoreExtensions::documentable_transformer())? {
            module = transformer.transform(module)?;
        }
        debug!(
            "[{}] Translated source set '{}'",
            ctx.run_id(),
            source_set.name
        );
        Ok(module)
    }
}
