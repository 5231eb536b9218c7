//! Generate Command
//!
//! Render documentation from analyzed source sets.
//!
//! Usage:
//!   weavedoc generate <INPUT>... [--format html|markdown] [--output DIR]
//!                     [--module NAME] [--include-private] [--dry-run]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::base::DryRunPlugin;
use crate::cli::Output;
use crate::config::{ConfigLoader, OutputFormat, RunSettings};
use crate::model::SourceSet;
use crate::pipeline::{DocumentationGenerator, GenerationReport, default_plugins};
use crate::plugability::Plugin;
use crate::types::{DocError, Result};

/// Command line overrides on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Source set files or glob patterns
    pub inputs: Vec<String>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
    pub module_name: Option<String>,
    pub include_private: bool,
    /// Render into memory and list the files instead of writing them
    pub dry_run: bool,
}

impl GenerateOptions {
    fn apply(&self, settings: &mut RunSettings) {
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(module_name) = &self.module_name {
            settings.module_name = module_name.clone();
        }
        if self.include_private {
            settings.include_private = true;
        }
    }
}

pub async fn run(options: GenerateOptions) -> Result<GenerationReport> {
    let output = Output::new();
    let config = ConfigLoader::load()?;

    let mut settings = config.run.clone();
    options.apply(&mut settings);

    let paths = expand_inputs(&options.inputs)?;
    let source_sets = paths
        .iter()
        .map(|path| {
            debug!("Loading source set {}", path.display());
            SourceSet::from_path(path)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut plugins = default_plugins(&config.plugins);
    let dry_run = options.dry_run.then(|| Arc::new(DryRunPlugin::new()));
    if let Some(plugin) = &dry_run {
        plugins.push(Arc::clone(plugin) as Arc<dyn Plugin>);
    }

    let generator = DocumentationGenerator::new(&plugins, settings)?;
    let report = generator.generate(source_sets).await?;

    output.report(&report, dry_run.is_some());
    match &dry_run {
        Some(plugin) => output.info(&format!(
            "Dry run: {} file(s) kept in memory",
            plugin.writer().len()
        )),
        None => output.success(&format!(
            "Documentation written to {}",
            generator.settings().output_dir.display()
        )),
    }

    Ok(report)
}

/// Resolve input patterns to existing files
///
/// Files keep the order of the patterns that first matched them, so source
/// sets are generated in the order they were given.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| DocError::Input {
            path: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut matched = false;
        for entry in entries {
            let path = entry.map_err(|e| DocError::Input {
                path: pattern.clone(),
                message: e.to_string(),
            })?;
            if path.is_file() {
                matched = true;
                if seen.insert(path.clone()) {
                    paths.push(path);
                }
            }
        }
        if !matched {
            return Err(DocError::Input {
                path: pattern.clone(),
                message: "no source set file matches".to_string(),
            });
        }
    }

    Ok(paths)
}
