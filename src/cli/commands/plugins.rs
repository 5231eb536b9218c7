//! Plugins Command
//!
//! Show loaded plugins, their points and extensions, and what every point
//! resolves to under the current configuration.
//!
//! Usage:
//!   weavedoc plugins [-f json]

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cli::Output;
use crate::config::{ConfigLoader, RunSettings};
use crate::pipeline::default_plugins;
use crate::plugability::{Plugin, PluginRegistry, RegistrySummary, RunContext};
use crate::types::Result;

/// How `weavedoc plugins` prints its report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}. Valid values: text, json", s)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PluginReport {
    #[serde(flatten)]
    pub registry: RegistrySummary,
    /// Point identity to its resolution under the given settings
    pub resolved: BTreeMap<String, PointResolution>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointResolution {
    Extensions(Vec<String>),
    Error(String),
}

/// Load `plugins` and resolve every point once
pub fn report(plugins: &[Arc<dyn Plugin>], settings: RunSettings) -> Result<PluginReport> {
    let registry = Arc::new(PluginRegistry::load(plugins)?);
    let ctx = RunContext::new(Arc::clone(&registry), settings);

    let resolved = registry
        .point_ids()
        .map(|point| {
            let resolution = match ctx.resolved_ids(point) {
                Ok(ids) => PointResolution::Extensions(ids.iter().map(ToString::to_string).collect()),
                Err(e) => PointResolution::Error(e.to_string()),
            };
            (point.to_string(), resolution)
        })
        .collect();

    Ok(PluginReport {
        registry: registry.describe(),
        resolved,
    })
}

pub fn run(format: ReportFormat) -> Result<()> {
    let config = ConfigLoader::load()?;
    let plugins = default_plugins(&config.plugins);
    let report = report(&plugins, config.run)?;

    if format == ReportFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let output = Output::new();
    for plugin in &report.registry.plugins {
        output.section(&format!("Plugin {}", plugin.name));

        for point in &plugin.points {
            output.field("point", &format!("{} ({:?})", point.id, point.cardinality));
        }
        for extension in &plugin.extensions {
            let mut flags = Vec::new();
            if extension.fallback {
                flags.push("fallback".to_string());
            }
            if extension.conditional {
                flags.push("conditional".to_string());
            }
            flags.extend(extension.before.iter().map(|id| format!("before {}", id)));
            flags.extend(extension.after.iter().map(|id| format!("after {}", id)));

            let suffix = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            };
            output.field("extension", &format!("{} → {}{}", extension.id, extension.point, suffix));
        }
    }

    output.section("Resolution");
    for (point, resolution) in &report.resolved {
        match resolution {
            PointResolution::Extensions(ids) if ids.is_empty() => {
                output.field(point, "(none)");
            }
            PointResolution::Extensions(ids) => output.field(point, &ids.join(", ")),
            PointResolution::Error(message) => output.warning(&format!("{}: {}", point, message)),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, PluginSettings};

    #[test]
    fn test_report_format_parsing() {
        assert_eq!("json".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert_eq!("TEXT".parse::<ReportFormat>(), Ok(ReportFormat::Text));

        let err = "yaml".parse::<ReportFormat>().unwrap_err();
        assert!(err.contains("yaml"));
        assert!(err.contains("text, json"));
    }

    #[test]
    fn test_report_resolves_every_point() {
        let plugins = default_plugins(&PluginSettings::default());
        let report = report(&plugins, RunSettings::default()).unwrap();

        let names: Vec<&str> = report
            .registry
            .plugins
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["core", "base"]);
        assert_eq!(report.resolved.len(), 11);
        assert!(matches!(
            &report.resolved["core/renderer"],
            PointResolution::Extensions(ids) if ids == &["base/htmlRenderer"]
        ));
    }

    #[test]
    fn test_report_without_base_lists_failures() {
        let settings = PluginSettings {
            disabled: vec!["base".to_string()],
        };
        let report = report(&default_plugins(&settings), RunSettings {
            format: OutputFormat::Markdown,
            ..RunSettings::default()
        })
        .unwrap();

        assert!(matches!(
            &report.resolved["core/renderer"],
            PointResolution::Error(message) if message.contains("No active extension")
        ));
        assert!(matches!(
            &report.resolved["core/pageTransformer"],
            PointResolution::Extensions(ids) if ids.is_empty()
        ));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["resolved"]["core/renderer"]["error"].is_string());
    }
}
