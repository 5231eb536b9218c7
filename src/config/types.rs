//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (`~/.config/weavedoc/`) and project (`.weavedoc/`) level configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::{DocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Settings every extension can read during a run
    pub run: RunSettings,

    /// Plugin selection
    pub plugins: PluginSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            run: RunSettings::default(),
            plugins: PluginSettings::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.run.module_name.trim().is_empty() {
            return Err(DocError::Config(
                "run.module_name must not be empty".to_string(),
            ));
        }

        if self.run.output_dir.as_os_str().is_empty() {
            return Err(DocError::Config(
                "run.output_dir must not be empty".to_string(),
            ));
        }

        if let Some(name) = self
            .plugins
            .disabled
            .iter()
            .find(|name| name.as_str() == crate::constants::plugins::CORE)
        {
            return Err(DocError::Config(format!(
                "Plugin '{}' cannot be disabled",
                name
            )));
        }

        Ok(())
    }
}

// =============================================================================
// Run Settings
// =============================================================================

/// Ambient settings of one documentation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Output format selecting the active renderer
    pub format: OutputFormat,

    /// Directory the file writer puts pages into
    pub output_dir: PathBuf,

    /// Name of the documented module (root page title)
    pub module_name: String,

    /// Keep private and internal members
    pub include_private: bool,

    /// Free-form options for third-party plugins
    pub options: BTreeMap<String, String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output_dir: PathBuf::from("docs"),
            module_name: "root".to_string(),
            include_private: false,
            options: BTreeMap::new(),
        }
    }
}

impl RunSettings {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Markdown,
}

impl OutputFormat {
    /// File extension of rendered pages
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Html => write!(f, "html"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!(
                "Unknown output format: {}. Valid values: html, markdown",
                s
            )),
        }
    }
}

// =============================================================================
// Plugin Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Names of bundled plugins left out of the registry
    pub disabled: Vec<String>,
}

impl PluginSettings {
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|disabled| disabled == name)
    }
}
