//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Error Categories
//!
//! Every plugin error is a configuration-time defect:
//!
//! - **Declaration**: plugin, point or extension declarations that do not fit together
//! - **Ordering**: `before`/`after` constraints that cannot be satisfied
//! - **Cardinality**: a `Single` point without exactly one candidate
//! - **Resolution**: a point whose resolution depends on itself, or was aborted
//! - **Extension**: a factory that failed while building its value
//!
//! None of them is retried. The run aborts with a message naming the plugin and
//! extension identities involved, since only a configuration change fixes them.

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Plugin error categories for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginErrorCategory {
    /// Declarations that do not fit together (unknown point, duplicates, type mismatch)
    Declaration,
    /// Ordering constraints form a cycle
    Ordering,
    /// Single point resolved to zero or several candidates
    Cardinality,
    /// Resolution recursively depends on itself or was aborted
    Resolution,
    /// An extension factory failed
    Extension,
}

impl std::fmt::Display for PluginErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Declaration => write!(f, "DECLARATION"),
            Self::Ordering => write!(f, "ORDERING"),
            Self::Cardinality => write!(f, "CARDINALITY"),
            Self::Resolution => write!(f, "RESOLUTION"),
            Self::Extension => write!(f, "EXTENSION"),
        }
    }
}

// =============================================================================
// Plugin Error
// =============================================================================

/// Errors raised while loading plugins or resolving extension points.
///
/// `Clone` so a failed resolution can be memoized and handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    #[error("Unresolved extension point '{point}'{}", referenced_by_suffix(.referenced_by))]
    UnresolvedPoint {
        point: String,
        referenced_by: Option<String>,
    },

    #[error("Plugin '{plugin}' is loaded more than once")]
    DuplicatePlugin { plugin: String },

    #[error("Plugin '{plugin}' cannot declare '{point}', which belongs to another plugin")]
    ForeignPointDeclaration { plugin: String, point: String },

    #[error("Extension point '{point}' is declared more than once")]
    DuplicatePoint { point: String },

    #[error("Extension '{extension}' is registered more than once at point '{point}'")]
    DuplicateExtensionIdentity { point: String, extension: String },

    #[error("Extension point '{point}' is declared as {expected} but used as {found}")]
    PointTypeMismatch {
        point: String,
        expected: String,
        found: String,
    },

    #[error(
        "Extension '{extension}' at '{point}' orders itself against '{reference}', which only exists at '{reference_point}'"
    )]
    OrderingAcrossPoints {
        extension: String,
        point: String,
        reference: String,
        reference_point: String,
    },

    #[error("Cyclic ordering at '{point}': {}", .cycle.join(" -> "))]
    CyclicOrdering { point: String, cycle: Vec<String> },

    #[error("Ambiguous single extension at '{point}': candidates [{}]", .candidates.join(", "))]
    AmbiguousSingleExtension {
        point: String,
        candidates: Vec<String>,
    },

    #[error("No active extension at '{point}' (inactive: [{}])", .inactive.join(", "))]
    NoActiveExtension { point: String, inactive: Vec<String> },

    #[error("Resolution cycle: {}", .chain.join(" -> "))]
    ResolutionCycle { chain: Vec<String> },

    #[error("Resolution of '{point}' was aborted by a panicking extension")]
    ResolutionAborted { point: String },

    #[error("Extension '{extension}' failed: {message}")]
    ExtensionFailed { extension: String, message: String },
}

fn referenced_by_suffix(referenced_by: &Option<String>) -> String {
    referenced_by
        .as_ref()
        .map(|by| format!(" (referenced by '{}')", by))
        .unwrap_or_default()
}

impl PluginError {
    /// Category used for reporting
    pub fn category(&self) -> PluginErrorCategory {
        match self {
            Self::UnresolvedPoint { .. }
            | Self::DuplicatePlugin { .. }
            | Self::ForeignPointDeclaration { .. }
            | Self::DuplicatePoint { .. }
            | Self::DuplicateExtensionIdentity { .. }
            | Self::PointTypeMismatch { .. }
            | Self::OrderingAcrossPoints { .. } => PluginErrorCategory::Declaration,
            Self::CyclicOrdering { .. } => PluginErrorCategory::Ordering,
            Self::AmbiguousSingleExtension { .. } | Self::NoActiveExtension { .. } => {
                PluginErrorCategory::Cardinality
            }
            Self::ResolutionCycle { .. } | Self::ResolutionAborted { .. } => {
                PluginErrorCategory::Resolution
            }
            Self::ExtensionFailed { .. } => PluginErrorCategory::Extension,
        }
    }

    pub fn is_resolution_cycle(&self) -> bool {
        matches!(self, Self::ResolutionCycle { .. })
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum DocError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // -------------------------------------------------------------------------
    // Plugin Errors
    // -------------------------------------------------------------------------
    #[error("[{}] {}", .0.category(), .0)]
    Plugin(#[from] PluginError),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Pipeline error in stage {stage}: {message}")]
    Pipeline { stage: String, message: String },

    #[error("Render error for page '{page}': {message}")]
    Render { page: String, message: String },

    #[error("Input error in {path}: {message}")]
    Input { path: String, message: String },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DocError>;

impl DocError {
    /// Create a pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a render error
    pub fn render(page: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            page: page.into(),
            message: message.into(),
        }
    }

    /// Plugin error carried by this error, if any
    pub fn as_plugin_error(&self) -> Option<&PluginError> {
        match self {
            Self::Plugin(err) => Some(err),
            _ => None,
        }
    }

    /// Convert into a memoizable plugin error, attributing foreign failures to `extension`
    pub fn into_plugin_error(self, extension: &str) -> PluginError {
        match self {
            Self::Plugin(err) => err,
            other => PluginError::ExtensionFailed {
                extension: extension.to_string(),
                message: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(PluginErrorCategory::Declaration.to_string(), "DECLARATION");
        assert_eq!(PluginErrorCategory::Cardinality.to_string(), "CARDINALITY");
        assert_eq!(PluginErrorCategory::Resolution.to_string(), "RESOLUTION");
    }

    #[test]
    fn test_error_categories() {
        let unresolved = PluginError::UnresolvedPoint {
            point: "core/renderer".to_string(),
            referenced_by: None,
        };
        assert_eq!(unresolved.category(), PluginErrorCategory::Declaration);

        let cycle = PluginError::CyclicOrdering {
            point: "base/htmlPreprocessors".to_string(),
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(cycle.category(), PluginErrorCategory::Ordering);

        let recursion = PluginError::ResolutionCycle { chain: vec![] };
        assert!(recursion.is_resolution_cycle());
        assert_eq!(recursion.category(), PluginErrorCategory::Resolution);
    }

    #[test]
    fn test_error_messages() {
        let err = PluginError::UnresolvedPoint {
            point: "base/missing".to_string(),
            referenced_by: Some("ext/writer".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Unresolved extension point 'base/missing' (referenced by 'ext/writer')"
        );

        let err = PluginError::CyclicOrdering {
            point: "p/x".to_string(),
            cycle: vec!["p/a".to_string(), "p/b".to_string(), "p/a".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic ordering at 'p/x': p/a -> p/b -> p/a");

        let wrapped = DocError::from(PluginError::DuplicatePlugin {
            plugin: "base".to_string(),
        });
        assert_eq!(
            wrapped.to_string(),
            "[DECLARATION] Plugin 'base' is loaded more than once"
        );
    }

    #[test]
    fn test_into_plugin_error() {
        let err = DocError::Config("bad".to_string()).into_plugin_error("base/fileWriter");
        assert_eq!(
            err,
            PluginError::ExtensionFailed {
                extension: "base/fileWriter".to_string(),
                message: "Config error: bad".to_string(),
            }
        );

        let inner = PluginError::ResolutionCycle {
            chain: vec!["a".to_string()],
        };
        assert_eq!(DocError::Plugin(inner.clone()).into_plugin_error("x"), inner);
    }
}
