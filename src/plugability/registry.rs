//! Plugin Registry
//!
//! Runs every plugin's declaration in load order, indexes points and
//! extensions by point identity, validates the result and freezes it. A
//! frozen registry is immutable and can back any number of isolated runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::extension::RegisteredExtension;
use super::plugin::{Plugin, PluginDeclarer, PointDeclaration};
use super::point::Cardinality;
use crate::types::{ExtensionId, PluginError, PointId, Result};

/// One declared point with the extensions targeting it, in declaration order
pub(crate) struct PointEntry {
    pub declaration: PointDeclaration,
    pub declared_by: String,
    pub extensions: Vec<RegisteredExtension>,
}

/// Frozen index of all loaded plugins
pub struct PluginRegistry {
    plugins: Vec<String>,
    points: BTreeMap<PointId, PointEntry>,
}

impl PluginRegistry {
    /// Run the declaration phase of `plugins` in order, validate and freeze.
    pub fn load(plugins: &[Arc<dyn Plugin>]) -> Result<Self> {
        let mut names: Vec<String> = Vec::with_capacity(plugins.len());
        let mut points: BTreeMap<PointId, PointEntry> = BTreeMap::new();
        let mut extensions: Vec<RegisteredExtension> = Vec::new();

        for plugin in plugins {
            let name = plugin.name().to_string();
            if names.contains(&name) {
                return Err(PluginError::DuplicatePlugin { plugin: name }.into());
            }

            let mut declarer = PluginDeclarer::new(name.as_str());
            plugin.declare(&mut declarer)?;
            let (declared_points, declared_extensions) = declarer.finish();
            debug!(
                "Plugin '{}' declared {} points, {} extensions",
                name,
                declared_points.len(),
                declared_extensions.len()
            );

            for declaration in declared_points {
                if declaration.id.plugin() != name {
                    return Err(PluginError::ForeignPointDeclaration {
                        plugin: name,
                        point: declaration.id.to_string(),
                    }
                    .into());
                }
                if points.contains_key(&declaration.id) {
                    return Err(PluginError::DuplicatePoint {
                        point: declaration.id.to_string(),
                    }
                    .into());
                }
                points.insert(
                    declaration.id.clone(),
                    PointEntry {
                        declaration,
                        declared_by: name.clone(),
                        extensions: Vec::new(),
                    },
                );
            }

            extensions.extend(declared_extensions);
            names.push(name);
        }

        for extension in extensions {
            let Some(entry) = points.get_mut(&extension.point) else {
                return Err(PluginError::UnresolvedPoint {
                    point: extension.point.to_string(),
                    referenced_by: Some(extension.id.to_string()),
                }
                .into());
            };
            if entry.declaration.capability != extension.capability {
                return Err(PluginError::PointTypeMismatch {
                    point: extension.point.to_string(),
                    expected: entry.declaration.capability.name().to_string(),
                    found: extension.capability.name().to_string(),
                }
                .into());
            }
            if entry.extensions.iter().any(|e| e.id == extension.id) {
                return Err(PluginError::DuplicateExtensionIdentity {
                    point: extension.point.to_string(),
                    extension: extension.id.to_string(),
                }
                .into());
            }
            entry.extensions.push(extension);
        }

        validate_ordering_references(&points)?;

        info!(
            "Loaded {} plugins: {} extension points, {} extensions",
            names.len(),
            points.len(),
            points.values().map(|e| e.extensions.len()).sum::<usize>()
        );

        Ok(Self {
            plugins: names,
            points,
        })
    }

    /// Plugin names in load order
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    /// Declared point identities
    pub fn point_ids(&self) -> impl Iterator<Item = &PointId> {
        self.points.keys()
    }

    pub fn contains_point(&self, id: &PointId) -> bool {
        self.points.contains_key(id)
    }

    pub(crate) fn entry(&self, id: &PointId) -> Option<&PointEntry> {
        self.points.get(id)
    }

    /// Serializable overview of plugins, points and extensions
    pub fn describe(&self) -> RegistrySummary {
        let plugins = self
            .plugins
            .iter()
            .map(|name| PluginSummary {
                name: name.clone(),
                points: self
                    .points
                    .values()
                    .filter(|entry| &entry.declared_by == name)
                    .map(|entry| PointSummary {
                        id: entry.declaration.id.to_string(),
                        cardinality: entry.declaration.cardinality,
                        capability: entry.declaration.capability.name().to_string(),
                    })
                    .collect(),
                extensions: self
                    .points
                    .values()
                    .flat_map(|entry| entry.extensions.iter())
                    .filter(|extension| extension.id.plugin() == name)
                    .map(|extension| ExtensionSummary {
                        id: extension.id.to_string(),
                        point: extension.point.to_string(),
                        fallback: extension.fallback,
                        conditional: extension.condition.is_some(),
                        before: extension.before.iter().map(ToString::to_string).collect(),
                        after: extension.after.iter().map(ToString::to_string).collect(),
                    })
                    .collect(),
            })
            .collect();

        RegistrySummary { plugins }
    }
}

/// Reject `before`/`after` references to extensions that only exist at other points
fn validate_ordering_references(points: &BTreeMap<PointId, PointEntry>) -> Result<()> {
    let mut located: HashMap<&ExtensionId, Vec<&PointId>> = HashMap::new();
    for (point, entry) in points {
        for extension in &entry.extensions {
            located.entry(&extension.id).or_default().push(point);
        }
    }

    for (point, entry) in points {
        let local: HashSet<&ExtensionId> = entry.extensions.iter().map(|e| &e.id).collect();

        for extension in &entry.extensions {
            for reference in extension.before.iter().chain(&extension.after) {
                if local.contains(reference) {
                    continue;
                }
                match located.get(reference).and_then(|found| found.first()) {
                    Some(elsewhere) => {
                        return Err(PluginError::OrderingAcrossPoints {
                            extension: extension.id.to_string(),
                            point: point.to_string(),
                            reference: reference.to_string(),
                            reference_point: elsewhere.to_string(),
                        }
                        .into());
                    }
                    None => debug!(
                        "'{}' references unknown extension '{}'; constraint is vacuous",
                        extension.id, reference
                    ),
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// Summaries
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RegistrySummary {
    pub plugins: Vec<PluginSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub points: Vec<PointSummary>,
    pub extensions: Vec<ExtensionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointSummary {
    pub id: String,
    pub cardinality: Cardinality,
    pub capability: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtensionSummary {
    pub id: String,
    pub point: String,
    pub fallback: bool,
    pub conditional: bool,
    pub before: Vec<String>,
    pub after: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugability::test_support::plugin;
    use crate::plugability::{ExtensionOptions, ExtensionPoint, Provider};
    use crate::types::DocError;

    trait Greeter: Send + Sync {}
    trait Painter: Send + Sync {}

    struct Hello;
    impl Greeter for Hello {}

    fn greeters() -> ExtensionPoint<dyn Greeter> {
        ExtensionPoint::multi("host", "greeters")
    }

    fn hello() -> Provider<dyn Greeter> {
        Provider::instance(Arc::new(Hello) as Arc<dyn Greeter>)
    }

    fn plugin_error(result: Result<PluginRegistry>) -> PluginError {
        match result {
            Err(DocError::Plugin(err)) => err,
            Err(other) => panic!("expected plugin error, got {other}"),
            Ok(_) => panic!("expected plugin error, registry loaded"),
        }
    }

    #[test]
    fn test_load_indexes_points_and_extensions() {
        let host = plugin("host", |d| {
            d.declare(&greeters());
        });
        let guest = plugin("guest", |d| {
            d.register_extension(&greeters(), "hello", hello(), ExtensionOptions::new());
        });

        let registry = PluginRegistry::load(&[host, guest]).unwrap();
        assert_eq!(registry.plugins(), ["host", "guest"]);
        assert!(registry.contains_point(greeters().id()));

        let summary = registry.describe();
        assert_eq!(summary.plugins[0].points[0].id, "host/greeters");
        assert_eq!(summary.plugins[1].extensions[0].id, "guest/hello");
        assert_eq!(summary.plugins[1].extensions[0].point, "host/greeters");
    }

    #[test]
    fn test_extension_may_target_point_of_later_plugin() {
        let guest = plugin("guest", |d| {
            d.register_extension(&greeters(), "hello", hello(), ExtensionOptions::new());
        });
        let host = plugin("host", |d| {
            d.declare(&greeters());
        });

        assert!(PluginRegistry::load(&[guest, host]).is_ok());
    }

    #[test]
    fn test_unresolved_target_point() {
        let guest = plugin("guest", |d| {
            d.register_extension(&greeters(), "hello", hello(), ExtensionOptions::new());
        });

        assert_eq!(
            plugin_error(PluginRegistry::load(&[guest])),
            PluginError::UnresolvedPoint {
                point: "host/greeters".to_string(),
                referenced_by: Some("guest/hello".to_string()),
            }
        );
    }

    #[test]
    fn test_duplicate_plugin() {
        let a = plugin("host", |_| {});
        let b = plugin("host", |_| {});
        assert_eq!(
            plugin_error(PluginRegistry::load(&[a, b])),
            PluginError::DuplicatePlugin {
                plugin: "host".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_point() {
        let host = plugin("host", |d| {
            d.declare(&greeters());
            d.declare_point::<dyn Greeter>("greeters", Cardinality::Single);
        });
        assert!(matches!(
            plugin_error(PluginRegistry::load(&[host])),
            PluginError::DuplicatePoint { .. }
        ));
    }

    #[test]
    fn test_foreign_point_declaration() {
        let intruder = plugin("intruder", |d| {
            d.declare(&greeters());
        });
        assert!(matches!(
            plugin_error(PluginRegistry::load(&[intruder])),
            PluginError::ForeignPointDeclaration { .. }
        ));
    }

    #[test]
    fn test_duplicate_extension_identity() {
        let host = plugin("host", |d| {
            let point = d.declare_point::<dyn Greeter>("greeters", Cardinality::Multi);
            d.register_extension(&point, "hello", hello(), ExtensionOptions::new());
            d.register_extension(&point, "hello", hello(), ExtensionOptions::fallback());
        });
        assert_eq!(
            plugin_error(PluginRegistry::load(&[host])),
            PluginError::DuplicateExtensionIdentity {
                point: "host/greeters".to_string(),
                extension: "host/hello".to_string(),
            }
        );
    }

    #[test]
    fn test_same_name_at_different_points_is_allowed() {
        let host = plugin("host", |d| {
            let first = d.declare_point::<dyn Greeter>("first", Cardinality::Multi);
            let second = d.declare_point::<dyn Greeter>("second", Cardinality::Multi);
            d.register_extension(&first, "hello", hello(), ExtensionOptions::new());
            d.register_extension(&second, "hello", hello(), ExtensionOptions::new());
        });
        assert!(PluginRegistry::load(&[host]).is_ok());
    }

    #[test]
    fn test_point_type_mismatch() {
        let host = plugin("host", |d| {
            d.declare_point::<dyn Painter>("greeters", Cardinality::Multi);
            d.register_extension(&greeters(), "hello", hello(), ExtensionOptions::new());
        });
        let err = plugin_error(PluginRegistry::load(&[host]));
        let PluginError::PointTypeMismatch { expected, found, .. } = err else {
            panic!("expected type mismatch");
        };
        assert!(expected.contains("Painter"));
        assert!(found.contains("Greeter"));
    }

    #[test]
    fn test_ordering_across_points_is_rejected() {
        let host = plugin("host", |d| {
            let first = d.declare_point::<dyn Greeter>("first", Cardinality::Multi);
            let second = d.declare_point::<dyn Greeter>("second", Cardinality::Multi);
            d.register_extension(&first, "a", hello(), ExtensionOptions::new());
            let target = d.id("a");
            d.register_extension(&second, "b", hello(), ExtensionOptions::new().before(target));
        });
        assert_eq!(
            plugin_error(PluginRegistry::load(&[host])),
            PluginError::OrderingAcrossPoints {
                extension: "host/b".to_string(),
                point: "host/second".to_string(),
                reference: "host/a".to_string(),
                reference_point: "host/first".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_ordering_reference_is_accepted() {
        let host = plugin("host", |d| {
            let point = d.declare_point::<dyn Greeter>("greeters", Cardinality::Multi);
            let ghost = d.id("ghost");
            d.register_extension(&point, "a", hello(), ExtensionOptions::new().after(ghost));
        });
        assert!(PluginRegistry::load(&[host]).is_ok());
    }
}
