//! Plugins and the declaration phase
//!
//! A plugin only describes itself: `declare` records points and extensions on
//! a `PluginDeclarer` as plain data. Nothing is validated or resolved until
//! the registry freezes, so a plugin may target points and extensions of
//! plugins loaded after it.

use super::extension::{ExtensionOptions, ExtensionRef, Provider, RegisteredExtension};
use super::point::{Capability, Cardinality, ExtensionPoint};
use crate::types::{ExtensionId, PointId, Result};

/// A named bundle of extension points and extensions
pub trait Plugin: Send + Sync {
    /// Unique plugin name; prefixes every point and extension identity it declares
    fn name(&self) -> &str;

    /// Record this plugin's points and extensions
    fn declare(&self, declarer: &mut PluginDeclarer) -> Result<()>;
}

/// Point as recorded during declaration
#[derive(Debug, Clone)]
pub(crate) struct PointDeclaration {
    pub id: PointId,
    pub cardinality: Cardinality,
    pub capability: Capability,
}

/// Declaration context handed to one plugin during load
pub struct PluginDeclarer {
    plugin: String,
    points: Vec<PointDeclaration>,
    extensions: Vec<RegisteredExtension>,
}

impl PluginDeclarer {
    pub(crate) fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            points: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Name of the plugin being declared
    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// Identity of an extension of this plugin, for `before`/`after` constraints
    pub fn id(&self, name: &str) -> ExtensionId {
        ExtensionId::new(self.plugin.as_str(), name)
    }

    /// Declare a new point owned by this plugin
    pub fn declare_point<T>(&mut self, name: &str, cardinality: Cardinality) -> ExtensionPoint<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let point = ExtensionPoint::new(&self.plugin, name, cardinality);
        self.declare(&point);
        point
    }

    /// Declare a point from a pre-built handle (e.g. `CoreExtensions::renderer()`)
    pub fn declare<T>(&mut self, point: &ExtensionPoint<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.points.push(PointDeclaration {
            id: point.id().clone(),
            cardinality: point.cardinality(),
            capability: point.capability(),
        });
    }

    /// Register an extension of `point`, which may belong to any plugin
    pub fn register_extension<T>(
        &mut self,
        point: &ExtensionPoint<T>,
        name: &str,
        provider: Provider<T>,
        options: ExtensionOptions,
    ) -> ExtensionRef
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let id = self.id(name);
        self.extensions
            .push(RegisteredExtension::new(id.clone(), point, provider, options));
        ExtensionRef {
            id,
            point: point.id().clone(),
        }
    }

    pub(crate) fn finish(self) -> (Vec<PointDeclaration>, Vec<RegisteredExtension>) {
        (self.points, self.extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;

    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_declarer_records_plain_data() {
        let mut declarer = PluginDeclarer::new("demo");
        let point = declarer.declare_point::<dyn Greeter>("greeters", Cardinality::Multi);
        let registered = declarer.register_extension(
            &point,
            "hello",
            Provider::instance(Arc::new(Hello) as Arc<dyn Greeter>),
            ExtensionOptions::new().before(ExtensionId::new("demo", "later")),
        );

        assert_eq!(registered.id, ExtensionId::new("demo", "hello"));
        assert_eq!(registered.point, PointId::new("demo", "greeters"));
        assert_eq!(declarer.plugin(), "demo");

        let (points, extensions) = declarer.finish();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].cardinality, Cardinality::Multi);
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].before, vec![ExtensionId::new("demo", "later")]);
    }
}
