//! Extensions
//!
//! An extension binds one behavior to one point. Ordering, fallback and
//! activation are plain fields on `ExtensionOptions` and are consumed by the
//! resolver uniformly.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::context::ResolutionScope;
use super::point::{Capability, ExtensionPoint};
use crate::types::{ExtensionId, PointId, Result};

/// Factory building an extension value from the live run
pub type Factory<T> = Arc<dyn Fn(&ResolutionScope<'_>) -> Result<Arc<T>> + Send + Sync>;

/// Activation predicate, evaluated once per run
pub type Condition = Arc<dyn Fn(&ResolutionScope<'_>) -> bool + Send + Sync>;

/// Where an extension's value comes from
pub enum Provider<T: ?Sized> {
    /// Ready-made value
    Instance(Arc<T>),
    /// Built lazily, may resolve other points
    Factory(Factory<T>),
}

impl<T: ?Sized + Send + Sync + 'static> Provider<T> {
    pub fn instance(value: Arc<T>) -> Self {
        Provider::Instance(value)
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&ResolutionScope<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Provider::Factory(Arc::new(f))
    }
}

/// Ordering, fallback and activation options of one extension
#[derive(Clone, Default)]
pub struct ExtensionOptions {
    /// Only used when no concrete extension is active at the point
    pub fallback: bool,
    /// Extensions this one must precede
    pub before: Vec<ExtensionId>,
    /// Extensions this one must follow
    pub after: Vec<ExtensionId>,
    /// Activation predicate; `None` means always active
    pub condition: Option<Condition>,
}

impl ExtensionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    pub fn before(mut self, id: ExtensionId) -> Self {
        self.before.push(id);
        self
    }

    pub fn after(mut self, id: ExtensionId) -> Self {
        self.after.push(id);
        self
    }

    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ResolutionScope<'_>) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }
}

impl fmt::Debug for ExtensionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionOptions")
            .field("fallback", &self.fallback)
            .field("before", &self.before)
            .field("after", &self.after)
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

/// Handle returned by registration, usable in other extensions' constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRef {
    pub id: ExtensionId,
    pub point: PointId,
}

// =============================================================================
// Type-erased storage
// =============================================================================

/// Provider with its capability type erased; values come back as `Box<Arc<T>>`
pub(crate) trait ErasedProvider: Send + Sync {
    fn provide(&self, scope: &ResolutionScope<'_>) -> Result<Box<dyn Any + Send + Sync>>;
}

impl<T: ?Sized + Send + Sync + 'static> ErasedProvider for Provider<T> {
    fn provide(&self, scope: &ResolutionScope<'_>) -> Result<Box<dyn Any + Send + Sync>> {
        let value: Arc<T> = match self {
            Provider::Instance(value) => Arc::clone(value),
            Provider::Factory(factory) => factory(scope)?,
        };
        Ok(Box::new(value))
    }
}

/// One extension as held by the registry
pub(crate) struct RegisteredExtension {
    pub id: ExtensionId,
    pub point: PointId,
    pub capability: Capability,
    pub fallback: bool,
    pub before: Vec<ExtensionId>,
    pub after: Vec<ExtensionId>,
    pub condition: Option<Condition>,
    pub provider: Box<dyn ErasedProvider>,
}

impl RegisteredExtension {
    pub(crate) fn new<T: ?Sized + Send + Sync + 'static>(
        id: ExtensionId,
        point: &ExtensionPoint<T>,
        provider: Provider<T>,
        options: ExtensionOptions,
    ) -> Self {
        Self {
            id,
            point: point.id().clone(),
            capability: point.capability(),
            fallback: options.fallback,
            before: options.before,
            after: options.after,
            condition: options.condition,
            provider: Box::new(provider),
        }
    }

    pub(crate) fn is_active(&self, scope: &ResolutionScope<'_>) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(scope))
    }
}

impl fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("id", &self.id)
            .field("point", &self.point)
            .field("fallback", &self.fallback)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builders() {
        let options = ExtensionOptions::fallback()
            .before(ExtensionId::new("base", "a"))
            .after(ExtensionId::new("base", "b"));
        assert!(options.fallback);
        assert_eq!(options.before, vec![ExtensionId::new("base", "a")]);
        assert_eq!(options.after, vec![ExtensionId::new("base", "b")]);
        assert!(options.condition.is_none());

        let conditional = ExtensionOptions::new().when(|_| false);
        assert!(!conditional.fallback);
        assert!(conditional.condition.is_some());
        assert!(format!("{:?}", conditional).contains("conditional: true"));
    }
}
