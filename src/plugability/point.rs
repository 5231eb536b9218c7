//! Extension points
//!
//! A point is a typed slot: `ExtensionPoint<dyn Renderer>` can only be filled
//! with `Arc<dyn Renderer>` values and only be queried for them. The handle
//! itself is plain data, so any plugin can rebuild the handle of another
//! plugin's point from its identity.

use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::types::PointId;

/// How many extensions a point resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Exactly one resolved extension
    Single,
    /// Ordered sequence, possibly empty
    Multi,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Single => write!(f, "single"),
            Cardinality::Multi => write!(f, "multi"),
        }
    }
}

/// Typed handle to an extension point
pub struct ExtensionPoint<T: ?Sized> {
    id: PointId,
    cardinality: Cardinality,
    _capability: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ExtensionPoint<T> {
    pub fn new(plugin: &str, name: &str, cardinality: Cardinality) -> Self {
        Self {
            id: PointId::new(plugin, name),
            cardinality,
            _capability: PhantomData,
        }
    }

    pub fn single(plugin: &str, name: &str) -> Self {
        Self::new(plugin, name, Cardinality::Single)
    }

    pub fn multi(plugin: &str, name: &str) -> Self {
        Self::new(plugin, name, Cardinality::Multi)
    }

    pub fn id(&self) -> &PointId {
        &self.id
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub(crate) fn capability(&self) -> Capability {
        Capability::of::<T>()
    }
}

impl<T: ?Sized> Clone for ExtensionPoint<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            cardinality: self.cardinality,
            _capability: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for ExtensionPoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionPoint")
            .field("id", &self.id)
            .field("cardinality", &self.cardinality)
            .field("capability", &type_name::<T>())
            .finish()
    }
}

/// Runtime witness of a point's capability type
#[derive(Debug, Clone, Copy)]
pub(crate) struct Capability {
    type_id: TypeId,
    type_name: &'static str,
}

impl Capability {
    pub(crate) fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Capability {}
