//! Run Context
//!
//! Live resolution state of one documentation run. Each point is resolved
//! lazily on first query and memoized for the rest of the run, failures
//! included.
//!
//! ## Concurrency
//!
//! The resolution table sits behind one mutex and one condvar. The first
//! caller for a point marks it in progress and computes it with the lock
//! released; concurrent callers for the same point wait until the outcome is
//! published, so factories run at most once and nobody sees a partially
//! resolved point.
//!
//! ## Resolution cycles
//!
//! - Same call chain: every `ResolutionScope` carries the chain of points
//!   being resolved; asking for a point already on the chain is a cycle.
//! - Across threads: before waiting on a point owned by another thread, the
//!   wait-for graph (thread → awaited point → owning thread ...) is walked;
//!   reaching the current thread means waiting would deadlock.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Instant;

use tracing::{debug, warn};

use super::point::{Cardinality, ExtensionPoint};
use super::registry::PluginRegistry;
use super::resolver::{Candidate, resolve_order};
use crate::config::RunSettings;
use crate::types::{ExtensionId, PluginError, PointId, Result, RunId};

/// Memoized outcome of one point
struct ResolvedPoint {
    ids: Vec<ExtensionId>,
    /// `Box<Arc<T>>` per extension, in resolved order
    values: Vec<Box<dyn Any + Send + Sync>>,
}

enum Slot {
    InProgress(ThreadId),
    Resolved(Arc<ResolvedPoint>),
    Failed(PluginError),
}

#[derive(Default)]
struct ResolutionTable {
    slots: HashMap<PointId, Slot>,
    /// Point each blocked thread is waiting for
    waiting: HashMap<ThreadId, PointId>,
}

impl ResolutionTable {
    /// Points along the wait-for chain starting at `owner`, if it leads back to `me`
    fn wait_chain(&self, me: ThreadId, owner: ThreadId) -> Option<Vec<PointId>> {
        let mut chain = Vec::new();
        let mut current = owner;

        for _ in 0..=self.waiting.len() {
            if current == me {
                return Some(chain);
            }
            let awaited = self.waiting.get(&current)?;
            chain.push(awaited.clone());
            match self.slots.get(awaited) {
                Some(Slot::InProgress(next)) => current = *next,
                _ => return None,
            }
        }

        None
    }
}

/// Resolution state of one documentation run
pub struct RunContext {
    registry: Arc<PluginRegistry>,
    settings: RunSettings,
    run_id: RunId,
    table: Mutex<ResolutionTable>,
    settled: Condvar,
}

impl RunContext {
    pub fn new(registry: Arc<PluginRegistry>, settings: RunSettings) -> Self {
        Self {
            registry,
            settings,
            run_id: RunId::generate(),
            table: Mutex::new(ResolutionTable::default()),
            settled: Condvar::new(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// The one resolved extension of a `Single` point
    pub fn single<T>(&self, point: &ExtensionPoint<T>) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.root_scope().single(point)
    }

    /// The ordered extensions of a `Multi` point
    pub fn multi<T>(&self, point: &ExtensionPoint<T>) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.root_scope().multi(point)
    }

    /// Resolve a point without knowing its capability type; returns the ordered identities
    pub fn resolved_ids(&self, point: &PointId) -> Result<Vec<ExtensionId>> {
        self.root_scope().resolved_ids(point)
    }

    fn root_scope(&self) -> ResolutionScope<'_> {
        ResolutionScope {
            ctx: self,
            chain: Vec::new(),
            cycle: OnceLock::new(),
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, ResolutionTable> {
        self.table.lock().unwrap_or_else(|poisoned| {
            warn!("Resolution table mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn resolve_point(
        &self,
        point: &PointId,
        caller: &ResolutionScope<'_>,
    ) -> std::result::Result<Arc<ResolvedPoint>, PluginError> {
        if !self.registry.contains_point(point) {
            return Err(PluginError::UnresolvedPoint {
                point: point.to_string(),
                referenced_by: caller.chain.last().map(ToString::to_string),
            });
        }

        if let Some(start) = caller.chain.iter().position(|p| p == point) {
            return Err(resolution_cycle(&caller.chain[start..], &[point.clone()]));
        }

        let me = thread::current().id();
        let mut table = self.lock_table();

        loop {
            match table.slots.get(point) {
                Some(Slot::Resolved(resolved)) => return Ok(Arc::clone(resolved)),
                Some(Slot::Failed(err)) => return Err(err.clone()),
                Some(Slot::InProgress(owner)) if *owner == me => {
                    return Err(resolution_cycle(&caller.chain, &[point.clone()]));
                }
                Some(Slot::InProgress(owner)) => {
                    let owner = *owner;
                    if let Some(waits) = table.wait_chain(me, owner) {
                        let mut tail = vec![point.clone()];
                        tail.extend(waits);
                        return Err(resolution_cycle(&caller.chain, &tail));
                    }
                    table.waiting.insert(me, point.clone());
                    table = self
                        .settled
                        .wait(table)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    table.waiting.remove(&me);
                }
                None => {
                    table.slots.insert(point.clone(), Slot::InProgress(me));
                    break;
                }
            }
        }
        drop(table);

        let mut in_flight = InFlight {
            ctx: self,
            point,
            published: false,
        };
        let scope = caller.child(point.clone());
        let outcome = self.compute(point, &scope).map(Arc::new);
        in_flight.publish(match &outcome {
            Ok(resolved) => Slot::Resolved(Arc::clone(resolved)),
            Err(err) => Slot::Failed(err.clone()),
        });
        outcome
    }

    /// Evaluate conditions, order, then build the selected extensions
    fn compute(
        &self,
        point: &PointId,
        scope: &ResolutionScope<'_>,
    ) -> std::result::Result<ResolvedPoint, PluginError> {
        let started = Instant::now();
        let entry = self
            .registry
            .entry(point)
            .ok_or_else(|| PluginError::UnresolvedPoint {
                point: point.to_string(),
                referenced_by: None,
            })?;

        let mut active = Vec::with_capacity(entry.extensions.len());
        for extension in &entry.extensions {
            active.push(extension.is_active(scope));
            if let Some(err) = scope.cycle() {
                return Err(err);
            }
        }

        let candidates: Vec<Candidate<'_>> = entry
            .extensions
            .iter()
            .zip(&active)
            .map(|(extension, &active)| Candidate {
                id: &extension.id,
                fallback: extension.fallback,
                active,
                before: &extension.before,
                after: &extension.after,
            })
            .collect();
        let order = resolve_order(point, entry.declaration.cardinality, &candidates)?;

        let mut resolved = ResolvedPoint {
            ids: Vec::with_capacity(order.len()),
            values: Vec::with_capacity(order.len()),
        };
        for index in order {
            let extension = &entry.extensions[index];
            let value = extension
                .provider
                .provide(scope)
                .map_err(|err| err.into_plugin_error(&extension.id.to_string()))?;
            if let Some(err) = scope.cycle() {
                return Err(err);
            }
            resolved.ids.push(extension.id.clone());
            resolved.values.push(value);
        }

        debug!(
            "[{}] Resolved {} -> [{}] in {:?}",
            self.run_id,
            point,
            resolved
                .ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            started.elapsed()
        );

        Ok(resolved)
    }
}

fn resolution_cycle(head: &[PointId], tail: &[PointId]) -> PluginError {
    PluginError::ResolutionCycle {
        chain: head.iter().chain(tail).map(ToString::to_string).collect(),
    }
}

/// Publishes the outcome of an in-progress point; a panicking factory publishes an abort
struct InFlight<'a> {
    ctx: &'a RunContext,
    point: &'a PointId,
    published: bool,
}

impl InFlight<'_> {
    fn publish(&mut self, slot: Slot) {
        let mut table = self.ctx.lock_table();
        table.slots.insert(self.point.clone(), slot);
        self.published = true;
        drop(table);
        self.ctx.settled.notify_all();
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.published {
            warn!("Resolution of {} aborted", self.point);
            self.publish(Slot::Failed(PluginError::ResolutionAborted {
                point: self.point.to_string(),
            }));
        }
    }
}

// =============================================================================
// Resolution Scope
// =============================================================================

/// View of the run handed to factories and conditions.
///
/// Resolving through the scope records the dependency, so a point that ends
/// up depending on itself fails with `ResolutionCycle`, even when the
/// factory or condition swallows the error it was given.
pub struct ResolutionScope<'a> {
    ctx: &'a RunContext,
    chain: Vec<PointId>,
    cycle: OnceLock<PluginError>,
}

impl<'a> ResolutionScope<'a> {
    pub fn settings(&self) -> &'a RunSettings {
        &self.ctx.settings
    }

    pub fn run_id(&self) -> &'a RunId {
        &self.ctx.run_id
    }

    /// Points currently being resolved on this call chain, outermost first
    pub fn chain(&self) -> &[PointId] {
        &self.chain
    }

    pub fn single<T>(&self, point: &ExtensionPoint<T>) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.check_handle(point, Cardinality::Single)?;
        let resolved = self.resolve(point.id())?;
        let value = resolved
            .values
            .first()
            .ok_or_else(|| PluginError::NoActiveExtension {
                point: point.id().to_string(),
                inactive: Vec::new(),
            })?;
        Ok(downcast::<T>(point, &**value)?)
    }

    pub fn multi<T>(&self, point: &ExtensionPoint<T>) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.check_handle(point, Cardinality::Multi)?;
        let resolved = self.resolve(point.id())?;
        let values = resolved
            .values
            .iter()
            .map(|value| downcast::<T>(point, &**value))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    pub fn resolved_ids(&self, point: &PointId) -> Result<Vec<ExtensionId>> {
        Ok(self.resolve(point)?.ids.clone())
    }

    fn resolve(&self, point: &PointId) -> std::result::Result<Arc<ResolvedPoint>, PluginError> {
        let result = self.ctx.resolve_point(point, self);
        if let Err(err) = &result
            && err.is_resolution_cycle()
        {
            let _ = self.cycle.set(err.clone());
        }
        result
    }

    fn child(&self, point: PointId) -> ResolutionScope<'a> {
        let mut chain = self.chain.clone();
        chain.push(point);
        ResolutionScope {
            ctx: self.ctx,
            chain,
            cycle: OnceLock::new(),
        }
    }

    fn cycle(&self) -> Option<PluginError> {
        self.cycle.get().cloned()
    }

    fn check_handle<T>(
        &self,
        point: &ExtensionPoint<T>,
        expected: Cardinality,
    ) -> std::result::Result<(), PluginError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let entry = self
            .ctx
            .registry
            .entry(point.id())
            .ok_or_else(|| PluginError::UnresolvedPoint {
                point: point.id().to_string(),
                referenced_by: self.chain.last().map(ToString::to_string),
            })?;
        let declared = &entry.declaration;

        if declared.capability != point.capability() || declared.cardinality != expected {
            return Err(PluginError::PointTypeMismatch {
                point: point.id().to_string(),
                expected: format!("{} {}", declared.cardinality, declared.capability.name()),
                found: format!("{} {}", expected, point.capability().name()),
            });
        }
        Ok(())
    }
}

fn downcast<T>(
    point: &ExtensionPoint<T>,
    value: &(dyn Any + Send + Sync),
) -> std::result::Result<Arc<T>, PluginError>
where
    T: ?Sized + Send + Sync + 'static,
{
    value
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| PluginError::PointTypeMismatch {
            point: point.id().to_string(),
            expected: point.capability().name().to_string(),
            found: "a value of another type".to_string(),
        })
}
