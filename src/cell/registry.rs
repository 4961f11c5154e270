//! Prototype registry: Caller-owned prototype cells for measuring items.
//!
//! A host registers one prototype cell per reuse identifier. To measure an
//! item, the registry applies the item's state to the matching prototype and
//! asks it for its size. A prototype registered with
//! [`register_with`](PrototypeRegistry::register_with) also runs a configure
//! hook after each state is applied, the same one the host runs on real cells.
//! The registry is an ordinary value owned by the screen that uses it; its
//! state type is fixed at construction, so a prototype expecting another state
//! type cannot be registered at all.

use super::traits::{CellKind, Constraints, ContainerId, ListCell, Size};
use crate::diff::Diffable;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;
use tracing::trace;

/// Errors reported by a [`PrototypeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// No prototype is registered for the item's reuse identifier.
    #[error("no prototype cell registered for reuse identifier `{0}`")]
    UnregisteredPrototype(String),
}

/// An item displayed by a list cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem<K, S> {
    /// Identity key.
    pub key: K,
    /// Which prototype displays this item.
    pub reuse_identifier: String,
    /// State applied to the cell.
    pub state: S,
    /// Container the item is displayed in, if known.
    pub container: Option<ContainerId>,
}

impl<K, S> ListItem<K, S> {
    /// Create a new item.
    pub fn new(key: K, reuse_identifier: impl Into<String>, state: S) -> Self {
        Self {
            key,
            reuse_identifier: reuse_identifier.into(),
            state,
            container: None,
        }
    }

    /// Set the container the item is displayed in.
    #[must_use]
    pub const fn with_container(mut self, container: ContainerId) -> Self {
        self.container = Some(container);
        self
    }
}

impl<K, S> Diffable for ListItem<K, S>
where
    K: Eq + Hash + Clone,
    S: Clone + PartialEq,
{
    type Key = K;

    #[inline]
    fn diff_key(&self) -> K {
        self.key.clone()
    }

    fn content_eq(&self, other: &Self) -> bool {
        self.reuse_identifier == other.reuse_identifier && self.state == other.state
    }
}

/// Prototype cells keyed by reuse identifier.
pub struct PrototypeRegistry<S> {
    prototypes: HashMap<String, Box<dyn ListCell<State = S>>>,
}

impl<S> Default for PrototypeRegistry<S> {
    fn default() -> Self {
        Self {
            prototypes: HashMap::new(),
        }
    }
}

impl<S> PrototypeRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `cell` as the prototype for `reuse_identifier`.
    ///
    /// Returns the prototype it replaces, if any.
    pub fn register<C>(
        &mut self,
        reuse_identifier: impl Into<String>,
        cell: C,
    ) -> Option<Box<dyn ListCell<State = S>>>
    where
        C: ListCell<State = S> + 'static,
    {
        let reuse_identifier = reuse_identifier.into();
        trace!(%reuse_identifier, kind = ?cell.kind(), "registered prototype cell");
        self.prototypes.insert(reuse_identifier, Box::new(cell))
    }

    /// Register `cell` as the prototype for `reuse_identifier`, running
    /// `configure` on it after every applied state.
    ///
    /// Returns the prototype it replaces, if any.
    pub fn register_with<C, F>(
        &mut self,
        reuse_identifier: impl Into<String>,
        cell: C,
        configure: F,
    ) -> Option<Box<dyn ListCell<State = S>>>
    where
        C: ListCell<State = S> + 'static,
        F: Fn(&mut C, &S) + 'static,
    {
        self.register(reuse_identifier, Configured { cell, configure })
    }

    /// Whether a prototype is registered for `reuse_identifier`.
    pub fn is_registered(&self, reuse_identifier: &str) -> bool {
        self.prototypes.contains_key(reuse_identifier)
    }

    /// Number of registered prototypes.
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Whether no prototype is registered.
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Measure `item` with its prototype.
    ///
    /// # Errors
    ///
    /// Returns [`CellError::UnregisteredPrototype`] if no prototype matches the
    /// item's reuse identifier.
    pub fn measure<K>(&mut self, item: &ListItem<K, S>, constraints: Constraints) -> Result<Size, CellError> {
        let cell = self
            .prototypes
            .get_mut(&item.reuse_identifier)
            .ok_or_else(|| CellError::UnregisteredPrototype(item.reuse_identifier.clone()))?;

        if let Some(container) = item.container {
            cell.attach(container);
        }
        cell.apply_state(&item.state);
        Ok(cell.measure(constraints))
    }

    /// Measure every item of `items`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first item without a registered prototype.
    pub fn measure_all<K>(
        &mut self,
        items: &[ListItem<K, S>],
        constraints: Constraints,
    ) -> Result<Vec<Size>, CellError> {
        items
            .iter()
            .map(|item| self.measure(item, constraints))
            .collect()
    }
}

/// A prototype followed by its configure hook.
struct Configured<C, F> {
    cell: C,
    configure: F,
}

impl<C, F> ListCell for Configured<C, F>
where
    C: ListCell,
    F: Fn(&mut C, &C::State),
{
    type State = C::State;

    fn attach(&mut self, container: ContainerId) -> bool {
        self.cell.attach(container)
    }

    fn container(&self) -> Option<ContainerId> {
        self.cell.container()
    }

    fn apply_state(&mut self, state: &C::State) {
        self.cell.apply_state(state);
        (self.configure)(&mut self.cell, state);
    }

    fn measure(&self, constraints: Constraints) -> Size {
        self.cell.measure(constraints)
    }

    fn kind(&self) -> CellKind {
        self.cell.kind()
    }
}

impl<S> std::fmt::Debug for PrototypeRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut identifiers: Vec<_> = self.prototypes.keys().collect();
        identifiers.sort();
        f.debug_struct("PrototypeRegistry")
            .field("prototypes", &identifiers)
            .finish()
    }
}
