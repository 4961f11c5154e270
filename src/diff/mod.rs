//! Diff module: Identity-keyed reconciliation of ordered collections.
//!
//! This module contains:
//! - [`Diffable`]: Identity key + content equality for elements
//! - [`diff()`]: The pure diffing function
//! - [`EditScript`]: The resulting ordered list of [`Edit`]s

mod engine;
mod item;
mod script;

pub use engine::{diff, validate_identities, DiffError, Side};
pub use item::{Diffable, Keyed};
pub use script::{Edit, EditCounts, EditKinds, EditScript};
