//! # bufferdiff
//!
//! Identity-keyed diffing and update buffering for list and grid views.
//!
//! A host view displays an ordered collection. When the application produces
//! a new collection, bufferdiff computes a minimal edit script (inserts,
//! deletes, moves, content updates) and applies it to the displayed
//! collection and the view in one atomic batch, so that the view's item count
//! always agrees with the data source.
//!
//! ## Core Concepts
//!
//! - **Diff engine**: Pure function from (old, new) to an ordered edit script
//! - **Buffer**: Owns the displayed collection, queues updates in request order
//! - **Async diffs**: Worker threads compute scripts off the UI thread
//! - **Adapter**: Routes scripts into one section of a host view
//!
//! ## Example
//!
//! ```rust
//! use bufferdiff::{Adapter, MemoryView};
//!
//! let mut adapter = Adapter::new(vec!["a", "b", "c"], MemoryView::new(), 0).unwrap();
//! adapter.update(Some(vec!["c", "a", "d"]), true, None).unwrap();
//!
//! assert_eq!(adapter.view().unwrap().items(0), ["c", "a", "d"]);
//! assert_eq!(adapter.count_displayed(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod adapter;
pub mod buffer;
pub mod cell;
pub mod diff;

// Re-exports for convenience
pub use actor::Ticket;
pub use adapter::{Adapter, AdapterError, AdapterState, IndexPath, ListView, MemoryView, SectionBatch, SectionEdit};
pub use buffer::{AppliedUpdate, Buffer, BufferConfig, BufferError, Completion, ScriptSink, UpdateHandle};
pub use cell::{CellError, Constraints, GridCell, ListCell, ListItem, PrototypeRegistry, Size, TableRowCell};
pub use diff::{diff, DiffError, Diffable, Edit, EditKinds, EditScript, Keyed};
