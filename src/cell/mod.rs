//! Cell module: Statically typed list cells and prototype measurement.
//!
//! Cells are external to reconciliation: the diffing engine and adapter never
//! look at them. Hosts use this module to size items before laying out the
//! rows an adapter reports.
//!
//! - [`ListCell`]: attach / apply state / measure
//! - [`TableRowCell`] and [`GridCell`]: the two layout variants
//! - [`PrototypeRegistry`]: caller-owned prototypes keyed by reuse identifier

mod registry;
mod traits;
mod variants;

pub use registry::{CellError, ListItem, PrototypeRegistry};
pub use traits::{CellContent, CellKind, Constraints, ContainerId, ListCell, Size};
pub use variants::{GridCell, TableRowCell};
