//! Adapter module: Connects a buffer to a section of a host list or grid view.
//!
//! - [`Adapter`]: Section-routed updates, sync/async, exactly one batch each
//! - [`ListView`]: What the host view must provide
//! - [`SectionBatch`] / [`SectionEdit`] / [`IndexPath`]: What the host receives
//! - [`MemoryView`]: In-memory host for headless use and tests

#[allow(clippy::module_inception)]
mod adapter;
mod view;

pub use adapter::{Adapter, AdapterError, AdapterState};
pub use view::{IndexPath, ListView, MemoryView, SectionBatch, SectionEdit};
