//! Buffer module: The displayed collection and its ordered update queue.
//!
//! This module contains:
//! - [`Buffer`]: Owner of the displayed collection, sync/async updates
//! - [`BufferConfig`]: Worker configuration
//! - [`UpdateHandle`] / [`AppliedUpdate`]: Completion signalling
//! - [`ScriptSink`]: Hook receiving each script as it is applied

#[allow(clippy::module_inception)]
mod buffer;
mod update;

pub use buffer::{Buffer, BufferConfig, BufferError};
pub use update::{AppliedUpdate, Completion, ScriptSink, UpdateHandle};
