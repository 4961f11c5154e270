//! Message types for worker communication.
//!
//! These types define the protocol between a [`Buffer`](crate::Buffer) and
//! its diff workers.

use crate::diff::{DiffError, EditScript};
use std::sync::Arc;
use std::time::Duration;

/// Sequence number of an update request.
///
/// Tickets increase monotonically per buffer. The ticket of a request is also
/// the generation of the collection it targets; generation `0` is the
/// initial collection.
pub type Ticket = u64;

/// A diff to compute off the owner's thread.
#[derive(Debug, Clone)]
pub struct DiffJob<T> {
    /// The request this job belongs to.
    pub ticket: Ticket,
    /// Collection the script will be applied to.
    pub base: Arc<Vec<T>>,
    /// Generation of `base`.
    pub base_generation: u64,
    /// Collection the script must produce.
    pub target: Arc<Vec<T>>,
}

/// Commands sent to the worker threads.
#[derive(Debug)]
pub enum WorkerCommand<T> {
    /// Compute a diff.
    Diff(DiffJob<T>),

    /// Stop one worker thread.
    Shutdown,
}

/// Result of a [`DiffJob`], sent back to the owner.
#[derive(Debug)]
pub struct DiffOutcome<T> {
    /// The request this outcome belongs to.
    pub ticket: Ticket,
    /// Generation the script was computed against.
    pub base_generation: u64,
    /// Collection the script produces.
    pub target: Arc<Vec<T>>,
    /// The computed script.
    pub result: Result<EditScript<T>, DiffError>,
    /// Time spent computing the diff.
    pub elapsed: Duration,
}

impl<T> DiffOutcome<T> {
    /// Whether this outcome can be applied to a collection of the given
    /// generation.
    #[inline]
    pub fn applies_to(&self, generation: u64) -> bool {
        self.base_generation == generation && self.result.is_ok()
    }
}
