//! Update plumbing: How applied updates are reported back to callers.
//!
//! Every call to [`Buffer::update`](super::Buffer::update) returns an
//! [`UpdateHandle`] that resolves once the update's script has been applied.
//! An optional [`Completion`] closure runs on the owner's thread at the same
//! moment.

use crate::actor::Ticket;
use crate::diff::EditScript;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked on the owner's thread once an update has been applied.
pub type Completion<T> = Box<dyn FnOnce(&AppliedUpdate<T>)>;

/// Receives each edit script right before the buffer commits it.
///
/// The adapter uses this to forward scripts to the host view; a plain
/// buffer uses `()`.
pub trait ScriptSink<T> {
    /// Apply `script` to whatever mirrors the displayed collection.
    ///
    /// Called exactly once per update, in ticket order.
    fn apply_script(&mut self, ticket: Ticket, script: &EditScript<T>);
}

impl<T> ScriptSink<T> for () {
    #[inline]
    fn apply_script(&mut self, _ticket: Ticket, _script: &EditScript<T>) {}
}

/// Record of an update that has been applied.
#[derive(Debug)]
pub struct AppliedUpdate<T> {
    /// The update's ticket.
    pub ticket: Ticket,
    /// The script that was applied.
    pub script: Arc<EditScript<T>>,
    /// Number of displayed elements after the update.
    pub count: usize,
    /// Time spent computing the diff.
    pub elapsed: Duration,
}

impl<T> Clone for AppliedUpdate<T> {
    fn clone(&self) -> Self {
        Self {
            ticket: self.ticket,
            script: Arc::clone(&self.script),
            count: self.count,
            elapsed: self.elapsed,
        }
    }
}

/// Resolves with the [`AppliedUpdate`] of one request.
///
/// Updates are applied on the buffer owner's thread. Waiting on a handle from
/// that same thread only makes progress if the update has already been
/// applied; use [`Buffer::wait_idle`](super::Buffer::wait_idle) there instead.
#[derive(Debug)]
pub struct UpdateHandle<T> {
    ticket: Ticket,
    rx: Receiver<AppliedUpdate<T>>,
}

impl<T> UpdateHandle<T> {
    pub(crate) const fn new(ticket: Ticket, rx: Receiver<AppliedUpdate<T>>) -> Self {
        Self { ticket, rx }
    }

    /// The ticket assigned to this update.
    #[inline]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Returns the applied update if it is available.
    pub fn try_applied(&self) -> Option<AppliedUpdate<T>> {
        match self.rx.try_recv() {
            Ok(applied) => Some(applied),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the update is applied, for at most `timeout`.
    ///
    /// Returns `None` on timeout, or if the buffer was dropped before the
    /// update was applied.
    pub fn wait(&self, timeout: Duration) -> Option<AppliedUpdate<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(applied) => Some(applied),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
