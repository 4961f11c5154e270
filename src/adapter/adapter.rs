//! Adapter: Drives one section of a host view from a [`Buffer`].
//!
//! The adapter is a small state machine:
//!
//! ```text
//!        update()                 last pending update applied
//! Idle ───────────▶ Updating ─────────────────────────────────▶ Idle
//! ```
//!
//! Every applied update reaches the view as exactly one [`SectionBatch`].
//! Before handing it over, the adapter checks that the view still shows the
//! number of items the script was computed from.

use super::view::{ListView, SectionBatch};
use crate::actor::Ticket;
use crate::buffer::{Buffer, BufferError, Completion, ScriptSink, UpdateHandle};
use crate::diff::{Diffable, EditScript};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, trace};

/// Errors reported by an [`Adapter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// An update was requested with no view attached.
    #[error("update requested for section {section} with no view attached")]
    UnconfiguredView {
        /// The adapter's section.
        section: usize,
    },

    /// The view's item count diverged from the buffer's.
    #[error("section {section} shows {actual} items but the buffer expected {expected}")]
    InconsistentState {
        /// The adapter's section.
        section: usize,
        /// Count the update was computed from.
        expected: usize,
        /// Count reported by the view.
        actual: usize,
    },

    /// Error from the underlying buffer.
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Whether an adapter has updates that are not yet on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Every requested update has been applied.
    Idle,
    /// At least one update is being computed or waiting to be applied.
    Updating,
}

/// Forwards scripts to the host view, routed to one section.
struct ViewSink<'a, V> {
    view: &'a mut V,
    section: usize,
}

impl<T, V: ListView<T>> ScriptSink<T> for ViewSink<'_, V> {
    fn apply_script(&mut self, ticket: Ticket, script: &EditScript<T>) {
        let actual = self.view.item_count(self.section);
        if actual != script.old_len() {
            let err = AdapterError::InconsistentState {
                section: self.section,
                expected: script.old_len(),
                actual,
            };
            error!(ticket, %err, "refusing to apply batch");
            panic!("{err}");
        }

        trace!(
            ticket,
            section = self.section,
            edits = script.len(),
            "performing batch"
        );
        self.view.perform_batch(&SectionBatch::new(self.section, ticket, script));
    }
}

/// Connects a [`Buffer`] to one section of a host view.
pub struct Adapter<T, V> {
    /// The data buffer.
    buffer: Buffer<T>,
    /// The host view (may be detached).
    view: Option<V>,
    /// Section driven by this adapter.
    section_index: usize,
}

impl<T, V> Adapter<T, V>
where
    T: Diffable,
    V: ListView<T>,
{
    /// Create an adapter around an existing buffer.
    ///
    /// The view's section is reloaded with the buffer's displayed collection.
    pub fn with_buffer(buffer: Buffer<T>, mut view: V, section_index: usize) -> Self {
        view.reload_section(section_index, buffer.displayed());
        Self {
            buffer,
            view: Some(view),
            section_index,
        }
    }

    /// Create an adapter displaying `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Buffer`] if `initial` repeats an identity.
    pub fn new(initial: Vec<T>, view: V, section_index: usize) -> Result<Self, AdapterError> {
        let buffer = Buffer::with_elements(initial)?;
        Ok(Self::with_buffer(buffer, view, section_index))
    }

    /// The section this adapter drives.
    #[inline]
    pub const fn section_index(&self) -> usize {
        self.section_index
    }

    /// The attached view, if any.
    #[inline]
    pub const fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    /// Detach the view.
    ///
    /// Updates requested before detaching stay queued until a view is
    /// attached again.
    pub fn take_view(&mut self) -> Option<V> {
        self.view.take()
    }

    /// Attach `view`, reloading its section with the displayed collection.
    ///
    /// Returns the previously attached view.
    pub fn attach_view(&mut self, mut view: V) -> Option<V> {
        view.reload_section(self.section_index, self.buffer.displayed());
        self.view.replace(view)
    }

    /// The underlying buffer.
    #[inline]
    pub const fn buffer(&self) -> &Buffer<T> {
        &self.buffer
    }

    /// Current state.
    pub fn state(&self) -> AdapterState {
        if self.buffer.is_idle() {
            AdapterState::Idle
        } else {
            AdapterState::Updating
        }
    }

    /// Returns the displayed element at `index`.
    pub fn displayed_element_at(&self, index: usize) -> Result<&T, AdapterError> {
        Ok(self.buffer.displayed_element_at(index)?)
    }

    /// Number of displayed elements.
    #[inline]
    pub fn count_displayed(&self) -> usize {
        self.buffer.count_displayed()
    }
}

impl<T, V> Adapter<T, V>
where
    T: Diffable + Send + Sync + 'static,
    V: ListView<T>,
{
    /// Request a transition to `new_values`; see [`Buffer::update`].
    ///
    /// # Panics
    ///
    /// Panics with [`AdapterError::UnconfiguredView`] if no view is attached,
    /// and with [`AdapterError::InconsistentState`] if the view's item count
    /// does not match the buffer when a batch is applied.
    pub fn update(
        &mut self,
        new_values: Option<Vec<T>>,
        synchronous: bool,
        on_complete: Option<Completion<T>>,
    ) -> Result<UpdateHandle<T>, AdapterError> {
        let section = self.section_index;
        let Some(view) = self.view.as_mut() else {
            let err = AdapterError::UnconfiguredView { section };
            error!(%err, "adapter misconfigured");
            panic!("{err}");
        };

        let mut sink = ViewSink { view, section };
        Ok(self
            .buffer
            .update_into(new_values, synchronous, on_complete, &mut sink)?)
    }

    /// Apply every finished update whose turn has come, without blocking.
    ///
    /// Returns the number of updates applied. Nothing is applied while no
    /// view is attached.
    pub fn process_completed(&mut self) -> Result<usize, AdapterError> {
        let section = self.section_index;
        let Some(view) = self.view.as_mut() else {
            return Ok(0);
        };
        let mut sink = ViewSink { view, section };
        Ok(self.buffer.process_completed_into(&mut sink)?)
    }

    /// Block until every requested update has been applied, for at most
    /// `timeout`. Returns `true` once idle.
    ///
    /// Returns immediately while no view is attached.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<bool, AdapterError> {
        let section = self.section_index;
        let Some(view) = self.view.as_mut() else {
            return Ok(self.buffer.is_idle());
        };
        let mut sink = ViewSink { view, section };
        Ok(self.buffer.wait_idle_into(timeout, &mut sink)?)
    }
}

impl<T, V> std::fmt::Debug for Adapter<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("section_index", &self.section_index)
            .field("buffer", &self.buffer)
            .field("view_attached", &self.view.is_some())
            .finish()
    }
}
