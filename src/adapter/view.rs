//! Host view: The collaborator that displays a section and receives batches.
//!
//! The adapter never renders anything itself. Each applied update is handed
//! to the host as one [`SectionBatch`]: every operation already routed to the
//! adapter's section, plus the counts before and after, so the host can run a
//! single animated layout pass.

use crate::actor::Ticket;
use crate::diff::{Edit, EditScript};
use std::collections::BTreeMap;
use std::fmt;

/// Position of an item in a multi-section view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath {
    /// Section index.
    pub section: usize,
    /// Item index within the section.
    pub index: usize,
}

impl IndexPath {
    /// Create a new index path.
    #[inline]
    pub const fn new(section: usize, index: usize) -> Self {
        Self { section, index }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.index)
    }
}

/// A structural operation routed to a section.
///
/// Index conventions match [`Edit`]: deletes, updates and move sources use
/// pre-batch positions; inserts and move destinations use post-batch
/// positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionEdit<'a, T> {
    /// Insert `item` at `at`.
    Insert {
        /// Post-batch position.
        at: IndexPath,
        /// The new item.
        item: &'a T,
    },
    /// Delete the item at `at`.
    Delete {
        /// Pre-batch position.
        at: IndexPath,
    },
    /// Move an item.
    Move {
        /// Pre-batch position.
        from: IndexPath,
        /// Post-batch position.
        to: IndexPath,
    },
    /// Redisplay the item at `at` with new content.
    Update {
        /// Pre-batch position.
        at: IndexPath,
        /// The new content.
        item: &'a T,
    },
}

/// All operations of one applied update, for one section.
#[derive(Debug)]
pub struct SectionBatch<'a, T> {
    section: usize,
    ticket: Ticket,
    script: &'a EditScript<T>,
}

impl<'a, T> SectionBatch<'a, T> {
    /// Wrap `script` for `section`.
    pub const fn new(section: usize, ticket: Ticket, script: &'a EditScript<T>) -> Self {
        Self {
            section,
            ticket,
            script,
        }
    }

    /// The section every operation targets.
    #[inline]
    pub const fn section(&self) -> usize {
        self.section
    }

    /// Ticket of the update this batch belongs to.
    #[inline]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Items in the section before the batch.
    #[inline]
    pub const fn old_count(&self) -> usize {
        self.script.old_len()
    }

    /// Items in the section after the batch.
    #[inline]
    pub const fn new_count(&self) -> usize {
        self.script.new_len()
    }

    /// Whether the batch changes nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// The underlying script.
    #[inline]
    pub const fn script(&self) -> &'a EditScript<T> {
        self.script
    }

    /// The operations, routed to this section, in script order.
    pub fn edits(&self) -> impl Iterator<Item = SectionEdit<'a, T>> + 'a {
        let section = self.section;
        let script = self.script;
        script.edits().iter().map(move |edit| match edit {
            Edit::Insert { index, item } => SectionEdit::Insert {
                at: IndexPath::new(section, *index),
                item,
            },
            Edit::Delete { index } => SectionEdit::Delete {
                at: IndexPath::new(section, *index),
            },
            Edit::Move { from, to } => SectionEdit::Move {
                from: IndexPath::new(section, *from),
                to: IndexPath::new(section, *to),
            },
            Edit::Update { index, item } => SectionEdit::Update {
                at: IndexPath::new(section, *index),
                item,
            },
        })
    }
}

/// The host view an [`Adapter`](super::Adapter) drives.
///
/// Implementations must apply each batch as one atomic layout transaction.
pub trait ListView<T> {
    /// Number of items the view currently shows in `section`.
    fn item_count(&self, section: usize) -> usize;

    /// Apply one batch of structural operations.
    fn perform_batch(&mut self, batch: &SectionBatch<'_, T>);

    /// Discard whatever `section` shows and display `items` instead.
    ///
    /// Called when a view is first attached to an adapter. Views that pull
    /// their content from the adapter can ignore it.
    fn reload_section(&mut self, section: usize, items: &[T]) {
        let _ = (section, items);
    }
}

/// A host view that keeps every section in memory.
///
/// Useful for headless hosts and for checking that batches reproduce the
/// buffer's collection.
#[derive(Debug, Clone)]
pub struct MemoryView<T> {
    sections: BTreeMap<usize, Vec<T>>,
    batches: usize,
}

impl<T> Default for MemoryView<T> {
    fn default() -> Self {
        Self {
            sections: BTreeMap::new(),
            batches: 0,
        }
    }
}

impl<T: Clone> MemoryView<T> {
    /// Create a view with no sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items shown in `section` (empty if the section was never touched).
    pub fn items(&self, section: usize) -> &[T] {
        self.sections.get(&section).map_or(&[][..], Vec::as_slice)
    }

    /// Number of batches performed so far, across all sections.
    #[inline]
    pub const fn batches_performed(&self) -> usize {
        self.batches
    }

    /// Number of sections that have been touched.
    #[inline]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

impl<T: Clone> ListView<T> for MemoryView<T> {
    fn item_count(&self, section: usize) -> usize {
        self.sections.get(&section).map_or(0, Vec::len)
    }

    fn perform_batch(&mut self, batch: &SectionBatch<'_, T>) {
        let items = self.sections.entry(batch.section()).or_default();
        batch.script().apply_to(items);
        self.batches += 1;
    }

    fn reload_section(&mut self, section: usize, items: &[T]) {
        self.sections.insert(section, items.to_vec());
    }
}
