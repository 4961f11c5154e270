//! Edit Script: The ordered list of operations produced by the diffing engine.
//!
//! Indices follow the batch-update contract used by table and grid views:
//!
//! ```text
//! Delete(i)      i is a pre-edit index
//! Update(i, x)   i is a pre-edit index
//! Move(f, t)     f is a pre-edit index, t is a post-edit index
//! Insert(i, x)   i is a post-edit index
//! ```
//!
//! [`EditScript::apply_to`] implements these semantics on a `Vec`.

use bitflags::bitflags;

bitflags! {
    /// Summary of which operation kinds a script contains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EditKinds: u8 {
        /// At least one insertion.
        const INSERT = 0b0001;
        /// At least one deletion.
        const DELETE = 0b0010;
        /// At least one move.
        const MOVE   = 0b0100;
        /// At least one in-place update.
        const UPDATE = 0b1000;
        /// Insertions or deletions: the element count may change.
        const STRUCTURE = Self::INSERT.bits() | Self::DELETE.bits();
    }
}

/// A single reconciliation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    /// Insert `item` so that it ends up at post-edit `index`.
    Insert {
        /// Post-edit index.
        index: usize,
        /// The inserted item.
        item: T,
    },
    /// Remove the item at pre-edit `index`.
    Delete {
        /// Pre-edit index.
        index: usize,
    },
    /// Move the item at pre-edit `from` to post-edit `to`.
    Move {
        /// Pre-edit index.
        from: usize,
        /// Post-edit index.
        to: usize,
    },
    /// Replace the content of the item at pre-edit `index`.
    Update {
        /// Pre-edit index.
        index: usize,
        /// The new content for that row.
        item: T,
    },
}

impl<T> Edit<T> {
    /// The kind of this operation.
    pub const fn kind(&self) -> EditKinds {
        match self {
            Self::Insert { .. } => EditKinds::INSERT,
            Self::Delete { .. } => EditKinds::DELETE,
            Self::Move { .. } => EditKinds::MOVE,
            Self::Update { .. } => EditKinds::UPDATE,
        }
    }
}

/// Per-kind operation counts of a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCounts {
    /// Number of insertions.
    pub inserts: usize,
    /// Number of deletions.
    pub deletes: usize,
    /// Number of moves.
    pub moves: usize,
    /// Number of updates.
    pub updates: usize,
}

/// Ordered record of operations transforming one collection into another.
///
/// Operations are stored as deletes, moves, inserts, then updates, each group
/// in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditScript<T> {
    edits: Vec<Edit<T>>,
    old_len: usize,
    new_len: usize,
}

impl<T> EditScript<T> {
    /// An empty script over a collection of `len` items.
    pub const fn unchanged(len: usize) -> Self {
        Self {
            edits: Vec::new(),
            old_len: len,
            new_len: len,
        }
    }

    pub(crate) const fn from_parts(edits: Vec<Edit<T>>, old_len: usize, new_len: usize) -> Self {
        Self {
            edits,
            old_len,
            new_len,
        }
    }

    /// The operations, in script order.
    #[inline]
    pub fn edits(&self) -> &[Edit<T>] {
        &self.edits
    }

    /// Number of operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Whether the script changes nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Length of the collection the script was computed from.
    #[inline]
    pub const fn old_len(&self) -> usize {
        self.old_len
    }

    /// Length of the collection the script produces.
    #[inline]
    pub const fn new_len(&self) -> usize {
        self.new_len
    }

    /// Which operation kinds appear in the script.
    pub fn kinds(&self) -> EditKinds {
        self.edits
            .iter()
            .fold(EditKinds::empty(), |kinds, edit| kinds | edit.kind())
    }

    /// Count operations by kind.
    pub fn counts(&self) -> EditCounts {
        let mut counts = EditCounts::default();
        for edit in &self.edits {
            match edit {
                Edit::Insert { .. } => counts.inserts += 1,
                Edit::Delete { .. } => counts.deletes += 1,
                Edit::Move { .. } => counts.moves += 1,
                Edit::Update { .. } => counts.updates += 1,
            }
        }
        counts
    }

    /// Consume the script, returning its operations.
    pub fn into_edits(self) -> Vec<Edit<T>> {
        self.edits
    }
}

impl<T: Clone> EditScript<T> {
    /// Apply the script to `target` using batch-update splice semantics.
    ///
    /// `target` must hold the collection the script was computed from.
    ///
    /// # Panics
    ///
    /// Panics if `target.len()` differs from [`old_len`](Self::old_len) or the
    /// operations do not describe a valid splice.
    pub fn apply_to(&self, target: &mut Vec<T>) {
        assert_eq!(
            target.len(),
            self.old_len,
            "edit script computed for {} items applied to {}",
            self.old_len,
            target.len()
        );

        let mut removed = vec![false; target.len()];
        // (post-edit index, pre-edit source index or inserted item)
        let mut placements: Vec<(usize, Placement<'_, T>)> = Vec::new();

        for edit in &self.edits {
            match edit {
                Edit::Update { index, item } => target[*index] = item.clone(),
                Edit::Delete { index } => removed[*index] = true,
                Edit::Move { from, to } => {
                    removed[*from] = true;
                    placements.push((*to, Placement::Moved(*from)));
                }
                Edit::Insert { index, item } => placements.push((*index, Placement::Inserted(item))),
            }
        }

        let mut moved: Vec<Option<T>> = vec![None; target.len()];
        let mut kept = Vec::with_capacity(target.len());
        for (index, item) in target.drain(..).enumerate() {
            if removed[index] {
                moved[index] = Some(item);
            } else {
                kept.push(item);
            }
        }

        // Merge placed items into the survivors: slot `i` of the result is
        // either the placement targeting `i` or the next surviving item.
        placements.sort_by_key(|(to, _)| *to);
        let mut placements = placements.into_iter().peekable();
        let mut kept = kept.into_iter();
        let mut result = Vec::with_capacity(self.new_len);
        for slot in 0..self.new_len {
            let item = match placements.next_if(|(to, _)| *to == slot) {
                Some((_, Placement::Moved(from))) => moved[from]
                    .take()
                    .unwrap_or_else(|| panic!("item {from} moved twice")),
                Some((_, Placement::Inserted(item))) => item.clone(),
                None => kept
                    .next()
                    .unwrap_or_else(|| panic!("edit script leaves slot {slot} empty")),
            };
            result.push(item);
        }
        assert!(
            placements.next().is_none() && kept.next().is_none(),
            "edit script does not produce {} items",
            self.new_len
        );

        *target = result;
    }
}

enum Placement<'a, T> {
    Moved(usize),
    Inserted(&'a T),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_insert_delete() {
        let script = EditScript::from_parts(
            vec![
                Edit::Delete { index: 0 },
                Edit::Insert { index: 2, item: 'd' },
            ],
            3,
            3,
        );
        let mut items = vec!['a', 'b', 'c'];
        script.apply_to(&mut items);
        assert_eq!(items, vec!['b', 'c', 'd']);
    }

    #[test]
    fn test_apply_move_uses_mixed_indices() {
        // a b c d -> d a c b  (a, c stationary)
        let script = EditScript::from_parts(
            vec![Edit::Move { from: 1, to: 3 }, Edit::Move { from: 3, to: 0 }],
            4,
            4,
        );
        let mut items = vec!['a', 'b', 'c', 'd'];
        script.apply_to(&mut items);
        assert_eq!(items, vec!['d', 'a', 'c', 'b']);
    }

    #[test]
    fn test_apply_update_before_move() {
        let script = EditScript::from_parts(
            vec![
                Edit::Move { from: 0, to: 1 },
                Edit::Update { index: 0, item: "A" },
            ],
            2,
            2,
        );
        let mut items = vec!["a", "b"];
        script.apply_to(&mut items);
        assert_eq!(items, vec!["b", "A"]);
    }

    #[test]
    fn test_kinds_and_counts() {
        let script = EditScript::from_parts(
            vec![
                Edit::Delete { index: 0 },
                Edit::Move { from: 1, to: 0 },
                Edit::Update { index: 1, item: 9 },
            ],
            2,
            1,
        );
        assert_eq!(script.kinds(), EditKinds::DELETE | EditKinds::MOVE | EditKinds::UPDATE);
        assert!(!script.kinds().contains(EditKinds::INSERT));
        let counts = script.counts();
        assert_eq!(counts.deletes, 1);
        assert_eq!(counts.moves, 1);
        assert_eq!(counts.updates, 1);
        assert_eq!(counts.inserts, 0);
    }

    #[test]
    fn test_unchanged_is_empty() {
        let script: EditScript<u8> = EditScript::unchanged(5);
        assert!(script.is_empty());
        assert_eq!(script.kinds(), EditKinds::empty());
        let mut items = vec![1, 2, 3, 4, 5];
        script.apply_to(&mut items);
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    #[should_panic]
    fn test_apply_wrong_length() {
        let script: EditScript<u8> = EditScript::unchanged(2);
        script.apply_to(&mut vec![1]);
    }
}
