//! Diffing Engine: Compute the edit script between two ordered collections.
//!
//! The algorithm is identity-keyed:
//! 1. Index both collections by key (duplicates are rejected)
//! 2. Items only in `old` are deleted, items only in `new` are inserted
//! 3. Shared items whose content differs are updated in place
//! 4. Shared items outside the longest order-preserving run are moved
//!
//! Everything is O(n log n): hashing for matching, patience sorting for the
//! stationary run.

use super::item::Diffable;
use super::script::{Edit, EditScript};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Which input collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The currently displayed collection.
    Old,
    /// The collection being transitioned to.
    New,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => f.write_str("old"),
            Self::New => f.write_str("new"),
        }
    }
}

/// Input rejected by the diffing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiffError {
    /// Two items of one collection share an identity key.
    #[error("duplicate identity in {side} collection: index {index} repeats index {first}")]
    DuplicateIdentity {
        /// Collection containing the duplicate.
        side: Side,
        /// Index of the first occurrence.
        first: usize,
        /// Index of the repeated occurrence.
        index: usize,
    },
}

/// Check that every identity key in `items` is unique.
pub fn validate_identities<T: Diffable>(items: &[T], side: Side) -> Result<(), DiffError> {
    index_by_key(items, side).map(|_| ())
}

fn index_by_key<T: Diffable>(items: &[T], side: Side) -> Result<HashMap<T::Key, usize>, DiffError> {
    let mut index = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        if let Some(first) = index.insert(item.diff_key(), position) {
            return Err(DiffError::DuplicateIdentity {
                side,
                first,
                index: position,
            });
        }
    }
    Ok(index)
}

/// Compute the edit script transforming `old` into `new`.
///
/// The result is deterministic: identical inputs always produce identical
/// scripts. See [`EditScript`] for the index conventions.
///
/// # Errors
///
/// Returns [`DiffError::DuplicateIdentity`] if either side repeats a key.
pub fn diff<T: Diffable>(old: &[T], new: &[T]) -> Result<EditScript<T>, DiffError> {
    let old_index = index_by_key(old, Side::Old)?;
    let new_index = index_by_key(new, Side::New)?;

    // Matched pairs in new order: sources[k] is the old index of the k-th
    // shared item, targets[k] its new index.
    let mut sources = Vec::with_capacity(new.len().min(old.len()));
    let mut targets = Vec::with_capacity(sources.capacity());
    for (to, item) in new.iter().enumerate() {
        if let Some(&from) = old_index.get(&item.diff_key()) {
            sources.push(from);
            targets.push(to);
        }
    }

    let stationary = stationary_mask(&sources);

    let mut edits = Vec::new();

    for (index, item) in old.iter().enumerate() {
        if !new_index.contains_key(&item.diff_key()) {
            edits.push(Edit::Delete { index });
        }
    }

    let mut moves: Vec<(usize, usize)> = sources
        .iter()
        .zip(&targets)
        .zip(&stationary)
        .filter(|&(_, &still)| !still)
        .map(|((&from, &to), _)| (from, to))
        .collect();
    moves.sort_unstable();
    edits.extend(moves.into_iter().map(|(from, to)| Edit::Move { from, to }));

    for (index, item) in new.iter().enumerate() {
        if !old_index.contains_key(&item.diff_key()) {
            edits.push(Edit::Insert {
                index,
                item: item.clone(),
            });
        }
    }

    let mut updates: Vec<(usize, usize)> = sources
        .iter()
        .zip(&targets)
        .filter(|&(&from, &to)| !old[from].content_eq(&new[to]))
        .map(|(&from, &to)| (from, to))
        .collect();
    updates.sort_unstable();
    edits.extend(updates.into_iter().map(|(index, to)| Edit::Update {
        index,
        item: new[to].clone(),
    }));

    trace!(
        old_len = old.len(),
        new_len = new.len(),
        matched = sources.len(),
        edits = edits.len(),
        "computed list diff"
    );

    Ok(EditScript::from_parts(edits, old.len(), new.len()))
}

/// Mark the longest strictly increasing subsequence of `sources`.
///
/// Among several longest runs, the one ending earliest is chosen, so for
/// `[0, 2, 1]` the run `[0, 2]` is kept and `1` is reported as moved.
fn stationary_mask(sources: &[usize]) -> Vec<bool> {
    let count = sources.len();
    // tails[l] is the position ending the best run of length l + 1 so far.
    let mut tails: Vec<usize> = Vec::new();
    let mut lengths = vec![0usize; count];
    let mut predecessors: Vec<Option<usize>> = vec![None; count];

    for (position, &value) in sources.iter().enumerate() {
        let slot = tails.partition_point(|&tail| sources[tail] < value);
        if slot > 0 {
            predecessors[position] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(position);
        } else {
            tails[slot] = position;
        }
        lengths[position] = slot + 1;
    }

    let mut mask = vec![false; count];
    let longest = tails.len();
    let mut cursor = lengths.iter().position(|&length| length == longest);
    while let Some(position) = cursor {
        mask[position] = true;
        cursor = predecessors[position];
    }
    mask
}
