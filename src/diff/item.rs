//! Item: What the diffing engine needs to know about an element.
//!
//! Every element carries two notions of equality:
//! - **Identity**: a stable key naming "the same logical item" across two
//!   collections, independent of position or content.
//! - **Content**: whether an item with unchanged identity needs to be
//!   redisplayed.

use std::hash::Hash;

/// An element that can be reconciled by the diffing engine.
///
/// Identity keys must be unique within a collection. Two items with the same
/// key and equal content are considered the same displayed row; the same key
/// with different content produces an update.
pub trait Diffable: Clone {
    /// The identity key type.
    type Key: Eq + Hash + Clone;

    /// Returns the identity key of this item.
    fn diff_key(&self) -> Self::Key;

    /// Returns `true` if `other` has the same displayable content.
    ///
    /// Only called for items whose keys match.
    fn content_eq(&self, other: &Self) -> bool;
}

macro_rules! impl_diffable_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Diffable for $ty {
                type Key = $ty;

                #[inline]
                fn diff_key(&self) -> Self::Key {
                    self.clone()
                }

                #[inline]
                fn content_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

// Values that are their own identity: they can only move, never update.
impl_diffable_by_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, char, String);

impl Diffable for &'static str {
    type Key = &'static str;

    #[inline]
    fn diff_key(&self) -> Self::Key {
        *self
    }

    #[inline]
    fn content_eq(&self, other: &Self) -> bool {
        self == other
    }
}

/// A key paired with content, for collections whose items have no natural
/// key of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyed<K, V> {
    /// Identity key.
    pub key: K,
    /// Displayed content.
    pub value: V,
}

impl<K, V> Keyed<K, V> {
    /// Create a new keyed item.
    #[inline]
    pub const fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> Diffable for Keyed<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    type Key = K;

    #[inline]
    fn diff_key(&self) -> K {
        self.key.clone()
    }

    #[inline]
    fn content_eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
