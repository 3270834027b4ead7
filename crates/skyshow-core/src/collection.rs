//! Keyed collection that remembers display order.
//!
//! Vehicles and mission slots are looked up by identifier on every
//! computation but shown to the operator in a stable order. The collection
//! keeps both views in sync: `order` is always a permutation of the keys of
//! `by_id`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, Result};

/// Items that carry their own identifier.
pub trait Keyed {
    type Key: Clone + Eq + Hash + Debug;

    fn key(&self) -> Self::Key;
}

#[derive(Debug, Clone)]
pub struct OrderedCollection<T: Keyed> {
    by_id: HashMap<T::Key, T>,
    order: Vec<T::Key>,
}

impl<T: Keyed> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Keyed> OrderedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from items in display order.
    ///
    /// Fails with `InvalidSnapshot` when two items share an identifier.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut collection = Self::new();
        for item in items {
            let key = item.key();
            if collection.by_id.contains_key(&key) {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate identifier {:?}",
                    key
                )));
            }
            collection.order.push(key.clone());
            collection.by_id.insert(key, item);
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.by_id.contains_key(key)
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.by_id.get(key)
    }

    /// Mutable access to an item. The item's key must not change.
    pub fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.by_id.get_mut(key)
    }

    /// Index of `key` in display order.
    pub fn position(&self, key: &T::Key) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    /// Identifiers in display order.
    pub fn ids(&self) -> &[T::Key] {
        &self.order
    }

    /// Items in display order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(|key| self.by_id.get(key))
    }

    /// Append an item. An existing item with the same key is replaced in place
    /// and returned.
    pub fn insert_at_end(&mut self, item: T) -> Option<T> {
        let key = item.key();
        if let Some(previous) = self.by_id.insert(key.clone(), item) {
            return Some(previous);
        }
        self.order.push(key);
        None
    }

    /// Prepend an item. An existing item with the same key is replaced in
    /// place and returned.
    pub fn insert_at_front(&mut self, item: T) -> Option<T> {
        let key = item.key();
        if let Some(previous) = self.by_id.insert(key.clone(), item) {
            return Some(previous);
        }
        self.order.insert(0, key);
        None
    }

    /// Insert an item before the first item that compares greater, assuming
    /// the collection is already sorted by `compare`. An existing item with
    /// the same key is removed first, so the item may move.
    pub fn insert_sorted_by<F>(&mut self, item: T, mut compare: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let key = item.key();
        let previous = self.remove(&key);
        let index = self
            .order
            .iter()
            .position(|k| {
                self.by_id
                    .get(k)
                    .map(|existing| compare(existing, &item) == Ordering::Greater)
                    .unwrap_or(false)
            })
            .unwrap_or(self.order.len());
        self.order.insert(index, key.clone());
        self.by_id.insert(key, item);
        previous
    }

    /// Replace an existing item in place, or insert it at its sorted position
    /// when it is new.
    pub fn replace_or_insert_sorted_by<F>(&mut self, item: T, compare: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let key = item.key();
        if self.by_id.contains_key(&key) {
            return self.by_id.insert(key, item);
        }
        self.insert_sorted_by(item, compare)
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let item = self.by_id.remove(key)?;
        self.order.retain(|k| k != key);
        Some(item)
    }

    /// Remove every listed item; unknown keys are ignored.
    pub fn remove_many<'a, I>(&mut self, keys: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a T::Key>,
        T::Key: 'a,
    {
        let mut removed = Vec::new();
        let mut doomed = HashSet::new();
        for key in keys {
            if let Some(item) = self.by_id.remove(key) {
                doomed.insert(key.clone());
                removed.push(item);
            }
        }
        self.order.retain(|k| !doomed.contains(k));
        removed
    }

    /// Move the listed items, in the listed order, so that the first one ends
    /// up at `index` among the items that were not moved. Unknown keys are
    /// ignored and `index` is clamped to the end.
    pub fn move_to(&mut self, keys: &[T::Key], index: usize) {
        let mut seen = HashSet::new();
        let moving: Vec<T::Key> = keys
            .iter()
            .filter(|k| self.by_id.contains_key(*k) && seen.insert((*k).clone()))
            .cloned()
            .collect();
        if moving.is_empty() {
            return;
        }

        self.order.retain(|k| !seen.contains(k));
        let index = index.min(self.order.len());
        self.order.splice(index..index, moving);
    }

    /// Stable sort of the display order.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let by_id = &self.by_id;
        self.order.sort_by(|a, b| match (by_id.get(a), by_id.get(b)) {
            (Some(a), Some(b)) => compare(a, b),
            _ => Ordering::Equal,
        });
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.by_id.retain(|_, item| keep(&*item));
        let by_id = &self.by_id;
        self.order.retain(|k| by_id.contains_key(k));
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.order.clear();
    }

    /// Whether the order list is a duplicate-free permutation of the keys.
    pub fn is_consistent(&self) -> bool {
        if self.order.len() != self.by_id.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.order.len());
        self.order
            .iter()
            .all(|k| self.by_id.contains_key(k) && seen.insert(k))
    }
}

impl<T: Keyed + PartialEq> PartialEq for OrderedCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.iter().eq(other.iter())
    }
}

// Serialized as the plain list of items in display order; the key index is
// rebuilt (and duplicates rejected) on the way back in.
impl<T: Keyed + Serialize> Serialize for OrderedCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Keyed + Deserialize<'de>> Deserialize<'de> for OrderedCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Self::from_items(items).map_err(D::Error::custom)
    }
}
