//! Insertion-ordered store for catalog entries keyed by stable ids.
//!
//! Files, axes, variables and sub-axes all live in a `Repository`: entries
//! keep the order in which they were first inserted (that order drives id
//! assignment and serialization output), keys are unique, and lookups go
//! through a key→position map. Entries are never removed.

use anyhow::{Result, bail};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

/// Owning, insertion-ordered map with keyed and positional access.
#[derive(Clone)]
pub struct Repository<K, V> {
    entries: Vec<(K, V)>,
    positions: HashMap<K, usize>,
}

impl<K, V> Default for Repository<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K, V> Repository<K, V>
where
    K: Clone + Eq + Hash + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a new entry; a key that is already present is an error.
    pub fn insert(&mut self, key: K, value: V) -> Result<&mut V> {
        if self.positions.contains_key(&key) {
            bail!("duplicate key \"{key}\"");
        }
        let position = self.entries.len();
        self.positions.insert(key.clone(), position);
        self.entries.push((key, value));
        Ok(&mut self.entries[position].1)
    }

    /// Fetch the entry for `key`, creating it with `make` when absent.
    ///
    /// The returned flag is true when the entry was created by this call.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> (&mut V, bool) {
        match self.positions.get(&key) {
            Some(&position) => (&mut self.entries[position].1, false),
            None => {
                let position = self.entries.len();
                self.positions.insert(key.clone(), position);
                self.entries.push((key, make()));
                (&mut self.entries[position].1, true)
            }
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.positions.get(key)?;
        Some(&self.entries[position].1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = *self.positions.get(key)?;
        Some(&mut self.entries[position].1)
    }

    /// Positional access in insertion order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(key, value)| (key, value))
    }

    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.get(key).copied()
    }

    /// First key matching `predicate`, scanning in insertion order.
    pub fn find_key(&self, mut predicate: impl FnMut(&V) -> bool) -> Option<&K> {
        self.entries
            .iter()
            .find(|(_, value)| predicate(value))
            .map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<K, V> Repository<K, V>
where
    K: Clone + Eq + Hash + Display + Borrow<str> + From<usize>,
{
    /// Next sequential id that is not already taken.
    ///
    /// Starts from the entry count, so a freshly scanned repository hands
    /// out `"0"`, `"1"`, ... and one loaded with sparse ids never collides.
    pub fn next_sequential_key(&self) -> K {
        let mut candidate = self.entries.len();
        while self.positions.contains_key(candidate.to_string().as_str()) {
            candidate += 1;
        }
        K::from(candidate)
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Repository<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Debug, V: Debug> Debug for Repository<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(key, value)| (key, value)))
            .finish()
    }
}
