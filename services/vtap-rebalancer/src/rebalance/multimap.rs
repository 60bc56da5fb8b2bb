// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Key-ordered multimap with de-duplicated, insertion-ordered values.

use std::collections::BTreeMap;
use std::collections::btree_map;

/// Maps each key to a sequence of distinct values.
///
/// Keys iterate in sorted order. Values keep the order in which they were
/// first inserted; inserting a value already present under the same key is
/// a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMultiMap<K, V> {
    entries: BTreeMap<K, Vec<V>>,
}

impl<K, V> Default for OrderedMultiMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord, V: PartialEq> OrderedMultiMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` under `key`. Returns false if it was already there.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let values = self.entries.entry(key).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Values under `key`, empty if the key is absent.
    pub fn get(&self, key: &K) -> &[V] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> btree_map::Keys<'_, K, Vec<V>> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord, V: PartialEq> FromIterator<(K, V)> for OrderedMultiMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
