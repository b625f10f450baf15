// Copyright 2019 The Set Shim Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An insertion-ordered map with two storage tiers: a plain vector of
//! entries while the map is small, upgraded to an [`IndexMap`] once it
//! grows past a threshold. Key hashes are computed once and carried next
//! to the key, so lookups in either tier never rehash.
//!
//! Removal shifts survivors down in both tiers, so iteration order is
//! always first-insertion order of the still-present keys, and
//! re-inserting a present key updates its value without moving it.

use indexmap::{Equivalent, IndexMap};
use std::hash::{Hash, Hasher};

const THRESHOLD: usize = 12;

#[macro_use]
mod macros;

/// Hash contract for map keys.
///
/// Implementations must be consistent with the key's `Eq`: equal keys
/// hash alike. There is deliberately no blanket impl; each key type the
/// crate uses spells out its own.
pub trait KeyHash: Eq {
    fn key_hash(&self) -> u64;
}

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl KeyHash for String {
    fn key_hash(&self) -> u64 {
        hash_of(self.as_str())
    }
}

impl KeyHash for str {
    fn key_hash(&self) -> u64 {
        hash_of(self)
    }
}

/// A key carrying its precomputed hash.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Hashed<K: KeyHash> {
    hash: u64,
    key: K,
}

impl<K: KeyHash> Hashed<K> {
    fn new(key: K) -> Self {
        Hashed {
            hash: key.key_hash(),
            key,
        }
    }

    fn key(&self) -> &K {
        &self.key
    }
}

impl<K: KeyHash> Hash for Hashed<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash)
    }
}

/// Borrowed lookup key with its hash, comparable against `Hashed` keys.
struct BorrowedHash<'a, Q: KeyHash + ?Sized> {
    hash: u64,
    key: &'a Q,
}

impl<'a, Q: KeyHash + ?Sized> BorrowedHash<'a, Q> {
    fn new(key: &'a Q) -> Self {
        BorrowedHash {
            hash: key.key_hash(),
            key,
        }
    }
}

impl<'a, Q, K> Equivalent<Hashed<K>> for BorrowedHash<'a, Q>
where
    K: KeyHash,
    Q: KeyHash + Equivalent<K> + ?Sized,
{
    fn equivalent(&self, other: &Hashed<K>) -> bool {
        self.hash == other.hash && self.key.equivalent(&other.key)
    }
}

impl<'a, Q: KeyHash + ?Sized> Hash for BorrowedHash<'a, Q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash)
    }
}

/// The inline tier: entries in insertion order, scanned linearly.
#[derive(PartialEq, Eq, Debug, Clone)]
struct VecMap<K: KeyHash, V> {
    entries: Vec<(Hashed<K>, V)>,
}

impl<K: KeyHash, V> Default for VecMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: KeyHash, V> VecMap<K, V> {
    fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        let hash = key.key_hash();
        self.entries
            .iter()
            .position(|(k, _)| k.hash == hash && key.equivalent(&k.key))
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        self.find(key).map(|i| &self.entries[i].1)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        self.find(key).is_some()
    }

    fn insert(&mut self, key: K, mut value: V) -> Option<V> {
        match self.find(&key) {
            Some(i) => {
                std::mem::swap(&mut self.entries[i].1, &mut value);
                Some(value)
            }
            None => {
                self.entries.push((Hashed::new(key), value));
                None
            }
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        self.find(key).map(|i| self.entries.remove(i).1)
    }

    fn drain_to(&mut self, map: &mut IndexMap<Hashed<K>, V>) {
        map.extend(self.entries.drain(..));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(k, v)| (k.key(), v))
    }

    fn iter(&self) -> VMIter<K, V> {
        VMIter {
            iter: self.entries.iter(),
        }
    }
}

pub struct VMIter<'a, K: KeyHash + 'a, V: 'a> {
    iter: std::slice::Iter<'a, (Hashed<K>, V)>,
}

impl<'a, K: KeyHash + 'a, V: 'a> VMIter<'a, K, V> {
    fn map(entry: &(Hashed<K>, V)) -> (&K, &V) {
        (entry.0.key(), &entry.1)
    }
}

impl<'a, K: KeyHash + 'a, V: 'a> Iterator for VMIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    def_iter!(Self::map);
}

#[derive(PartialEq, Eq, Debug, Clone)]
enum MapHolder<K: KeyHash, V> {
    Vec(VecMap<K, V>),
    Map(IndexMap<Hashed<K>, V>),
}

impl<K: KeyHash, V> MapHolder<K, V> {
    fn with_capacity(n: usize) -> Self {
        if n < THRESHOLD {
            MapHolder::Vec(VecMap::with_capacity(n))
        } else {
            MapHolder::Map(IndexMap::with_capacity(n))
        }
    }
}

impl<K: KeyHash, V> Default for MapHolder<K, V> {
    fn default() -> Self {
        MapHolder::Vec(VecMap::default())
    }
}

pub enum MHIter<'a, K: KeyHash + 'a, V: 'a> {
    Vec(VMIter<'a, K, V>),
    Map(indexmap::map::Iter<'a, Hashed<K>, V>),
}

impl<'a, K: KeyHash + 'a, V: 'a> Iterator for MHIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            MHIter::Vec(iter) => iter.next(),
            MHIter::Map(iter) => iter.next().map(|(k, v)| (k.key(), v)),
        }
    }
}

/// Insertion-ordered map over [`KeyHash`] keys.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SmallMap<K: KeyHash, V> {
    state: MapHolder<K, V>,
}

impl<K: KeyHash, V> Default for SmallMap<K, V> {
    fn default() -> Self {
        Self {
            state: Default::default(),
        }
    }
}

impl<K: KeyHash, V> SmallMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            state: MapHolder::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        match self.state {
            MapHolder::Vec(ref v) => v.len(),
            MapHolder::Map(ref m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.state {
            MapHolder::Vec(ref v) => v.is_empty(),
            MapHolder::Map(ref m) => m.is_empty(),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        match self.state {
            MapHolder::Vec(ref v) => v.get(key),
            MapHolder::Map(ref m) => m.get(&BorrowedHash::new(key)),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        match self.state {
            MapHolder::Vec(ref v) => v.contains_key(key),
            MapHolder::Map(ref m) => m.contains_key(&BorrowedHash::new(key)),
        }
    }

    fn upgrade(&mut self) {
        let mut holder = MapHolder::Map(IndexMap::with_capacity(THRESHOLD));
        std::mem::swap(&mut self.state, &mut holder);

        if let MapHolder::Vec(ref mut v) = holder {
            if let MapHolder::Map(ref mut m) = self.state {
                v.drain_to(m);
                return;
            }
        }

        unreachable!()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.state {
            MapHolder::Map(ref mut m) => {
                return m.insert(Hashed::new(key), value);
            }
            MapHolder::Vec(ref mut v) => {
                if v.len() + 1 < THRESHOLD || v.contains_key(&key) {
                    return v.insert(key, value);
                }
            }
        }

        self.upgrade();
        if let MapHolder::Map(ref mut m) = self.state {
            return m.insert(Hashed::new(key), value);
        }

        unreachable!()
    }

    /// Removes a key, shifting later entries down so insertion order is
    /// preserved.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        match self.state {
            MapHolder::Vec(ref mut v) => v.remove(key),
            MapHolder::Map(ref mut m) => m.shift_remove(&BorrowedHash::new(key)),
        }
    }

    pub fn clear(&mut self) {
        self.state = MapHolder::default();
    }

    /// Entry at `index` in insertion order.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        match self.state {
            MapHolder::Vec(ref v) => v.get_index(index),
            MapHolder::Map(ref m) => m.get_index(index).map(|(k, v)| (k.key(), v)),
        }
    }

    /// Position of `key` in insertion order, if present.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: KeyHash + Equivalent<K> + ?Sized,
    {
        match self.state {
            MapHolder::Vec(ref v) => v.find(key),
            MapHolder::Map(ref m) => m.get_full(&BorrowedHash::new(key)).map(|(i, _, _)| i),
        }
    }

    pub fn iter(&self) -> MHIter<K, V> {
        match self.state {
            MapHolder::Vec(ref v) => MHIter::Vec(v.iter()),
            MapHolder::Map(ref m) => MHIter::Map(m.iter()),
        }
    }
}

impl<'a, K: KeyHash, V> IntoIterator for &'a SmallMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = MHIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(map: &SmallMap<String, i32>) -> Vec<String> {
        map.iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = SmallMap::new();
        map.insert("b".to_owned(), 1);
        map.insert("a".to_owned(), 2);
        map.insert("c".to_owned(), 3);
        assert_eq!(vec!["b", "a", "c"], keys(&map));
    }

    #[test]
    fn reinsert_updates_value_but_not_position() {
        let mut map = SmallMap::new();
        map.insert("a".to_owned(), 1);
        map.insert("b".to_owned(), 2);
        map.insert("a".to_owned(), 10);
        assert_eq!(vec!["a", "b"], keys(&map));
        assert_eq!(Some(&10), map.get("a"));
        assert_eq!(2, map.len());
    }

    #[test]
    fn remove_preserves_order_of_survivors() {
        let mut map = SmallMap::new();
        for k in &["a", "b", "c", "d"] {
            map.insert(k.to_string(), 0);
        }
        assert_eq!(Some(0), map.remove("b"));
        assert_eq!(None, map.remove("b"));
        assert_eq!(vec!["a", "c", "d"], keys(&map));
    }

    #[test]
    fn order_survives_tier_upgrade() {
        let mut map = SmallMap::new();
        let names: Vec<String> = (0..32).map(|i| format!("k{}", i)).collect();
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), i as i32);
        }
        assert_eq!(32, map.len());
        assert_eq!(names, keys(&map));
        for (i, name) in names.iter().enumerate() {
            assert_eq!(Some(&(i as i32)), map.get(name.as_str()));
            assert_eq!(Some(i), map.index_of(name.as_str()));
        }
    }

    #[test]
    fn positional_access() {
        let mut map = SmallMap::new();
        map.insert("x".to_owned(), 1);
        map.insert("y".to_owned(), 2);
        assert_eq!(Some(("y", 2)), map.get_index(1).map(|(k, v)| (k.as_str(), *v)));
        assert_eq!(None, map.get_index(2));
        assert_eq!(Some(0), map.index_of("x"));
        assert_eq!(None, map.index_of("z"));
    }

    #[test]
    fn clear_resets() {
        let mut map = SmallMap::new();
        map.insert("a".to_owned(), 1);
        map.clear();
        assert!(map.is_empty());
        assert_eq!(None, map.get("a"));
    }
}
