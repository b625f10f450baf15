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

//! The ordered-map dependency.
//!
//! The polyfill Set is written purely against the [`OrderedMap`]
//! contract; [`ValueMap`] is the default implementation, backed by
//! [`SmallMap`]. A [`MapProvider`] bound in the registry hands out one
//! exclusively-owned map per Set instance, and [`install`] is the
//! dependency's own one-time lifecycle hook.

use crate::environment::ShimRegistry;
use crate::small_map::SmallMap;
use crate::values::Value;
use std::rc::Rc;

/// Insertion-ordered key/value store under SameValueZero key equality.
///
/// Iteration order is first-insertion order of still-present keys;
/// re-inserting a present key updates its value but not its position.
/// Every entry carries a creation stamp: stamps grow in insertion
/// order, survive value updates, and a key deleted and re-added gets a
/// fresh one. A traversal cursor resumes through `entry_after`, so it
/// never depends on the shifting positions of entries around it.
pub trait OrderedMap {
    fn set(&mut self, key: Value, value: Value);

    fn get(&self, key: &Value) -> Option<Value>;

    fn has(&self, key: &Value) -> bool;

    fn delete(&mut self, key: &Value) -> bool;

    fn clear(&mut self);

    fn len(&self) -> usize;

    /// Fresh sequence over the current entries, in insertion order.
    fn entries(&self) -> Box<dyn Iterator<Item = (Value, Value)>>;

    fn entry_at(&self, index: usize) -> Option<(Value, Value)>;

    fn index_of(&self, key: &Value) -> Option<usize>;

    /// The first entry stamped later than `mark`, with its stamp; the
    /// first entry of all when `mark` is `None`.
    fn entry_after(&self, mark: Option<u64>) -> Option<(u64, Value, Value)>;
}

struct Slot {
    value: Value,
    stamp: u64,
}

/// Default [`OrderedMap`] over a [`SmallMap`] keyed by values themselves.
#[derive(Default)]
pub struct ValueMap {
    content: SmallMap<Value, Slot>,
    next_stamp: u64,
}

impl ValueMap {
    pub fn new() -> ValueMap {
        ValueMap::default()
    }
}

impl OrderedMap for ValueMap {
    fn set(&mut self, key: Value, value: Value) {
        let stamp = match self.content.get(&key) {
            Some(slot) => slot.stamp,
            None => {
                let stamp = self.next_stamp;
                self.next_stamp += 1;
                stamp
            }
        };
        self.content.insert(key, Slot { value, stamp });
    }

    fn get(&self, key: &Value) -> Option<Value> {
        self.content.get(key).map(|slot| slot.value.clone())
    }

    fn has(&self, key: &Value) -> bool {
        self.content.contains_key(key)
    }

    fn delete(&mut self, key: &Value) -> bool {
        self.content.remove(key).is_some()
    }

    fn clear(&mut self) {
        self.content.clear();
    }

    fn len(&self) -> usize {
        self.content.len()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (Value, Value)>> {
        let items: Vec<(Value, Value)> = self
            .content
            .iter()
            .map(|(k, slot)| (k.clone(), slot.value.clone()))
            .collect();
        Box::new(items.into_iter())
    }

    fn entry_at(&self, index: usize) -> Option<(Value, Value)> {
        self.content
            .get_index(index)
            .map(|(k, slot)| (k.clone(), slot.value.clone()))
    }

    fn index_of(&self, key: &Value) -> Option<usize> {
        self.content.index_of(key)
    }

    fn entry_after(&self, mark: Option<u64>) -> Option<(u64, Value, Value)> {
        // Stamps grow along the insertion order, so the first match in
        // iteration order is the cursor's successor.
        self.content
            .iter()
            .find(|(_, slot)| mark.map_or(true, |mark| slot.stamp > mark))
            .map(|(k, slot)| (slot.stamp, k.clone(), slot.value.clone()))
    }
}

/// Hands out backing maps; each Set owns the map it receives.
pub trait MapProvider {
    fn make_map(&self) -> Box<dyn OrderedMap>;
}

pub struct DefaultMapProvider;

impl MapProvider for DefaultMapProvider {
    fn make_map(&self) -> Box<dyn OrderedMap> {
        Box::new(ValueMap::new())
    }
}

/// One-time install hook for the ordered-map dependency. Idempotent: a
/// bound provider is never replaced.
pub fn install(registry: &ShimRegistry) {
    if registry.map_provider().is_ok() {
        return;
    }
    registry.bind_map(Rc::new(DefaultMapProvider));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_keys(map: &dyn OrderedMap) -> Vec<Value> {
        map.entries().map(|(k, _)| k).collect()
    }

    #[test]
    fn insertion_order_and_reinsert() {
        let mut map = ValueMap::new();
        map.set(Value::from(3), Value::from(3));
        map.set(Value::from(1), Value::from(1));
        map.set(Value::from(3), Value::from(30));
        assert_eq!(2, map.len());
        assert_eq!(vec![Value::from(3), Value::from(1)], entry_keys(&map));
        assert_eq!(Some(Value::from(30)), map.get(&Value::from(3)));
    }

    #[test]
    fn same_value_zero_keys() {
        let mut map = ValueMap::new();
        map.set(Value::from(f64::NAN), Value::from(1));
        assert!(map.has(&Value::from(f64::NAN)));
        map.set(Value::from(0.0), Value::from(2));
        map.set(Value::from(-0.0), Value::from(3));
        assert_eq!(2, map.len());
        assert_eq!(Some(Value::from(3)), map.get(&Value::from(0.0)));
    }

    #[test]
    fn delete_reports_and_preserves_order() {
        let mut map = ValueMap::new();
        for i in 0..4 {
            map.set(Value::from(i), Value::from(i));
        }
        assert!(map.delete(&Value::from(1)));
        assert!(!map.delete(&Value::from(1)));
        assert_eq!(
            vec![Value::from(0), Value::from(2), Value::from(3)],
            entry_keys(&map)
        );
        assert_eq!(Some(1), map.index_of(&Value::from(2)));
        assert_eq!(Some((Value::from(3), Value::from(3))), map.entry_at(2));
    }

    #[test]
    fn stamps_advance_only_for_new_entries() {
        let mut map = ValueMap::new();
        map.set(Value::from("a"), Value::from(1));
        map.set(Value::from("b"), Value::from(2));

        let (first, key, _) = map.entry_after(None).unwrap();
        assert_eq!(Value::from("a"), key);
        // Updating a present key keeps its stamp and position.
        map.set(Value::from("a"), Value::from(10));
        assert_eq!(first, map.entry_after(None).unwrap().0);

        // Deleting and re-adding issues a fresh stamp past every survivor.
        map.delete(&Value::from("a"));
        map.set(Value::from("a"), Value::from(1));
        let (stamp_b, key_b, _) = map.entry_after(Some(first)).unwrap();
        assert_eq!(Value::from("b"), key_b);
        let (stamp_a, key_a, _) = map.entry_after(Some(stamp_b)).unwrap();
        assert_eq!(Value::from("a"), key_a);
        assert!(stamp_a > stamp_b);
        assert!(map.entry_after(Some(stamp_a)).is_none());
    }
}
