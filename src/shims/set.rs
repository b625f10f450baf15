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

//! The polyfill Set.
//!
//! Members are stored as both key and value of one exclusively-owned
//! [`OrderedMap`], so membership inherits the map's SameValueZero key
//! equality and iteration inherits its insertion order. A cached `size`
//! mirrors the map's entry count after every mutating call.

use crate::shims::map::{OrderedMap, ValueMap};
use crate::shims::{SetEntries, SetInstance};
use crate::values::error::ValueError;
use crate::values::iter::{ValueIter, ValueIterable};
use crate::values::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub struct PolyfillSet {
    map: RefCell<Box<dyn OrderedMap>>,
    size: Cell<usize>,
}

impl PolyfillSet {
    pub fn new() -> PolyfillSet {
        PolyfillSet::with_map(Box::new(ValueMap::new()))
    }

    pub fn with_map(map: Box<dyn OrderedMap>) -> PolyfillSet {
        let size = map.len();
        PolyfillSet {
            map: RefCell::new(map),
            size: Cell::new(size),
        }
    }

    /// Builds a set seeded from a source sequence, adding items in pull
    /// order. A pull failure propagates to the caller; items pulled
    /// before the failure stay added (no rollback).
    pub fn from_source<I>(source: I) -> Result<PolyfillSet, ValueError>
    where
        I: IntoIterator<Item = Result<Value, ValueError>>,
    {
        let set = PolyfillSet::new();
        set.fill(source)?;
        Ok(set)
    }

    pub(crate) fn fill<I>(&self, source: I) -> Result<(), ValueError>
    where
        I: IntoIterator<Item = Result<Value, ValueError>>,
    {
        for item in source {
            self.add(item?);
        }
        Ok(())
    }

    /// Adds or re-adds a value, returning the set for call chaining.
    pub fn add(&self, value: Value) -> &PolyfillSet {
        {
            let mut map = self.map.borrow_mut();
            map.set(value.clone(), value);
            self.size.set(map.len());
        }
        self
    }

    /// Removes a value, reporting whether a removal actually occurred.
    pub fn delete(&self, value: &Value) -> bool {
        let mut map = self.map.borrow_mut();
        let removed = map.delete(value);
        self.size.set(map.len());
        removed
    }

    pub fn clear(&self) {
        self.map.borrow_mut().clear();
        self.size.set(0);
    }

    pub fn has(&self, value: &Value) -> bool {
        self.map.borrow().has(value)
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    /// Fresh `(value, value)` sequence over the contents at call time, in
    /// insertion order. Each call restarts independently.
    pub fn entries(&self) -> Box<dyn Iterator<Item = (Value, Value)>> {
        self.map.borrow().entries()
    }

    /// Fresh value sequence with the same ordering guarantee; the set's
    /// default iteration sequence.
    pub fn values(&self) -> Box<dyn Iterator<Item = Value>> {
        Box::new(self.entries().map(|(value, _)| value))
    }

    /// In-order traversal invoking `callback(value, value, set)`.
    ///
    /// The cursor is live: entries deleted before being reached are
    /// skipped, entries appended during traversal are visited if still
    /// present when the cursor reaches them, and a value deleted and
    /// re-added mid-traversal is visited again at its new position. The
    /// cursor follows the map's creation stamps rather than entry
    /// positions, so entries shifting around it never affect it.
    pub fn for_each<F>(&self, mut callback: F)
    where
        F: FnMut(&Value, &Value, &PolyfillSet),
    {
        let mut mark: Option<u64> = None;
        loop {
            let next = self.map.borrow().entry_after(mark);
            match next {
                Some((stamp, key, value)) => {
                    mark = Some(stamp);
                    callback(&key, &value, self);
                }
                None => break,
            }
        }
    }
}

impl Default for PolyfillSet {
    fn default() -> PolyfillSet {
        PolyfillSet::new()
    }
}

impl ValueIterable for PolyfillSet {
    fn to_iter(&self) -> ValueIter<'_> {
        Box::new(self.values().map(Ok))
    }
}

/// Reference-counted [`PolyfillSet`] exposing the dynamic
/// [`SetInstance`] surface, so registry consumers handle the polyfill
/// and a native candidate uniformly.
pub struct SharedSet {
    this: Weak<SharedSet>,
    set: PolyfillSet,
}

impl SharedSet {
    pub fn new(map: Box<dyn OrderedMap>) -> Rc<SharedSet> {
        Rc::new_cyclic(|this| SharedSet {
            this: this.clone(),
            set: PolyfillSet::with_map(map),
        })
    }

    pub fn from_source(
        map: Box<dyn OrderedMap>,
        source: ValueIter<'_>,
    ) -> Result<Rc<SharedSet>, ValueError> {
        let shared = SharedSet::new(map);
        shared.set.fill(source)?;
        Ok(shared)
    }

    fn handle(&self) -> Rc<dyn SetInstance> {
        self.this.upgrade().unwrap()
    }
}

impl SetInstance for SharedSet {
    fn has(&self, value: &Value) -> Result<bool, ValueError> {
        Ok(self.set.has(value))
    }

    fn size(&self) -> Result<usize, ValueError> {
        Ok(self.set.size())
    }

    fn add(&self, value: Value) -> Result<Rc<dyn SetInstance>, ValueError> {
        self.set.add(value);
        Ok(self.handle())
    }

    fn delete(&self, value: &Value) -> Result<bool, ValueError> {
        Ok(self.set.delete(value))
    }

    fn clear(&self) -> Result<(), ValueError> {
        self.set.clear();
        Ok(())
    }

    fn entries(&self) -> Result<SetEntries, ValueError> {
        Ok(Box::new(self.set.entries().map(Ok)))
    }

    fn values(&self) -> Result<Box<dyn Iterator<Item = Result<Value, ValueError>>>, ValueError> {
        Ok(Box::new(self.set.values().map(Ok)))
    }

    fn for_each(
        &self,
        callback: &mut dyn FnMut(&Value, &Value, &Rc<dyn SetInstance>),
    ) -> Result<(), ValueError> {
        let handle = self.handle();
        self.set
            .for_each(|value, key, _| callback(value, key, &handle));
        Ok(())
    }
}
