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

//! The collection shims: the ordered-map contract, the polyfill Set, the
//! conformance probe and the installer.

use crate::values::error::ValueError;
use crate::values::iter::ValueIter;
use crate::values::Value;
use std::rc::Rc;

pub mod conformance;
pub mod install;
pub mod map;
pub mod set;

/// A step sequence of `(value, value)` entry pairs; native candidates may
/// fail mid-iteration, so each step is fallible.
pub type SetEntries = Box<dyn Iterator<Item = Result<(Value, Value), ValueError>>>;

/// One live Set, native or polyfill, behind a uniform dynamic surface.
///
/// `add` hands back an instance handle rather than `&Self` so the
/// chaining contract is observable: a conformant implementation returns
/// the instance it was called on, and the probe checks that by pointer
/// identity.
pub trait SetInstance {
    fn has(&self, value: &Value) -> Result<bool, ValueError>;

    fn size(&self) -> Result<usize, ValueError>;

    fn add(&self, value: Value) -> Result<Rc<dyn SetInstance>, ValueError>;

    fn delete(&self, value: &Value) -> Result<bool, ValueError>;

    fn clear(&self) -> Result<(), ValueError>;

    /// Fresh entry sequence over the current contents, in insertion order.
    fn entries(&self) -> Result<SetEntries, ValueError>;

    /// Fresh value sequence with the same ordering guarantee.
    fn values(&self) -> Result<Box<dyn Iterator<Item = Result<Value, ValueError>>>, ValueError>;

    /// In-order traversal invoking `callback(value, value, set)`.
    fn for_each(
        &self,
        callback: &mut dyn FnMut(&Value, &Value, &Rc<dyn SetInstance>),
    ) -> Result<(), ValueError>;
}

/// A Set implementation offered by the host, before it has been vetted.
pub trait SetCandidate {
    /// Whether instances expose entry iteration at all.
    fn supports_entries(&self) -> bool;

    /// Builds an instance seeded from a source sequence.
    fn construct(&self, source: ValueIter<'_>) -> Result<Rc<dyn SetInstance>, ValueError>;
}

/// Pointer identity of two instance handles.
pub fn same_instance(a: &Rc<dyn SetInstance>, b: &Rc<dyn SetInstance>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}
