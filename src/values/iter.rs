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

//! The generic iteration seam.
//!
//! Collections are consumed through fallible step sequences: each pull
//! yields either the next [`Value`] or the error the underlying source
//! raised. Construction from a source propagates such errors unmodified,
//! since they indicate a caller-supplied defect rather than an
//! environment defect.

use crate::values::error::ValueError;
use crate::values::Value;

/// A pull-based sequence of values; each step may fail.
pub type ValueIter<'a> = Box<dyn Iterator<Item = Result<Value, ValueError>> + 'a>;

/// Containers that can hand out a fresh iteration sequence.
///
/// Implementing this is what gives a container default iteration in
/// generic for-each constructs.
pub trait ValueIterable {
    fn to_iter(&self) -> ValueIter<'_>;
}

impl ValueIterable for [Value] {
    fn to_iter(&self) -> ValueIter<'_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

impl ValueIterable for Vec<Value> {
    fn to_iter(&self) -> ValueIter<'_> {
        self.as_slice().to_iter()
    }
}

/// Adapts an iterable or array-like input into a fallible step sequence.
pub fn make_iterator<T: ValueIterable + ?Sized>(iterable: &T) -> ValueIter<'_> {
    iterable.to_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_iteration_yields_items_in_order() {
        let items = vec![Value::from(1), Value::from(2)];
        let pulled: Result<Vec<Value>, ValueError> = make_iterator(&items).collect();
        assert_eq!(Ok(items), pulled);
    }

    #[test]
    fn empty_slice_terminates_immediately() {
        assert!(make_iterator(&[] as &[Value]).next().is_none());
    }
}
