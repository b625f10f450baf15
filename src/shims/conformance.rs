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

//! Conformance check for a host-provided native Set.
//!
//! Identity-based dedup and strict insertion-order iteration are the two
//! properties most commonly broken by partial native implementations, so
//! the probe exercises exactly those with a handful of observable
//! operations on sealed throwaway objects. Any error at any step counts
//! the same as a failed assertion: the answer is `false` and the shim
//! falls back to the polyfill. Probe failures never propagate.

use crate::environment::{HostEnvironment, ShimConfig};
use crate::shims::{same_instance, SetCandidate};
use crate::values::error::ValueError;
use crate::values::iter::make_iterator;
use crate::values::Value;

/// Decides whether the host's native Set candidate matches required
/// behavior. Deterministic for a fixed host and config; callable any
/// number of times.
pub fn is_conformant(host: &dyn HostEnvironment, config: &ShimConfig) -> bool {
    if config.assume_no_native_set {
        return false;
    }
    let candidate = match host.native_set() {
        Some(candidate) => candidate,
        None => return false,
    };
    if !candidate.supports_entries() || !host.can_seal_objects() {
        return false;
    }
    // Some implementations don't support constructor arguments; anything
    // else that goes wrong in the probe lands here too.
    match probe(&*candidate) {
        Ok(conformant) => conformant,
        Err(_) => false,
    }
}

/// A sealed `{x: 4}` object, never retained past the probe.
fn probe_object() -> Result<Value, ValueError> {
    let object = Value::object(vec![("x", Value::from(4))]);
    object.seal()?;
    Ok(object)
}

fn probe(candidate: &dyn SetCandidate) -> Result<bool, ValueError> {
    let value = probe_object()?;
    let seed = [value.clone()];
    let set = candidate.construct(make_iterator(&seed[..]))?;

    if !set.has(&value)? || set.size()? != 1 {
        return Ok(false);
    }
    // Re-adding a member must chain on the same instance without growing.
    if !same_instance(&set.add(value.clone())?, &set) || set.size()? != 1 {
        return Ok(false);
    }
    // A distinct object of equal shape is a distinct member.
    if !same_instance(&set.add(probe_object()?)?, &set) || set.size()? != 2 {
        return Ok(false);
    }

    let mut entries = set.entries()?;
    match entries.next() {
        Some(step) => {
            let (key, entry_value) = step?;
            if !key.same_value_zero(&value) || !entry_value.same_value_zero(&key) {
                return Ok(false);
            }
        }
        None => return Ok(false),
    }
    match entries.next() {
        Some(step) => {
            let (key, entry_value) = step?;
            if key.same_value_zero(&value)
                || key.get_field("x")? != Value::from(4)
                || !entry_value.same_value_zero(&key)
            {
                return Ok(false);
            }
        }
        None => return Ok(false),
    }
    Ok(entries.next().is_none())
}
