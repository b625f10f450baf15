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

//! A runtime compatibility shim supplying a Set-like collection for
//! execution environments whose native implementation is missing or
//! non-conformant, as used by a source-to-source compiler's support
//! runtime.
//!
//! Three pieces cooperate:
//!
//! * [`shims::conformance`] probes a host-provided native Set candidate
//!   with a handful of observable operations and decides whether it is
//!   trustworthy. Any probe failure falls back to the polyfill.
//! * [`shims::set::PolyfillSet`] reproduces insertion-order iteration and
//!   SameValueZero membership by delegating to an ordered key/value map.
//! * [`shims::install::Installer`] binds the winning implementation into
//!   the process-wide [`environment::ShimRegistry`] exactly once.
//!
//! Values stored in sets are dynamic [`values::Value`]s: membership uses
//! SameValueZero equality (NaN equals NaN, +0 equals -0, objects compare
//! by identity).

pub mod environment;
pub mod shims;
pub mod small_map;
pub mod values;

pub use crate::environment::{BareHost, HostEnvironment, ShimConfig, ShimRegistry};
pub use crate::shims::install::{make_set, InstallState, Installer};
pub use crate::shims::set::PolyfillSet;
pub use crate::values::Value;
