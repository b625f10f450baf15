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

//! The host environment seam and the registry holding the process-wide
//! collection bindings.
//!
//! Instead of mutating an ad hoc global, the shim rebinds entries in a
//! [`ShimRegistry`]: a single indirection point that consumers resolve
//! through, so alternate implementations can be substituted in tests.
//! Capability detection goes through the pluggable [`HostEnvironment`]
//! trait rather than reaching for process globals directly.

use crate::shims::install::SetProvider;
use crate::shims::map::MapProvider;
use crate::shims::SetCandidate;
use crate::values::error::{RuntimeError, ValueError};
use std::cell::RefCell;
use std::rc::Rc;

// SM prefix = Shim Module
const NOT_BOUND_ERROR_CODE: &str = "SM00";

#[derive(Debug, PartialEq, Eq)]
pub enum EnvironmentError {
    /// A registry slot was resolved before anything was installed in it.
    SymbolNotBound(String),
}

impl Into<RuntimeError> for EnvironmentError {
    fn into(self) -> RuntimeError {
        match self {
            EnvironmentError::SymbolNotBound(name) => RuntimeError {
                code: NOT_BOUND_ERROR_CODE,
                label: "Symbol is not bound".to_owned(),
                message: format!("Symbol '{}' resolved before installation", name),
            },
        }
    }
}

impl From<EnvironmentError> for ValueError {
    fn from(e: EnvironmentError) -> Self {
        ValueError::Runtime(e.into())
    }
}

/// What the surrounding execution environment offers the shim.
///
/// Deterministic fakes of this trait model conformant, partially broken
/// and absent native implementations in tests.
pub trait HostEnvironment {
    /// The host's native Set candidate, if it has one at all.
    fn native_set(&self) -> Option<Rc<dyn SetCandidate>>;

    /// Whether the host provides a generic object-sealing facility.
    fn can_seal_objects(&self) -> bool;
}

/// A host with no native Set implementation.
pub struct BareHost;

impl HostEnvironment for BareHost {
    fn native_set(&self) -> Option<Rc<dyn SetCandidate>> {
        None
    }

    fn can_seal_objects(&self) -> bool {
        true
    }
}

/// Shim configuration.
#[derive(Clone, Debug, Default)]
pub struct ShimConfig {
    /// Skip the conformance check and always use the polyfill. Used to
    /// force deterministic behavior in tests.
    pub assume_no_native_set: bool,
}

/// The process-wide binding point for shimmed collections.
///
/// Each slot is bound at most once, by the installers; resolving an
/// unbound slot is an error rather than a panic so call sites can
/// surface a diagnostic.
pub struct ShimRegistry {
    host: Rc<dyn HostEnvironment>,
    config: ShimConfig,
    map: RefCell<Option<Rc<dyn MapProvider>>>,
    set: RefCell<Option<SetProvider>>,
}

impl ShimRegistry {
    pub fn new(host: Rc<dyn HostEnvironment>, config: ShimConfig) -> ShimRegistry {
        ShimRegistry {
            host,
            config,
            map: RefCell::new(None),
            set: RefCell::new(None),
        }
    }

    pub fn host(&self) -> &dyn HostEnvironment {
        &*self.host
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub(crate) fn bind_map(&self, provider: Rc<dyn MapProvider>) {
        *self.map.borrow_mut() = Some(provider);
    }

    pub fn map_provider(&self) -> Result<Rc<dyn MapProvider>, EnvironmentError> {
        match &*self.map.borrow() {
            Some(provider) => Ok(provider.clone()),
            None => Err(EnvironmentError::SymbolNotBound("Map".to_owned())),
        }
    }

    pub(crate) fn bind_set(&self, provider: SetProvider) {
        *self.set.borrow_mut() = Some(provider);
    }

    pub fn set_provider(&self) -> Result<SetProvider, EnvironmentError> {
        match &*self.set.borrow() {
            Some(provider) => Ok(provider.clone()),
            None => Err(EnvironmentError::SymbolNotBound("Set".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_slots_error_with_code() {
        let registry = ShimRegistry::new(Rc::new(BareHost), ShimConfig::default());
        let err = registry.set_provider().unwrap_err();
        assert_eq!(
            EnvironmentError::SymbolNotBound("Set".to_owned()),
            err
        );
        let runtime: RuntimeError = err.into();
        assert_eq!(NOT_BOUND_ERROR_CODE, runtime.code);
        assert!(registry.map_provider().is_err());
    }

    #[test]
    fn bare_host_offers_no_candidate() {
        assert!(BareHost.native_set().is_none());
        assert!(BareHost.can_seal_objects());
    }
}
