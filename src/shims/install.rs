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

//! One-time installation of the best available Set implementation.
//!
//! The first `install()` call ensures the ordered-map dependency is
//! bound, runs the conformance check, and binds the registry's Set slot
//! to the native candidate or the polyfill. The installer then flips to
//! its terminal state, so every later call from any call site returns
//! immediately without repeating dependency or probe work. `install()`
//! itself cannot fail: probe errors are absorbed inside the conformance
//! check.

use crate::environment::ShimRegistry;
use crate::shims::conformance::is_conformant;
use crate::shims::map;
use crate::shims::set::SharedSet;
use crate::shims::{SetCandidate, SetInstance};
use crate::values::error::ValueError;
use crate::values::iter::{make_iterator, ValueIter};
use crate::values::Value;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// The implementation bound in the registry's Set slot.
#[derive(Clone)]
pub enum SetProvider {
    /// The host's native implementation, vetted by the conformance check.
    /// It already satisfies the default-iteration contract, so no further
    /// wrapping is needed.
    Native(Rc<dyn SetCandidate>),
    /// The polyfill; default iteration over its values is part of its
    /// compile-time surface.
    Polyfill,
}

impl fmt::Debug for SetProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetProvider::Native(..) => f.write_str("Native(..)"),
            SetProvider::Polyfill => f.write_str("Polyfill"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstallState {
    Uninstalled,
    /// Terminal; never left once reached.
    Installed,
}

/// Decides between the polyfill and the native implementation, once.
pub struct Installer {
    registry: Rc<ShimRegistry>,
    state: Cell<InstallState>,
}

impl Installer {
    pub fn new(registry: Rc<ShimRegistry>) -> Installer {
        Installer {
            registry,
            state: Cell::new(InstallState::Uninstalled),
        }
    }

    pub fn state(&self) -> InstallState {
        self.state.get()
    }

    pub fn registry(&self) -> &Rc<ShimRegistry> {
        &self.registry
    }

    pub fn install(&self) {
        if self.state.get() == InstallState::Installed {
            return;
        }

        map::install(&self.registry);

        let provider = if is_conformant(self.registry.host(), self.registry.config()) {
            match self.registry.host().native_set() {
                Some(native) => SetProvider::Native(native),
                // A conformant answer implies a candidate; a host that
                // retracts it between calls gets the polyfill.
                None => SetProvider::Polyfill,
            }
        } else {
            SetProvider::Polyfill
        };
        self.registry.bind_set(provider);

        self.state.set(InstallState::Installed);
    }
}

/// Builds a Set through whatever implementation is installed, optionally
/// seeded from a source sequence. Source pull failures propagate;
/// resolving before installation is an error.
pub fn make_set(
    registry: &ShimRegistry,
    source: Option<ValueIter<'_>>,
) -> Result<Rc<dyn SetInstance>, ValueError> {
    match registry.set_provider()? {
        SetProvider::Native(candidate) => match source {
            Some(source) => candidate.construct(source),
            None => candidate.construct(make_iterator(&[] as &[Value])),
        },
        SetProvider::Polyfill => {
            let map = registry.map_provider()?.make_map();
            match source {
                Some(source) => {
                    let set = SharedSet::from_source(map, source)?;
                    Ok(set)
                }
                None => {
                    let set: Rc<dyn SetInstance> = SharedSet::new(map);
                    Ok(set)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{BareHost, ShimConfig};
    use crate::values::iter::ValueIterable;

    fn polyfill_installer() -> Installer {
        let registry = Rc::new(ShimRegistry::new(Rc::new(BareHost), ShimConfig::default()));
        Installer::new(registry)
    }

    #[test]
    fn install_binds_polyfill_on_bare_host() {
        let installer = polyfill_installer();
        assert_eq!(InstallState::Uninstalled, installer.state());
        installer.install();
        assert_eq!(InstallState::Installed, installer.state());
        match installer.registry().set_provider().unwrap() {
            SetProvider::Polyfill => (),
            SetProvider::Native(..) => panic!("bare host must not bind a native set"),
        }
        assert!(installer.registry().map_provider().is_ok());
    }

    #[test]
    fn provider_debug_elides_the_candidate() {
        assert_eq!("Polyfill", format!("{:?}", SetProvider::Polyfill));
        let installer = polyfill_installer();
        installer.install();
        let provider = installer.registry().set_provider().unwrap();
        assert_eq!("Polyfill", format!("{:?}", provider));
    }

    #[test]
    fn make_set_before_install_errors() {
        let installer = polyfill_installer();
        assert!(make_set(installer.registry(), None).is_err());
    }

    #[test]
    fn installed_polyfill_set_works_end_to_end() {
        let installer = polyfill_installer();
        installer.install();

        let items = vec![
            Value::from(1),
            Value::from(2),
            Value::from(2),
            Value::from(3),
        ];
        let set = make_set(installer.registry(), Some(items.to_iter())).unwrap();
        assert_eq!(Ok(3), set.size());
        assert_eq!(Ok(true), set.has(&Value::from(2)));

        let values: Result<Vec<Value>, ValueError> = set.values().unwrap().collect();
        assert_eq!(
            Ok(vec![Value::from(1), Value::from(2), Value::from(3)]),
            values
        );
    }

    #[test]
    fn second_install_is_a_no_op() {
        let installer = polyfill_installer();
        installer.install();
        let before = make_set(installer.registry(), None).unwrap();
        before.add(Value::from(1)).unwrap();

        installer.install();
        assert_eq!(InstallState::Installed, installer.state());
        match installer.registry().set_provider().unwrap() {
            SetProvider::Polyfill => (),
            SetProvider::Native(..) => panic!("rebinding changed the provider"),
        }
    }
}
