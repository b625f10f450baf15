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

//! The dynamic value type stored in shimmed collections.
//!
//! A [`Value`] is cheap to clone: scalars are copied, strings and objects
//! are reference-counted. Equality is SameValueZero — NaN equals NaN,
//! +0 equals -0, strings compare by content and objects by identity —
//! and [`KeyHash`] is consistent with it, so values can key the
//! insertion-ordered [`SmallMap`](crate::small_map::SmallMap) directly.
//!
//! Objects carry named fields and can be *sealed*, after which any
//! mutation is a [`ValueError::CannotMutateSealedValue`]. The conformance
//! probe uses sealed objects as tamper-evident test values.

use crate::small_map::{KeyHash, SmallMap};
use crate::values::error::ValueError;
use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub mod error;
pub mod iter;

macro_rules! unsupported {
    ($v:expr, $op:expr) => {
        ValueError::OperationNotSupported {
            op: $op.to_owned(),
            on: $v.get_type().to_owned(),
        }
    };
}

#[derive(Clone)]
enum Inner {
    None,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Object(Rc<Object>),
}

/// A dynamic value.
#[derive(Clone)]
pub struct Value(Inner);

/// A reference object with named fields and a seal flag.
pub struct Object {
    fields: RefCell<SmallMap<String, Value>>,
    sealed: Cell<bool>,
}

impl Object {
    pub fn new() -> Object {
        Object {
            fields: RefCell::new(SmallMap::new()),
            sealed: Cell::new(false),
        }
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) -> Result<(), ValueError> {
        self.test_mut()?;
        self.fields.borrow_mut().insert(name.to_owned(), value);
        Ok(())
    }

    /// Returns the appropriate error if the object can no longer be
    /// mutated, to be called as `object.test_mut()?`.
    fn test_mut(&self) -> Result<(), ValueError> {
        if self.sealed.get() {
            Err(ValueError::CannotMutateSealedValue)
        } else {
            Ok(())
        }
    }

    fn seal(&self) {
        self.sealed.set(true);
    }
}

impl Default for Object {
    fn default() -> Object {
        Object::new()
    }
}

impl Value {
    pub fn none() -> Value {
        Value(Inner::None)
    }

    /// Builds an unsealed object value from `(field, value)` pairs.
    pub fn object(fields: Vec<(&str, Value)>) -> Value {
        let object = Object::new();
        for (name, value) in fields {
            // A fresh object is never sealed.
            object.set(name, value).unwrap();
        }
        Value::from(object)
    }

    pub fn get_type(&self) -> &'static str {
        match self.0 {
            Inner::None => "none",
            Inner::Bool(..) => "bool",
            Inner::Number(..) => "number",
            Inner::Str(..) => "string",
            Inner::Object(..) => "object",
        }
    }

    /// SameValueZero comparison: NaN equals NaN, +0 equals -0, strings by
    /// content, objects by identity.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (&self.0, &other.0) {
            (Inner::None, Inner::None) => true,
            (Inner::Bool(a), Inner::Bool(b)) => a == b,
            (Inner::Number(a), Inner::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Inner::Str(a), Inner::Str(b)) => a == b,
            (Inner::Object(a), Inner::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn get_field(&self, name: &str) -> Result<Value, ValueError> {
        match &self.0 {
            Inner::Object(object) => object
                .get(name)
                .ok_or_else(|| ValueError::FieldNotFound(name.to_owned())),
            _ => Err(unsupported!(self, format!(".{}", name))),
        }
    }

    pub fn set_field(&self, name: &str, value: Value) -> Result<(), ValueError> {
        match &self.0 {
            Inner::Object(object) => object.set(name, value),
            _ => Err(unsupported!(self, format!(".{} =", name))),
        }
    }

    /// Seals an object so further mutation errors out.
    pub fn seal(&self) -> Result<(), ValueError> {
        match &self.0 {
            Inner::Object(object) => {
                object.seal();
                Ok(())
            }
            _ => Err(unsupported!(self, "seal()")),
        }
    }

    pub fn is_sealed(&self) -> bool {
        match &self.0 {
            Inner::Object(object) => object.sealed.get(),
            _ => false,
        }
    }

    pub fn to_repr(&self) -> String {
        let mut s = String::new();
        self.collect_repr(&mut s);
        s
    }

    fn collect_repr(&self, s: &mut String) {
        match &self.0 {
            Inner::None => s.push_str("none"),
            Inner::Bool(b) => s.push_str(if *b { "true" } else { "false" }),
            Inner::Number(n) => s.push_str(&n.to_string()),
            Inner::Str(v) => {
                s.push('"');
                s.push_str(v);
                s.push('"');
            }
            Inner::Object(object) => {
                s.push('{');
                for (i, (name, value)) in object.fields.borrow().iter().enumerate() {
                    if i != 0 {
                        s.push_str(", ");
                    }
                    s.push_str(name);
                    s.push_str(": ");
                    value.collect_repr(s);
                }
                s.push('}');
            }
        }
    }
}

fn number_hash_bits(n: f64) -> u64 {
    if n.is_nan() {
        // All NaN payloads are one member.
        f64::NAN.to_bits()
    } else if n == 0.0 {
        // Covers -0.0.
        0
    } else {
        n.to_bits()
    }
}

impl KeyHash for Value {
    fn key_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match &self.0 {
            Inner::None => 0u8.hash(&mut hasher),
            Inner::Bool(b) => {
                1u8.hash(&mut hasher);
                b.hash(&mut hasher);
            }
            Inner::Number(n) => {
                2u8.hash(&mut hasher);
                number_hash_bits(*n).hash(&mut hasher);
            }
            Inner::Str(s) => {
                3u8.hash(&mut hasher);
                s.hash(&mut hasher);
            }
            Inner::Object(object) => {
                4u8.hash(&mut hasher);
                (Rc::as_ptr(object) as usize).hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.same_value_zero(other)
    }
}
impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Value[{}]({})", self.get_type(), self.to_repr())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_repr())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value(Inner::Bool(b))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value(Inner::Number(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value(Inner::Number(n as f64))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value(Inner::Number(n as f64))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value(Inner::Str(Rc::from(s)))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value(Inner::Str(Rc::from(s.as_str())))
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Value {
        Value(Inner::Object(Rc::new(object)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_zero_numbers() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_eq!(Value::from(0.0), Value::from(-0.0));
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(1), Value::from(2));
        assert_ne!(Value::from(1), Value::from(true));
    }

    #[test]
    fn same_value_zero_objects_by_identity() {
        let a = Value::object(vec![("x", Value::from(4))]);
        let b = Value::object(vec![("x", Value::from(4))]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(Value::from("set"), Value::from("set"));
    }

    #[test]
    fn hash_consistent_with_equality() {
        assert_eq!(
            Value::from(f64::NAN).key_hash(),
            Value::from(-f64::NAN).key_hash()
        );
        assert_eq!(Value::from(0.0).key_hash(), Value::from(-0.0).key_hash());
        assert_eq!(Value::from("a").key_hash(), Value::from("a").key_hash());
        let object = Value::object(vec![]);
        assert_eq!(object.key_hash(), object.clone().key_hash());
    }

    #[test]
    fn sealed_object_rejects_mutation() {
        let object = Value::object(vec![("x", Value::from(4))]);
        object.set_field("y", Value::from(5)).unwrap();
        object.seal().unwrap();
        assert!(object.is_sealed());
        assert_eq!(
            Err(ValueError::CannotMutateSealedValue),
            object.set_field("z", Value::from(6))
        );
        assert_eq!(Ok(Value::from(4)), object.get_field("x"));
        assert_eq!(
            Err(ValueError::FieldNotFound("z".to_owned())),
            object.get_field("z")
        );
    }

    #[test]
    fn field_access_on_scalars_is_unsupported() {
        assert!(Value::from(1).get_field("x").is_err());
        assert!(Value::none().seal().is_err());
    }

    #[test]
    fn repr() {
        let object = Value::object(vec![("x", Value::from(4))]);
        assert_eq!("{x: 4}", object.to_repr());
        assert_eq!("\"a\"", Value::from("a").to_repr());
        assert_eq!("none", Value::none().to_repr());
    }
}
