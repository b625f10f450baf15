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

//! Error types for value operations, with conversion to diagnostics.

use codemap::Span;
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};

// SV prefix = Shim Value
const SEALED_VALUE_ERROR_CODE: &str = "SV00";
const OPERATION_NOT_SUPPORTED_ERROR_CODE: &str = "SV01";
const FIELD_NOT_FOUND_ERROR_CODE: &str = "SV02";
const BROKEN_SOURCE_ERROR_CODE: &str = "SV03";

/// Error raised by an operation on a [`Value`](crate::values::Value) or on
/// a container of values.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Raised when mutating a sealed object.
    CannotMutateSealedValue,
    /// The operation is not defined for the value's type.
    OperationNotSupported { op: String, on: String },
    /// Field access on an object that does not carry the field.
    FieldNotFound(String),
    /// A caller-supplied source sequence failed while being pulled.
    BrokenSource(String),
    Runtime(RuntimeError),
}

/// A generic runtime error with a diagnostic code, as reported to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub code: &'static str,
    pub label: String,
    pub message: String,
}

impl RuntimeError {
    pub fn to_diagnostic(&self, file_span: Span) -> Diagnostic {
        Diagnostic {
            level: Level::Error,
            message: self.message.clone(),
            code: Some(self.code.to_owned()),
            spans: vec![SpanLabel {
                span: file_span,
                style: SpanStyle::Primary,
                label: Some(self.label.clone()),
            }],
        }
    }
}

impl Into<RuntimeError> for ValueError {
    fn into(self) -> RuntimeError {
        match self {
            ValueError::CannotMutateSealedValue => RuntimeError {
                code: SEALED_VALUE_ERROR_CODE,
                label: "This value is sealed".to_owned(),
                message: "Cannot mutate a sealed value".to_owned(),
            },
            ValueError::OperationNotSupported { ref op, ref on } => RuntimeError {
                code: OPERATION_NOT_SUPPORTED_ERROR_CODE,
                label: format!("Operation '{}' not supported", op),
                message: format!("Operation '{}' not supported on type '{}'", op, on),
            },
            ValueError::FieldNotFound(ref name) => RuntimeError {
                code: FIELD_NOT_FOUND_ERROR_CODE,
                label: "Field not found".to_owned(),
                message: format!("Object has no field '{}'", name),
            },
            ValueError::BrokenSource(ref reason) => RuntimeError {
                code: BROKEN_SOURCE_ERROR_CODE,
                label: "Source sequence failed".to_owned(),
                message: format!("Failure while pulling from a source sequence: {}", reason),
            },
            ValueError::Runtime(e) => e,
        }
    }
}

impl ValueError {
    pub fn to_diagnostic(self, file_span: Span) -> Diagnostic {
        let runtime: RuntimeError = self.into();
        runtime.to_diagnostic(file_span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemap::CodeMap;

    #[test]
    fn diagnostic_carries_code_and_label() {
        let mut map = CodeMap::new();
        let file = map.add_file("shim".to_owned(), "set".to_owned());
        let err = ValueError::BrokenSource("stop".to_owned());
        let diagnostic = err.to_diagnostic(file.span);
        assert_eq!(Some(BROKEN_SOURCE_ERROR_CODE.to_owned()), diagnostic.code);
        assert_eq!(Level::Error, diagnostic.level);
        assert!(diagnostic.message.contains("stop"));
    }

    #[test]
    fn sealed_error_is_distinct() {
        let runtime: RuntimeError = ValueError::CannotMutateSealedValue.into();
        assert_eq!(SEALED_VALUE_ERROR_CODE, runtime.code);
    }
}
