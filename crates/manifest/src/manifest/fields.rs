//! Typed readers over a JSON object that record failures by field path.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationErrors};
use crate::url::{validate_url, UrlRules};

/// A view of one JSON object in the manifest, addressed by `prefix`.
pub(crate) struct Fields<'a> {
    object: &'a Map<String, Value>,
    prefix: String,
}

enum Slot<'a> {
    Missing,
    Null,
    Present(&'a Value),
}

impl<'a> Fields<'a> {
    pub(crate) fn root(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            prefix: String::new(),
        }
    }

    /// Reads `value` as an object nested at `path`; reports under `path` otherwise.
    pub(crate) fn nested(
        value: &'a Value,
        path: String,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        match value.as_object() {
            Some(object) => Some(Self {
                object,
                prefix: path,
            }),
            None => {
                errors.add(path, FieldError::invalid("value is not a valid dict"));
                None
            }
        }
    }

    pub(crate) fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.prefix)
        }
    }

    fn slot(&self, field: &str) -> Slot<'a> {
        match self.object.get(field) {
            None => Slot::Missing,
            Some(Value::Null) => Slot::Null,
            Some(value) => Slot::Present(value),
        }
    }

    pub(crate) fn required_str(
        &self,
        field: &str,
        max_length: Option<usize>,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        match self.slot(field) {
            Slot::Missing => {
                errors.add(self.path(field), FieldError::required());
                None
            }
            Slot::Null => {
                errors.add(self.path(field), none_not_allowed());
                None
            }
            Slot::Present(value) => self.checked_str(field, value, max_length, errors),
        }
    }

    pub(crate) fn optional_str(
        &self,
        field: &str,
        max_length: Option<usize>,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        match self.slot(field) {
            Slot::Missing | Slot::Null => None,
            Slot::Present(value) => self.checked_str(field, value, max_length, errors),
        }
    }

    fn checked_str(
        &self,
        field: &str,
        value: &Value,
        max_length: Option<usize>,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        let result = coerce_str(value).and_then(|text| match max_length {
            Some(max) if text.chars().count() > max => Err(FieldError::invalid(format!(
                "ensure this value has at most {max} characters"
            ))),
            _ => Ok(text),
        });
        self.record(field, result, errors)
    }

    pub(crate) fn required_url(
        &self,
        field: &str,
        rules: &UrlRules,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        let text = self.required_str(field, None, errors)?;
        self.record(field, validate_url(&text, rules), errors)
    }

    pub(crate) fn optional_url(
        &self,
        field: &str,
        rules: &UrlRules,
        errors: &mut ValidationErrors,
    ) -> Option<String> {
        let text = self.optional_str(field, None, errors)?;
        self.record(field, validate_url(&text, rules), errors)
    }

    /// Reads a boolean, falling back to `default` when absent.
    pub(crate) fn bool_or(
        &self,
        field: &str,
        default: bool,
        errors: &mut ValidationErrors,
    ) -> Option<bool> {
        match self.slot(field) {
            Slot::Missing => Some(default),
            Slot::Null => {
                errors.add(self.path(field), none_not_allowed());
                None
            }
            Slot::Present(value) => self.record(field, coerce_bool(value), errors),
        }
    }

    /// Reads a list; absent and `null` both mean empty.
    pub(crate) fn list(&self, field: &str, errors: &mut ValidationErrors) -> Option<&'a [Value]> {
        match self.slot(field) {
            Slot::Missing | Slot::Null => Some(&[][..]),
            Slot::Present(Value::Array(items)) => Some(items.as_slice()),
            Slot::Present(_) => {
                errors.add(self.path(field), FieldError::invalid("value is not a valid list"));
                None
            }
        }
    }

    /// Reads a string-to-string map; absent and `null` both mean empty.
    pub(crate) fn string_map(
        &self,
        field: &str,
        errors: &mut ValidationErrors,
    ) -> Option<BTreeMap<String, String>> {
        let object = match self.slot(field) {
            Slot::Missing | Slot::Null => return Some(BTreeMap::new()),
            Slot::Present(Value::Object(object)) => object,
            Slot::Present(_) => {
                errors.add(self.path(field), FieldError::invalid("value is not a valid dict"));
                return None;
            }
        };

        let mut map = BTreeMap::new();
        let mut valid = true;
        for (key, value) in object {
            match coerce_str(value) {
                Ok(text) => {
                    map.insert(key.clone(), text);
                }
                Err(error) => {
                    errors.add(format!("{}.{key}", self.path(field)), error);
                    valid = false;
                }
            }
        }
        valid.then_some(map)
    }

    /// Unwraps `result`, recording the error under `field`.
    pub(crate) fn record<T>(
        &self,
        field: &str,
        result: Result<T, FieldError>,
        errors: &mut ValidationErrors,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                errors.add(self.path(field), error);
                None
            }
        }
    }
}

/// Strings pass through; numbers are accepted in their JSON text form.
pub(crate) fn coerce_str(value: &Value) -> Result<String, FieldError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Null => Err(none_not_allowed()),
        _ => Err(FieldError::invalid("str type expected")),
    }
}

fn coerce_bool(value: &Value) -> Result<bool, FieldError> {
    let parsed = match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "1" | "on" | "t" | "true" | "y" | "yes" => Some(true),
            "0" | "off" | "f" | "false" | "n" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed.ok_or_else(|| FieldError::invalid("value could not be parsed to a boolean"))
}

fn none_not_allowed() -> FieldError {
    FieldError::invalid("none is not an allowed value")
}
