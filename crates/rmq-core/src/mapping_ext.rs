use serde_yaml::{Mapping, Sequence, Value};

use crate::{HarnessError, HarnessResult};

/// Returns the variant name of a manifest value for diagnostics.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// Typed accessors over nested manifest mappings.
///
/// Lookups fail with [`HarnessError::NotFound`] when a key is absent and
/// [`HarnessError::TypeMismatch`] when the value has the wrong shape, instead
/// of silently yielding `None`.
pub trait MappingExt {
    fn require(&self, key: &str) -> HarnessResult<&Value>;
    fn require_mapping(&self, key: &str) -> HarnessResult<&Mapping>;
    fn require_mapping_mut(&mut self, key: &str) -> HarnessResult<&mut Mapping>;
    fn require_str(&self, key: &str) -> HarnessResult<&str>;
    fn require_bool(&self, key: &str) -> HarnessResult<bool>;
    fn require_sequence(&self, key: &str) -> HarnessResult<&Sequence>;
    fn require_sequence_mut(&mut self, key: &str) -> HarnessResult<&mut Sequence>;
    /// Walks nested mappings, reporting the dotted path on failure.
    fn require_mapping_path(&self, path: &[&str]) -> HarnessResult<&Mapping>;
    fn require_mapping_path_mut(&mut self, path: &[&str]) -> HarnessResult<&mut Mapping>;
    /// Returns the nested mapping under `key`, inserting an empty one if absent.
    fn mapping_entry(&mut self, key: &str) -> HarnessResult<&mut Mapping>;
    fn set_value(&mut self, key: &str, value: impl Into<Value>) -> Option<Value>;
    fn remove_value(&mut self, key: &str) -> Option<Value>;
}

fn mismatch(key: &str, expected: &'static str, value: &Value) -> HarnessError {
    HarnessError::TypeMismatch {
        path: key.to_string(),
        expected,
        found: value_kind(value),
    }
}

fn missing(key: &str) -> HarnessError {
    HarnessError::not_found(format!("key '{key}'"))
}

fn with_path(error: HarnessError, path: &[&str]) -> HarnessError {
    let dotted = path.join(".");
    match error {
        HarnessError::NotFound(_) => HarnessError::not_found(format!("key '{dotted}'")),
        HarnessError::TypeMismatch {
            expected, found, ..
        } => HarnessError::TypeMismatch {
            path: dotted,
            expected,
            found,
        },
        other => other,
    }
}

impl MappingExt for Mapping {
    fn require(&self, key: &str) -> HarnessResult<&Value> {
        self.get(key).ok_or_else(|| missing(key))
    }

    fn require_mapping(&self, key: &str) -> HarnessResult<&Mapping> {
        let value = self.require(key)?;
        value
            .as_mapping()
            .ok_or_else(|| mismatch(key, "mapping", value))
    }

    fn require_mapping_mut(&mut self, key: &str) -> HarnessResult<&mut Mapping> {
        let value = self.get_mut(key).ok_or_else(|| missing(key))?;
        if !value.is_mapping() {
            return Err(mismatch(key, "mapping", value));
        }
        value
            .as_mapping_mut()
            .ok_or_else(|| HarnessError::not_found(format!("key '{key}'")))
    }

    fn require_str(&self, key: &str) -> HarnessResult<&str> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| mismatch(key, "string", value))
    }

    fn require_bool(&self, key: &str) -> HarnessResult<bool> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| mismatch(key, "bool", value))
    }

    fn require_sequence(&self, key: &str) -> HarnessResult<&Sequence> {
        let value = self.require(key)?;
        value
            .as_sequence()
            .ok_or_else(|| mismatch(key, "sequence", value))
    }

    fn require_sequence_mut(&mut self, key: &str) -> HarnessResult<&mut Sequence> {
        let value = self.get_mut(key).ok_or_else(|| missing(key))?;
        if !value.is_sequence() {
            return Err(mismatch(key, "sequence", value));
        }
        value
            .as_sequence_mut()
            .ok_or_else(|| HarnessError::not_found(format!("key '{key}'")))
    }

    fn require_mapping_path(&self, path: &[&str]) -> HarnessResult<&Mapping> {
        let mut current: &Mapping = self;
        for (depth, key) in path.iter().enumerate() {
            current = current
                .require_mapping(key)
                .map_err(|error| with_path(error, &path[..=depth]))?;
        }
        Ok(current)
    }

    fn require_mapping_path_mut(&mut self, path: &[&str]) -> HarnessResult<&mut Mapping> {
        let mut current: &mut Mapping = self;
        for (depth, key) in path.iter().enumerate() {
            current = current
                .require_mapping_mut(key)
                .map_err(|error| with_path(error, &path[..=depth]))?;
        }
        Ok(current)
    }

    fn mapping_entry(&mut self, key: &str) -> HarnessResult<&mut Mapping> {
        if !self.contains_key(key) {
            self.insert(Value::from(key), Value::Mapping(Mapping::new()));
        }
        self.require_mapping_mut(key)
    }

    fn set_value(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.insert(Value::from(key), value.into())
    }

    fn remove_value(&mut self, key: &str) -> Option<Value> {
        self.remove(key)
    }
}
