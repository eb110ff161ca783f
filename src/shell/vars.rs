use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::error::ShellError;

pub const PREV: &str = "prev";
pub const LAST_RESULT: &str = "last_result";

/// Values available to argument placeholders.
///
/// A string argument that is exactly `$name` is replaced by the value of
/// `name`; `{$name}` inside a longer string is replaced by its text.
/// Unknown names are left as written.
#[derive(Debug, Clone)]
pub struct ChainVars {
    values: IndexMap<String, Value>,
    pattern: Regex,
}

impl ChainVars {
    pub fn new() -> Result<Self, ShellError> {
        let pattern = Regex::new(r"\{\$([^}]+)\}")
            .map_err(|e| ShellError::Command(format!("placeholder pattern: {}", e)))?;
        Ok(Self {
            values: IndexMap::new(),
            pattern,
        })
    }

    /// Seed saved session variables.
    pub fn with_values<'v>(mut self, values: impl IntoIterator<Item = (&'v String, &'v Value)>) -> Self {
        for (name, value) in values {
            self.values.insert(name.clone(), value.clone());
        }
        self
    }

    /// Seed `$prev` / `$last_result` from an earlier command.
    pub fn with_last_result(mut self, last: Option<Value>) -> Self {
        if let Some(value) = last {
            self.values.insert(PREV.to_string(), value.clone());
            self.values.insert(LAST_RESULT.to_string(), value);
        }
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store the output of 1-based step `step`.
    pub fn record_step(&mut self, step: usize, output: &Value) {
        self.values.insert(format!("step{}_result", step), output.clone());
        self.values.insert(PREV.to_string(), output.clone());
        self.values.insert(LAST_RESULT.to_string(), output.clone());
    }

    /// Substitute placeholders in every string of `value`, recursively.
    pub fn substitute(&self, value: Value) -> Value {
        match value {
            Value::String(s) => self.substitute_str(s),
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.substitute(v)).collect()),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, self.substitute(v)))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Substitute placeholders in a template string.
    pub fn format(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &regex::Captures<'_>| match self.values.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn substitute_str(&self, s: String) -> Value {
        if let Some(name) = s.strip_prefix('$') {
            if let Some(value) = self.values.get(name) {
                return value.clone();
            }
            return Value::String(s);
        }
        if s.contains("{$") {
            return Value::String(self.format(&s));
        }
        Value::String(s)
    }
}
