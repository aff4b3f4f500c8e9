//! Adaptive Card template expansion.
//!
//! Supports the subset of the templating language the bundled cards use:
//!
//! - `"${path}"` as a whole string keeps the bound value's JSON type
//! - `"Hello ${name}!"` interpolates scalars into the surrounding text
//! - `$root.path` reaches the top-level data from inside a `$data` scope
//! - `"$data": "${items}"` on an array element repeats it once per item
//! - `"$when": "${flag}"` drops the element when the value is falsy
//!
//! A binding to a path the data does not have is an error; `null` renders
//! as an empty string.

use serde_json::{Map, Value};

use crate::ports::RenderError;

const DATA_KEY: &str = "$data";
const WHEN_KEY: &str = "$when";

/// Expands one template against its data.
pub(crate) struct Expander<'a> {
    template_id: &'a str,
    root: &'a Value,
}

impl<'a> Expander<'a> {
    pub(crate) fn new(template_id: &'a str, root: &'a Value) -> Self {
        Self { template_id, root }
    }

    pub(crate) fn expand(&self, template: &Value) -> Result<Value, RenderError> {
        self.expand_node(template, self.root)
    }

    fn expand_node(&self, node: &Value, scope: &Value) -> Result<Value, RenderError> {
        match node {
            Value::String(s) => self.expand_string(s, scope),
            Value::Array(items) => self.expand_array(items, scope).map(Value::Array),
            Value::Object(map) => {
                let scope = match map.get(DATA_KEY) {
                    Some(binding) => {
                        let bound = self.expand_node(binding, scope)?;
                        if bound.is_array() {
                            return Err(self.invalid(
                                "$data bound to an array outside of an array element",
                            ));
                        }
                        bound
                    }
                    None => scope.clone(),
                };
                self.expand_object(map, &scope).map(|expanded| {
                    expanded.map(Value::Object).unwrap_or(Value::Null)
                })
            }
            other => Ok(other.clone()),
        }
    }

    fn expand_array(&self, items: &[Value], scope: &Value) -> Result<Vec<Value>, RenderError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(map) = item else {
                out.push(self.expand_node(item, scope)?);
                continue;
            };

            match map.get(DATA_KEY) {
                Some(binding) => match self.expand_node(binding, scope)? {
                    Value::Array(repeated) => {
                        for entry in &repeated {
                            if let Some(expanded) = self.expand_object(map, entry)? {
                                out.push(Value::Object(expanded));
                            }
                        }
                    }
                    single => {
                        if let Some(expanded) = self.expand_object(map, &single)? {
                            out.push(Value::Object(expanded));
                        }
                    }
                },
                None => {
                    if let Some(expanded) = self.expand_object(map, scope)? {
                        out.push(Value::Object(expanded));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Expands an object's fields; `None` when `$when` rules it out.
    fn expand_object(
        &self,
        map: &Map<String, Value>,
        scope: &Value,
    ) -> Result<Option<Map<String, Value>>, RenderError> {
        if let Some(condition) = map.get(WHEN_KEY) {
            if !is_truthy(&self.expand_node(condition, scope)?) {
                return Ok(None);
            }
        }

        let mut out = Map::new();
        for (key, value) in map {
            if key == DATA_KEY || key == WHEN_KEY {
                continue;
            }
            out.insert(key.clone(), self.expand_node(value, scope)?);
        }
        Ok(Some(out))
    }

    fn expand_string(&self, s: &str, scope: &Value) -> Result<Value, RenderError> {
        if let Some(path) = whole_binding(s) {
            return self.resolve(path, scope).map(|v| v.clone());
        }

        if !s.contains("${") {
            return Ok(Value::String(s.to_string()));
        }

        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| self.invalid(format!("unterminated binding in '{}'", s)))?;
            let value = self.resolve(after[..end].trim(), scope)?;
            out.push_str(&scalar_text(value));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(Value::String(out))
    }

    fn resolve<'v>(&'v self, path: &str, scope: &'v Value) -> Result<&'v Value, RenderError> {
        let (mut current, rest) = if path == "$root" {
            (self.root, "")
        } else if let Some(rest) = path.strip_prefix("$root.") {
            (self.root, rest)
        } else if path == "$data" {
            (scope, "")
        } else if let Some(rest) = path.strip_prefix("$data.") {
            (scope, rest)
        } else {
            (scope, path)
        };

        if rest.is_empty() {
            return Ok(current);
        }

        for segment in rest.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| RenderError::MissingBinding {
                template_id: self.template_id.to_string(),
                path: path.to_string(),
            })?;
        }
        Ok(current)
    }

    fn invalid(&self, reason: impl Into<String>) -> RenderError {
        RenderError::InvalidTemplate {
            template_id: self.template_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// `"${path}"` with nothing around it.
fn whole_binding(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner.trim())
}

/// Text form of a bound value inside an interpolated string.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
