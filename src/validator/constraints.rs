//! Per-property constraint checks.
//!
//! ```text
//! object ── required ──▶ constraints ──▶ closed world
//!              │              │
//!              │              ├─ scoped + rule array ─▶ rule shape ─▶ value constraints
//!              │              └─ otherwise ───────────────────────▶ value constraints
//!              │                                                         │
//!              └──────────────── nested objects recurse ◀────────────────┘
//! ```

use chrono::DateTime;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::ValidatorOptions;
use super::report::{Violations, pointer};
use crate::registry::{PropertyDef, PropertyKind, StringFormat};
use crate::scoping::{ScopedRule, Scoping};

/// Extension properties are permitted at every object level.
pub fn is_extension(name: &str) -> bool {
    name.starts_with("ext")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(super) struct Checker<'a> {
    pub options: &'a ValidatorOptions,
    pub out: &'a mut Violations,
}

impl Checker<'_> {
    /// Check an object against a closed property table.
    pub fn object(
        &mut self,
        path: &str,
        object: &Map<String, Value>,
        properties: &BTreeMap<String, PropertyDef>,
        required: &BTreeSet<String>,
        depth: usize,
    ) {
        if !self.within_depth(path, depth) {
            return;
        }

        for name in required {
            if !object.contains_key(name) {
                self.out.push(&pointer(path, name), format!("missing required property '{name}'"));
            }
        }

        for (name, value) in object {
            if let Some(def) = properties.get(name) {
                self.property(&pointer(path, name), value, def, depth);
            }
        }

        for name in object.keys() {
            if !properties.contains_key(name) && !is_extension(name) {
                self.out.push(&pointer(path, name), format!("unexpected property '{name}'"));
            }
        }
    }

    /// Check a property that may be expressed as scoped rules.
    pub fn property(&mut self, path: &str, value: &Value, def: &PropertyDef, depth: usize) {
        match &def.scoping {
            Some(scoping) if scoping.is_rule_array(value) => self.rules(path, value, def, scoping, depth),
            Some(scoping) if scoping.rules_only => {
                self.out.push(path, format!("expected an array of rules with '{}' values", scoping.value_key))
            }
            _ => self.value(path, value, def, depth),
        }
    }

    fn rules(&mut self, path: &str, value: &Value, def: &PropertyDef, scoping: &Scoping, depth: usize) {
        let Some(items) = value.as_array() else {
            return;
        };
        if items.is_empty() {
            self.out.push(path, "rule array must not be empty");
            return;
        }
        if items.len() > self.options.max_rules {
            self.out.push(path, format!("{} rules exceed the limit of {}", items.len(), self.options.max_rules));
            return;
        }

        for (index, raw) in items.iter().enumerate() {
            let rule_path = pointer(path, index);
            if let Err(issues) = ScopedRule::inspect(raw, scoping) {
                for issue in issues {
                    let at = issue.key.as_deref().map_or_else(|| rule_path.clone(), |key| pointer(&rule_path, key));
                    self.out.push(&at, issue.defect.to_string());
                }
            }
            if let Some(rule_value) = raw.get(&scoping.value_key) {
                self.value(&pointer(&rule_path, &scoping.value_key), rule_value, def, depth + 1);
            }
        }
    }

    fn value(&mut self, path: &str, value: &Value, def: &PropertyDef, depth: usize) {
        if !self.within_depth(path, depth) {
            return;
        }

        match &def.kind {
            PropertyKind::String { pattern, min_length, format } => {
                let Some(text) = value.as_str() else {
                    return self.mismatch(path, def, value);
                };
                if let Some(pattern) = pattern {
                    if !pattern.is_match(text) {
                        self.out.push(path, format!("'{text}' does not match pattern '{}'", pattern.as_str()));
                    }
                }
                if let Some(min) = min_length {
                    if text.chars().count() < *min {
                        self.out.push(path, format!("must be at least {min} characters long"));
                    }
                }
                if let Some(StringFormat::DateTime) = format {
                    if DateTime::parse_from_rfc3339(text).is_err() {
                        self.out.push(path, format!("'{text}' is not a valid RFC 3339 date-time"));
                    }
                }
            }
            PropertyKind::Number { minimum, maximum } => {
                let Some(number) = value.as_f64() else {
                    return self.mismatch(path, def, value);
                };
                self.bounds(path, number, *minimum, *maximum);
            }
            PropertyKind::Integer { minimum, maximum } => {
                let Some(number) = value.as_f64().filter(|n| n.fract() == 0.0) else {
                    return self.mismatch(path, def, value);
                };
                self.bounds(path, number, *minimum, *maximum);
            }
            PropertyKind::Boolean => {
                if !value.is_boolean() {
                    self.mismatch(path, def, value);
                }
            }
            PropertyKind::Enum { values } => match value.as_str() {
                Some(text) if values.iter().any(|allowed| allowed == text) => {}
                Some(text) => self.out.push(path, format!("'{text}' is not one of: {}", values.join(", "))),
                None => self.mismatch(path, def, value),
            },
            PropertyKind::Array { items, min_items, unique_items } => {
                let Some(elements) = value.as_array() else {
                    return self.mismatch(path, def, value);
                };
                if elements.len() < *min_items {
                    self.out.push(path, format!("must contain at least {min_items} items"));
                }
                if *unique_items {
                    for (i, element) in elements.iter().enumerate() {
                        if elements[..i].contains(element) {
                            self.out.push(&pointer(path, i), "duplicate array item");
                        }
                    }
                }
                for (i, element) in elements.iter().enumerate() {
                    self.property(&pointer(path, i), element, items, depth + 1);
                }
            }
            PropertyKind::Tuple { items } => {
                let Some(elements) = value.as_array() else {
                    return self.mismatch(path, def, value);
                };
                if elements.len() != items.len() {
                    self.out.push(path, format!("expected exactly {} items, found {}", items.len(), elements.len()));
                }
                for (i, (element, item)) in elements.iter().zip(items).enumerate() {
                    self.value(&pointer(path, i), element, item, depth + 1);
                }
            }
            PropertyKind::Object { properties, required } => {
                let Some(object) = value.as_object() else {
                    return self.mismatch(path, def, value);
                };
                self.object(path, object, properties, required, depth + 1);
            }
            PropertyKind::Map { values, key_pattern } => {
                let Some(object) = value.as_object() else {
                    return self.mismatch(path, def, value);
                };
                for (key, entry) in object {
                    let entry_path = pointer(path, key);
                    if let Some(pattern) = key_pattern {
                        if !pattern.is_match(key) {
                            self.out.push(&entry_path, format!("key '{key}' does not match pattern '{}'", pattern.as_str()));
                        }
                    }
                    self.property(&entry_path, entry, values, depth + 1);
                }
            }
        }
    }

    fn bounds(&mut self, path: &str, number: f64, minimum: Option<f64>, maximum: Option<f64>) {
        if let Some(min) = minimum.filter(|min| number < *min) {
            self.out.push(path, format!("{number} is less than the minimum of {min}"));
        }
        if let Some(max) = maximum.filter(|max| number > *max) {
            self.out.push(path, format!("{number} is greater than the maximum of {max}"));
        }
    }

    fn mismatch(&mut self, path: &str, def: &PropertyDef, value: &Value) {
        self.out.push(path, format!("expected {}, found {}", def.kind.name(), json_type(value)));
    }

    fn within_depth(&mut self, path: &str, depth: usize) -> bool {
        if depth > self.options.max_depth {
            self.out.push(path, format!("nesting exceeds the maximum depth of {}", self.options.max_depth));
            return false;
        }
        true
    }
}
