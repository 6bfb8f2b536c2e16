//! Property definitions.
//!
//! A `PropertyDef` is the in-memory form of one property's schema: its kind,
//! the constraints that go with that kind, and whether it may be expressed
//! as scoped rules. Definitions are built in code by the theme modules or
//! deserialized from a layer file:
//!
//! ```json
//! { "kind": "array", "items": { "kind": "enum", "values": ["is_bridge", "is_tunnel"] },
//!   "uniqueItems": true, "scoping": { "qualifiers": "GEOMETRIC" } }
//! ```

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};

use crate::scoping::Scoping;

/// A compiled regular expression usable in definitions.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&Regex> for Pattern {
    fn from(regex: &Regex) -> Self {
        Pattern(regex.clone())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Semantic checks beyond a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    /// RFC 3339 date-time that names a real instant.
    DateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PropertyKind {
    String {
        #[serde(default)]
        pattern: Option<Pattern>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        format: Option<StringFormat>,
    },
    Number {
        #[serde(default)]
        minimum: Option<f64>,
        #[serde(default)]
        maximum: Option<f64>,
    },
    Integer {
        #[serde(default)]
        minimum: Option<f64>,
        #[serde(default)]
        maximum: Option<f64>,
    },
    Boolean,
    Enum {
        values: Vec<String>,
    },
    Array {
        items: Box<PropertyDef>,
        #[serde(default)]
        min_items: usize,
        #[serde(default)]
        unique_items: bool,
    },
    Tuple {
        items: Vec<PropertyDef>,
    },
    Object {
        #[serde(default)]
        properties: BTreeMap<String, PropertyDef>,
        #[serde(default)]
        required: BTreeSet<String>,
    },
    Map {
        values: Box<PropertyDef>,
        #[serde(default)]
        key_pattern: Option<Pattern>,
    },
}

impl PropertyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKind::String { .. } => "string",
            PropertyKind::Number { .. } => "number",
            PropertyKind::Integer { .. } => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Enum { .. } => "enum",
            PropertyKind::Array { .. } => "array",
            PropertyKind::Tuple { .. } => "tuple",
            PropertyKind::Object { .. } => "object",
            PropertyKind::Map { .. } => "map",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDef {
    #[serde(flatten)]
    pub kind: PropertyKind,
    #[serde(default)]
    pub scoping: Option<Scoping>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<PropertyKind> for PropertyDef {
    fn from(kind: PropertyKind) -> Self {
        PropertyDef { kind, scoping: None, description: None }
    }
}

// --- Constructors -------------------------------------------------------------

impl PropertyDef {
    pub fn string() -> Self {
        PropertyKind::String { pattern: None, min_length: None, format: None }.into()
    }

    pub fn number() -> Self {
        PropertyKind::Number { minimum: None, maximum: None }.into()
    }

    pub fn integer() -> Self {
        PropertyKind::Integer { minimum: None, maximum: None }.into()
    }

    pub fn boolean() -> Self {
        PropertyKind::Boolean.into()
    }

    pub fn enumeration(values: &[&str]) -> Self {
        PropertyKind::Enum { values: values.iter().map(|v| v.to_string()).collect() }.into()
    }

    pub fn array(items: PropertyDef) -> Self {
        PropertyKind::Array { items: Box::new(items), min_items: 0, unique_items: false }.into()
    }

    pub fn tuple(items: Vec<PropertyDef>) -> Self {
        PropertyKind::Tuple { items }.into()
    }

    pub fn object<'a>(properties: impl IntoIterator<Item = (&'a str, PropertyDef)>) -> Self {
        PropertyKind::Object {
            properties: properties.into_iter().map(|(name, def)| (name.to_string(), def)).collect(),
            required: BTreeSet::new(),
        }
        .into()
    }

    pub fn map(values: PropertyDef) -> Self {
        PropertyKind::Map { values: Box::new(values), key_pattern: None }.into()
    }
}

// --- Modifiers ----------------------------------------------------------------
//
// Modifiers that do not apply to the definition's kind are ignored.

impl PropertyDef {
    pub fn pattern(mut self, regex: &Regex) -> Self {
        match &mut self.kind {
            PropertyKind::String { pattern, .. } => *pattern = Some(regex.into()),
            PropertyKind::Map { key_pattern, .. } => *key_pattern = Some(regex.into()),
            _ => {}
        }
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        if let PropertyKind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(len);
        }
        self
    }

    pub fn format(mut self, value: StringFormat) -> Self {
        if let PropertyKind::String { format, .. } = &mut self.kind {
            *format = Some(value);
        }
        self
    }

    pub fn minimum(mut self, value: f64) -> Self {
        if let PropertyKind::Number { minimum, .. } | PropertyKind::Integer { minimum, .. } = &mut self.kind {
            *minimum = Some(value);
        }
        self
    }

    pub fn maximum(mut self, value: f64) -> Self {
        if let PropertyKind::Number { maximum, .. } | PropertyKind::Integer { maximum, .. } = &mut self.kind {
            *maximum = Some(value);
        }
        self
    }

    pub fn min_items(mut self, count: usize) -> Self {
        if let PropertyKind::Array { min_items, .. } = &mut self.kind {
            *min_items = count;
        }
        self
    }

    pub fn unique(mut self) -> Self {
        if let PropertyKind::Array { unique_items, .. } = &mut self.kind {
            *unique_items = true;
        }
        self
    }

    pub fn required(mut self, names: &[&str]) -> Self {
        if let PropertyKind::Object { required, .. } = &mut self.kind {
            required.extend(names.iter().map(|name| name.to_string()));
        }
        self
    }

    pub fn scoped(mut self, scoping: Scoping) -> Self {
        self.scoping = Some(scoping);
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// Nested definition reached by a `/`-separated path through objects.
    pub fn child(&self, path: &str) -> Option<&PropertyDef> {
        path.split('/').filter(|part| !part.is_empty()).try_fold(self, |def, part| match &def.kind {
            PropertyKind::Object { properties, .. } => properties.get(part),
            _ => None,
        })
    }
}
