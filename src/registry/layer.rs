//! Schema layers: the unit of registration.
//!
//! A base layer describes a `(theme, type)` pair. A subtype layer adds
//! properties on top of its base and is selected by the base's discriminator
//! property. Layers are usually built with the `layer!` macro; external
//! layers can be loaded from JSON:
//!
//! ```json
//! { "theme": "transportation", "type": "segment", "subtype": "cable_car",
//!   "geometry": ["LineString"], "required": ["class"],
//!   "properties": { "class": { "kind": "enum", "values": ["gondola", "chair_lift"] } },
//!   "defaultModes": "FOOT" }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumString};

use super::property::PropertyDef;
use crate::scoping::ModeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Display, EnumString, AsRefStr)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

/// `(theme, type[, subtype])`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureType {
    pub theme: String,
    pub kind: String,
    pub subtype: Option<String>,
}

impl FeatureType {
    pub fn new(theme: &str, kind: &str, subtype: Option<&str>) -> Self {
        FeatureType { theme: theme.to_string(), kind: kind.to_string(), subtype: subtype.map(str::to_string) }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.theme, self.kind)?;
        if let Some(subtype) = &self.subtype {
            write!(f, "/{subtype}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaLayer {
    pub theme: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    /// Allowed geometry types. Empty on a base means any geometry; empty on
    /// a subtype means "inherit from the base".
    #[serde(default)]
    pub geometry: Vec<GeometryType>,
    /// Base-layer property whose value selects a subtype layer.
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub required: BTreeSet<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDef>,
    /// Modes a rule without `modes`/`notModes` applies to.
    #[serde(default)]
    pub default_modes: Option<ModeSet>,
}

impl SchemaLayer {
    pub fn feature_type(&self) -> FeatureType {
        FeatureType::new(&self.theme, &self.kind, self.subtype.as_deref())
    }

    pub fn is_subtype(&self) -> bool {
        self.subtype.is_some()
    }

    /// Add properties (and their required names) that are not already declared.
    pub fn with_properties(mut self, properties: Vec<(&str, PropertyDef)>, required: &[&str]) -> Self {
        for (name, def) in properties {
            self.properties.entry(name.to_string()).or_insert(def);
        }
        self.required.extend(required.iter().map(|name| name.to_string()));
        self
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
