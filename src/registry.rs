//! Schema registry.
//!
//! Registration and lookup are split across two types so that the lookup side
//! never needs a lock:
//!
//! ```text
//! RegistryBuilder ── register / register_override ──▶ layers (mutable)
//!        │
//!        └─ freeze() ── merge subtype layers onto bases ──▶ Registry (immutable, Send + Sync)
//!                                                              │
//!                                               resolve(theme, type, subtype?)
//! ```
//!
//! Merging is additive: required sets and property tables are unioned, and a
//! property declared by both a base and one of its subtype layers is an error.

#[path = "registry/layer.rs"]
mod layer;
#[path = "registry/property.rs"]
mod property;

pub use layer::{FeatureType, GeometryType, SchemaLayer};
pub use property::{Pattern, PropertyDef, PropertyKind, StringFormat};

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::scoping::ModeSet;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("no schema registered for feature type {theme}/{kind}")]
    UnknownFeatureType { theme: String, kind: String },

    #[error("feature type {0} is already registered")]
    DuplicateRegistration(FeatureType),

    #[error("property '{property}' of {feature_type} is declared by both the base schema and the subtype layer")]
    PropertyCollision { feature_type: FeatureType, property: String },

    #[error("subtype layer {0} has no base schema")]
    OrphanSubtype(FeatureType),

    #[error("invalid schema layer {feature_type}: {message}")]
    InvalidLayer { feature_type: FeatureType, message: String },

    #[error("schema layer could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A base schema merged with (at most) one subtype layer.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub feature_type: FeatureType,
    /// Allowed geometry types; empty means any.
    pub geometry: Vec<GeometryType>,
    pub discriminator: Option<String>,
    pub required: BTreeSet<String>,
    pub properties: BTreeMap<String, PropertyDef>,
    pub default_modes: ModeSet,
}

impl ResolvedSchema {
    pub fn allows_geometry(&self, geometry: GeometryType) -> bool {
        self.geometry.is_empty() || self.geometry.contains(&geometry)
    }

    /// Definition of a property addressed by a `/`-separated path.
    pub fn property(&self, path: &str) -> Option<&PropertyDef> {
        let path = path.trim_start_matches('/');
        let (head, rest) = path.split_once('/').unwrap_or((path, ""));
        let def = self.properties.get(head)?;
        if rest.is_empty() { Some(def) } else { def.child(rest) }
    }

    fn from_base(layer: SchemaLayer) -> Self {
        ResolvedSchema {
            feature_type: layer.feature_type(),
            geometry: layer.geometry,
            discriminator: layer.discriminator,
            required: layer.required,
            properties: layer.properties,
            default_modes: layer.default_modes.unwrap_or(ModeSet::all()),
        }
    }

    fn merge(base: &ResolvedSchema, layer: SchemaLayer) -> Result<Self, SchemaError> {
        let feature_type = layer.feature_type();

        let geometry = if layer.geometry.is_empty() {
            base.geometry.clone()
        } else {
            if let Some(extra) = layer.geometry.iter().find(|g| !base.allows_geometry(**g)) {
                return Err(SchemaError::InvalidLayer {
                    feature_type,
                    message: format!("geometry {extra} is not allowed by the base schema"),
                });
            }
            layer.geometry
        };

        let mut properties = base.properties.clone();
        for (name, def) in layer.properties {
            if properties.contains_key(&name) {
                return Err(SchemaError::PropertyCollision { feature_type, property: name });
            }
            properties.insert(name, def);
        }

        let mut required = base.required.clone();
        required.extend(layer.required);

        Ok(ResolvedSchema {
            feature_type,
            geometry,
            discriminator: base.discriminator.clone(),
            required,
            properties,
            default_modes: layer.default_modes.unwrap_or(base.default_modes),
        })
    }
}

/// Mutable registration phase. Call [`RegistryBuilder::freeze`] once every
/// layer is registered.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    layers: BTreeMap<FeatureType, SchemaLayer>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Add a layer; registering the same feature type twice is an error.
    pub fn register(&mut self, layer: SchemaLayer) -> Result<&mut Self, SchemaError> {
        let feature_type = layer.feature_type();
        if self.layers.contains_key(&feature_type) {
            return Err(SchemaError::DuplicateRegistration(feature_type));
        }
        debug!("[registry] register {feature_type}");
        self.layers.insert(feature_type, layer);
        Ok(self)
    }

    /// Add or replace a layer, returning the one it replaced.
    pub fn register_override(&mut self, layer: SchemaLayer) -> Option<SchemaLayer> {
        let feature_type = layer.feature_type();
        let previous = self.layers.insert(feature_type.clone(), layer);
        if previous.is_some() {
            debug!("[registry] override {feature_type}");
        }
        previous
    }

    pub fn contains(&self, feature_type: &FeatureType) -> bool {
        self.layers.contains_key(feature_type)
    }

    /// Merge every subtype layer onto its base and seal the registry.
    pub fn freeze(self) -> Result<Registry, SchemaError> {
        let (bases, subtypes): (Vec<_>, Vec<_>) = self.layers.into_values().partition(|layer| !layer.is_subtype());

        let mut themes: BTreeMap<String, BTreeMap<String, TypeEntry>> = BTreeMap::new();
        for layer in bases {
            let entry = TypeEntry { base: ResolvedSchema::from_base(layer.clone()), subtypes: BTreeMap::new() };
            themes.entry(layer.theme).or_default().insert(layer.kind, entry);
        }

        for layer in subtypes {
            let feature_type = layer.feature_type();
            let entry = themes
                .get_mut(&layer.theme)
                .and_then(|types| types.get_mut(&layer.kind))
                .ok_or_else(|| SchemaError::OrphanSubtype(feature_type.clone()))?;
            let subtype = layer.subtype.clone().unwrap_or_default();
            let merged = ResolvedSchema::merge(&entry.base, layer)?;
            entry.subtypes.insert(subtype, merged);
        }

        let count: usize = themes.values().flat_map(|types| types.values()).map(|entry| 1 + entry.subtypes.len()).sum();
        debug!("[registry] frozen with {count} schemas across {} themes", themes.len());

        Ok(Registry { themes })
    }
}

#[derive(Debug)]
struct TypeEntry {
    base: ResolvedSchema,
    subtypes: BTreeMap<String, ResolvedSchema>,
}

/// Immutable, merged schemas.
#[derive(Debug)]
pub struct Registry {
    themes: BTreeMap<String, BTreeMap<String, TypeEntry>>,
}

impl Registry {
    /// Resolve the schema for `(theme, type)` and optional subtype. An
    /// unknown subtype resolves to the base schema alone.
    pub fn resolve(&self, theme: &str, kind: &str, subtype: Option<&str>) -> Result<&ResolvedSchema, SchemaError> {
        let entry = self.themes.get(theme).and_then(|types| types.get(kind)).ok_or_else(|| {
            SchemaError::UnknownFeatureType { theme: theme.to_string(), kind: kind.to_string() }
        })?;

        Ok(subtype.and_then(|name| entry.subtypes.get(name)).unwrap_or(&entry.base))
    }

    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn types(&self, theme: &str) -> impl Iterator<Item = &str> {
        self.themes.get(theme).into_iter().flat_map(|types| types.keys().map(String::as_str))
    }

    pub fn subtypes(&self, theme: &str, kind: &str) -> impl Iterator<Item = &str> {
        self.themes
            .get(theme)
            .and_then(|types| types.get(kind))
            .into_iter()
            .flat_map(|entry| entry.subtypes.keys().map(String::as_str))
    }

    /// Every registered feature type, bases before their subtypes.
    pub fn feature_types(&self) -> Vec<FeatureType> {
        let mut out = Vec::new();
        for types in self.themes.values() {
            for entry in types.values() {
                out.push(entry.base.feature_type.clone());
                out.extend(entry.subtypes.values().map(|schema| schema.feature_type.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> SchemaLayer {
        layer! {
            theme: "transportation",
            kind: "segment",
            geometry: [LineString],
            discriminator: "subtype",
            required: ["subtype"],
            properties: {
                "subtype" => PropertyDef::enumeration(&["road", "rail"]),
                "names" => PropertyDef::string(),
            }
        }
    }

    fn road() -> SchemaLayer {
        layer! {
            theme: "transportation",
            kind: "segment",
            subtype: "road",
            required: ["class"],
            properties: {
                "class" => PropertyDef::enumeration(&["primary", "residential"]),
            }
        }
    }

    fn rail() -> SchemaLayer {
        layer! {
            theme: "transportation",
            kind: "segment",
            subtype: "rail",
            default_modes: ModeSet::empty(),
            properties: {}
        }
    }

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new();
        builder.register(segment()).unwrap().register(road()).unwrap().register(rail()).unwrap();
        builder.freeze().unwrap()
    }

    #[test]
    fn resolves_base_plus_subtype() {
        let registry = registry();
        let schema = registry.resolve("transportation", "segment", Some("road")).unwrap();
        assert_eq!(schema.feature_type.to_string(), "transportation/segment/road");
        assert!(schema.required.contains("subtype"));
        assert!(schema.required.contains("class"));
        assert!(schema.properties.contains_key("names"));
        assert!(schema.properties.contains_key("class"));
        assert_eq!(schema.geometry, vec![GeometryType::LineString]);
        assert_eq!(schema.discriminator.as_deref(), Some("subtype"));
        assert_eq!(schema.default_modes, ModeSet::all());
    }

    #[test]
    fn unknown_subtype_falls_back_to_base() {
        let registry = registry();
        let schema = registry.resolve("transportation", "segment", Some("water")).unwrap();
        assert_eq!(schema.feature_type.subtype, None);
        assert!(!schema.properties.contains_key("class"));
    }

    #[test]
    fn subtype_layers_can_declare_default_modes() {
        let registry = registry();
        assert_eq!(registry.resolve("transportation", "segment", Some("rail")).unwrap().default_modes, ModeSet::empty());
    }

    #[test]
    fn unknown_feature_type_is_an_error() {
        let registry = registry();
        let err = registry.resolve("transportation", "connector", None).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownFeatureType { ref kind, .. } if kind == "connector"));
    }

    #[test]
    fn duplicate_registration_is_rejected_but_override_is_not() {
        let mut builder = RegistryBuilder::new();
        builder.register(segment()).unwrap();
        let err = builder.register(segment()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateRegistration(_)));

        let replaced = builder.register_override(segment());
        assert!(replaced.is_some());
        assert!(builder.register_override(road()).is_none());
        assert!(builder.contains(&FeatureType::new("transportation", "segment", Some("road"))));
    }

    #[test]
    fn colliding_property_is_rejected_at_freeze() {
        let clash = layer! {
            theme: "transportation",
            kind: "segment",
            subtype: "road",
            properties: { "names" => PropertyDef::string() }
        };
        let mut builder = RegistryBuilder::new();
        builder.register(segment()).unwrap().register(clash).unwrap();
        let err = builder.freeze().unwrap_err();
        assert!(matches!(err, SchemaError::PropertyCollision { ref property, .. } if property == "names"));
    }

    #[test]
    fn orphan_subtype_is_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register(road()).unwrap();
        assert!(matches!(builder.freeze().unwrap_err(), SchemaError::OrphanSubtype(_)));
    }

    #[test]
    fn subtype_geometry_must_narrow_base() {
        let wide = layer! {
            theme: "transportation",
            kind: "segment",
            subtype: "ferry",
            geometry: [Polygon],
            properties: {}
        };
        let mut builder = RegistryBuilder::new();
        builder.register(segment()).unwrap().register(wide).unwrap();
        assert!(matches!(builder.freeze().unwrap_err(), SchemaError::InvalidLayer { .. }));
    }

    #[test]
    fn enumerates_registered_types() {
        let registry = registry();
        assert_eq!(registry.themes().collect::<Vec<_>>(), vec!["transportation"]);
        assert_eq!(registry.types("transportation").collect::<Vec<_>>(), vec!["segment"]);
        assert_eq!(registry.subtypes("transportation", "segment").collect::<Vec<_>>(), vec!["rail", "road"]);
        assert_eq!(registry.feature_types().len(), 3);
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }

    #[test]
    fn property_lookup_by_path() {
        let registry = registry();
        let schema = registry.resolve("transportation", "segment", Some("road")).unwrap();
        assert!(schema.property("class").is_some());
        assert!(schema.property("/class").is_some());
        assert!(schema.property("class/nested").is_none());
        assert!(schema.property("missing").is_none());
    }
}
