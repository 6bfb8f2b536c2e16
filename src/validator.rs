//! Feature document validation.
//!
//! ```text
//! document
//!   │
//!   ├─ envelope      type/id/geometry/properties/bbox, closed top level
//!   ├─ lookup        properties.theme + properties.type (+ discriminator) ─▶ ResolvedSchema
//!   ├─ geometry      allowed type, coordinates present
//!   └─ properties    required ─▶ constraints (scalars or scoped rules) ─▶ closed world
//! ```
//!
//! Every violation is collected; nothing short-circuits except a missing
//! `theme`/`type`, which leaves no schema to check against.

#[path = "validator/constraints.rs"]
mod constraints;
#[path = "validator/report.rs"]
mod report;

pub use constraints::is_extension;
pub use report::{ValidationResult, Violation};

use log::debug;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::registry::{GeometryType, Registry, ResolvedSchema, SchemaError};
use constraints::Checker;
use report::{Violations, pointer};

const ENVELOPE_KEYS: &[&str] = &["type", "id", "geometry", "properties", "bbox"];

/// Input-size safeguards. Exceeding either is reported as a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Maximum object/array nesting below `properties`.
    pub max_depth: usize,
    /// Maximum number of rules in one scoped property.
    pub max_rules: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions { max_depth: 32, max_rules: 256 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Validator<'r> {
    registry: &'r Registry,
    options: ValidatorOptions,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Validator { registry, options: ValidatorOptions::default() }
    }

    pub fn with_options(registry: &'r Registry, options: ValidatorOptions) -> Self {
        Validator { registry, options }
    }

    /// Validate one GeoJSON feature.
    ///
    /// Invalid documents produce an `Ok` result listing every violation.
    /// `Err` is reserved for a `theme`/`type` pair that has no registered
    /// schema.
    pub fn validate(&self, document: &Value) -> Result<ValidationResult, SchemaError> {
        let mut out = Violations::default();

        let Some(feature) = document.as_object() else {
            out.push("", "document must be a JSON object");
            return Ok(ValidationResult::new(None, out.into_vec()));
        };

        check_envelope(feature, &mut out);

        let Some(properties) = feature.get("properties").and_then(Value::as_object) else {
            return Ok(ValidationResult::new(None, out.into_vec()));
        };

        let Some(schema) = self.lookup(properties, &mut out)? else {
            return Ok(ValidationResult::new(None, out.into_vec()));
        };

        if let Some(geometry) = feature.get("geometry").and_then(Value::as_object) {
            check_geometry(geometry, schema, &mut out);
        }

        Checker { options: &self.options, out: &mut out }.object(
            "/properties",
            properties,
            &schema.properties,
            &schema.required,
            1,
        );

        let violations = out.into_vec();
        debug!("[validate] {}: {} violations", schema.feature_type, violations.len());
        Ok(ValidationResult::new(Some(schema.feature_type.clone()), violations))
    }

    /// Resolve the schema a document declares, reporting unusable discriminators.
    fn lookup(&self, properties: &Map<String, Value>, out: &mut Violations) -> Result<Option<&'r ResolvedSchema>, SchemaError> {
        let theme = required_str(properties, "theme", out);
        let kind = required_str(properties, "type", out);
        let (Some(theme), Some(kind)) = (theme, kind) else {
            return Ok(None);
        };

        let base = self.registry.resolve(theme, kind, None)?;
        let subtype = base.discriminator.as_deref().and_then(|name| properties.get(name)).and_then(Value::as_str);
        self.registry.resolve(theme, kind, subtype).map(Some)
    }
}

fn required_str<'v>(properties: &'v Map<String, Value>, name: &str, out: &mut Violations) -> Option<&'v str> {
    let path = pointer("/properties", name);
    match properties.get(name) {
        Some(Value::String(text)) => Some(text),
        Some(_) => {
            out.push(&path, format!("'{name}' must be a string"));
            None
        }
        None => {
            out.push(&path, format!("missing required property '{name}'"));
            None
        }
    }
}

fn check_envelope(feature: &Map<String, Value>, out: &mut Violations) {
    if feature.get("type").and_then(Value::as_str) != Some("Feature") {
        out.push("/type", "type must be \"Feature\"");
    }

    match feature.get("id") {
        Some(Value::String(id)) if !id.is_empty() => {}
        Some(_) => out.push("/id", "id must be a non-empty string"),
        None => out.push("/id", "missing required property 'id'"),
    }

    match feature.get("geometry") {
        Some(Value::Object(_)) => {}
        Some(_) => out.push("/geometry", "geometry must be an object"),
        None => out.push("/geometry", "missing required property 'geometry'"),
    }

    match feature.get("properties") {
        Some(Value::Object(_)) => {}
        Some(_) => out.push("/properties", "properties must be an object"),
        None => out.push("/properties", "missing required property 'properties'"),
    }

    if let Some(bbox) = feature.get("bbox") {
        let valid = bbox
            .as_array()
            .is_some_and(|values| matches!(values.len(), 4 | 6) && values.iter().all(Value::is_number));
        if !valid {
            out.push("/bbox", "bbox must be an array of 4 or 6 numbers");
        }
    }

    for key in feature.keys() {
        if !ENVELOPE_KEYS.contains(&key.as_str()) && !is_extension(key) {
            out.push(&pointer("", key), format!("unexpected property '{key}'"));
        }
    }
}

fn check_geometry(geometry: &Map<String, Value>, schema: &ResolvedSchema, out: &mut Violations) {
    let Some(name) = geometry.get("type").and_then(Value::as_str) else {
        out.push("/geometry/type", "missing geometry type");
        return;
    };
    let Ok(kind) = GeometryType::from_str(name) else {
        out.push("/geometry/type", format!("unknown geometry type '{name}'"));
        return;
    };

    if !schema.allows_geometry(kind) {
        let allowed: Vec<&str> = schema.geometry.iter().map(AsRef::as_ref).collect();
        out.push(
            "/geometry/type",
            format!("geometry type {kind} is not allowed for {}; expected {}", schema.feature_type, allowed.join(" or ")),
        );
    }

    let member = if kind == GeometryType::GeometryCollection { "geometries" } else { "coordinates" };
    if !geometry.get(member).is_some_and(Value::is_array) {
        out.push(&pointer("/geometry", member), format!("{kind} must carry a '{member}' array"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PropertyDef, RegistryBuilder};
    use crate::scoping::{Qualifiers, Scoping};
    use serde_json::json;

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new();
        builder
            .register(layer! {
                theme: "transportation",
                kind: "segment",
                geometry: [LineString],
                discriminator: "subtype",
                required: ["theme", "type", "subtype", "version"],
                properties: {
                    "theme" => PropertyDef::enumeration(&["transportation"]),
                    "type" => PropertyDef::enumeration(&["segment"]),
                    "subtype" => PropertyDef::enumeration(&["road", "rail"]),
                    "version" => PropertyDef::integer().minimum(0.0),
                }
            })
            .unwrap()
            .register(layer! {
                theme: "transportation",
                kind: "segment",
                subtype: "road",
                required: ["class"],
                properties: {
                    "class" => PropertyDef::enumeration(&["primary", "residential"]),
                    "speed_limits" => PropertyDef::tuple(vec![PropertyDef::integer(), PropertyDef::string()])
                        .scoped(Scoping::rules("maxSpeed", Qualifiers::all())),
                }
            })
            .unwrap();
        builder.freeze().unwrap()
    }

    fn road() -> Value {
        json!({
            "type": "Feature",
            "id": "seg-1",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
            "properties": {
                "theme": "transportation",
                "type": "segment",
                "subtype": "road",
                "version": 0,
                "class": "primary",
                "speed_limits": [{"maxSpeed": [50, "km/h"], "applyAt": [0, 1]}]
            }
        })
    }

    fn validate(document: &Value) -> ValidationResult {
        Validator::new(&registry()).validate(document).unwrap()
    }

    #[test]
    fn valid_road_passes() {
        let result = validate(&road());
        assert!(result.is_ok(), "{:?}", result.violations);
        assert_eq!(result.feature_type.unwrap().to_string(), "transportation/segment/road");
    }

    #[test]
    fn reports_every_missing_required_property() {
        let mut document = road();
        let properties = document["properties"].as_object_mut().unwrap();
        properties.remove("version");
        properties.remove("class");

        let result = validate(&document);
        let paths: Vec<&str> = result.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["/properties/class", "/properties/version"]);
    }

    #[test]
    fn closed_world_rejects_unknown_but_not_extension_properties() {
        let mut document = road();
        document["properties"]["ext_foo"] = json!(1);
        assert!(validate(&document).is_ok());

        document["properties"]["foo"] = json!(1);
        let result = validate(&document);
        assert_eq!(result.violations, vec![Violation {
            path: "/properties/foo".to_string(),
            message: "unexpected property 'foo'".to_string(),
        }]);
    }

    #[test]
    fn unknown_subtype_rejects_subtype_properties() {
        let mut document = road();
        document["properties"]["subtype"] = json!("ferry");
        let result = validate(&document);
        assert_eq!(result.feature_type.as_ref().map(ToString::to_string).as_deref(), Some("transportation/segment"));
        assert!(result.mentions("'ferry' is not one of"));
        assert!(result.mentions("/properties/class"));
        assert!(result.mentions("/properties/speed_limits"));
    }

    #[test]
    fn geometry_type_is_checked() {
        let mut document = road();
        document["geometry"] = json!({"type": "Point", "coordinates": [0, 0]});
        let result = validate(&document);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].path, "/geometry/type");
        assert!(result.violations[0].message.contains("expected LineString"));

        document["geometry"] = json!({"type": "LineString"});
        assert!(validate(&document).mentions("/geometry/coordinates"));
    }

    #[test]
    fn envelope_is_checked() {
        let mut document = road();
        document["type"] = json!("FeatureCollection");
        document["id"] = json!("");
        document["bbox"] = json!([0, 0, 1]);
        document["links"] = json!([]);
        document["ext_tile"] = json!("z14");
        let paths: Vec<String> = validate(&document).violations.into_iter().map(|v| v.path).collect();
        assert_eq!(paths, vec!["/type", "/id", "/bbox", "/links"]);
    }

    #[test]
    fn missing_theme_stops_schema_checks() {
        let mut document = road();
        document["properties"].as_object_mut().unwrap().remove("theme");
        let result = validate(&document);
        assert!(result.feature_type.is_none());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].path, "/properties/theme");
    }

    #[test]
    fn unregistered_feature_type_is_an_error() {
        let mut document = road();
        document["properties"]["type"] = json!("connector");
        let err = Validator::new(&registry()).validate(&document).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownFeatureType { .. }));
    }

    #[test]
    fn malformed_rules_are_reported_with_rule_paths() {
        let mut document = road();
        document["properties"]["speed_limits"] = json!([
            {"maxSpeed": [50, "km/h"], "applyAt": [0.6, 0.2]},
            {"maxSpeed": [30, "km/h"], "modes": ["car"], "notModes": ["truck"]},
            {"maxSpeed": [30, "km/h"], "applyDuring": "Mo-Fr 25:00-26:00"}
        ]);
        let result = validate(&document);
        let paths: Vec<&str> = result.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec![
            "/properties/speed_limits/0/applyAt",
            "/properties/speed_limits/1/notModes",
            "/properties/speed_limits/2/applyDuring"
        ]);
    }

    #[test]
    fn non_object_document() {
        let result = validate(&json!([1, 2]));
        assert!(!result.is_ok());
        assert_eq!(result.violations[0].path, "");
    }
}
