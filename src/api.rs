use log::debug;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::registry::{Registry, ResolvedSchema, SchemaError};
use crate::scoping::{
    CoverageReport, MalformedRuleError, ModeSet, Query, Resolution, ScopedValue, Scoping, check_coverage, resolve_at,
};
use crate::validator::{ValidationResult, Validator, ValidatorOptions};

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    crate::themes::registry().unwrap_or_else(|err| panic!("built-in theme schemas are inconsistent: {err}"))
});

/// The registry holding every built-in feature type.
///
/// Built on first use and read-only afterwards; safe to share across threads.
pub fn registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Validate `document` against the built-in registry with default options.
///
/// # Example
/// ```
/// use serde_json::json;
///
/// let document = json!({
///     "type": "Feature",
///     "id": "c-1",
///     "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
///     "properties": {
///         "theme": "transportation",
///         "type": "connector",
///         "version": 0,
///         "updateTime": "2024-01-01T00:00:00Z"
///     }
/// });
/// assert!(overture_rules::validate(&document).unwrap().is_ok());
/// ```
pub fn validate(document: &Value) -> Result<ValidationResult, SchemaError> {
    Validator::new(registry()).validate(document)
}

pub fn validate_with(
    registry: &Registry,
    document: &Value,
    options: ValidatorOptions,
) -> Result<ValidationResult, SchemaError> {
    Validator::with_options(registry, options).validate(document)
}

#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("document does not declare a theme and type")]
    Undeclared,

    #[error("property '{0}' is not present in the document or not declared by its schema")]
    NotFound(String),

    #[error("property '{0}' cannot be expressed as scoped rules")]
    NotScoped(String),

    #[error("property '{path}': {source}")]
    Malformed {
        path: String,
        #[source]
        source: MalformedRuleError,
    },
}

/// A rule-based property located in a document, with the context needed to
/// interpret it.
#[derive(Debug, Clone)]
pub struct ScopedProperty<'d, 'r> {
    pub path: String,
    pub value: &'d Value,
    pub scoping: &'r Scoping,
    pub default_modes: ModeSet,
}

impl<'d> ScopedProperty<'d, '_> {
    pub fn parse(&self) -> Result<ScopedValue<'d>, PropertyError> {
        ScopedValue::parse(self.value, self.scoping)
            .map_err(|source| PropertyError::Malformed { path: self.path.clone(), source })
    }
}

/// Locate the property at `path` (relative to `properties`, `/`-separated)
/// and the schema details that govern it.
pub fn scoped_property<'d, 'r>(
    registry: &'r Registry,
    document: &'d Value,
    path: &str,
) -> Result<ScopedProperty<'d, 'r>, PropertyError> {
    let path = path.trim_matches('/');
    let schema = schema_for(registry, document)?;

    let def = schema.property(path).ok_or_else(|| PropertyError::NotFound(path.to_string()))?;
    let scoping = def.scoping.as_ref().ok_or_else(|| PropertyError::NotScoped(path.to_string()))?;
    let value =
        document.pointer(&format!("/properties/{path}")).ok_or_else(|| PropertyError::NotFound(path.to_string()))?;

    Ok(ScopedProperty { path: path.to_string(), value, scoping, default_modes: schema.default_modes })
}

/// Effective value of a rule-based property at `query`.
///
/// The document is expected to have passed validation; malformed rules are
/// reported rather than skipped.
pub fn resolve_property<'d>(
    registry: &Registry,
    document: &'d Value,
    path: &str,
    query: &Query,
) -> Result<Resolution<'d>, PropertyError> {
    let property = scoped_property(registry, document, path)?;
    let resolution = resolve_at(&property.parse()?, query, property.default_modes);
    debug!("[api] {} at {query:?} -> {resolution:?}", property.path);
    Ok(resolution)
}

/// Gap/overlap report for a rule-based property.
pub fn property_coverage(registry: &Registry, document: &Value, path: &str) -> Result<CoverageReport, PropertyError> {
    let property = scoped_property(registry, document, path)?;
    Ok(check_coverage(&property.parse()?, property.default_modes))
}

fn schema_for<'r>(registry: &'r Registry, document: &Value) -> Result<&'r ResolvedSchema, PropertyError> {
    let properties = document.get("properties").ok_or(PropertyError::Undeclared)?;
    let field = |name: &str| properties.get(name).and_then(Value::as_str);

    let (Some(theme), Some(kind)) = (field("theme"), field("type")) else {
        return Err(PropertyError::Undeclared);
    };

    let base = registry.resolve(theme, kind, None)?;
    let subtype = base.discriminator.as_deref().and_then(field);
    Ok(registry.resolve(theme, kind, subtype)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoping::TravelMode;
    use serde_json::json;

    fn road(speed_limits: Value) -> Value {
        json!({
            "type": "Feature",
            "id": "seg-1",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
            "properties": {
                "theme": "transportation",
                "type": "segment",
                "subtype": "road",
                "version": 1,
                "updateTime": "2024-05-01T12:00:00Z",
                "class": "residential",
                "surface": "paved",
                "restrictions": {"speedLimits": speed_limits}
            }
        })
    }

    #[test]
    fn default_registry_is_built_once() {
        assert!(std::ptr::eq(registry(), registry()));
        assert!(registry().themes().count() >= 6);
    }

    #[test]
    fn resolves_speed_limit_through_registry() {
        let document = road(json!([{"maxSpeed": [50, "km/h"], "applyAt": [0, 1]}]));
        assert!(validate(&document).unwrap().is_ok());

        for at in [0.0, 0.3, 1.0] {
            let resolution =
                resolve_property(registry(), &document, "restrictions/speedLimits", &Query::new().at(at)).unwrap();
            assert_eq!(resolution.value(), Some(&json!([50, "km/h"])));
        }
    }

    #[test]
    fn resolves_directional_override() {
        let document = road(json!([
            {"maxSpeed": [80, "km/h"]},
            {"maxSpeed": [60, "km/h"], "notModes": ["truck"]}
        ]));
        let truck = Query::new().mode(TravelMode::Truck);
        let car = Query::new().mode(TravelMode::Car);
        let path = "/restrictions/speedLimits";
        assert_eq!(resolve_property(registry(), &document, path, &truck).unwrap().value(), Some(&json!([80, "km/h"])));
        assert_eq!(resolve_property(registry(), &document, path, &car).unwrap().value(), Some(&json!([60, "km/h"])));
    }

    #[test]
    fn scalar_scoped_property_resolves_anywhere() {
        let document = road(json!([{"maxSpeed": [50, "km/h"]}]));
        let query = Query::new().at(0.9).mode(TravelMode::Bicycle);
        assert_eq!(resolve_property(registry(), &document, "surface", &query).unwrap().value(), Some(&json!("paved")));
    }

    #[test]
    fn rail_rules_without_modes_do_not_match_mode_queries() {
        let document = json!({
            "type": "Feature",
            "id": "rail-1",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
            "properties": {
                "theme": "transportation", "type": "segment", "subtype": "rail",
                "version": 0, "updateTime": "2024-05-01T12:00:00Z", "class": "tram",
                "rail_flags": [{"value": ["is_bridge"], "applyAt": [0, 0.2]}]
            }
        });
        let property = scoped_property(registry(), &document, "rail_flags").unwrap();
        assert_eq!(property.default_modes, ModeSet::empty());
        assert!(resolve_property(registry(), &document, "rail_flags", &Query::new().at(0.1)).unwrap().value().is_some());
    }

    #[test]
    fn coverage_through_registry() {
        let document = road(json!([
            {"maxSpeed": [50, "km/h"], "applyAt": [0, 0.3]},
            {"maxSpeed": [50, "km/h"], "applyAt": [0.6, 1]}
        ]));
        let report = property_coverage(registry(), &document, "restrictions/speedLimits").unwrap();
        assert_eq!(report.gaps.len(), 1);
        assert_eq!((report.gaps[0].range.start, report.gaps[0].range.end), (0.3, 0.6));
    }

    #[test]
    fn property_errors() {
        let document = road(json!([{"maxSpeed": [50, "km/h"], "applyAt": [0.7, 0.2]}]));
        let query = Query::new();
        assert!(matches!(
            resolve_property(registry(), &document, "restrictions/speedLimits", &query),
            Err(PropertyError::Malformed { .. })
        ));
        assert!(matches!(resolve_property(registry(), &document, "class", &query), Err(PropertyError::NotScoped(_))));
        assert!(matches!(resolve_property(registry(), &document, "width", &query), Err(PropertyError::NotFound(_))));
        assert!(matches!(
            resolve_property(registry(), &json!({"properties": {}}), "width", &query),
            Err(PropertyError::Undeclared)
        ));
    }
}
