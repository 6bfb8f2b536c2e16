use super::common;
use crate::registry::{PropertyDef, RegistryBuilder, SchemaError};

const THEME: &str = "buildings";

const SUBTYPES: &[&str] = &[
    "agricultural",
    "civic",
    "commercial",
    "education",
    "entertainment",
    "industrial",
    "medical",
    "military",
    "outbuilding",
    "religious",
    "residential",
    "service",
    "transportation",
];

const ROOF_SHAPES: &[&str] =
    &["dome", "flat", "gabled", "gambrel", "half_hipped", "hipped", "mansard", "onion", "pyramidal", "round", "skillion"];

const FACADE_MATERIALS: &[&str] =
    &["brick", "cement_block", "clay", "concrete", "glass", "metal", "plaster", "plastic", "stone", "timber_framing", "wood"];

/// Shape properties shared by buildings and building parts.
fn shape() -> Vec<(&'static str, PropertyDef)> {
    vec![
        ("names", common::names()),
        ("height", PropertyDef::number().minimum(0.0).describe("Height above ground in meters")),
        ("min_height", PropertyDef::number().minimum(0.0)),
        ("num_floors", PropertyDef::integer().minimum(1.0)),
        ("num_floors_underground", PropertyDef::integer().minimum(0.0)),
        ("is_underground", PropertyDef::boolean()),
        ("facade_color", PropertyDef::string().pattern(regex!(r"^(#[0-9A-Fa-f]{3}|#[0-9A-Fa-f]{6}|[a-z]+)$"))),
        ("facade_material", PropertyDef::enumeration(FACADE_MATERIALS)),
        ("roof_shape", PropertyDef::enumeration(ROOF_SHAPES)),
        ("roof_height", PropertyDef::number().minimum(0.0)),
    ]
}

pub(super) fn register(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    let building = layer! {
        theme: THEME,
        kind: "building",
        geometry: [Polygon, MultiPolygon],
        properties: {
            "subtype" => PropertyDef::enumeration(SUBTYPES),
            "class" => PropertyDef::string().pattern(regex!(r"^[a-z_]+$")),
            "has_parts" => PropertyDef::boolean(),
        }
    };

    let part = layer! {
        theme: THEME,
        kind: "building_part",
        geometry: [Polygon, MultiPolygon],
        required: ["building_id"],
        properties: {
            "building_id" => PropertyDef::string().min_length(1),
        }
    };

    builder
        .register(common::feature(building.with_properties(shape(), &[])))?
        .register(common::feature(part.with_properties(shape(), &[])))?;
    Ok(())
}
