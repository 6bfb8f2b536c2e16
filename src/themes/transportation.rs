//! Transportation theme: segments (road/rail/water) and connectors.
//!
//! ```text
//! transportation/segment           LineString, discriminated by `subtype`
//!   ├─ road    class, surface*, road_flags*, width*, lanes*, restrictions{speedLimits**, access**}
//!   ├─ rail    class, rail_flags*                                  (no default modes)
//!   └─ water   class                                               (no default modes)
//! transportation/connector         Point
//!
//! *  scalar or rules      ** rules only
//! ```

use super::common;
use crate::registry::{PropertyDef, RegistryBuilder, SchemaError, SchemaLayer};
use crate::scoping::{ModeSet, Qualifiers, Scoping};

const THEME: &str = "transportation";

pub(super) fn register(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    builder
        .register(common::feature(layer! {
            theme: THEME,
            kind: "segment",
            geometry: [LineString],
            discriminator: "subtype",
            required: ["subtype"],
            properties: {
                "subtype" => PropertyDef::enumeration(&["road", "rail", "water"]),
                "names" => common::names(),
                "connector_ids" => common::unique_strings(),
            }
        }))?
        .register(road())?
        .register(rail())?
        .register(water())?
        .register(common::feature(layer! {
            theme: THEME,
            kind: "connector",
            geometry: [Point],
            properties: {}
        }))?;
    Ok(())
}

fn road() -> SchemaLayer {
    let classes = &[
        "motorway",
        "trunk",
        "primary",
        "secondary",
        "tertiary",
        "residential",
        "living_street",
        "unclassified",
        "service",
        "pedestrian",
        "footway",
        "steps",
        "path",
        "track",
        "cycleway",
        "bridleway",
        "unknown",
    ];
    let surfaces = &["unknown", "paved", "unpaved", "gravel", "dirt", "paving_stones", "metal"];
    let flags = &["is_bridge", "is_link", "is_tunnel", "is_under_construction", "is_abandoned", "is_covered", "is_indoor"];

    let speed = PropertyDef::tuple(vec![
        PropertyDef::integer().minimum(1.0).maximum(350.0),
        PropertyDef::enumeration(&["km/h", "mph"]),
    ])
    .scoped(Scoping::rules("maxSpeed", Qualifiers::all()))
    .describe("Maximum legal speed as [value, unit]");

    let access = PropertyDef::enumeration(&["allowed", "denied", "designated"])
        .scoped(Scoping::rules("accessType", Qualifiers::all()));

    layer! {
        theme: THEME,
        kind: "segment",
        subtype: "road",
        required: ["class"],
        default_modes: ModeSet::all(),
        properties: {
            "class" => PropertyDef::enumeration(classes),
            "surface" => PropertyDef::enumeration(surfaces).scoped(Scoping::new(Qualifiers::GEOMETRIC)),
            "road_flags" => PropertyDef::array(PropertyDef::enumeration(flags))
                .unique()
                .scoped(Scoping::new(Qualifiers::GEOMETRIC)),
            "width" => PropertyDef::number().minimum(0.0).scoped(Scoping::new(Qualifiers::GEOMETRIC)),
            "lanes" => PropertyDef::integer().minimum(1.0).scoped(Scoping::default()),
            "restrictions" => PropertyDef::object([("speedLimits", speed), ("access", access)]),
        }
    }
}

fn rail() -> SchemaLayer {
    let classes = &[
        "funicular",
        "light_rail",
        "monorail",
        "narrow_gauge",
        "standard_gauge",
        "subway",
        "tram",
        "unknown",
    ];
    let flags = &[
        "is_bridge",
        "is_tunnel",
        "is_passenger",
        "is_freight",
        "is_disused",
        "is_abandoned",
        "is_under_construction",
        "is_covered",
    ];

    layer! {
        theme: THEME,
        kind: "segment",
        subtype: "rail",
        required: ["class"],
        default_modes: ModeSet::empty(),
        properties: {
            "class" => PropertyDef::enumeration(classes),
            "rail_flags" => PropertyDef::array(PropertyDef::enumeration(flags))
                .unique()
                .scoped(Scoping::new(Qualifiers::GEOMETRIC)),
        }
    }
}

fn water() -> SchemaLayer {
    layer! {
        theme: THEME,
        kind: "segment",
        subtype: "water",
        default_modes: ModeSet::empty(),
        properties: {
            "class" => PropertyDef::enumeration(&["ferry", "waterway", "unknown"]),
        }
    }
}
