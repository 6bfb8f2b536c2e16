use super::common;
use crate::registry::{PropertyDef, RegistryBuilder, SchemaError, SchemaLayer};

const THEME: &str = "base";

/// Every base type carries an open-ended `class` under a closed `subtype`.
fn classified(kind: &str, subtypes: &[&str]) -> SchemaLayer {
    layer! {
        theme: THEME,
        kind: kind,
        geometry: [Point, LineString, Polygon, MultiPolygon],
        required: ["subtype", "class"],
        properties: {
            "subtype" => PropertyDef::enumeration(subtypes),
            "class" => PropertyDef::string().pattern(regex!(r"^[a-z0-9_]+$")),
            "names" => common::names(),
            "source_tags" => common::source_tags(),
            "wikidata" => common::wikidata(),
        }
    }
}

pub(super) fn register(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    let water = classified(
        "water",
        &["canal", "human_made", "lake", "ocean", "physical", "pond", "reservoir", "river", "spring", "stream", "wastewater", "water"],
    )
    .with_properties(vec![("is_salt", PropertyDef::boolean()), ("is_intermittent", PropertyDef::boolean())], &[]);

    let land = classified(
        "land",
        &["crater", "desert", "forest", "glacier", "grass", "land", "physical", "reef", "rock", "sand", "shrub", "tree", "wetland"],
    )
    .with_properties(
        vec![
            ("elevation", PropertyDef::integer().maximum(9000.0)),
            ("surface", PropertyDef::string()),
        ],
        &[],
    );

    let land_use = classified(
        "land_use",
        &[
            "agriculture",
            "aquaculture",
            "campground",
            "cemetery",
            "construction",
            "developed",
            "education",
            "entertainment",
            "golf",
            "grass",
            "horticulture",
            "landfill",
            "managed",
            "medical",
            "military",
            "park",
            "pedestrian",
            "protected",
            "recreation",
            "religious",
            "residential",
            "resource_extraction",
            "transportation",
            "winter_sports",
        ],
    )
    .with_properties(vec![("surface", PropertyDef::string())], &[]);

    let infrastructure = classified(
        "infrastructure",
        &[
            "aerialway",
            "airport",
            "barrier",
            "bridge",
            "communication",
            "emergency",
            "manhole",
            "pedestrian",
            "pier",
            "power",
            "recreation",
            "tower",
            "transit",
            "transportation",
            "utility",
            "waste_management",
            "water",
        ],
    )
    .with_properties(
        vec![("height", PropertyDef::number().minimum(0.0)), ("surface", PropertyDef::string())],
        &[],
    );

    builder
        .register(common::feature(water))?
        .register(common::feature(land))?
        .register(common::feature(land_use))?
        .register(common::feature(infrastructure))?;
    Ok(())
}
