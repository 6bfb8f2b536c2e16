//! Administrative divisions: the named place (`division`), its area and the
//! boundaries shared between areas.

use super::common;
use crate::registry::{PropertyDef, RegistryBuilder, SchemaError};

const THEME: &str = "divisions";

const SUBTYPES: &[&str] = &[
    "country",
    "dependency",
    "region",
    "county",
    "localadmin",
    "locality",
    "macrohood",
    "neighborhood",
    "microhood",
];

fn region() -> PropertyDef {
    PropertyDef::string().pattern(regex!(r"^[A-Z]{2}-[A-Z0-9]{1,3}$"))
}

pub(super) fn register(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    let division = layer! {
        theme: THEME,
        kind: "division",
        geometry: [Point],
        required: ["subtype", "names", "country"],
        properties: {
            "subtype" => PropertyDef::enumeration(SUBTYPES),
            "class" => PropertyDef::enumeration(&["megacity", "city", "town", "village", "hamlet"]),
            "names" => common::names(),
            "country" => common::country(),
            "region" => region(),
            "population" => PropertyDef::integer().minimum(0.0),
            "parent_division_id" => PropertyDef::string().min_length(1),
            "wikidata" => common::wikidata(),
        }
    };

    let area = layer! {
        theme: THEME,
        kind: "division_area",
        geometry: [Polygon, MultiPolygon],
        required: ["subtype", "class", "division_id", "country"],
        properties: {
            "subtype" => PropertyDef::enumeration(SUBTYPES),
            "class" => PropertyDef::enumeration(&["land", "maritime"]),
            "division_id" => PropertyDef::string().min_length(1),
            "names" => common::names(),
            "country" => common::country(),
            "region" => region(),
            "is_land" => PropertyDef::boolean(),
            "is_territorial" => PropertyDef::boolean(),
        }
    };

    let boundary = layer! {
        theme: THEME,
        kind: "division_boundary",
        geometry: [LineString, MultiLineString],
        required: ["subtype", "class", "division_ids"],
        properties: {
            "subtype" => PropertyDef::enumeration(SUBTYPES),
            "class" => PropertyDef::enumeration(&["land", "maritime"]),
            "division_ids" => PropertyDef::tuple(vec![
                PropertyDef::string().min_length(1),
                PropertyDef::string().min_length(1),
            ])
            .describe("The two divisions on either side of the boundary"),
            "country" => common::country(),
            "region" => region(),
            "is_disputed" => PropertyDef::boolean(),
        }
    };

    builder
        .register(common::feature(division))?
        .register(common::feature(area))?
        .register(common::feature(boundary))?;
    Ok(())
}
