//! Properties shared across themes.

use crate::registry::{PropertyDef, SchemaLayer, StringFormat};

/// Properties every feature type requires.
pub const REQUIRED: &[&str] = &["theme", "type", "version", "updateTime"];

/// Attach the common property table to a base layer.
pub fn feature(layer: SchemaLayer) -> SchemaLayer {
    let properties = vec![
        ("theme", PropertyDef::enumeration(&[layer.theme.as_str()])),
        ("type", PropertyDef::enumeration(&[layer.kind.as_str()])),
        ("version", PropertyDef::integer().minimum(0.0).describe("Incremented on every change to the feature")),
        (
            "updateTime",
            PropertyDef::string()
                .pattern(regex!(r"^[1-9]\d{3}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(Z|[-+]\d{2}:\d{2})$"))
                .format(StringFormat::DateTime),
        ),
        ("sources", sources()),
        ("level", PropertyDef::integer().describe("Z-order relative to other features at the same location")),
    ];
    layer.with_properties(properties, REQUIRED)
}

pub fn sources() -> PropertyDef {
    let source = PropertyDef::object([
        ("property", PropertyDef::string().describe("JSON pointer to the sourced property, empty for the whole feature")),
        ("dataset", PropertyDef::string().min_length(1)),
        ("recordId", PropertyDef::string()),
        ("confidence", confidence()),
    ])
    .required(&["property", "dataset"]);

    PropertyDef::array(source).min_items(1).unique()
}

pub fn confidence() -> PropertyDef {
    PropertyDef::number().minimum(0.0).maximum(1.0)
}

/// BCP-47 style language tag, e.g. `en`, `zh-Hant`, `sr-Latn-RS`.
pub fn language_tag() -> PropertyDef {
    PropertyDef::string().pattern(regex!(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$"))
}

/// ISO 3166-1 alpha-2 country code.
pub fn country() -> PropertyDef {
    PropertyDef::string().pattern(regex!(r"^[A-Z]{2}$"))
}

pub fn wikidata() -> PropertyDef {
    PropertyDef::string().pattern(regex!(r"^Q\d+$"))
}

/// Raw tags of the upstream feature, keyed by tag name.
pub fn source_tags() -> PropertyDef {
    PropertyDef::map(PropertyDef::string())
}

pub fn names() -> PropertyDef {
    let rule = PropertyDef::object([
        ("variant", PropertyDef::enumeration(&["common", "official", "alternate", "short"])),
        ("language", language_tag()),
        ("value", PropertyDef::string().min_length(1)),
        ("between", PropertyDef::tuple(vec![fraction(), fraction()])),
        ("side", PropertyDef::enumeration(&["left", "right"])),
    ])
    .required(&["variant", "value"]);

    PropertyDef::object([
        ("primary", PropertyDef::string().min_length(1)),
        ("common", PropertyDef::map(PropertyDef::string().min_length(1)).pattern(regex!(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$"))),
        ("rules", PropertyDef::array(rule)),
    ])
    .required(&["primary"])
}

/// Linear-reference position along a path.
pub fn fraction() -> PropertyDef {
    PropertyDef::number().minimum(0.0).maximum(1.0)
}

pub fn unique_strings() -> PropertyDef {
    PropertyDef::array(PropertyDef::string().min_length(1)).unique()
}
