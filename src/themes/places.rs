use super::common;
use crate::registry::{PropertyDef, RegistryBuilder, SchemaError};

pub(super) fn register(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    let categories = PropertyDef::object([
        ("primary", PropertyDef::string().pattern(regex!(r"^[a-z0-9_]+$"))),
        ("alternate", PropertyDef::array(PropertyDef::string().pattern(regex!(r"^[a-z0-9_]+$"))).unique()),
    ])
    .required(&["primary"]);

    let brand = PropertyDef::object([("names", common::names()), ("wikidata", common::wikidata())]);

    let address = PropertyDef::object([
        ("freeform", PropertyDef::string()),
        ("locality", PropertyDef::string()),
        ("postcode", PropertyDef::string()),
        ("region", PropertyDef::string().pattern(regex!(r"^[A-Z]{2}-[A-Z0-9]{1,3}$"))),
        ("country", common::country()),
    ]);

    builder.register(common::feature(layer! {
        theme: "places",
        kind: "place",
        geometry: [Point],
        required: ["names"],
        properties: {
            "names" => common::names(),
            "categories" => categories,
            "confidence" => common::confidence(),
            "websites" => PropertyDef::array(PropertyDef::string().pattern(regex!(r"^https?://\S+$"))).unique(),
            "socials" => PropertyDef::array(PropertyDef::string().pattern(regex!(r"^https?://\S+$"))).unique(),
            "emails" => PropertyDef::array(PropertyDef::string().pattern(regex!(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"))).unique(),
            "phones" => PropertyDef::array(PropertyDef::string().pattern(regex!(r"^\+?[0-9 ()./-]{3,}$"))).unique(),
            "brand" => brand,
            "addresses" => PropertyDef::array(address),
        }
    }))?;
    Ok(())
}
