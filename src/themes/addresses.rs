use super::common;
use crate::registry::{PropertyDef, RegistryBuilder, SchemaError};

pub(super) fn register(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    let level = PropertyDef::object([("value", PropertyDef::string().min_length(1))]).required(&["value"]);

    builder.register(common::feature(layer! {
        theme: "addresses",
        kind: "address",
        geometry: [Point],
        required: ["country"],
        properties: {
            "country" => common::country(),
            "postcode" => PropertyDef::string(),
            "street" => PropertyDef::string(),
            "number" => PropertyDef::string(),
            "unit" => PropertyDef::string(),
            "postal_city" => PropertyDef::string(),
            "address_levels" => PropertyDef::array(level).describe("Administrative levels, largest first"),
        }
    }))?;
    Ok(())
}
