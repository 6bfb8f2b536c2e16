//! Built-in Overture feature types.
//!
//! Registration is explicit and ordered; nothing registers itself as a side
//! effect of being compiled in.
//!
//! ```text
//! bootstrap(builder)
//!   ├─ transportation   segment (+ road, rail, water), connector
//!   ├─ buildings        building, building_part
//!   ├─ places           place
//!   ├─ divisions        division, division_area, division_boundary
//!   ├─ base             water, land, land_use, infrastructure
//!   └─ addresses        address
//! ```

#[path = "themes/addresses.rs"]
mod addresses;
#[path = "themes/base.rs"]
mod base;
#[path = "themes/buildings.rs"]
mod buildings;
#[path = "themes/common.rs"]
pub mod common;
#[path = "themes/divisions.rs"]
mod divisions;
#[path = "themes/places.rs"]
mod places;
#[path = "themes/transportation.rs"]
mod transportation;


use crate::registry::{Registry, RegistryBuilder, SchemaError};

/// Theme names in registration order.
pub const THEMES: &[&str] = &["transportation", "buildings", "places", "divisions", "base", "addresses"];

/// Register every built-in layer.
pub fn bootstrap(builder: &mut RegistryBuilder) -> Result<(), SchemaError> {
    transportation::register(builder)?;
    buildings::register(builder)?;
    places::register(builder)?;
    divisions::register(builder)?;
    base::register(builder)?;
    addresses::register(builder)?;
    Ok(())
}

/// A frozen registry holding only the built-in layers.
pub fn registry() -> Result<Registry, SchemaError> {
    let mut builder = RegistryBuilder::new();
    bootstrap(&mut builder)?;
    builder.freeze()
}
