#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Builds a [`SchemaLayer`](crate::SchemaLayer) from a declarative block.
///
/// Only `theme`, `kind` and `properties` are mandatory; a layer with a
/// `subtype` is additive and is merged onto its base when the registry is
/// frozen.
#[macro_export]
macro_rules! layer {
    (
        theme: $theme:expr,
        kind: $kind:expr
        $(, subtype: $subtype:expr)?
        $(, geometry: [ $($geom:ident),* $(,)? ])?
        $(, discriminator: $disc:expr)?
        $(, required: [ $($req:expr),* $(,)? ])?
        $(, default_modes: $modes:expr)?
        , properties: { $($name:literal => $def:expr),* $(,)? }
        $(,)?
    ) => {{
        $crate::SchemaLayer {
            theme: ($theme).to_string(),
            kind: ($kind).to_string(),
            subtype: None $(.or(Some(($subtype).to_string())))?,
            geometry: vec![ $($($crate::GeometryType::$geom),*)? ],
            discriminator: None $(.or(Some(($disc).to_string())))?,
            required: [ $($(($req).to_string()),*)? ].into_iter().collect(),
            properties: [ $((($name).to_string(), $def)),* ].into_iter().collect(),
            default_modes: None $(.or(Some($modes)))?,
        }
    }};
}
