//! Validation and scoped-rule resolution for Overture-style map features.
//!
//! ```text
//! themes::bootstrap ──▶ RegistryBuilder ── freeze ──▶ Registry
//!                                                       │
//! document ───────────────────────────▶ Validator ◀─────┤
//!                                           │           │
//! rule-based property ── ScopedValue ──▶ resolve_at / check_coverage
//! ```
//!
//! Start with [`validate`] for whole documents and [`resolve_property`] for
//! the effective value of a rule-based property at a position, time and
//! travel mode.

#[macro_use]
mod macros;
mod api;
pub mod harness;
mod registry;
pub mod scoping;
pub mod themes;
mod validator;

pub use api::{
    PropertyError, ScopedProperty, property_coverage, registry, resolve_property, scoped_property, validate,
    validate_with,
};
pub use registry::{
    FeatureType, GeometryType, Pattern, PropertyDef, PropertyKind, Registry, RegistryBuilder, ResolvedSchema,
    SchemaError, SchemaLayer, StringFormat,
};
pub use scoping::{
    CoverageReport, GeometricRange, MalformedRuleError, ModeSet, Qualifiers, Query, Resolution, RuleDefect, Scoping,
    TravelMode,
};
pub use validator::{ValidationResult, Validator, ValidatorOptions, Violation, is_extension};
