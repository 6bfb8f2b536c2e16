//! Scoped ("rule-based") property values.
//!
//! A scoped property holds either one scalar or an ordered array of rules,
//! each restricted by optional qualifiers:
//!
//! ```text
//! rule = value
//!      + applyAt      geometric range along the path   (default: [0, 1])
//!      + applyDuring  recurring opening-hours window    (default: always)
//!      + modes/notModes travel-mode filter              (default: subtype modes)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `modes.rs`: travel modes, their hierarchy and `ModeSet`.
//! - `opening_hours.rs`: `applyDuring` parsing and evaluation.
//! - `rule.rs`: rule parsing (`ScopedRule`, `ScopedValue`) and defects.
//! - `resolve.rs`: effective value at a query point (last-declared-wins).
//! - `coverage.rs`: advisory gap/overlap report.
//!
//! Everything here is a pure function of its inputs.

#[path = "scoping/coverage.rs"]
mod coverage;
#[path = "scoping/modes.rs"]
mod modes;
#[path = "scoping/opening_hours.rs"]
mod opening_hours;
#[path = "scoping/resolve.rs"]
mod resolve;
#[path = "scoping/rule.rs"]
mod rule;

pub use coverage::{CoverageReport, Gap, Overlap, check_coverage, check_coverage_json};
pub use modes::{ModeSet, TravelMode};
pub use opening_hours::{TemporalWindow, WeekMask};
pub use resolve::{Query, Resolution, resolve_at, resolve_json};
pub use rule::{
    APPLY_AT, APPLY_DURING, GeometricRange, MODES, MalformedRuleError, ModeFilter, NOT_MODES, Qualifiers, RuleDefect,
    RuleIssue, ScopedRule, ScopedValue, Scoping,
};
