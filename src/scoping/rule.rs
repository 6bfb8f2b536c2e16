//! Scoped rules and their qualifiers.
//!
//! A rule-based property is stored either as a bare scalar or as an array of
//! rule objects:
//!
//! ```text
//! { <value key>: <value>, applyAt?: [start, end], applyDuring?: "<hours>",
//!   modes?: [<mode>...], notModes?: [<mode>...] }
//! ```
//!
//! Parsing is shared by the validator (which wants every defect, keyed by the
//! offending rule key) and the resolver (which only needs the first one).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use super::modes::{ModeSet, TravelMode};
use super::opening_hours::{TemporalWindow, WeekMask};
use super::resolve::Query;

pub const APPLY_AT: &str = "applyAt";
pub const APPLY_DURING: &str = "applyDuring";
pub const MODES: &str = "modes";
pub const NOT_MODES: &str = "notModes";

bitflags::bitflags! {
    /// Qualifiers a scoped property accepts on its rules.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Qualifiers: u8 {
        const GEOMETRIC = 1 << 0;
        const TEMPORAL  = 1 << 1;
        const MODAL     = 1 << 2;
    }
}

/// How a property may be expressed as rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scoping {
    /// Key holding each rule's value (`value`, or e.g. `maxSpeed`).
    pub value_key: String,
    /// When set, the bare scalar form is not accepted.
    pub rules_only: bool,
    pub qualifiers: Qualifiers,
}

impl Default for Scoping {
    fn default() -> Self {
        Scoping { value_key: "value".to_string(), rules_only: false, qualifiers: Qualifiers::all() }
    }
}

impl Scoping {
    pub fn new(qualifiers: Qualifiers) -> Self {
        Scoping { qualifiers, ..Scoping::default() }
    }

    /// Rules-only scoping whose value lives under `value_key`.
    pub fn rules(value_key: &str, qualifiers: Qualifiers) -> Self {
        Scoping { value_key: value_key.to_string(), rules_only: true, qualifiers }
    }

    /// Whether `value` should be read as a rule array rather than a scalar.
    ///
    /// Rules-only properties treat every array as rules. Otherwise an array is
    /// a rule array when one of its elements is an object carrying the value
    /// key or a qualifier key; this keeps array-valued scalars such as
    /// `["is_bridge"]` unambiguous.
    pub fn is_rule_array(&self, value: &Value) -> bool {
        let Some(items) = value.as_array() else {
            return false;
        };
        if self.rules_only {
            return true;
        }
        items.iter().filter_map(Value::as_object).any(|rule| {
            rule.contains_key(&self.value_key)
                || [APPLY_AT, APPLY_DURING, MODES, NOT_MODES].iter().any(|key| rule.contains_key(*key))
        })
    }
}

/// Why a rule could not be read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleDefect {
    #[error("rule must be an object")]
    NotAnObject,
    #[error("rule is missing its '{0}' value")]
    MissingValue(String),
    #[error("applyAt must be an array of two numbers")]
    RangeShape,
    #[error("applyAt bounds must lie within [0, 1]")]
    RangeBounds,
    #[error("applyAt start {start} must be less than end {end}")]
    RangeOrder { start: f64, end: f64 },
    #[error("applyDuring must be an opening-hours string")]
    WindowShape,
    #[error("invalid opening hours '{input}': {reason}")]
    Window { input: String, reason: String },
    #[error("modes and notModes are mutually exclusive")]
    ConflictingModeFilter,
    #[error("{0} must be a non-empty array of travel modes")]
    ModeShape(&'static str),
    #[error("unknown travel mode '{0}'")]
    UnknownMode(String),
    #[error("travel mode '{0}' is listed more than once")]
    DuplicateMode(String),
    #[error("{0} is not supported for this property")]
    UnsupportedQualifier(&'static str),
    #[error("unexpected rule key '{0}'")]
    UnknownKey(String),
}

/// A defect together with the rule key it was found under, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleIssue {
    pub key: Option<String>,
    pub defect: RuleDefect,
}

/// Raised when rule data that should have been rejected by validation reaches
/// the resolver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("scoped rule {index} is malformed: {defect}")]
pub struct MalformedRuleError {
    pub index: usize,
    pub defect: RuleDefect,
}

/// Inclusive linear-reference range, `0 <= start < end <= 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricRange {
    pub start: f64,
    pub end: f64,
}

impl GeometricRange {
    pub const FULL: GeometricRange = GeometricRange { start: 0.0, end: 1.0 };

    pub fn new(start: f64, end: f64) -> Result<Self, RuleDefect> {
        if !(0.0..=1.0).contains(&start) || !(0.0..=1.0).contains(&end) {
            return Err(RuleDefect::RangeBounds);
        }
        if start >= end {
            return Err(RuleDefect::RangeOrder { start, end });
        }
        Ok(GeometricRange { start, end })
    }

    pub fn from_json(value: &Value) -> Result<Self, RuleDefect> {
        match value.as_array().map(Vec::as_slice) {
            Some([start, end]) => match (start.as_f64(), end.as_f64()) {
                (Some(start), Some(end)) => GeometricRange::new(start, end),
                _ => Err(RuleDefect::RangeShape),
            },
            _ => Err(RuleDefect::RangeShape),
        }
    }

    /// Both ends are inclusive.
    pub fn contains(&self, at: f64) -> bool {
        at >= self.start && at <= self.end
    }

    /// True when `[start, end]` lies entirely inside this range.
    pub fn covers(&self, start: f64, end: f64) -> bool {
        self.start <= start && end <= self.end
    }
}

impl std::fmt::Display for GeometricRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFilter {
    /// `modes`: only these modes (and their descendants).
    Only(ModeSet),
    /// `notModes`: every mode except these (and their descendants).
    Except(ModeSet),
}

impl ModeFilter {
    pub fn allows(&self, mode: TravelMode) -> bool {
        match self {
            ModeFilter::Only(set) => set.admits(mode),
            ModeFilter::Except(set) => !set.admits(mode),
        }
    }

    /// The modes this filter names explicitly.
    pub fn named(&self) -> ModeSet {
        match self {
            ModeFilter::Only(set) | ModeFilter::Except(set) => *set,
        }
    }
}

fn parse_modes(key: &'static str, value: &Value) -> Result<ModeSet, RuleDefect> {
    let items = value.as_array().filter(|items| !items.is_empty()).ok_or(RuleDefect::ModeShape(key))?;

    let mut set = ModeSet::empty();
    for item in items {
        let name = item.as_str().ok_or(RuleDefect::ModeShape(key))?;
        let mode = TravelMode::from_str(name).map_err(|_| RuleDefect::UnknownMode(name.to_string()))?;
        if set.contains(mode.bit()) {
            return Err(RuleDefect::DuplicateMode(name.to_string()));
        }
        set |= mode.bit();
    }
    Ok(set)
}

/// One candidate value and the domain it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedRule<'a> {
    pub value: &'a Value,
    pub apply_at: Option<GeometricRange>,
    pub apply_during: Option<TemporalWindow>,
    pub mode_filter: Option<ModeFilter>,
}

impl<'a> ScopedRule<'a> {
    /// Parse a rule, collecting every defect.
    pub fn inspect(value: &'a Value, scoping: &Scoping) -> Result<Self, Vec<RuleIssue>> {
        let Some(object) = value.as_object() else {
            return Err(vec![RuleIssue { key: None, defect: RuleDefect::NotAnObject }]);
        };

        let mut issues = Vec::new();

        let rule_value = object.get(&scoping.value_key);
        if rule_value.is_none() {
            issues.push(RuleIssue { key: None, defect: RuleDefect::MissingValue(scoping.value_key.clone()) });
        }

        let mut issue = |key: &str, defect: RuleDefect| issues.push(RuleIssue { key: Some(key.to_string()), defect });

        for key in object.keys() {
            if key != &scoping.value_key && !is_qualifier_key(key) && !key.starts_with("ext") {
                issue(key.as_str(), RuleDefect::UnknownKey(key.clone()));
            }
        }

        let apply_at = qualifier(object, APPLY_AT, Qualifiers::GEOMETRIC, scoping, &mut issue)
            .and_then(|raw| GeometricRange::from_json(raw).map_err(|defect| issue(APPLY_AT, defect)).ok());

        let apply_during = qualifier(object, APPLY_DURING, Qualifiers::TEMPORAL, scoping, &mut issue).and_then(|raw| {
            let Some(text) = raw.as_str() else {
                issue(APPLY_DURING, RuleDefect::WindowShape);
                return None;
            };
            TemporalWindow::parse(text)
                .map_err(|reason| issue(APPLY_DURING, RuleDefect::Window { input: text.to_string(), reason }))
                .ok()
        });

        let only = qualifier(object, MODES, Qualifiers::MODAL, scoping, &mut issue);
        let except = qualifier(object, NOT_MODES, Qualifiers::MODAL, scoping, &mut issue);
        let mode_filter = match (only, except) {
            (Some(_), Some(_)) => {
                issue(NOT_MODES, RuleDefect::ConflictingModeFilter);
                None
            }
            (Some(raw), None) => parse_modes(MODES, raw).map(ModeFilter::Only).map_err(|defect| issue(MODES, defect)).ok(),
            (None, Some(raw)) => {
                parse_modes(NOT_MODES, raw).map(ModeFilter::Except).map_err(|defect| issue(NOT_MODES, defect)).ok()
            }
            (None, None) => None,
        };

        match rule_value {
            Some(value) if issues.is_empty() => Ok(ScopedRule { value, apply_at, apply_during, mode_filter }),
            _ => Err(issues),
        }
    }

    /// Parse a rule, stopping at the first defect.
    pub fn parse(value: &'a Value, scoping: &Scoping) -> Result<Self, RuleDefect> {
        ScopedRule::inspect(value, scoping).map_err(|mut issues| issues.remove(0).defect)
    }

    /// The geometric extent, defaulting to the whole geometry.
    pub fn range(&self) -> GeometricRange {
        self.apply_at.unwrap_or(GeometricRange::FULL)
    }

    pub fn allows_mode(&self, mode: TravelMode, default_modes: ModeSet) -> bool {
        match &self.mode_filter {
            Some(filter) => filter.allows(mode),
            None => default_modes.admits(mode),
        }
    }

    pub fn matches(&self, query: &Query, default_modes: ModeSet) -> bool {
        query.at.is_none_or(|at| self.range().contains(at))
            && query.during.is_none_or(|at| self.apply_during.as_ref().is_none_or(|window| window.contains(at)))
            && query.mode.is_none_or(|mode| self.allows_mode(mode, default_modes))
    }

    /// Minutes of the week this rule applies to.
    pub fn week_mask(&self) -> WeekMask {
        self.apply_during.as_ref().map_or_else(WeekMask::full, TemporalWindow::week_mask)
    }
}

fn is_qualifier_key(key: &str) -> bool {
    matches!(key, APPLY_AT | APPLY_DURING | MODES | NOT_MODES)
}

fn qualifier<'v>(
    object: &'v Map<String, Value>,
    key: &'static str,
    required: Qualifiers,
    scoping: &Scoping,
    issue: &mut impl FnMut(&str, RuleDefect),
) -> Option<&'v Value> {
    let raw = object.get(key)?;
    if scoping.qualifiers.contains(required) {
        Some(raw)
    } else {
        issue(key, RuleDefect::UnsupportedQualifier(key));
        None
    }
}

/// A rule-based property as stored: a scalar, or rules in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopedValue<'a> {
    Scalar(&'a Value),
    Rules(Vec<ScopedRule<'a>>),
}

impl<'a> ScopedValue<'a> {
    pub fn parse(value: &'a Value, scoping: &Scoping) -> Result<Self, MalformedRuleError> {
        if !scoping.is_rule_array(value) {
            return Ok(ScopedValue::Scalar(value));
        }

        let rules = value
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(index, raw)| ScopedRule::parse(raw, scoping).map_err(|defect| MalformedRuleError { index, defect }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScopedValue::Rules(rules))
    }
}
