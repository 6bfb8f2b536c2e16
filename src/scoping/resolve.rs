//! Effective-value resolution for rule-based properties.
//!
//! ```text
//! scalar ─────────────────────────────────────────▶ Value { rule: None }
//! rules  ── scan in declaration order ─┬─ match ──▶ remember, keep scanning
//!                                      └─ done ───▶ last match | NoMatch
//! ```
//!
//! Well-formed data is expected to be non-overlapping. When several rules
//! match the same query the one declared last wins; the coverage checker
//! flags such overlaps so they can be fixed at the source.

use chrono::NaiveDateTime;
use log::trace;
use serde_json::Value;

use super::modes::{ModeSet, TravelMode};
use super::rule::{MalformedRuleError, ScopedValue, Scoping};

/// A point in the query space. Absent coordinates match every rule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Query {
    /// Linear-reference position along the geometry.
    pub at: Option<f64>,
    /// Local date and time.
    pub during: Option<NaiveDateTime>,
    pub mode: Option<TravelMode>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    pub fn at(mut self, position: f64) -> Self {
        self.at = Some(position);
        self
    }

    pub fn during(mut self, time: NaiveDateTime) -> Self {
        self.during = Some(time);
        self
    }

    pub fn mode(mut self, mode: TravelMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The effective value and the index of the rule that produced it
    /// (`None` for a scalar).
    Value { value: &'a Value, rule: Option<usize> },
    /// No rule applies; the caller falls back to an externally defined
    /// default (road class, jurisdiction, ...).
    NoMatch,
}

impl<'a> Resolution<'a> {
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Resolution::Value { value, .. } => Some(value),
            Resolution::NoMatch => None,
        }
    }
}

/// Resolve an already-parsed property at `query`.
pub fn resolve_at<'a>(property: &ScopedValue<'a>, query: &Query, default_modes: ModeSet) -> Resolution<'a> {
    let rules = match property {
        ScopedValue::Scalar(value) => return Resolution::Value { value, rule: None },
        ScopedValue::Rules(rules) => rules,
    };

    let mut winner = None;
    for (index, rule) in rules.iter().enumerate() {
        if rule.matches(query, default_modes) {
            if let Some(previous) = winner {
                trace!("[resolve] rule {index} supersedes rule {previous} at {query:?}");
            }
            winner = Some(index);
        }
    }

    match winner {
        Some(index) => Resolution::Value { value: rules[index].value, rule: Some(index) },
        None => {
            trace!("[resolve] no rule matches {query:?}");
            Resolution::NoMatch
        }
    }
}

/// Parse `value` according to `scoping` and resolve it at `query`.
pub fn resolve_json<'a>(
    value: &'a Value,
    scoping: &Scoping,
    query: &Query,
    default_modes: ModeSet,
) -> Result<Resolution<'a>, MalformedRuleError> {
    let property = ScopedValue::parse(value, scoping)?;
    Ok(resolve_at(&property, query, default_modes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoping::rule::{Qualifiers, RuleDefect};
    use chrono::NaiveDate;
    use serde_json::json;

    fn speed_limits() -> Scoping {
        Scoping::rules("maxSpeed", Qualifiers::all())
    }

    fn resolve<'a>(value: &'a Value, query: Query) -> Option<&'a Value> {
        resolve_json(value, &speed_limits(), &query, ModeSet::all()).unwrap().value()
    }

    #[test]
    fn scalar_is_returned_for_any_query() {
        let value = json!("paved");
        let scoping = Scoping::new(Qualifiers::GEOMETRIC);
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(3, 0, 0).unwrap();
        let queries = [
            Query::new(),
            Query::new().at(0.0),
            Query::new().at(1.0).mode(TravelMode::Foot),
            Query::new().at(0.5).during(monday).mode(TravelMode::Truck),
        ];
        for query in queries {
            let resolution = resolve_json(&value, &scoping, &query, ModeSet::empty()).unwrap();
            assert_eq!(resolution, Resolution::Value { value: &value, rule: None });
        }
    }

    #[test]
    fn simple_speed_limit_applies_along_whole_segment() {
        let value = json!([{"maxSpeed": [50, "km/h"], "applyAt": [0, 1]}]);
        for at in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(resolve(&value, Query::new().at(at)), Some(&json!([50, "km/h"])));
        }
    }

    #[test]
    fn range_boundaries_match_inclusively() {
        let value = json!([{"maxSpeed": [30, "km/h"], "applyAt": [0.2, 0.4]}]);
        assert!(resolve(&value, Query::new().at(0.2)).is_some());
        assert!(resolve(&value, Query::new().at(0.4)).is_some());
        assert!(resolve(&value, Query::new().at(0.2 - 1e-9)).is_none());
        assert!(resolve(&value, Query::new().at(0.4 + 1e-9)).is_none());
    }

    #[test]
    fn last_declared_rule_wins() {
        let value = json!([
            {"maxSpeed": [50, "km/h"], "applyAt": [0, 0.6]},
            {"maxSpeed": [30, "km/h"], "applyAt": [0.4, 1]}
        ]);
        let resolution = resolve_json(&value, &speed_limits(), &Query::new().at(0.5), ModeSet::all()).unwrap();
        assert_eq!(resolution, Resolution::Value { value: &json!([30, "km/h"]), rule: Some(1) });
        assert_eq!(resolve(&value, Query::new().at(0.1)), Some(&json!([50, "km/h"])));
    }

    #[test]
    fn excluded_mode_falls_through_to_earlier_rule() {
        let value = json!([
            {"maxSpeed": [80, "km/h"]},
            {"maxSpeed": [60, "km/h"], "notModes": ["truck"]}
        ]);
        assert_eq!(resolve(&value, Query::new().mode(TravelMode::Truck)), Some(&json!([80, "km/h"])));
        assert_eq!(resolve(&value, Query::new().mode(TravelMode::Car)), Some(&json!([60, "km/h"])));
        assert_eq!(resolve(&value, Query::new()), Some(&json!([60, "km/h"])));
    }

    #[test]
    fn uncovered_point_is_no_match() {
        let value = json!([
            {"maxSpeed": [50, "km/h"], "applyAt": [0, 0.3]},
            {"maxSpeed": [50, "km/h"], "applyAt": [0.6, 1]}
        ]);
        let resolution = resolve_json(&value, &speed_limits(), &Query::new().at(0.45), ModeSet::all()).unwrap();
        assert_eq!(resolution, Resolution::NoMatch);
    }

    #[test]
    fn time_window_limits_rule() {
        let value = json!([
            {"maxSpeed": [50, "km/h"]},
            {"maxSpeed": [30, "km/h"], "applyDuring": "Mo-Fr 07:00-09:00"}
        ]);
        let rush = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(8, 15, 0).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap().and_hms_opt(8, 15, 0).unwrap();
        assert_eq!(resolve(&value, Query::new().during(rush)), Some(&json!([30, "km/h"])));
        assert_eq!(resolve(&value, Query::new().during(sunday)), Some(&json!([50, "km/h"])));
    }

    #[test]
    fn rule_without_filter_uses_default_modes() {
        let value = json!([{"maxSpeed": [20, "km/h"]}]);
        let query = Query::new().mode(TravelMode::Car);
        assert_eq!(resolve_json(&value, &speed_limits(), &query, ModeSet::empty()).unwrap(), Resolution::NoMatch);
        assert!(resolve_json(&value, &speed_limits(), &query, ModeSet::MOTOR_VEHICLE).unwrap().value().is_some());
    }

    #[test]
    fn malformed_rule_is_an_error() {
        let value = json!([{"maxSpeed": [20, "km/h"], "applyAt": [0.9, 0.1]}]);
        let err = resolve_json(&value, &speed_limits(), &Query::new(), ModeSet::all()).unwrap_err();
        assert_eq!(err, MalformedRuleError { index: 0, defect: RuleDefect::RangeOrder { start: 0.9, end: 0.1 } });
    }
}
