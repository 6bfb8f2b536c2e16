//! Gap and overlap detection for rule arrays.
//!
//! The checker is advisory: the schema accepts gapped and overlapping rules
//! and leaves interpretation to the resolver. Reports are meant for linting
//! data and for tests.
//!
//! ```text
//! applyAt boundaries: 0 ──── 0.3 ──── 0.6 ──── 1
//! sub-intervals:      [0,0.3]  [0.3,0.6]  [0.6,1]
//!                       R0        —         R1      => gap [0.3, 0.6]
//! ```
//!
//! Once any rule carries a mode filter, each sub-interval is checked for every
//! mode a query could name against these rules: the default modes plus the
//! named modes and their descendants. Rules without filters behave the same
//! for every mode, so they get a single mode-agnostic pass. Time windows are
//! compared at minute resolution over a week.

use log::debug;
use serde_json::Value;

use super::modes::{ModeSet, TravelMode};
use super::opening_hours::WeekMask;
use super::rule::{GeometricRange, MalformedRuleError, ScopedRule, ScopedValue, Scoping};

#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub range: GeometricRange,
    /// Mode the gap was found for; `None` for mode-agnostic checks.
    pub mode: Option<TravelMode>,
    /// Some rule covers this range for part of the week.
    pub partial_time: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlap {
    pub range: GeometricRange,
    pub mode: Option<TravelMode>,
    /// Indices of the rules that compete, ascending.
    pub rules: Vec<usize>,
    /// The rule the resolver picks (the last declared).
    pub winner: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub gaps: Vec<Gap>,
    pub overlaps: Vec<Overlap>,
}

impl CoverageReport {
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty() && self.overlaps.is_empty()
    }
}

/// Check a parsed property. Scalars cover everything and never conflict.
pub fn check_coverage(property: &ScopedValue<'_>, default_modes: ModeSet) -> CoverageReport {
    match property {
        ScopedValue::Scalar(_) => CoverageReport::default(),
        ScopedValue::Rules(rules) => check_rules(rules, default_modes),
    }
}

/// Parse `value` according to `scoping` and check it.
pub fn check_coverage_json(
    value: &Value,
    scoping: &Scoping,
    default_modes: ModeSet,
) -> Result<CoverageReport, MalformedRuleError> {
    let property = ScopedValue::parse(value, scoping)?;
    Ok(check_coverage(&property, default_modes))
}

fn check_rules(rules: &[ScopedRule<'_>], default_modes: ModeSet) -> CoverageReport {
    let mut report = CoverageReport::default();
    let intervals = partition(rules);
    let masks: Vec<WeekMask> = rules.iter().map(ScopedRule::week_mask).collect();

    let named: ModeSet =
        rules.iter().filter_map(|rule| rule.mode_filter.map(|filter| filter.named())).fold(ModeSet::empty(), |a, b| a | b);
    let modes: Vec<Option<TravelMode>> = if named.is_empty() {
        vec![None]
    } else {
        ModeSet::all().modes().filter(|mode| default_modes.contains(mode.bit()) || named.admits(*mode)).map(Some).collect()
    };

    for mode in modes {
        for &(start, end) in &intervals {
            let covering: Vec<usize> = rules
                .iter()
                .enumerate()
                .filter(|(_, rule)| rule.range().covers(start, end))
                .filter(|(_, rule)| mode.is_none_or(|mode| rule.allows_mode(mode, default_modes)))
                .map(|(index, _)| index)
                .collect();

            let range = GeometricRange { start, end };

            let mut union = WeekMask::empty();
            for &index in &covering {
                union.union(&masks[index]);
            }
            if !union.is_full() {
                push_gap(&mut report.gaps, Gap { range, mode, partial_time: !union.is_empty() });
            }

            let competing: Vec<usize> = covering
                .iter()
                .copied()
                .filter(|&i| {
                    covering
                        .iter()
                        .any(|&j| i != j && rules[i].value != rules[j].value && masks[i].intersects(&masks[j]))
                })
                .collect();
            if let Some(winner) = competing.last().copied() {
                push_overlap(&mut report.overlaps, Overlap { range, mode, rules: competing, winner });
            }
        }
    }

    debug!("[coverage] {} rules: {} gaps, {} overlaps", rules.len(), report.gaps.len(), report.overlaps.len());
    report
}

/// Split `[0, 1]` at every rule boundary.
fn partition(rules: &[ScopedRule<'_>]) -> Vec<(f64, f64)> {
    let mut points = vec![0.0, 1.0];
    for rule in rules {
        let range = rule.range();
        points.push(range.start);
        points.push(range.end);
    }
    points.sort_by(f64::total_cmp);
    points.dedup();
    points.windows(2).map(|pair| (pair[0], pair[1])).collect()
}

fn push_gap(gaps: &mut Vec<Gap>, gap: Gap) {
    match gaps.last_mut() {
        Some(last)
            if last.mode == gap.mode && last.partial_time == gap.partial_time && last.range.end == gap.range.start =>
        {
            last.range.end = gap.range.end;
        }
        _ => gaps.push(gap),
    }
}

fn push_overlap(overlaps: &mut Vec<Overlap>, overlap: Overlap) {
    match overlaps.last_mut() {
        Some(last)
            if last.mode == overlap.mode && last.rules == overlap.rules && last.range.end == overlap.range.start =>
        {
            last.range.end = overlap.range.end;
        }
        _ => overlaps.push(overlap),
    }
}
