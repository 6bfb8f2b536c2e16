//! Example/counterexample test harness.
//!
//! ```text
//! <root>/examples/**/*.json         must validate
//! <root>/counterexamples/**/*.json  must not validate; an optional top-level
//!                                   `ext_expected_errors: [..]` lists substrings
//!                                   that must each appear in some violation
//! ```

use log::{debug, warn};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::validator::{Validator, Violation};

/// Top-level key listing the violations a counterexample must produce.
pub const EXPECTED_ERRORS: &str = "ext_expected_errors";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Agreed,
    /// An example produced violations.
    ExampleFailed(Vec<Violation>),
    /// A counterexample validated cleanly.
    CounterexamplePassed,
    /// A counterexample failed, but not with every expected violation.
    MissingExpectedErrors { missing: Vec<String>, violations: Vec<Violation> },
    /// The file could not be read, parsed or matched to a schema.
    Error(String),
}

impl CaseOutcome {
    pub fn is_agreement(&self) -> bool {
        matches!(self, CaseOutcome::Agreed)
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseOutcome::Agreed => write!(f, "ok"),
            CaseOutcome::ExampleFailed(violations) => {
                write!(f, "example failed validation ({} violations)", violations.len())
            }
            CaseOutcome::CounterexamplePassed => write!(f, "counterexample passed validation"),
            CaseOutcome::MissingExpectedErrors { missing, .. } => {
                write!(f, "counterexample failed without expected errors: {}", missing.join(", "))
            }
            CaseOutcome::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Case {
    pub path: PathBuf,
    pub expectation: Expectation,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct HarnessReport {
    pub cases: Vec<Case>,
}

impl HarnessReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|case| case.outcome.is_agreement()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter().filter(|case| !case.outcome.is_agreement())
    }

    pub fn is_success(&self) -> bool {
        self.cases.iter().all(|case| case.outcome.is_agreement())
    }
}

/// Substrings listed under [`EXPECTED_ERRORS`].
pub fn expected_errors(document: &Value) -> Vec<String> {
    document
        .get(EXPECTED_ERRORS)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Compare one document's validation outcome with what the fixture expects.
pub fn judge(validator: &Validator<'_>, document: &Value, expectation: Expectation) -> CaseOutcome {
    let result = match validator.validate(document) {
        Ok(result) => result,
        // A document naming an unregistered feature type is still a rejection.
        Err(err) if expectation == Expectation::Fail => {
            let message = err.to_string();
            let missing: Vec<String> =
                expected_errors(document).into_iter().filter(|needle| !message.contains(needle.as_str())).collect();
            return if missing.is_empty() {
                CaseOutcome::Agreed
            } else {
                CaseOutcome::MissingExpectedErrors { missing, violations: vec![Violation { path: String::new(), message }] }
            };
        }
        Err(err) => return CaseOutcome::Error(err.to_string()),
    };

    match expectation {
        Expectation::Pass if result.is_ok() => CaseOutcome::Agreed,
        Expectation::Pass => CaseOutcome::ExampleFailed(result.violations),
        Expectation::Fail if result.is_ok() => CaseOutcome::CounterexamplePassed,
        Expectation::Fail => {
            let missing: Vec<String> =
                expected_errors(document).into_iter().filter(|needle| !result.mentions(needle)).collect();
            if missing.is_empty() {
                CaseOutcome::Agreed
            } else {
                CaseOutcome::MissingExpectedErrors { missing, violations: result.violations }
            }
        }
    }
}

/// Read and judge one file.
pub fn judge_file(validator: &Validator<'_>, path: &Path, expectation: Expectation) -> CaseOutcome {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => return CaseOutcome::Error(format!("cannot read file: {err}")),
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(document) => judge(validator, &document, expectation),
        Err(err) => CaseOutcome::Error(format!("invalid JSON: {err}")),
    }
}

/// Every `*.json` file under `dir`, sorted by path.
pub fn json_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("[harness] skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "json"))
        .map(|entry| entry.into_path())
        .collect()
}

/// Run every fixture under `root/examples` and `root/counterexamples`.
pub fn run(validator: &Validator<'_>, root: &Path) -> std::io::Result<HarnessReport> {
    let examples = root.join("examples");
    let counterexamples = root.join("counterexamples");
    if !examples.is_dir() && !counterexamples.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} has neither an examples/ nor a counterexamples/ directory", root.display()),
        ));
    }

    let mut report = HarnessReport::default();
    for (dir, expectation) in [(examples, Expectation::Pass), (counterexamples, Expectation::Fail)] {
        for path in json_files(&dir) {
            let outcome = judge_file(validator, &path, expectation);
            debug!("[harness] {}: {outcome}", path.display());
            report.cases.push(Case { path, expectation, outcome });
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::registry;
    use serde_json::json;

    fn connector() -> Value {
        json!({
            "type": "Feature",
            "id": "c-1",
            "geometry": {"type": "Point", "coordinates": [0, 0]},
            "properties": {
                "theme": "transportation", "type": "connector",
                "version": 0, "updateTime": "2024-01-01T00:00:00Z"
            }
        })
    }

    #[test]
    fn example_and_counterexample_outcomes() {
        let validator = Validator::new(registry());
        assert_eq!(judge(&validator, &connector(), Expectation::Pass), CaseOutcome::Agreed);
        assert_eq!(judge(&validator, &connector(), Expectation::Fail), CaseOutcome::CounterexamplePassed);

        let mut broken = connector();
        broken["properties"]["foo"] = json!(true);
        assert!(matches!(judge(&validator, &broken, Expectation::Pass), CaseOutcome::ExampleFailed(_)));
        assert_eq!(judge(&validator, &broken, Expectation::Fail), CaseOutcome::Agreed);
    }

    #[test]
    fn expected_errors_must_all_appear() {
        let validator = Validator::new(registry());
        let mut broken = connector();
        broken["properties"]["foo"] = json!(true);
        broken[EXPECTED_ERRORS] = json!(["unexpected property 'foo'", "missing required property"]);

        match judge(&validator, &broken, Expectation::Fail) {
            CaseOutcome::MissingExpectedErrors { missing, .. } => assert_eq!(missing, vec!["missing required property"]),
            other => panic!("unexpected outcome {other}"),
        }
    }

    #[test]
    fn unregistered_type_counts_as_rejection() {
        let validator = Validator::new(registry());
        let mut document = connector();
        document["properties"]["type"] = json!("roundabout");
        document[EXPECTED_ERRORS] = json!(["no schema registered"]);
        assert_eq!(judge(&validator, &document, Expectation::Fail), CaseOutcome::Agreed);
        assert!(matches!(judge(&validator, &document, Expectation::Pass), CaseOutcome::Error(_)));
    }

    #[test]
    fn runs_fixture_tree() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let report = run(&Validator::new(registry()), &root).unwrap();
        assert!(report.cases.iter().any(|case| case.expectation == Expectation::Pass));
        assert!(report.cases.iter().any(|case| case.expectation == Expectation::Fail));
        let failures: Vec<String> =
            report.failed().map(|case| format!("{}: {}", case.path.display(), case.outcome)).collect();
        assert!(report.is_success(), "{failures:#?}");
        assert_eq!(report.passed(), report.cases.len());
    }

    #[test]
    fn missing_fixture_root_is_an_error() {
        let err = run(&Validator::new(registry()), Path::new("/nonexistent/fixtures")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
