use std::fmt;

use crate::registry::FeatureType;

/// One structural problem, located by a JSON pointer into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "(document)" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

/// Outcome of a single `validate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    /// The schema the document was checked against, once it could be resolved.
    pub feature_type: Option<FeatureType>,
    /// Every violation found, in check order.
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub(crate) fn new(feature_type: Option<FeatureType>, violations: Vec<Violation>) -> Self {
        ValidationResult { ok: violations.is_empty(), feature_type, violations }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// True when some violation's message or path contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.message.contains(needle) || v.path.contains(needle))
    }
}

/// Append one reference token to a JSON pointer (RFC 6901 escaping).
pub(crate) fn pointer(base: &str, token: impl fmt::Display) -> String {
    let token = token.to_string().replace('~', "~0").replace('/', "~1");
    format!("{base}/{token}")
}

/// Ordered violation sink.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<Violation>);

impl Violations {
    pub fn push(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(Violation { path: path.to_string(), message: message.into() });
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}
