use overture_rules::harness::{CaseOutcome, Expectation, HarnessReport};
use overture_rules::{CoverageReport, Registry, Resolution, ValidationResult, Violation};
use std::path::Path;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub struct Printer {
    palette: ansi::Palette,
}

impl Printer {
    pub fn new(color: bool) -> Self {
        Printer { palette: ansi::Palette::new(color) }
    }

    pub fn validation(&self, file: &Path, result: &ValidationResult) {
        let p = &self.palette;
        let feature_type = result.feature_type.as_ref().map_or_else(|| "?".to_string(), ToString::to_string);

        if result.is_ok() {
            println!("{} {} {}", p.paint("✓", ansi::GREEN), file.display(), p.dim(feature_type));
            return;
        }

        println!(
            "{} {} {} {}",
            p.paint("✗", ansi::RED),
            p.bold(file.display().to_string()),
            p.dim(feature_type),
            p.paint(format!("({} violations)", result.violations.len()), ansi::YELLOW)
        );
        for violation in &result.violations {
            let path = if violation.path.is_empty() { "(document)" } else { &violation.path };
            println!("    {} {}", p.paint(path, ansi::CYAN), violation.message);
        }
    }

    pub fn schema_error(&self, file: &Path, err: &dyn std::fmt::Display) {
        let p = &self.palette;
        println!("{} {} {}", p.paint("✗", ansi::RED), p.bold(file.display().to_string()), p.paint(err.to_string(), ansi::RED));
    }

    pub fn harness(&self, report: &HarnessReport) {
        let p = &self.palette;

        println!("\n{}", p.paint("━━━ Failures ━━━", ansi::GRAY));
        let mut any = false;
        for case in report.failed() {
            any = true;
            let kind = match case.expectation {
                Expectation::Pass => "example",
                Expectation::Fail => "counterexample",
            };
            println!(
                "  {} {} {}",
                p.paint(format!("[{kind}]"), ansi::BLUE),
                p.bold(case.path.display().to_string()),
                p.paint(case.outcome.to_string(), ansi::RED)
            );
            let violations: &[Violation] = match &case.outcome {
                CaseOutcome::ExampleFailed(violations) => violations.as_slice(),
                CaseOutcome::MissingExpectedErrors { violations, .. } => violations.as_slice(),
                _ => &[],
            };
            for violation in violations {
                println!("      {} {}", p.paint(&violation.path, ansi::CYAN), p.dim(&violation.message));
            }
        }
        if !any {
            println!("{}", p.dim("  none"));
        }

        println!("\n{}", p.paint("━━━ Summary ━━━", ansi::GRAY));
        let failed = report.cases.len() - report.passed();
        println!(
            "  Cases: {}  │  Agreed: {}  │  Disagreed: {}",
            p.bold(report.cases.len().to_string()),
            p.paint(report.passed().to_string(), ansi::GREEN),
            if failed > 0 { p.paint(failed.to_string(), ansi::RED) } else { p.dim("0") }
        );
        println!();
    }

    pub fn resolution(&self, property: &str, resolution: &Resolution<'_>) {
        let p = &self.palette;
        match resolution {
            Resolution::Value { value, rule } => {
                let source = rule.map_or_else(|| "scalar".to_string(), |index| format!("rule {index}"));
                println!("{} = {} {}", p.paint(property, ansi::CYAN), p.bold(p.paint(value.to_string(), ansi::GREEN)), p.dim(format!("({source})")));
            }
            Resolution::NoMatch => {
                println!("{} {}", p.paint(property, ansi::CYAN), p.paint("no matching rule", ansi::YELLOW));
            }
        }
    }

    pub fn coverage(&self, property: &str, report: &CoverageReport) {
        let p = &self.palette;
        println!("\n{}", p.bold(p.paint(format!("⚙  Coverage: {property}"), ansi::CYAN)));

        println!("\n{}", p.paint("━━━ Gaps ━━━", ansi::GRAY));
        if report.gaps.is_empty() {
            println!("{}", p.dim("  none"));
        }
        for gap in &report.gaps {
            let mode = gap.mode.map_or_else(|| "any mode".to_string(), |mode| mode.to_string());
            let time = if gap.partial_time { "part of the week" } else { "always" };
            println!("  {} {} {}", p.paint(gap.range.to_string(), ansi::YELLOW), p.paint(mode, ansi::BLUE), p.dim(time));
        }

        println!("\n{}", p.paint("━━━ Overlaps ━━━", ansi::GRAY));
        if report.overlaps.is_empty() {
            println!("{}", p.dim("  none"));
        }
        for overlap in &report.overlaps {
            let mode = overlap.mode.map_or_else(|| "any mode".to_string(), |mode| mode.to_string());
            let rules: Vec<String> = overlap.rules.iter().map(ToString::to_string).collect();
            println!(
                "  {} {} {} {}",
                p.paint(overlap.range.to_string(), ansi::YELLOW),
                p.paint(mode, ansi::BLUE),
                p.dim(format!("rules {}", rules.join(", "))),
                p.paint(format!("winner {}", overlap.winner), ansi::GREEN)
            );
        }
        println!();
    }

    pub fn feature_types(&self, registry: &Registry, properties: bool) {
        let p = &self.palette;
        for feature_type in registry.feature_types() {
            let Ok(schema) = registry.resolve(&feature_type.theme, &feature_type.kind, feature_type.subtype.as_deref()) else {
                continue;
            };
            let geometry: Vec<&str> = schema.geometry.iter().map(AsRef::as_ref).collect();
            let label = feature_type.to_string();
            let label = if feature_type.subtype.is_some() { format!("  {label}") } else { p.bold(label) };
            println!("{label} {}", p.dim(format!("[{}] {} properties", geometry.join(", "), schema.properties.len())));

            if !properties {
                continue;
            }
            for (name, def) in &schema.properties {
                let marker = if schema.required.contains(name) { "*" } else { " " };
                let kind = if def.scoping.is_some() { format!("{} (scoped)", def.kind.name()) } else { def.kind.name().to_string() };
                let description = def.description.as_deref().unwrap_or("");
                println!("    {marker} {} {} {}", p.paint(name, ansi::CYAN), p.paint(kind, ansi::BLUE), p.dim(description));
            }
        }
    }
}
