//! `overture-rules`: validate Overture feature documents and inspect their
//! rule-based properties.
//!
//! **Usage:**
//! ```text
//! overture-rules check <FILES>...
//! overture-rules test [ROOT]
//! overture-rules resolve <FILE> --property <PATH> [--at F] [--time TS] [--mode M]
//! overture-rules coverage <FILE> --property <PATH>
//! overture-rules list [--properties]
//! ```
//!
//! Exit codes: 0 success, 1 validation failure, malformed rule data or
//! harness disagreement, 2 usage or I/O error.

mod report;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use log::info;
use overture_rules::harness;
use overture_rules::{
    PropertyError, Query, Registry, RegistryBuilder, SchemaError, SchemaLayer, TravelMode, Validator, ValidatorOptions,
    themes,
};
use serde_json::Value;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

/// Validate Overture features and resolve scoped rule properties.
#[derive(Parser)]
#[command(name = "overture-rules", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// Extra schema layer (JSON) to register after the built-in themes.
    #[arg(long = "schema", global = true, value_name = "FILE")]
    schemas: Vec<PathBuf>,

    /// Maximum nesting depth below `properties`.
    #[arg(long, global = true, default_value_t = ValidatorOptions::default().max_depth)]
    max_depth: usize,

    /// Maximum number of rules in one scoped property.
    #[arg(long, global = true, default_value_t = ValidatorOptions::default().max_rules)]
    max_rules: usize,

    /// Force ANSI color output.
    #[arg(long, global = true, overrides_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Validate feature documents and print every violation.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Run `examples/` (must pass) and `counterexamples/` (must fail) under ROOT.
    Test {
        #[arg(default_value = "fixtures")]
        root: PathBuf,
    },
    /// Resolve the effective value of a rule-based property.
    Resolve {
        file: PathBuf,
        /// Property path below `properties`, e.g. `restrictions/speedLimits`.
        #[arg(long)]
        property: String,
        /// Linear-reference position in [0, 1].
        #[arg(long)]
        at: Option<f64>,
        /// Local time, `YYYY-MM-DDTHH:MM[:SS]`.
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveDateTime>,
        /// Travel mode, e.g. `car` or `motor_vehicle`.
        #[arg(long, value_parser = parse_mode)]
        mode: Option<TravelMode>,
    },
    /// Report gaps and ambiguous overlaps in a rule-based property.
    Coverage {
        file: PathBuf,
        #[arg(long)]
        property: String,
    },
    /// List registered feature types.
    List {
        /// Also print every property with its kind and description.
        #[arg(long)]
        properties: bool,
    },
}

fn parse_time(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("invalid time '{value}' (expected YYYY-MM-DDTHH:MM[:SS])"))
}

fn parse_mode(value: &str) -> Result<TravelMode, String> {
    TravelMode::from_str(value).map_err(|_| format!("unknown travel mode '{value}'"))
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the command succeeded; `Err` is a usage or I/O problem.
fn run(cli: Cli) -> Result<bool> {
    let global = cli.global;
    let color = if global.no_color { false } else { global.color || io::stdout().is_terminal() };
    let printer = report::Printer::new(color);
    let options = ValidatorOptions { max_depth: global.max_depth, max_rules: global.max_rules };

    let extended;
    let registry: &Registry = if global.schemas.is_empty() {
        overture_rules::registry()
    } else {
        extended = load_registry(&global.schemas)?;
        &extended
    };
    let validator = Validator::with_options(registry, options);

    match cli.command {
        Command::Check { files } => {
            let mut ok = true;
            for file in &files {
                let document = read_document(file)?;
                match validator.validate(&document) {
                    Ok(result) => {
                        ok &= result.is_ok();
                        printer.validation(file, &result);
                    }
                    Err(err) => {
                        ok = false;
                        printer.schema_error(file, &err);
                    }
                }
            }
            Ok(ok)
        }
        Command::Test { root } => {
            let report = harness::run(&validator, &root).with_context(|| format!("cannot run fixtures in {}", root.display()))?;
            info!("{} cases under {}", report.cases.len(), root.display());
            printer.harness(&report);
            Ok(report.is_success())
        }
        Command::Resolve { file, property, at, time, mode } => {
            let document = read_document(&file)?;
            let query = Query { at, during: time, mode };
            match overture_rules::resolve_property(registry, &document, &property, &query) {
                Ok(resolution) => {
                    printer.resolution(&property, &resolution);
                    Ok(true)
                }
                Err(err) => data_defect(&printer, &file, err),
            }
        }
        Command::Coverage { file, property } => {
            let document = read_document(&file)?;
            match overture_rules::property_coverage(registry, &document, &property) {
                Ok(report) => {
                    printer.coverage(&property, &report);
                    Ok(report.is_clean())
                }
                Err(err) => data_defect(&printer, &file, err),
            }
        }
        Command::List { properties } => {
            printer.feature_types(registry, properties);
            Ok(true)
        }
    }
}

/// Malformed rules are a fault in the document, reported like a failed
/// check; every other property error is a usage problem.
fn data_defect(printer: &report::Printer, file: &Path, err: PropertyError) -> Result<bool> {
    match err {
        PropertyError::Malformed { .. } => {
            printer.schema_error(file, &err);
            Ok(false)
        }
        other => Err(other.into()),
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Built-in themes plus the given layer files.
fn load_registry(schemas: &[PathBuf]) -> Result<Registry> {
    let mut builder = RegistryBuilder::new();
    themes::bootstrap(&mut builder)?;

    for path in schemas {
        let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let layer = SchemaLayer::from_json(&text)
            .map_err(SchemaError::from)
            .with_context(|| format!("invalid schema layer {}", path.display()))?;
        info!("registering {} from {}", layer.feature_type(), path.display());
        builder.register(layer)?;
    }

    Ok(builder.freeze()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overture_rules::{MalformedRuleError, RuleDefect};

    #[test]
    fn malformed_rules_fail_like_a_check() {
        let printer = report::Printer::new(false);
        let malformed = PropertyError::Malformed {
            path: "restrictions/speedLimits".to_string(),
            source: MalformedRuleError { index: 0, defect: RuleDefect::RangeOrder { start: 0.6, end: 0.2 } },
        };
        assert!(!data_defect(&printer, Path::new("road.json"), malformed).unwrap());
    }

    #[test]
    fn other_property_errors_are_usage_errors() {
        let printer = report::Printer::new(false);
        let err = data_defect(&printer, Path::new("road.json"), PropertyError::NotFound("width".to_string()));
        assert!(err.unwrap_err().to_string().contains("'width'"));
    }

    #[test]
    fn list_accepts_properties_flag() {
        let cli = Cli::try_parse_from(["overture-rules", "list", "--properties"]).unwrap();
        assert!(matches!(cli.command, Command::List { properties: true }));
    }
}
