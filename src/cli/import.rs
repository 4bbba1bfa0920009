use std::{path::PathBuf, process};

use clap::Parser;
use serde_json::{json, Value};
use tdm::{domain::UnitRatios, Characteristic, Config, DebtModel, ModelImporter, ValidationReport};
use tracing::instrument;

use super::terminal::{is_narrow, print_report, Colorize};

#[derive(Debug, Parser)]
#[command(about = "Import a model document and print the resulting model")]
pub struct Import {
    /// The model document (YAML or JSON)
    path: PathBuf,

    /// The rule catalog file (defaults to the configured one)
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "tree")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Tree,
    Json,
    Summary,
}

impl Import {
    #[instrument(level = "debug", skip(self, config), fields(path = %self.path.display()))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let catalog = super::load_catalog(self.rules, config)?;
        let bytes = std::fs::read(&self.path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", self.path.display()))?;
        let (model, report) = ModelImporter::new()
            .import_bytes(&bytes, &catalog)
            .map_err(|e| anyhow::anyhow!("{}: {e}", self.path.display()))?;

        match self.output {
            OutputFormat::Tree => {
                for line in tree_lines(&model, config.unit_ratios(), !is_narrow()) {
                    println!("{line}");
                }
                if !report.is_empty() {
                    println!();
                }
                print_report(&report);
            }
            OutputFormat::Json => {
                let output = to_json(&model, &report, config.unit_ratios());
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Summary => println!("{}", summary(&model, &report)),
        }

        if config.rejects(&report) {
            process::exit(2);
        }

        Ok(())
    }
}

/// Renders the model as an indented tree, one line per characteristic and
/// requirement.
fn tree_lines(model: &DebtModel, ratios: UnitRatios, with_minutes: bool) -> Vec<String> {
    let cost = |cost: tdm::WorkUnit| {
        if with_minutes && cost.unit() != tdm::TimeUnit::Minutes {
            format!("{cost} {}", format!("({}mn)", cost.minutes_with(ratios)).dim())
        } else {
            cost.to_string()
        }
    };

    let mut lines = Vec::new();
    for characteristic in model.characteristics() {
        let indent = "  ".repeat(characteristic.depth());
        let order = characteristic
            .order()
            .map(|order| format!("{order}. "))
            .unwrap_or_default();
        lines.push(format!(
            "{indent}{order}{} {}",
            characteristic.key(),
            characteristic.name().dim()
        ));

        for requirement in characteristic.requirements() {
            lines.push(format!(
                "{indent}  - {}:{} {} factor={} offset={}",
                requirement.rule().repository(),
                requirement.rule().key(),
                requirement.function(),
                cost(requirement.factor()),
                cost(requirement.offset()),
            ));
        }
    }
    lines
}

fn to_json(model: &DebtModel, report: &ValidationReport, ratios: UnitRatios) -> Value {
    fn characteristic_json(characteristic: Characteristic<'_>, ratios: UnitRatios) -> Value {
        let requirements: Vec<_> = characteristic
            .requirements()
            .iter()
            .map(|requirement| {
                json!({
                    "repository": requirement.rule().repository(),
                    "key": requirement.rule().key(),
                    "function": requirement.function(),
                    "factor": requirement.factor(),
                    "offset": requirement.offset(),
                    "unit_cost_minutes": requirement.factor().minutes_with(ratios)
                        + requirement.offset().minutes_with(ratios),
                })
            })
            .collect();
        let children: Vec<_> = characteristic
            .children()
            .map(|child| characteristic_json(child, ratios))
            .collect();

        json!({
            "key": characteristic.key(),
            "name": characteristic.name(),
            "order": characteristic.order(),
            "requirements": requirements,
            "children": children,
        })
    }

    let characteristics: Vec<_> = model
        .roots()
        .map(|root| characteristic_json(root, ratios))
        .collect();

    json!({
        "characteristics": characteristics,
        "unit_cost_minutes": model.unit_cost_minutes(ratios),
        "fingerprint": model.fingerprint(),
        "report": report,
    })
}

fn summary(model: &DebtModel, report: &ValidationReport) -> String {
    format!(
        "characteristics={} requirements={} errors={} warnings={}",
        model.len(),
        model.requirements().count(),
        report.errors().len(),
        report.warnings().len()
    )
}
