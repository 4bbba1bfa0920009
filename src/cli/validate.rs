use std::{
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use tdm::{Config, ModelImporter, RuleCatalog, ValidationReport};
use tracing::instrument;
use walkdir::WalkDir;

use super::terminal::{print_report, Colorize};

/// File extensions recognised as model documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Parser)]
#[command(about = "Check model documents against the rule catalog")]
pub struct Validate {
    /// Model documents, or directories to search for them
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// The rule catalog file (defaults to the configured one)
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Only print documents that fail
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// The result of validating one document.
#[derive(Debug)]
enum Outcome {
    /// The document could not be read as a model.
    Unreadable(String),
    /// The document was imported.
    Imported {
        characteristics: usize,
        requirements: usize,
        report: ValidationReport,
    },
}

impl Outcome {
    fn fails(&self, config: &Config) -> bool {
        match self {
            Self::Unreadable(_) => true,
            Self::Imported { report, .. } => config.rejects(report),
        }
    }
}

impl Validate {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let catalog = super::load_catalog(self.rules.clone(), config)?;
        let documents = collect_documents(&self.paths)?;

        let outcomes: Vec<_> = documents
            .into_iter()
            .map(|path| {
                let outcome = validate_document(&path, &catalog);
                (path, outcome)
            })
            .collect();
        tracing::debug!(
            documents = outcomes.len(),
            rules = catalog.cached_lookups(),
            "validated documents"
        );

        match self.output {
            OutputFormat::Table => self.output_table(&outcomes, config),
            OutputFormat::Json => Self::output_json(&outcomes, config)?,
        }

        if outcomes.iter().any(|(_, outcome)| outcome.fails(config)) {
            process::exit(2);
        }

        Ok(())
    }

    fn output_table(&self, outcomes: &[(PathBuf, Outcome)], config: &Config) {
        let mut failed = 0;
        for (path, outcome) in outcomes {
            let fails = outcome.fails(config);
            if fails {
                failed += 1;
            } else if self.quiet {
                continue;
            }

            match outcome {
                Outcome::Unreadable(error) => {
                    println!("{} {}: {error}", "✗".error(), path.display());
                }
                Outcome::Imported {
                    characteristics,
                    requirements,
                    report,
                } => {
                    let mark = if fails { "✗".error() } else { "✓".success() };
                    println!(
                        "{mark} {}: {characteristics} characteristics, {requirements} requirements, \
                         {} errors, {} warnings",
                        path.display(),
                        report.errors().len(),
                        report.warnings().len()
                    );
                    print_report(report);
                }
            }
        }

        if self.quiet {
            return;
        }
        if failed == 0 {
            println!(
                "\n{}",
                format!("{} documents valid", outcomes.len()).success()
            );
        } else {
            println!(
                "\n{}",
                format!("{failed} of {} documents failed", outcomes.len()).warning()
            );
        }
    }

    fn output_json(outcomes: &[(PathBuf, Outcome)], config: &Config) -> anyhow::Result<()> {
        use serde_json::json;

        let documents: Vec<_> = outcomes
            .iter()
            .map(|(path, outcome)| match outcome {
                Outcome::Unreadable(error) => json!({
                    "path": path.display().to_string(),
                    "valid": false,
                    "error": error,
                }),
                Outcome::Imported {
                    characteristics,
                    requirements,
                    report,
                } => json!({
                    "path": path.display().to_string(),
                    "valid": !outcome.fails(config),
                    "characteristics": characteristics,
                    "requirements": requirements,
                    "report": report,
                }),
            })
            .collect();

        println!("{}", serde_json::to_string_pretty(&json!({ "documents": documents }))?);
        Ok(())
    }
}

/// Expands the given paths into the model documents to validate.
///
/// Files are taken as given. Directories are searched recursively, in file
/// name order, for files with a document extension.
fn collect_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for path in paths {
        if path.is_file() {
            documents.push(path.clone());
            continue;
        }
        if !path.exists() {
            anyhow::bail!("No such file or directory: {}", path.display());
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_document(entry.path()) {
                documents.push(entry.into_path());
            }
        }
    }
    Ok(documents)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

#[instrument(level = "debug", skip(catalog))]
fn validate_document<C: RuleCatalog + ?Sized>(path: &Path, catalog: &C) -> Outcome {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return Outcome::Unreadable(e.to_string()),
    };

    match ModelImporter::new().import_bytes(&bytes, catalog) {
        Ok((model, report)) => Outcome::Imported {
            characteristics: model.len(),
            requirements: model.requirements().count(),
            report,
        },
        Err(e) => Outcome::Unreadable(e.to_string()),
    }
}
