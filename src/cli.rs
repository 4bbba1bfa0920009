use std::{
    num::NonZeroU64,
    path::{Path, PathBuf},
};

mod import;
mod terminal;
mod validate;

use clap::ArgAction;
use import::Import;
use tdm::{domain::CachedRuleCatalog, storage, Config as TdmConfig};
use tracing::instrument;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the configuration file
    #[arg(short, long, default_value = "tdm.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Import a model document and print it
    Import(Import),

    /// Check model documents against the rule catalog
    ///
    /// Directories are searched recursively for `.yaml`, `.yml` and `.json`
    /// files.
    Validate(Validate),

    /// Show or modify configuration settings
    Config(Config),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Import(command) => command.run(&load_config(config_path)?)?,
            Self::Validate(command) => command.run(&load_config(config_path)?)?,
            Self::Config(command) => command.run(config_path)?,
        }
        Ok(())
    }
}

/// Loads the configuration, falling back to the defaults when the file does
/// not exist.
fn load_config(path: &Path) -> anyhow::Result<TdmConfig> {
    if path.exists() {
        TdmConfig::load(path).map_err(|e| anyhow::anyhow!("{e}"))
    } else {
        tracing::debug!(path = %path.display(), "no configuration file, using defaults");
        Ok(TdmConfig::default())
    }
}

/// Type of the catalog the commands import against.
type Catalog = CachedRuleCatalog<tdm::domain::InMemoryRuleCatalog>;

/// Loads the rule catalog named on the command line, or else the one named in
/// the configuration.
fn load_catalog(rules: Option<PathBuf>, config: &TdmConfig) -> anyhow::Result<Catalog> {
    let Some(path) = rules.or_else(|| config.rules.clone()) else {
        anyhow::bail!("No rule catalog given: pass --rules or set 'rules' in the configuration");
    };

    let catalog = storage::load_catalog(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load rule catalog {}: {e}", path.display()))?;
    Ok(CachedRuleCatalog::new(catalog))
}

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: ConfigKey,

        /// Value to set
        value: String,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ConfigKey {
    /// Length of a working day, in hours
    HoursInDay,
    /// Default path to the rule catalog
    Rules,
    /// Whether warnings make validation fail
    WarningsAsErrors,
}

impl Config {
    #[instrument(level = "debug", skip(self))]
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        use terminal::Colorize;

        let mut config = load_config(config_path)?;

        match self.command {
            ConfigCommand::Show => {
                println!("Configuration:");
                println!("  hours_in_day: {}", config.hours_in_day());
                match &config.rules {
                    Some(rules) => println!("  rules: {}", rules.display()),
                    None => println!("  rules: {}", "(not set)".dim()),
                }
                println!("  warnings_as_errors: {}", config.warnings_as_errors);
            }
            ConfigCommand::Set { key, value } => {
                match key {
                    ConfigKey::HoursInDay => {
                        let hours = value.parse::<NonZeroU64>().map_err(|_| {
                            anyhow::anyhow!("Value must be a positive whole number of hours")
                        })?;
                        config.set_hours_in_day(hours);
                    }
                    ConfigKey::Rules => config.rules = Some(PathBuf::from(&value)),
                    ConfigKey::WarningsAsErrors => {
                        config.warnings_as_errors = value
                            .parse::<bool>()
                            .map_err(|_| anyhow::anyhow!("Value must be 'true' or 'false'"))?;
                    }
                }

                config
                    .save(config_path)
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                println!("{}", format!("Configuration updated: {value}").success());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let tmp = tempdir().unwrap();
        let config = load_config(&tmp.path().join("tdm.toml")).unwrap();
        assert_eq!(config, TdmConfig::default());
    }

    #[test]
    fn catalog_requires_a_path() {
        let error = load_catalog(None, &TdmConfig::default()).unwrap_err();
        assert!(error.to_string().contains("--rules"));
    }

    #[test]
    fn catalog_path_falls_back_to_config() {
        let tmp = tempdir().unwrap();
        let rules = tmp.path().join("rules.yaml");
        std::fs::write(&rules, "_version: \"1\"\nrepositories:\n  checkstyle: [Regexp]\n").unwrap();

        let mut config = TdmConfig::default();
        config.rules = Some(rules);

        let catalog = load_catalog(None, &config).unwrap();
        assert_eq!(catalog.into_inner().len(), 1);
    }

    #[test]
    fn config_set_writes_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("tdm.toml");

        let cli = Cli::try_parse_from([
            "tdm",
            "--config",
            path.to_str().unwrap(),
            "config",
            "set",
            "hours-in-day",
            "7",
        ])
        .unwrap();
        cli.command.run(&cli.config).unwrap();

        let config = TdmConfig::load(&path).unwrap();
        assert_eq!(config.hours_in_day(), 7);
    }

    #[test]
    fn config_set_rejects_zero_hours() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("tdm.toml");

        let cli = Cli::try_parse_from([
            "tdm",
            "--config",
            path.to_str().unwrap(),
            "config",
            "set",
            "hours-in-day",
            "0",
        ])
        .unwrap();

        assert!(cli.command.run(&cli.config).is_err());
        assert!(!path.exists());
    }
}
