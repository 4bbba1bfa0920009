use std::{
    num::NonZeroU64,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::{work_unit::UnitRatios, ValidationReport};

/// Configuration for importing and reporting on debt models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The length of a working day, in hours.
    ///
    /// Used when costs expressed in days are rendered in minutes.
    hours_in_day: NonZeroU64,

    /// Default path to the rule catalog file.
    ///
    /// Relative paths are resolved against the directory containing the
    /// configuration file.
    pub rules: Option<PathBuf>,

    /// Whether warnings alone make a document fail validation.
    pub warnings_as_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hours_in_day: default_hours_in_day(),
            rules: None,
            warnings_as_errors: false,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// A relative `rules` path is made relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))?;

        if let Some(base) = path.parent() {
            config.rules = config.rules.map(|rules| {
                if rules.is_relative() {
                    base.join(rules)
                } else {
                    rules
                }
            });
        }

        Ok(config)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the configured length of a working day, in hours.
    #[must_use]
    pub const fn hours_in_day(&self) -> u64 {
        self.hours_in_day.get()
    }

    /// Sets the length of a working day, in hours.
    pub const fn set_hours_in_day(&mut self, hours: NonZeroU64) {
        self.hours_in_day = hours;
    }

    /// The unit conversion ratios implied by this configuration.
    #[must_use]
    pub const fn unit_ratios(&self) -> UnitRatios {
        UnitRatios::new(self.hours_in_day)
    }

    /// Whether an import with this report should be treated as failed.
    #[must_use]
    pub fn rejects(&self, report: &ValidationReport) -> bool {
        report.has_errors() || (self.warnings_as_errors && report.has_warnings())
    }
}

const fn default_hours_in_day() -> NonZeroU64 {
    UnitRatios::STANDARD.hours_in_day_nonzero()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// The length of a working day, in hours.
        #[serde(default = "default_hours_in_day")]
        hours_in_day: NonZeroU64,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        rules: Option<PathBuf>,

        #[serde(default)]
        warnings_as_errors: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                hours_in_day,
                rules,
                warnings_as_errors,
            } => Self {
                hours_in_day,
                rules,
                warnings_as_errors,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            hours_in_day: config.hours_in_day,
            rules: config.rules,
            warnings_as_errors: config.warnings_as_errors,
        }
    }
}
