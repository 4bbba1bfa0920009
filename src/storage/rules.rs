use std::{collections::BTreeMap, io, path::Path};

use serde::Deserialize;

use crate::domain::{rule::InvalidRuleReference, InMemoryRuleCatalog, Rule, RuleReference};

/// The on-disk formats a rule catalog may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesFormat {
    /// TOML, for files ending in `.toml`.
    Toml,
    /// YAML (or JSON), for every other file.
    Yaml,
}

impl RulesFormat {
    /// Picks the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Errors that can occur when loading a rule catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    /// The catalog file was not found.
    #[error("rule catalog file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read rule catalog: {0}")]
    Io(#[from] io::Error),
    /// The TOML content could not be parsed.
    #[error("failed to parse rule catalog: {0}")]
    Toml(#[from] toml::de::Error),
    /// The YAML content could not be parsed.
    #[error("failed to parse rule catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A rule entry has an empty key.
    #[error("invalid rule in repository '{repository}': {source}")]
    InvalidRule {
        /// The repository the entry is listed under.
        repository: String,
        /// What is wrong with the entry.
        source: InvalidRuleReference,
    },
}

/// Loads a rule catalog from a file.
///
/// Files ending in `.toml` are read as TOML, anything else as YAML:
///
/// ```yaml
/// _version: "1"
/// repositories:
///   checkstyle:
///     - Regexp
///     - key: LineLength
///       name: Line length
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read, cannot be parsed, or lists
/// a rule with an empty repository or key.
pub fn load_catalog(path: &Path) -> Result<InMemoryRuleCatalog, CatalogLoadError> {
    let content = std::fs::read_to_string(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => CatalogLoadError::NotFound,
        _ => CatalogLoadError::Io(io_error),
    })?;

    let catalog = parse_catalog(&content, RulesFormat::from_path(path))?;
    tracing::debug!(path = %path.display(), rules = catalog.len(), "loaded rule catalog");
    Ok(catalog)
}

/// Parses a rule catalog from text in the given format.
///
/// # Errors
///
/// Returns an error if the text cannot be parsed, or lists a rule with an
/// empty repository or key.
pub fn parse_catalog(
    content: &str,
    format: RulesFormat,
) -> Result<InMemoryRuleCatalog, CatalogLoadError> {
    let file: RulesFile = match format {
        RulesFormat::Toml => toml::from_str(content)?,
        RulesFormat::Yaml => serde_yaml::from_str(content)?,
    };
    file.into_catalog()
}

/// The serialized versions of the rule catalog file.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version")]
enum RulesFile {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        repositories: BTreeMap<String, Vec<RuleEntry>>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleEntry {
    Key(String),
    Named {
        key: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl RulesFile {
    fn into_catalog(self) -> Result<InMemoryRuleCatalog, CatalogLoadError> {
        let Self::V1 { repositories } = self;
        let mut catalog = InMemoryRuleCatalog::new();

        for (repository, entries) in repositories {
            for entry in entries {
                let (key, name) = match entry {
                    RuleEntry::Key(key) => (key, None),
                    RuleEntry::Named { key, name } => (key, name),
                };
                let reference = RuleReference::new(repository.clone(), key).map_err(|source| {
                    CatalogLoadError::InvalidRule {
                        repository: repository.clone(),
                        source,
                    }
                })?;
                catalog.insert(Rule::new(reference, name));
            }
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use test_case::test_case;

    use super::*;
    use crate::domain::RuleCatalog;

    #[test_case("rules.toml", RulesFormat::Toml)]
    #[test_case("RULES.TOML", RulesFormat::Toml)]
    #[test_case("rules.yaml", RulesFormat::Yaml)]
    #[test_case("rules.json", RulesFormat::Yaml)]
    #[test_case("rules", RulesFormat::Yaml)]
    fn format_from_extension(path: &str, expected: RulesFormat) {
        assert_eq!(RulesFormat::from_path(&PathBuf::from(path)), expected);
    }

    #[test]
    fn parse_yaml_catalog() {
        let catalog = parse_catalog(
            r#"
_version: "1"
repositories:
  checkstyle:
    - Regexp
    - key: LineLength
      name: Line length
  pmd:
    - key: UnusedImports
"#,
            RulesFormat::Yaml,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert!(catalog.find("checkstyle", "Regexp").is_some());
        assert_eq!(
            catalog.find("checkstyle", "LineLength").unwrap().name(),
            Some("Line length")
        );
        assert!(catalog.find("pmd", "UnusedImports").is_some());
        assert!(catalog.find("findbugs", "Foo").is_none());
    }

    #[test]
    fn parse_toml_catalog() {
        let catalog = parse_catalog(
            r#"
_version = "1"

[repositories]
checkstyle = ["Regexp", { key = "LineLength", name = "Line length" }]
"#,
            RulesFormat::Toml,
        )
        .unwrap();

        assert_eq!(catalog.repositories().collect::<Vec<_>>(), vec!["checkstyle"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn missing_version_is_rejected() {
        let result = parse_catalog("repositories: {}\n", RulesFormat::Yaml);
        assert!(matches!(result, Err(CatalogLoadError::Yaml(_))));
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = parse_catalog(
            "_version: \"1\"\nrepositories:\n  checkstyle:\n    - \"\"\n",
            RulesFormat::Yaml,
        );
        assert!(matches!(
            result,
            Err(CatalogLoadError::InvalidRule {
                source: InvalidRuleReference::EmptyKey,
                ..
            })
        ));
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rules.toml");
        std::fs::write(&path, "_version = \"1\"\n[repositories]\nfindbugs = [\"Foo\"]\n").unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert!(catalog.find("findbugs", "Foo").is_some());
    }

    #[test]
    fn load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let result = load_catalog(&tmp.path().join("missing.yaml"));
        assert!(matches!(result, Err(CatalogLoadError::NotFound)));
    }
}
