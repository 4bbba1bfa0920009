//! Rule identifiers and the catalog they are resolved against.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Mutex, PoisonError},
};

use non_empty_string::NonEmptyString;

/// Identifies a rule by the repository that defines it and its key within
/// that repository.
///
/// Both parts are non-empty and compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuleReference {
    repository: NonEmptyString,
    key: NonEmptyString,
}

/// Error returned when a rule reference has an empty component.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidRuleReference {
    /// The repository name is empty.
    #[error("rule repository must not be empty")]
    EmptyRepository,
    /// The rule key is empty.
    #[error("rule key must not be empty")]
    EmptyKey,
}

impl RuleReference {
    /// Creates a rule reference.
    ///
    /// # Errors
    ///
    /// Returns an error if either the repository or the key is empty.
    pub fn new(
        repository: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, InvalidRuleReference> {
        let repository = NonEmptyString::new(repository.into())
            .map_err(|_| InvalidRuleReference::EmptyRepository)?;
        let key = NonEmptyString::new(key.into()).map_err(|_| InvalidRuleReference::EmptyKey)?;
        Ok(Self { repository, key })
    }

    /// The repository that defines the rule, e.g. `checkstyle`.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.repository.as_str()
    }

    /// The key of the rule within its repository.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }
}

impl fmt::Display for RuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[repository={}, key={}]",
            self.repository.as_str(),
            self.key.as_str()
        )
    }
}

/// A rule known to a [`RuleCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    reference: RuleReference,
    name: Option<String>,
}

impl Rule {
    /// Creates a rule with an optional display name.
    #[must_use]
    pub const fn new(reference: RuleReference, name: Option<String>) -> Self {
        Self { reference, name }
    }

    /// The rule's identifier.
    #[must_use]
    pub const fn reference(&self) -> &RuleReference {
        &self.reference
    }

    /// The rule's display name, if the catalog knows one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// The source of truth for which rules exist.
///
/// The importer only checks whether a rule exists; it never inspects the
/// returned [`Rule`] further. Implementations may be slow (I/O-bound) and are
/// free to cache.
pub trait RuleCatalog {
    /// Looks a rule up by repository and key.
    fn find(&self, repository: &str, key: &str) -> Option<Rule>;
}

impl<C: RuleCatalog + ?Sized> RuleCatalog for &C {
    fn find(&self, repository: &str, key: &str) -> Option<Rule> {
        (**self).find(repository, key)
    }
}

impl<C: RuleCatalog + ?Sized> RuleCatalog for Box<C> {
    fn find(&self, repository: &str, key: &str) -> Option<Rule> {
        (**self).find(repository, key)
    }
}

/// A catalog held entirely in memory, grouped by repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryRuleCatalog {
    repositories: BTreeMap<String, BTreeMap<String, Rule>>,
}

impl InMemoryRuleCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the catalog.
    ///
    /// Returns the rule previously registered under the same reference, if
    /// any.
    pub fn insert(&mut self, rule: Rule) -> Option<Rule> {
        self.repositories
            .entry(rule.reference().repository().to_string())
            .or_default()
            .insert(rule.reference().key().to_string(), rule)
    }

    /// Adds an unnamed rule, builder style.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository or key is empty.
    pub fn with_rule(
        mut self,
        repository: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, InvalidRuleReference> {
        self.insert(Rule::new(RuleReference::new(repository, key)?, None));
        Ok(self)
    }

    /// The number of rules in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.values().map(BTreeMap::len).sum()
    }

    /// Whether the catalog holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The names of the repositories that hold at least one rule.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }
}

impl RuleCatalog for InMemoryRuleCatalog {
    fn find(&self, repository: &str, key: &str) -> Option<Rule> {
        self.repositories.get(repository)?.get(key).cloned()
    }
}

/// Memoizes the lookups of another catalog.
///
/// Each distinct `(repository, key)` pair is resolved against the inner
/// catalog once; later lookups, including misses, are answered from the
/// cache. The cache is safe to share between threads.
#[derive(Debug)]
pub struct CachedRuleCatalog<C> {
    inner: C,
    cache: Mutex<BTreeMap<(String, String), Option<Rule>>>,
}

impl<C: RuleCatalog> CachedRuleCatalog<C> {
    /// Wraps a catalog.
    #[must_use]
    pub const fn new(inner: C) -> Self {
        Self {
            inner,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// The number of distinct lookups answered so far.
    #[must_use]
    pub fn cached_lookups(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Unwraps the inner catalog, discarding the cache.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: RuleCatalog> RuleCatalog for CachedRuleCatalog<C> {
    fn find(&self, repository: &str, key: &str) -> Option<Rule> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .entry((repository.to_string(), key.to_string()))
            .or_insert_with(|| {
                tracing::trace!(repository, key, "resolving rule");
                self.inner.find(repository, key)
            })
            .clone()
    }
}
