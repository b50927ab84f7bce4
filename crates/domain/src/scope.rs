use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use logscope_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// One level of the container log hierarchy, ordered from the widest scope to
/// the narrowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Tenant workspace grouping several namespaces.
    Workspace,
    /// Kubernetes namespace.
    Namespace,
    /// Controller owning pods (deployment, statefulset, daemonset).
    Workload,
    /// Pod.
    Pod,
    /// Container inside a pod.
    Container,
}

impl ScopeLevel {
    /// All levels, top-down.
    pub const ALL: [Self; 5] = [
        Self::Workspace,
        Self::Namespace,
        Self::Workload,
        Self::Pod,
        Self::Container,
    ];

    /// Returns stable parameter name of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Namespace => "namespace",
            Self::Workload => "workload",
            Self::Pod => "pod",
            Self::Container => "container",
        }
    }

    /// Returns the direct parent level, if any.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self {
            Self::Workspace => None,
            Self::Namespace => Some(Self::Workspace),
            Self::Workload => Some(Self::Namespace),
            Self::Pod => Some(Self::Workload),
            Self::Container => Some(Self::Pod),
        }
    }

    /// Returns the levels strictly below `entry`, or every level for a
    /// cluster-wide request.
    pub fn below(entry: Option<Self>) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |level| entry.is_none_or(|entry| *level > entry))
    }
}

impl Display for ScopeLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Requested filter for one level: explicit identifiers and name keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFilter {
    ids: Vec<String>,
    keywords: Vec<String>,
}

impl LevelFilter {
    /// Creates a level filter from explicit identifiers and keywords.
    #[must_use]
    pub fn new(ids: Vec<String>, keywords: Vec<String>) -> Self {
        Self {
            ids: normalize_items(ids),
            keywords: normalize_items(keywords),
        }
    }

    /// Creates a filter naming exact identifiers only.
    #[must_use]
    pub fn explicit(ids: Vec<String>) -> Self {
        Self::new(ids, Vec::new())
    }

    /// Creates a filter selecting names by keyword only.
    #[must_use]
    pub fn keywords(keywords: Vec<String>) -> Self {
        Self::new(Vec::new(), keywords)
    }

    /// Returns explicit identifiers.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Returns name keywords.
    #[must_use]
    pub fn keyword_list(&self) -> &[String] {
        &self.keywords
    }

    /// Returns whether neither identifiers nor keywords were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.keywords.is_empty()
    }

    /// Returns whether `name` contains at least one keyword, ignoring case.
    #[must_use]
    pub fn keyword_matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| name.contains(keyword.to_lowercase().as_str()))
    }
}

fn normalize_items(items: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() || normalized.iter().any(|existing| existing == item) {
            continue;
        }
        normalized.push(item.to_owned());
    }
    normalized
}

/// Scope requested by a caller: a fixed entry point taken from the route plus
/// optional filters for the levels below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    entry: Option<ScopeLevel>,
    levels: BTreeMap<ScopeLevel, LevelFilter>,
}

impl ScopeFilter {
    /// Creates a cluster-wide scope without a fixed entry point.
    #[must_use]
    pub fn cluster() -> Self {
        Self::default()
    }

    /// Creates a scope fixed by route path segments such as
    /// `/namespaces/{namespace}/pods/{pod}`.
    ///
    /// The deepest fixed level becomes the entry point; every fixed name is
    /// mandatory.
    pub fn at_entry(fixed: Vec<(ScopeLevel, String)>) -> AppResult<Self> {
        let mut scope = Self::default();
        for (level, name) in fixed {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation(format!("{level} must not be empty")));
            }
            if scope.levels.contains_key(&level) {
                return Err(AppError::Validation(format!(
                    "{level} is fixed more than once"
                )));
            }

            scope
                .levels
                .insert(level, LevelFilter::explicit(vec![name.to_owned()]));
            scope.entry = Some(scope.entry.map_or(level, |entry| entry.max(level)));
        }

        Ok(scope)
    }

    /// Adds a filter for a level below the entry point.
    pub fn narrow(mut self, level: ScopeLevel, filter: LevelFilter) -> AppResult<Self> {
        if self.entry.is_some_and(|entry| level <= entry) {
            return Err(AppError::Validation(format!(
                "{level} filters are not accepted at this scope"
            )));
        }

        if filter.is_empty() {
            self.levels.remove(&level);
        } else {
            self.levels.insert(level, filter);
        }
        Ok(self)
    }

    /// Returns the route entry level, `None` for cluster-wide requests.
    #[must_use]
    pub fn entry(&self) -> Option<ScopeLevel> {
        self.entry
    }

    /// Returns the filter requested for a level, if any.
    #[must_use]
    pub fn level(&self, level: ScopeLevel) -> Option<&LevelFilter> {
        self.levels.get(&level)
    }

    /// Returns the single fixed name at `level` when it is part of the route.
    #[must_use]
    pub fn fixed_name(&self, level: ScopeLevel) -> Option<&str> {
        if self.entry.is_none_or(|entry| level > entry) {
            return None;
        }
        self.levels
            .get(&level)
            .and_then(|filter| filter.ids().first())
            .map(String::as_str)
    }
}

/// Tri-state restriction of one level after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScopeRestriction {
    /// No restriction at this level.
    #[default]
    Unrestricted,
    /// A filter was applied and matched nothing: the query has no results.
    Empty,
    /// Restricted to these identifiers.
    Set(BTreeSet<String>),
}

impl ScopeRestriction {
    /// Builds a restriction from resolved names; no names yields `Empty`.
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let names: BTreeSet<String> = names.into_iter().collect();
        if names.is_empty() {
            Self::Empty
        } else {
            Self::Set(names)
        }
    }

    /// Returns whether this restriction excludes everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns whether this level narrows the search in any way.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !matches!(self, Self::Unrestricted)
    }

    /// Returns whether `name` passes the restriction.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Empty => false,
            Self::Set(names) => names.contains(name),
        }
    }

    /// Returns whether an optional name passes; a missing name only passes an
    /// unrestricted level.
    #[must_use]
    pub fn allows_optional(&self, name: Option<&str>) -> bool {
        match name {
            Some(name) => self.allows(name),
            None => !self.is_restricted(),
        }
    }

    /// Returns the restricted names, if the level is restricted to a set.
    #[must_use]
    pub fn names(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Set(names) => Some(names),
            _ => None,
        }
    }
}

/// Concrete restriction for every level of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedScope {
    levels: BTreeMap<ScopeLevel, ScopeRestriction>,
}

const UNRESTRICTED: ScopeRestriction = ScopeRestriction::Unrestricted;

impl ResolvedScope {
    /// Creates a scope without restrictions.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Returns a copy with `level` set to `restriction`.
    #[must_use]
    pub fn with(mut self, level: ScopeLevel, restriction: ScopeRestriction) -> Self {
        self.set(level, restriction);
        self
    }

    /// Sets the restriction of a level.
    pub fn set(&mut self, level: ScopeLevel, restriction: ScopeRestriction) {
        if restriction.is_restricted() {
            self.levels.insert(level, restriction);
        } else {
            self.levels.remove(&level);
        }
    }

    /// Returns the restriction of a level.
    #[must_use]
    pub fn get(&self, level: ScopeLevel) -> &ScopeRestriction {
        self.levels.get(&level).unwrap_or(&UNRESTRICTED)
    }

    /// Returns whether any level resolved to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.values().any(ScopeRestriction::is_empty)
    }
}
