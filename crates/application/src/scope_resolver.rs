use std::collections::BTreeSet;
use std::sync::Arc;

use logscope_core::{AppError, AppResult};
use logscope_domain::{
    CatalogSnapshot, LevelFilter, ResolvedScope, ScopeFilter, ScopeLevel, ScopeRestriction,
};
use tracing::debug;

use crate::log_ports::ScopeCatalog;

/// Resolves requested scope filters into concrete per-level restrictions.
///
/// Levels are processed top-down. Each level sees the restrictions already
/// resolved above it, so keywords only match names visible under the parent.
#[derive(Clone)]
pub struct ScopeResolver {
    catalog: Arc<dyn ScopeCatalog>,
}

impl ScopeResolver {
    /// Creates a resolver backed by a catalog port.
    #[must_use]
    pub fn new(catalog: Arc<dyn ScopeCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolves every level of `filter`.
    ///
    /// The catalog is read at most once, and only when a level needs names.
    pub async fn resolve(&self, filter: &ScopeFilter) -> AppResult<ResolvedScope> {
        let mut snapshot = LazySnapshot {
            catalog: self.catalog.as_ref(),
            namespace: filter.fixed_name(ScopeLevel::Namespace),
            loaded: None,
        };
        let mut scope = ResolvedScope::unrestricted();

        for level in ScopeLevel::ALL {
            let restriction = match LevelStep::for_filter(filter.level(level)) {
                LevelStep::Explicit(ids) => {
                    resolve_explicit(level, ids, &scope, &mut snapshot).await?
                }
                LevelStep::Keywords(keywords) => {
                    resolve_keywords(level, keywords, &scope, &mut snapshot).await?
                }
                LevelStep::Inherit => inherit(level, &scope, &mut snapshot).await?,
            };
            scope.set(level, restriction);
        }

        debug!(
            entry = ?filter.entry(),
            empty = scope.is_empty(),
            catalog_loaded = snapshot.loaded.is_some(),
            "resolved log scope"
        );
        Ok(scope)
    }
}

enum LevelStep<'a> {
    /// Explicit ids are authoritative; keywords at the same level are ignored.
    Explicit(&'a [String]),
    Keywords(&'a LevelFilter),
    Inherit,
}

impl<'a> LevelStep<'a> {
    fn for_filter(filter: Option<&'a LevelFilter>) -> Self {
        match filter {
            Some(filter) if !filter.ids().is_empty() => Self::Explicit(filter.ids()),
            Some(filter) if !filter.keyword_list().is_empty() => Self::Keywords(filter),
            _ => Self::Inherit,
        }
    }
}

struct LazySnapshot<'a> {
    catalog: &'a dyn ScopeCatalog,
    namespace: Option<&'a str>,
    loaded: Option<CatalogSnapshot>,
}

impl LazySnapshot<'_> {
    async fn get(&mut self) -> AppResult<&CatalogSnapshot> {
        let snapshot = match self.loaded.take() {
            Some(snapshot) => snapshot,
            None => {
                debug!(namespace = ?self.namespace, "loading scope catalog snapshot");
                self.catalog.load_snapshot(self.namespace).await?
            }
        };
        Ok(self.loaded.insert(snapshot))
    }
}

async fn resolve_explicit(
    level: ScopeLevel,
    ids: &[String],
    scope: &ResolvedScope,
    snapshot: &mut LazySnapshot<'_>,
) -> AppResult<ScopeRestriction> {
    if scope.is_empty() {
        return Err(AppError::Validation(format!(
            "{level} ids were given but the enclosing scope matches nothing"
        )));
    }

    let ids: BTreeSet<String> = ids.iter().cloned().collect();

    // Under a restricted ancestor only ids that are children of its
    // candidates survive; an empty intersection empties the level.
    if has_restricted_ancestor(level, scope) {
        let visible = snapshot.get().await?.visible_names(level, scope);
        return Ok(ScopeRestriction::from_names(
            ids.into_iter().filter(|id| visible.contains(id)),
        ));
    }

    Ok(ScopeRestriction::Set(ids))
}

fn has_restricted_ancestor(level: ScopeLevel, scope: &ResolvedScope) -> bool {
    ScopeLevel::ALL
        .into_iter()
        .take_while(|ancestor| *ancestor < level)
        .any(|ancestor| scope.get(ancestor).names().is_some())
}

async fn resolve_keywords(
    level: ScopeLevel,
    filter: &LevelFilter,
    scope: &ResolvedScope,
    snapshot: &mut LazySnapshot<'_>,
) -> AppResult<ScopeRestriction> {
    if scope.is_empty() {
        return Ok(ScopeRestriction::Empty);
    }

    let names = snapshot.get().await?.visible_names(level, scope);
    Ok(ScopeRestriction::from_names(
        names.into_iter().filter(|name| filter.keyword_matches(name)),
    ))
}

async fn inherit(
    level: ScopeLevel,
    scope: &ResolvedScope,
    snapshot: &mut LazySnapshot<'_>,
) -> AppResult<ScopeRestriction> {
    if level == ScopeLevel::Namespace && scope.get(ScopeLevel::Workspace).names().is_some() {
        let names = snapshot.get().await?.visible_names(level, scope);
        return Ok(ScopeRestriction::from_names(names));
    }

    Ok(ScopeRestriction::Unrestricted)
}
