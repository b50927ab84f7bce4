use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::scope::{ResolvedScope, ScopeLevel};

/// Namespace known to the cluster, with the workspace it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogNamespace {
    /// Namespace name.
    pub name: String,
    /// Owning workspace, when the namespace is assigned to one.
    pub workspace: Option<String>,
}

/// Workload controller known to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogWorkload {
    /// Namespace of the workload.
    pub namespace: String,
    /// Workload name.
    pub name: String,
}

/// Pod known to the cluster with its containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPod {
    /// Namespace of the pod.
    pub namespace: String,
    /// Pod name.
    pub name: String,
    /// Owning workload, absent for bare pods.
    pub workload: Option<String>,
    /// Container names declared by the pod.
    pub containers: Vec<String>,
}

/// Point-in-time listing of cluster object names used for keyword
/// resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Namespaces.
    pub namespaces: Vec<CatalogNamespace>,
    /// Workloads.
    pub workloads: Vec<CatalogWorkload>,
    /// Pods.
    pub pods: Vec<CatalogPod>,
}

impl CatalogSnapshot {
    /// Returns the names at `level` whose ancestors pass every restriction
    /// already present in `scope`.
    #[must_use]
    pub fn visible_names(&self, level: ScopeLevel, scope: &ResolvedScope) -> BTreeSet<String> {
        match level {
            ScopeLevel::Workspace => self
                .namespaces
                .iter()
                .filter_map(|namespace| namespace.workspace.clone())
                .collect(),
            ScopeLevel::Namespace => self
                .namespaces
                .iter()
                .filter(|namespace| {
                    scope
                        .get(ScopeLevel::Workspace)
                        .allows_optional(namespace.workspace.as_deref())
                })
                .map(|namespace| namespace.name.clone())
                .collect(),
            ScopeLevel::Workload => self
                .workloads
                .iter()
                .filter(|workload| scope.get(ScopeLevel::Namespace).allows(&workload.namespace))
                .filter(|workload| self.namespace_visible(&workload.namespace, scope))
                .map(|workload| workload.name.clone())
                .collect(),
            ScopeLevel::Pod => self
                .visible_pods(scope)
                .map(|pod| pod.name.clone())
                .collect(),
            ScopeLevel::Container => self
                .visible_pods(scope)
                .filter(|pod| scope.get(ScopeLevel::Pod).allows(&pod.name))
                .flat_map(|pod| pod.containers.iter().cloned())
                .collect(),
        }
    }

    fn visible_pods<'a>(&'a self, scope: &'a ResolvedScope) -> impl Iterator<Item = &'a CatalogPod> {
        self.pods
            .iter()
            .filter(|pod| scope.get(ScopeLevel::Namespace).allows(&pod.namespace))
            .filter(|pod| self.namespace_visible(&pod.namespace, scope))
            .filter(|pod| {
                scope
                    .get(ScopeLevel::Workload)
                    .allows_optional(pod.workload.as_deref())
            })
    }

    fn namespace_visible(&self, namespace: &str, scope: &ResolvedScope) -> bool {
        let workspaces = scope.get(ScopeLevel::Workspace);
        if !workspaces.is_restricted() {
            return true;
        }

        self.namespaces
            .iter()
            .find(|candidate| candidate.name == namespace)
            .is_some_and(|candidate| workspaces.allows_optional(candidate.workspace.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{CatalogNamespace, CatalogPod, CatalogSnapshot, CatalogWorkload};
    use crate::scope::{ResolvedScope, ScopeLevel, ScopeRestriction};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            namespaces: vec![
                CatalogNamespace {
                    name: "prod".to_owned(),
                    workspace: Some("team-a".to_owned()),
                },
                CatalogNamespace {
                    name: "staging".to_owned(),
                    workspace: Some("team-b".to_owned()),
                },
                CatalogNamespace {
                    name: "kube-system".to_owned(),
                    workspace: None,
                },
            ],
            workloads: vec![
                CatalogWorkload {
                    namespace: "prod".to_owned(),
                    name: "api".to_owned(),
                },
                CatalogWorkload {
                    namespace: "staging".to_owned(),
                    name: "api-canary".to_owned(),
                },
            ],
            pods: vec![
                CatalogPod {
                    namespace: "prod".to_owned(),
                    name: "api-7d9-x1".to_owned(),
                    workload: Some("api".to_owned()),
                    containers: vec!["app".to_owned(), "sidecar".to_owned()],
                },
                CatalogPod {
                    namespace: "prod".to_owned(),
                    name: "debug".to_owned(),
                    workload: None,
                    containers: vec!["shell".to_owned()],
                },
            ],
        }
    }

    fn set(names: &[&str]) -> ScopeRestriction {
        ScopeRestriction::Set(names.iter().map(|name| (*name).to_owned()).collect())
    }

    #[test]
    fn workspaces_come_from_namespace_assignments() {
        let names = snapshot().visible_names(ScopeLevel::Workspace, &ResolvedScope::unrestricted());
        assert_eq!(
            names,
            BTreeSet::from(["team-a".to_owned(), "team-b".to_owned()])
        );
    }

    #[test]
    fn restricted_workspace_hides_unassigned_namespaces() {
        let scope = ResolvedScope::unrestricted().with(ScopeLevel::Workspace, set(&["team-a"]));
        let names = snapshot().visible_names(ScopeLevel::Namespace, &scope);
        assert_eq!(names, BTreeSet::from(["prod".to_owned()]));
    }

    #[test]
    fn workloads_follow_workspace_restriction_transitively() {
        let scope = ResolvedScope::unrestricted().with(ScopeLevel::Workspace, set(&["team-b"]));
        let names = snapshot().visible_names(ScopeLevel::Workload, &scope);
        assert_eq!(names, BTreeSet::from(["api-canary".to_owned()]));
    }

    #[test]
    fn restricted_workload_excludes_bare_pods() {
        let scope = ResolvedScope::unrestricted().with(ScopeLevel::Workload, set(&["api"]));
        let names = snapshot().visible_names(ScopeLevel::Pod, &scope);
        assert_eq!(names, BTreeSet::from(["api-7d9-x1".to_owned()]));
    }

    #[test]
    fn containers_are_listed_for_visible_pods() {
        let scope = ResolvedScope::unrestricted().with(ScopeLevel::Pod, set(&["debug"]));
        let names = snapshot().visible_names(ScopeLevel::Container, &scope);
        assert_eq!(names, BTreeSet::from(["shell".to_owned()]));
    }
}
