use async_trait::async_trait;
use logscope_application::ScopeCatalog;
use logscope_core::AppResult;
use logscope_domain::CatalogSnapshot;

/// In-memory scope catalog serving a fixed snapshot.
#[derive(Debug, Default)]
pub struct InMemoryScopeCatalog {
    snapshot: CatalogSnapshot,
}

impl InMemoryScopeCatalog {
    /// Creates a catalog serving `snapshot`.
    #[must_use]
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ScopeCatalog for InMemoryScopeCatalog {
    async fn load_snapshot(&self, namespace: Option<&str>) -> AppResult<CatalogSnapshot> {
        let snapshot = &self.snapshot;
        let Some(namespace) = namespace else {
            return Ok(snapshot.clone());
        };

        Ok(CatalogSnapshot {
            namespaces: snapshot
                .namespaces
                .iter()
                .filter(|candidate| candidate.name == namespace)
                .cloned()
                .collect(),
            workloads: snapshot
                .workloads
                .iter()
                .filter(|workload| workload.namespace == namespace)
                .cloned()
                .collect(),
            pods: snapshot
                .pods
                .iter()
                .filter(|pod| pod.namespace == namespace)
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use logscope_application::ScopeCatalog;
    use logscope_domain::{CatalogNamespace, CatalogSnapshot, CatalogWorkload};

    use super::InMemoryScopeCatalog;

    #[tokio::test]
    async fn namespace_hint_limits_snapshot() {
        let catalog = InMemoryScopeCatalog::new(CatalogSnapshot {
            namespaces: ["prod", "staging"]
                .iter()
                .map(|name| CatalogNamespace {
                    name: (*name).to_owned(),
                    workspace: None,
                })
                .collect(),
            workloads: vec![
                CatalogWorkload {
                    namespace: "prod".to_owned(),
                    name: "api".to_owned(),
                },
                CatalogWorkload {
                    namespace: "staging".to_owned(),
                    name: "api".to_owned(),
                },
            ],
            pods: Vec::new(),
        });

        let full = catalog.load_snapshot(None).await.unwrap_or_default();
        let prod = catalog.load_snapshot(Some("prod")).await.unwrap_or_default();

        assert_eq!(full.workloads.len(), 2);
        assert_eq!(prod.namespaces.len(), 1);
        assert_eq!(prod.workloads.len(), 1);
    }
}
