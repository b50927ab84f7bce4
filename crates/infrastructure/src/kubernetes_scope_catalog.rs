use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Namespace, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ListParams;
use kube::{Api, Client, Resource, ResourceExt};
use logscope_application::ScopeCatalog;
use logscope_core::{AppError, AppResult};
use logscope_domain::{CatalogNamespace, CatalogPod, CatalogSnapshot, CatalogWorkload};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Label carrying the ReplicaSet template hash appended to pod owner names.
const POD_TEMPLATE_HASH_LABEL: &str = "pod-template-hash";

/// Scope catalog listing objects through the Kubernetes API.
#[derive(Clone)]
pub struct KubernetesScopeCatalog {
    client: Client,
    workspace_label: String,
}

impl KubernetesScopeCatalog {
    /// Creates a catalog reading the workspace of each namespace from
    /// `workspace_label`.
    #[must_use]
    pub fn new(client: Client, workspace_label: impl Into<String>) -> Self {
        Self {
            client,
            workspace_label: workspace_label.into(),
        }
    }

    fn scoped<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        match namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    async fn namespaces(&self, namespace: Option<&str>) -> Result<Vec<Namespace>, kube::Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        match namespace {
            Some(name) => Ok(api.get_opt(name).await?.into_iter().collect()),
            None => list(api).await,
        }
    }

    fn catalog_namespace(&self, namespace: &Namespace) -> CatalogNamespace {
        CatalogNamespace {
            name: namespace.name_any(),
            workspace: namespace.labels().get(&self.workspace_label).cloned(),
        }
    }
}

async fn list<K>(api: Api<K>) -> Result<Vec<K>, kube::Error>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    Ok(api.list(&ListParams::default()).await?.items)
}

#[async_trait]
impl ScopeCatalog for KubernetesScopeCatalog {
    async fn load_snapshot(&self, namespace: Option<&str>) -> AppResult<CatalogSnapshot> {
        let (namespaces, deployments, stateful_sets, daemon_sets, pods) = futures::try_join!(
            self.namespaces(namespace),
            list(self.scoped::<Deployment>(namespace)),
            list(self.scoped::<StatefulSet>(namespace)),
            list(self.scoped::<DaemonSet>(namespace)),
            list(self.scoped::<Pod>(namespace)),
        )
        .map_err(|error| {
            AppError::retryable_backend(format!("listing cluster objects failed: {error}"))
        })?;

        let workloads = deployments
            .iter()
            .map(catalog_workload)
            .chain(stateful_sets.iter().map(catalog_workload))
            .chain(daemon_sets.iter().map(catalog_workload))
            .collect();

        let snapshot = CatalogSnapshot {
            namespaces: namespaces
                .iter()
                .map(|namespace| self.catalog_namespace(namespace))
                .collect(),
            workloads,
            pods: pods.iter().map(catalog_pod).collect(),
        };
        debug!(
            namespace = ?namespace,
            namespaces = snapshot.namespaces.len(),
            workloads = snapshot.workloads.len(),
            pods = snapshot.pods.len(),
            "loaded cluster catalog"
        );
        Ok(snapshot)
    }
}

fn catalog_workload<K: Resource>(workload: &K) -> CatalogWorkload {
    CatalogWorkload {
        namespace: workload.namespace().unwrap_or_default(),
        name: workload.name_any(),
    }
}

fn catalog_pod(pod: &Pod) -> CatalogPod {
    let workload = pod
        .owner_references()
        .iter()
        .find(|owner| owner.controller.unwrap_or(false))
        .or_else(|| pod.owner_references().first())
        .and_then(|owner| workload_name(owner, pod.labels()));

    CatalogPod {
        namespace: pod.namespace().unwrap_or_default(),
        name: pod.name_any(),
        workload,
        containers: pod
            .spec
            .as_ref()
            .map(|spec| {
                spec.containers
                    .iter()
                    .map(|container| container.name.clone())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Names the workload owning a pod. Deployment pods are owned by a
/// ReplicaSet named `{deployment}-{pod-template-hash}`.
fn workload_name(owner: &OwnerReference, labels: &BTreeMap<String, String>) -> Option<String> {
    match owner.kind.as_str() {
        "ReplicaSet" => {
            let suffix = labels
                .get(POD_TEMPLATE_HASH_LABEL)
                .map(|hash| format!("-{hash}"));
            let name = suffix
                .as_deref()
                .and_then(|suffix| owner.name.strip_suffix(suffix))
                .or_else(|| owner.name.rsplit_once('-').map(|(name, _)| name))
                .unwrap_or(owner.name.as_str());
            Some(name.to_owned())
        }
        "Deployment" | "StatefulSet" | "DaemonSet" => Some(owner.name.clone()),
        _ => None,
    }
}
