use std::sync::Arc;

use async_trait::async_trait;
use ekspose_core::resources::intent::ExposureIntent;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::reflector::{ObjectRef, Store};
use log::{debug, info};

use super::{
    context::ReconcilerContext, ensure_ingress, ensure_service, error::ReconcilerError,
    remove_ingress, remove_service, ObjectKey, Reconciler,
};

/// Provisions the service (and, on request, the ingress) for a workload
/// that exists, and tears both down once it's gone.
pub struct WorkloadReconciler {
    context: Arc<ReconcilerContext>,
    workloads: Store<Deployment>,
}

impl WorkloadReconciler {
    pub fn new(context: Arc<ReconcilerContext>, workloads: Store<Deployment>) -> Self {
        Self { context, workloads }
    }

    /// Looks the workload up in the cache first and asks the cluster only
    /// when the cache doesn't have it, as the cache may lag behind.
    async fn lookup_workload(
        &self,
        key: &ObjectKey,
    ) -> Result<Option<Arc<Deployment>>, ReconcilerError> {
        let reference = ObjectRef::new(&key.name).within(&key.namespace);

        if let Some(workload) = self.workloads.get(&reference) {
            return Ok(Some(workload));
        }

        debug!("Workload '{key}' isn't cached, asking the cluster...");

        self.context
            .cluster
            .get_workload(&key.namespace, &key.name)
            .await
            .map(|workload| workload.map(Arc::new))
            .map_err(ReconcilerError::ClusterApiError)
    }

    async fn provision(
        &self,
        key: &ObjectKey,
        workload: &Deployment,
    ) -> Result<(), ReconcilerError> {
        let intent = ExposureIntent::from_workload(workload, &self.context.config)
            .map_err(ReconcilerError::ResourceGenerationError)?;

        info!(
            "Exposing workload '{key}' on port {} (ingress requested: {})...",
            intent.port, intent.ingress_requested
        );

        ensure_service(&self.context, workload, &intent).await?;

        match intent.route() {
            Some(route) => ensure_ingress(&self.context, key, &route).await,
            None => Ok(()),
        }
    }

    async fn teardown(&self, key: &ObjectKey) -> Result<(), ReconcilerError> {
        info!("Workload '{key}' is gone, removing its service and ingress...");

        // The ingress guard recreates ingresses of existing services, so the
        // service has to go first.
        remove_service(&self.context, key).await?;
        remove_ingress(&self.context, key).await
    }
}

#[async_trait]
impl Reconciler for WorkloadReconciler {
    fn name(&self) -> &'static str {
        "workload"
    }

    async fn reconcile(&self, key: &ObjectKey) -> Result<(), ReconcilerError> {
        match self.lookup_workload(key).await? {
            Some(workload) => self.provision(key, &workload).await,
            None => self.teardown(key).await,
        }
    }
}
