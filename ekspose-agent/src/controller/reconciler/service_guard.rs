use std::sync::Arc;

use async_trait::async_trait;
use ekspose_core::resources::intent::ExposureIntent;
use log::info;

use super::{
    context::ReconcilerContext, ensure_service, error::ReconcilerError, ObjectKey, Reconciler,
};

/// Recreates a deleted service as long as its workload still exists.
pub struct ServiceGuardReconciler {
    context: Arc<ReconcilerContext>,
}

impl ServiceGuardReconciler {
    pub fn new(context: Arc<ReconcilerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Reconciler for ServiceGuardReconciler {
    fn name(&self) -> &'static str {
        "service-guard"
    }

    async fn reconcile(&self, key: &ObjectKey) -> Result<(), ReconcilerError> {
        let workload = self
            .context
            .cluster
            .get_workload(&key.namespace, &key.name)
            .await
            .map_err(ReconcilerError::ClusterApiError)?;

        let Some(workload) = workload else {
            info!("Service '{key}' has no workload, leaving it deleted!");
            return Ok(());
        };

        info!("Service '{key}' was deleted, but its workload still exists! Recreating...");

        let intent = ExposureIntent::from_workload(&workload, &self.context.config)
            .map_err(ReconcilerError::ResourceGenerationError)?;

        ensure_service(&self.context, &workload, &intent).await
    }
}
