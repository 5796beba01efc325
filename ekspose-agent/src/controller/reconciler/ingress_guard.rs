use std::sync::Arc;

use async_trait::async_trait;
use ekspose_core::resources::ingress::RouteSpec;
use log::info;

use super::{
    context::ReconcilerContext, ensure_ingress, error::ReconcilerError, ObjectKey, Reconciler,
};

/// Recreates a deleted ingress as long as the service it routes to exists.
///
/// The workload isn't consulted, so the ingress comes back with the fallback
/// route rather than the one the workload asked for.
pub struct IngressGuardReconciler {
    context: Arc<ReconcilerContext>,
}

impl IngressGuardReconciler {
    pub fn new(context: Arc<ReconcilerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Reconciler for IngressGuardReconciler {
    fn name(&self) -> &'static str {
        "ingress-guard"
    }

    async fn reconcile(&self, key: &ObjectKey) -> Result<(), ReconcilerError> {
        let service = self
            .context
            .cluster
            .get_service(&key.namespace, &key.name)
            .await
            .map_err(ReconcilerError::ClusterApiError)?;

        if service.is_none() {
            info!("Ingress '{key}' has no service, leaving it deleted!");
            return Ok(());
        }

        info!("Ingress '{key}' was deleted, but its service still exists! Recreating...");

        ensure_ingress(&self.context, key, &RouteSpec::fallback(&self.context.config)).await
    }
}
