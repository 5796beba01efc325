use std::sync::Arc;

use ekspose_core::config::ExposeConfig;

use crate::cluster::ClusterApi;

pub struct ReconcilerContext {
    pub cluster: Arc<dyn ClusterApi>,
    pub config: ExposeConfig,
}
