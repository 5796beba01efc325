use ekspose_core::{kubernetes::error::ClusterError, resources::ResourceGenerationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Object is missing metadata!")]
    MissingObjectMetadata,
    #[error("Couldn't generate the resource! Reason: {}", .0)]
    ResourceGenerationError(ResourceGenerationError),
    #[error("Cluster API call has failed! Reason: {}", .0)]
    ClusterApiError(ClusterError),
}

impl ReconcilerError {
    /// Whether another attempt could succeed without anything else changing.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcilerError::ClusterApiError(error) => error.is_transient(),
            _ => false,
        }
    }
}
