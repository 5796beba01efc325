use std::fmt::Display;

use async_trait::async_trait;
use ekspose_core::{
    helpers::RequireMetadata,
    kubernetes::error::ClusterError,
    resources::{
        ingress::{generate_ingress, RouteSpec},
        intent::ExposureIntent,
        service::generate_service,
    },
};
use k8s_openapi::api::apps::v1::Deployment;
use kube::Resource;
use log::{info, warn};

use self::{context::ReconcilerContext, error::ReconcilerError};

pub mod context;
pub mod error;
pub mod ingress_guard;
pub mod service_guard;
pub mod workload;

/// Namespace and name of the object a reconciliation is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_resource<K: Resource>(object: &K) -> Result<Self, ReconcilerError> {
        Ok(Self::new(
            object.require_namespace_or(ReconcilerError::MissingObjectMetadata)?,
            object.require_name_or(ReconcilerError::MissingObjectMetadata)?,
        ))
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[async_trait]
pub trait Reconciler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn reconcile(&self, key: &ObjectKey) -> Result<(), ReconcilerError>;
}

#[derive(Debug)]
pub enum ReconcileOutcome {
    Success,
    RetryableFailure(ReconcilerError),
    FatalFailure(ReconcilerError),
}

impl From<Result<(), ReconcilerError>> for ReconcileOutcome {
    fn from(result: Result<(), ReconcilerError>) -> Self {
        match result {
            Ok(()) => ReconcileOutcome::Success,
            Err(error) if error.is_retryable() => ReconcileOutcome::RetryableFailure(error),
            Err(error) => ReconcileOutcome::FatalFailure(error),
        }
    }
}

/// Creates the service for the workload, treating an existing one as success.
pub async fn ensure_service(
    context: &ReconcilerContext,
    workload: &Deployment,
    intent: &ExposureIntent,
) -> Result<(), ReconcilerError> {
    let service =
        generate_service(workload, intent).map_err(ReconcilerError::ResourceGenerationError)?;
    let key = ObjectKey::from_resource(&service)?;

    tolerate_already_exists(
        context.cluster.create_service(&service).await,
        "service",
        &key,
    )
}

/// Creates the ingress for the service named by `key`, treating an existing
/// one as success.
pub async fn ensure_ingress(
    context: &ReconcilerContext,
    key: &ObjectKey,
    route: &RouteSpec,
) -> Result<(), ReconcilerError> {
    let ingress = generate_ingress(&key.name, &key.namespace, route, &context.config);

    tolerate_already_exists(
        context.cluster.create_ingress(&ingress).await,
        "ingress",
        key,
    )
}

pub async fn remove_service(
    context: &ReconcilerContext,
    key: &ObjectKey,
) -> Result<(), ReconcilerError> {
    tolerate_not_found(
        context
            .cluster
            .delete_service(&key.namespace, &key.name)
            .await,
        "service",
        key,
    )
}

pub async fn remove_ingress(
    context: &ReconcilerContext,
    key: &ObjectKey,
) -> Result<(), ReconcilerError> {
    tolerate_not_found(
        context
            .cluster
            .delete_ingress(&key.namespace, &key.name)
            .await,
        "ingress",
        key,
    )
}

fn tolerate_already_exists(
    result: Result<(), ClusterError>,
    kind: &str,
    key: &ObjectKey,
) -> Result<(), ReconcilerError> {
    match result {
        Ok(()) => {
            info!("Created {kind} '{key}'!");
            Ok(())
        }
        Err(ClusterError::AlreadyExists) => {
            info!("The {kind} '{key}' already exists!");
            Ok(())
        }
        Err(error) => {
            warn!("Couldn't create {kind} '{key}'! {error}");
            Err(ReconcilerError::ClusterApiError(error))
        }
    }
}

fn tolerate_not_found(
    result: Result<(), ClusterError>,
    kind: &str,
    key: &ObjectKey,
) -> Result<(), ReconcilerError> {
    match result {
        Ok(()) => {
            info!("Removed {kind} '{key}'!");
            Ok(())
        }
        Err(ClusterError::NotFound) => {
            info!("The {kind} '{key}' is already gone!");
            Ok(())
        }
        Err(error) => {
            warn!("Couldn't remove {kind} '{key}'! {error}");
            Err(ReconcilerError::ClusterApiError(error))
        }
    }
}
