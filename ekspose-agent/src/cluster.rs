use async_trait::async_trait;
use ekspose_core::kubernetes::{
    error::ClusterError,
    operations::{create_resource, delete_resource, try_get_resource},
};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service, networking::v1::Ingress};
use kube::Client;

#[cfg(test)]
use mockall::automock;

/// Authoritative cluster operations used by the reconcilers.
///
/// Reads return `Ok(None)` for missing objects. Writes report existing
/// (on create) and missing (on delete) objects as
/// [`ClusterError::AlreadyExists`] and [`ClusterError::NotFound`], leaving
/// it to the caller to decide whether that's a failure.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClusterError>;

    async fn get_service(&self, namespace: &str, name: &str)
        -> Result<Option<Service>, ClusterError>;

    async fn create_service(&self, service: &Service) -> Result<(), ClusterError>;

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn create_ingress(&self, ingress: &Ingress) -> Result<(), ClusterError>;

    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
}

pub struct KubeClusterApi {
    client: Client,
}

impl KubeClusterApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClusterError> {
        try_get_resource(&self.client, name, namespace).await
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, ClusterError> {
        try_get_resource(&self.client, name, namespace).await
    }

    async fn create_service(&self, service: &Service) -> Result<(), ClusterError> {
        create_resource(&self.client, service).await
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        delete_resource::<Service>(&self.client, name, namespace).await
    }

    async fn create_ingress(&self, ingress: &Ingress) -> Result<(), ClusterError> {
        create_resource(&self.client, ingress).await
    }

    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        delete_resource::<Ingress>(&self.client, name, namespace).await
    }
}
