use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{Service, ServicePort, ServiceSpec},
};
use kube::core::ObjectMeta;

use crate::helpers::RequireMetadata;

use super::{intent::ExposureIntent, ResourceGenerationError};

pub const SERVICE_PORT_NAME: &str = "http";

/// Builds the service exposing `workload`. The service shares the workload's
/// name and namespace and selects its pods by the pod template labels.
pub fn generate_service(
    workload: &Deployment,
    intent: &ExposureIntent,
) -> Result<Service, ResourceGenerationError> {
    let name = workload.require_name_or(ResourceGenerationError::DependentMissingMetadataName)?;
    let namespace = workload
        .require_namespace_or(ResourceGenerationError::DependentMissingMetadataNamespace)?;
    let selector = workload
        .spec
        .as_ref()
        .and_then(|spec| spec.template.metadata.as_ref())
        .and_then(|metadata| metadata.labels.to_owned())
        .ok_or_else(|| {
            ResourceGenerationError::DependentMissingData("spec.template.metadata.labels".into())
        })?;

    Ok(Service {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                name: Some(SERVICE_PORT_NAME.to_owned()),
                port: intent.port.into(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    })
}
