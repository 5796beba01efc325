use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;

use crate::config::ExposeConfig;

use super::{
    ingress::RouteSpec,
    labels::{INGRESS_REQUESTED_VALUE, INGRESS_REQUEST_LABEL, PORT_LABEL},
    ResourceGenerationError,
};

const ROOT_PATH: &str = "/";

/// How a workload wants to be exposed, derived from its labels.
///
/// It's computed once per reconciliation and passed to the resource
/// generators, so the service and the ingress can't disagree on the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposureIntent {
    pub port: u16,
    pub ingress_requested: bool,
    pub path: String,
}

impl ExposureIntent {
    pub fn from_workload(
        workload: &Deployment,
        config: &ExposeConfig,
    ) -> Result<Self, ResourceGenerationError> {
        match workload.metadata.labels.as_ref() {
            Some(labels) => Self::from_labels(labels, config),
            None => Self::from_labels(&BTreeMap::new(), config),
        }
    }

    pub fn from_labels(
        labels: &BTreeMap<String, String>,
        config: &ExposeConfig,
    ) -> Result<Self, ResourceGenerationError> {
        let port = match labels.get(PORT_LABEL) {
            Some(raw) => parse_port(raw)?,
            None => config.default_port,
        };
        let ingress_requested = labels
            .get(INGRESS_REQUEST_LABEL)
            .is_some_and(|value| value == INGRESS_REQUESTED_VALUE);
        let path = if port == config.api_port {
            config.api_path.to_owned()
        } else {
            ROOT_PATH.to_owned()
        };

        Ok(Self {
            port,
            ingress_requested,
            path,
        })
    }

    /// The route to publish, or `None` when no ingress was requested.
    pub fn route(&self) -> Option<RouteSpec> {
        self.ingress_requested.then(|| RouteSpec {
            path: self.path.to_owned(),
            port: self.port,
        })
    }
}

fn parse_port(raw: &str) -> Result<u16, ResourceGenerationError> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(ResourceGenerationError::InvalidData(
            format!("'{raw}' isn't a valid '{PORT_LABEL}' label value").into(),
        )),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::apps::v1::Deployment;
    use kube::core::ObjectMeta;

    use crate::{config::ExposeConfig, resources::ResourceGenerationError};

    use super::ExposureIntent;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn unlabeled_workload_gets_default_port_and_no_ingress() {
        let intent = ExposureIntent::from_workload(&Deployment::default(), &ExposeConfig::default())
            .unwrap();

        assert_eq!(
            intent,
            ExposureIntent {
                port: 80,
                ingress_requested: false,
                path: "/".to_owned(),
            }
        );
        assert_eq!(intent.route(), None);
    }

    #[test]
    fn api_port_is_routed_under_the_api_path() {
        let intent = ExposureIntent::from_labels(
            &labels(&[("port", "8080"), ("ingReq", "needed")]),
            &ExposeConfig::default(),
        )
        .unwrap();

        assert_eq!(intent.port, 8080);
        assert!(intent.ingress_requested);
        assert_eq!(intent.path, "/api/v1/books");

        let route = intent.route().unwrap();
        assert_eq!(route.path, "/api/v1/books");
        assert_eq!(route.port, 8080);
    }

    #[test]
    fn other_ports_are_routed_under_root() {
        let intent = ExposureIntent::from_labels(
            &labels(&[("port", "3000"), ("ingReq", "needed")]),
            &ExposeConfig::default(),
        )
        .unwrap();

        assert_eq!(intent.port, 3000);
        assert_eq!(intent.path, "/");
    }

    #[test]
    fn ingress_is_requested_only_by_the_exact_value() {
        for value in ["notNeeded", "Needed", "yes", ""] {
            let intent = ExposureIntent::from_labels(
                &labels(&[("ingReq", value)]),
                &ExposeConfig::default(),
            )
            .unwrap();

            assert!(!intent.ingress_requested, "'{value}' shouldn't request an ingress");
        }
    }

    #[test]
    fn labels_are_read_from_workload_metadata() {
        let workload = Deployment {
            metadata: ObjectMeta {
                labels: Some(labels(&[("port", "9000"), ("ingReq", "needed")])),
                ..Default::default()
            },
            ..Default::default()
        };

        let intent = ExposureIntent::from_workload(&workload, &ExposeConfig::default()).unwrap();

        assert_eq!(intent.port, 9000);
        assert!(intent.ingress_requested);
    }

    #[test]
    fn configured_api_port_and_path_are_honored() {
        let config = ExposeConfig {
            api_port: 9090,
            api_path: "/v2".to_owned(),
            ..Default::default()
        };

        let api = ExposureIntent::from_labels(&labels(&[("port", "9090")]), &config).unwrap();
        let books = ExposureIntent::from_labels(&labels(&[("port", "8080")]), &config).unwrap();

        assert_eq!(api.path, "/v2");
        assert_eq!(books.path, "/");
    }

    #[test]
    fn invalid_port_labels_are_rejected() {
        for value in ["http", "0", "65536", "-1", " 80"] {
            let result =
                ExposureIntent::from_labels(&labels(&[("port", value)]), &ExposeConfig::default());

            assert!(
                matches!(result, Err(ResourceGenerationError::InvalidData(_))),
                "'{value}' should be rejected"
            );
        }
    }
}
