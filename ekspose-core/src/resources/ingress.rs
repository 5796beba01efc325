use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use kube::core::ObjectMeta;

use crate::config::ExposeConfig;

pub const PATH_TYPE_EXACT: &str = "Exact";

/// Path and backend port of the single rule an ingress carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub path: String,
    pub port: u16,
}

impl RouteSpec {
    /// Route used when an ingress is recreated without looking at the
    /// workload: root path on the default port.
    pub fn fallback(config: &ExposeConfig) -> Self {
        Self {
            path: "/".to_owned(),
            port: config.default_port,
        }
    }
}

pub fn get_route_host(name: &str, config: &ExposeConfig) -> String {
    format!("{name}.{}", config.domain_suffix)
}

/// Builds the ingress routing `{name}.{domain}{path}` to the service with
/// the same name.
pub fn generate_ingress(
    name: &str,
    namespace: &str,
    route: &RouteSpec,
    config: &ExposeConfig,
) -> Ingress {
    let backend = IngressBackend {
        service: Some(IngressServiceBackend {
            name: name.to_owned(),
            port: Some(ServiceBackendPort {
                number: Some(route.port.into()),
                ..Default::default()
            }),
        }),
        ..Default::default()
    };
    let rule = IngressRule {
        host: Some(get_route_host(name, config)),
        http: Some(HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some(route.path.to_owned()),
                path_type: Some(PATH_TYPE_EXACT.to_owned()),
                backend,
            }],
        }),
    };

    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![rule]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::networking::v1::{HTTPIngressPath, Ingress};

    use crate::config::ExposeConfig;

    use super::{generate_ingress, RouteSpec, PATH_TYPE_EXACT};

    fn single_path(ingress: &Ingress) -> (&str, &HTTPIngressPath) {
        let rules = ingress.spec.as_ref().unwrap().rules.as_ref().unwrap();
        assert_eq!(rules.len(), 1);

        let paths = &rules[0].http.as_ref().unwrap().paths;
        assert_eq!(paths.len(), 1);

        (rules[0].host.as_deref().unwrap(), &paths[0])
    }

    #[test]
    fn ingress_routes_host_and_path_to_the_service() {
        let route = RouteSpec {
            path: "/api/v1/books".to_owned(),
            port: 8080,
        };
        let ingress = generate_ingress("web", "default", &route, &ExposeConfig::default());

        assert_eq!(ingress.metadata.name.as_deref(), Some("web"));
        assert_eq!(ingress.metadata.namespace.as_deref(), Some("default"));

        let (host, path) = single_path(&ingress);
        assert_eq!(host, "web.abhilash.com");
        assert_eq!(path.path.as_deref(), Some("/api/v1/books"));
        assert_eq!(path.path_type.as_deref(), Some(PATH_TYPE_EXACT));

        let backend = path.backend.service.as_ref().unwrap();
        assert_eq!(backend.name, "web");
        assert_eq!(backend.port.as_ref().unwrap().number, Some(8080));
    }

    #[test]
    fn fallback_route_uses_root_path_and_default_port() {
        let config = ExposeConfig::default();
        let ingress = generate_ingress("shop", "store", &RouteSpec::fallback(&config), &config);

        let (host, path) = single_path(&ingress);
        assert_eq!(host, "shop.abhilash.com");
        assert_eq!(path.path.as_deref(), Some("/"));

        let backend = path.backend.service.as_ref().unwrap();
        assert_eq!(backend.port.as_ref().unwrap().number, Some(80));
    }

    #[test]
    fn host_uses_the_configured_domain() {
        let config = ExposeConfig {
            domain_suffix: "apps.internal".to_owned(),
            ..Default::default()
        };
        let ingress = generate_ingress("web", "default", &RouteSpec::fallback(&config), &config);

        assert_eq!(single_path(&ingress).0, "web.apps.internal");
    }
}
