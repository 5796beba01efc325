use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use ekspose_core::{config::ExposeConfig, kubernetes::error::ClusterError};
use k8s_openapi::api::{
    apps::v1::{Deployment, DeploymentSpec},
    core::v1::{PodTemplateSpec, Service},
    networking::v1::Ingress,
};
use kube::{
    core::ObjectMeta,
    runtime::{
        reflector::{self, Store},
        watcher::Event,
    },
};

use crate::{
    cluster::ClusterApi,
    controller::reconciler::{context::ReconcilerContext, ObjectKey},
};

/// In-memory cluster with create/delete semantics of the API server.
#[derive(Default)]
pub struct FakeCluster {
    workloads: Mutex<HashMap<ObjectKey, Deployment>>,
    services: Mutex<HashMap<ObjectKey, Service>>,
    ingresses: Mutex<HashMap<ObjectKey, Ingress>>,
    created: Mutex<Vec<String>>,
    workload_reads: AtomicUsize,
}

impl FakeCluster {
    pub fn insert_workload(&self, workload: Deployment) {
        let key = ObjectKey::from_resource(&workload).unwrap();
        self.workloads.lock().unwrap().insert(key, workload);
    }

    pub fn remove_workload(&self, key: &ObjectKey) {
        self.workloads.lock().unwrap().remove(key);
    }

    pub fn insert_service(&self, service: Service) {
        let key = ObjectKey::from_resource(&service).unwrap();
        self.services.lock().unwrap().insert(key, service);
    }

    /// Deletes the service behind the controllers' back.
    pub fn remove_service(&self, key: &ObjectKey) -> Option<Service> {
        self.services.lock().unwrap().remove(key)
    }

    pub fn remove_ingress(&self, key: &ObjectKey) -> Option<Ingress> {
        self.ingresses.lock().unwrap().remove(key)
    }

    pub fn service(&self, key: &ObjectKey) -> Option<Service> {
        self.services.lock().unwrap().get(key).cloned()
    }

    pub fn ingress(&self, key: &ObjectKey) -> Option<Ingress> {
        self.ingresses.lock().unwrap().get(key).cloned()
    }

    /// Successful creations, as `kind namespace/name`.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn workload_reads(&self) -> usize {
        self.workload_reads.load(Ordering::SeqCst)
    }

    fn create<K: kube::Resource + Clone>(
        &self,
        store: &Mutex<HashMap<ObjectKey, K>>,
        kind: &str,
        object: &K,
    ) -> Result<(), ClusterError> {
        let key = ObjectKey::from_resource(object).unwrap();
        let mut store = store.lock().unwrap();

        if store.contains_key(&key) {
            return Err(ClusterError::AlreadyExists);
        }

        self.created.lock().unwrap().push(format!("{kind} {key}"));
        store.insert(key, object.clone());

        Ok(())
    }

    fn delete<K>(
        store: &Mutex<HashMap<ObjectKey, K>>,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        match store
            .lock()
            .unwrap()
            .remove(&ObjectKey::new(namespace, name))
        {
            Some(_) => Ok(()),
            None => Err(ClusterError::NotFound),
        }
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClusterError> {
        self.workload_reads.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .workloads
            .lock()
            .unwrap()
            .get(&ObjectKey::new(namespace, name))
            .cloned())
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, ClusterError> {
        Ok(self.service(&ObjectKey::new(namespace, name)))
    }

    async fn create_service(&self, service: &Service) -> Result<(), ClusterError> {
        self.create(&self.services, "service", service)
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        Self::delete(&self.services, namespace, name)
    }

    async fn create_ingress(&self, ingress: &Ingress) -> Result<(), ClusterError> {
        self.create(&self.ingresses, "ingress", ingress)
    }

    async fn delete_ingress(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        Self::delete(&self.ingresses, namespace, name)
    }
}

pub fn workload(namespace: &str, name: &str, labels: &[(&str, &str)]) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            labels: Some(
                labels
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(template_labels(name)),
                    ..Default::default()
                }),
                spec: None,
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn template_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_owned(), name.to_owned())])
}

pub fn context(cluster: Arc<dyn ClusterApi>) -> Arc<ReconcilerContext> {
    Arc::new(ReconcilerContext {
        cluster,
        config: ExposeConfig::default(),
    })
}

/// A cache holding the given objects.
pub fn store_with<K>(objects: Vec<K>) -> Store<K>
where
    K: kube::Resource<DynamicType = ()> + Clone + 'static,
{
    let (store, mut writer) = reflector::store();
    writer.apply_watcher_event(&Event::Restarted(objects));

    store
}

pub fn service_port(service: &Service) -> i32 {
    service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0].port
}

/// Host, path, backend name and backend port of the ingress' only rule.
pub fn ingress_route(ingress: &Ingress) -> (String, String, String, i32) {
    let rule = &ingress.spec.as_ref().unwrap().rules.as_ref().unwrap()[0];
    let path = &rule.http.as_ref().unwrap().paths[0];
    let backend = path.backend.service.as_ref().unwrap();

    (
        rule.host.clone().unwrap(),
        path.path.clone().unwrap(),
        backend.name.clone(),
        backend.port.as_ref().unwrap().number.unwrap(),
    )
}

pub fn transient_error() -> ClusterError {
    ClusterError::Transient(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_owned(),
        message: "etcd is unavailable".to_owned(),
        reason: "ServiceUnavailable".to_owned(),
        code: 503,
    }))
}
