use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};

pub mod error;
pub mod operations;

pub trait GetApi {
    fn namespaced_api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>;

    fn global_api<K>(&self) -> Api<K>
    where
        K: Resource<DynamicType = ()>;

    /// Namespaced api when `namespace` is set, all namespaces otherwise.
    fn scoped_api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        match namespace {
            Some(namespace) => self.namespaced_api(namespace),
            None => self.global_api(),
        }
    }
}

impl GetApi for Client {
    fn namespaced_api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.clone(), namespace)
    }

    fn global_api<K>(&self) -> Api<K>
    where
        K: Resource<DynamicType = ()>,
    {
        Api::all(self.clone())
    }
}
