use std::fmt::Debug;

use anyhow::Context;
use k8s_openapi::{
    serde::{de::DeserializeOwned, Serialize},
    NamespaceResourceScope,
};
use kube::{
    api::{DeleteParams, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config, Resource,
};
use log::{debug, info, warn};

use crate::helpers::pretty_type_name;

use super::{error::ClusterError, GetApi};

/// Creates a client from the given kubeconfig (or the default one), falling
/// back to the in-cluster service account when no usable kubeconfig is found.
pub async fn create_local_client(
    config_path: &Option<String>,
    context_name: &Option<String>,
) -> anyhow::Result<Client> {
    let config = match load_kubeconfig(config_path, context_name).await {
        Ok(config) => config,
        Err(error) => {
            warn!(
                "Couldn't load kubeconfig ({error:#}), falling back to in-cluster configuration..."
            );
            Config::incluster().context("Couldn't load in-cluster configuration!")?
        }
    };

    let client = Client::try_from(config)?;

    Ok(client)
}

async fn load_kubeconfig(
    config_path: &Option<String>,
    context_name: &Option<String>,
) -> anyhow::Result<Config> {
    let config_options = KubeConfigOptions {
        context: context_name.to_owned(),
        ..Default::default()
    };

    let config = match config_path {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Couldn't read kubeconfig from '{path}'!"))?;
            Config::from_custom_kubeconfig(kubeconfig, &config_options).await?
        }
        None => Config::from_kubeconfig(&config_options).await?,
    };

    Ok(config)
}

/// Authoritative read, bypassing any local cache. `Ok(None)` when the
/// resource doesn't exist.
pub async fn try_get_resource<T>(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<Option<T>, ClusterError>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    debug!(
        "Retrieving '{name}' {} from '{namespace}' namespace...",
        pretty_type_name::<T>()
    );

    match client.namespaced_api::<T>(namespace).get(name).await {
        Ok(resource) => Ok(Some(resource)),
        Err(error) => match ClusterError::from(error) {
            ClusterError::NotFound => Ok(None),
            error => Err(error),
        },
    }
}

/// Creates the resource, reporting an existing one as
/// [`ClusterError::AlreadyExists`].
pub async fn create_resource<T>(client: &Client, resource: &T) -> Result<(), ClusterError>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Serialize
        + Clone
        + DeserializeOwned
        + Debug,
{
    let name = resource.meta().name.as_deref().unwrap_or_default();
    let namespace = resource.meta().namespace.as_deref().unwrap_or_default();

    info!(
        "Creating '{name}' {} in '{namespace}' namespace...",
        pretty_type_name::<T>()
    );

    client
        .namespaced_api::<T>(namespace)
        .create(&PostParams::default(), resource)
        .await?;

    Ok(())
}

/// Deletes the resource, reporting a missing one as
/// [`ClusterError::NotFound`].
pub async fn delete_resource<T>(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<(), ClusterError>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    info!(
        "Removing '{name}' {} from '{namespace}' namespace...",
        pretty_type_name::<T>()
    );

    client
        .namespaced_api::<T>(namespace)
        .delete(name, &DeleteParams::default())
        .await?;

    Ok(())
}
