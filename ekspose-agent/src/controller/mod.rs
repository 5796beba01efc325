use std::sync::Arc;

use ekspose_core::config::ExposeConfig;
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service, networking::v1::Ingress};
use kube::Client;
use log::{info, warn};
use tokio::{join, sync::watch};

use crate::{cluster::KubeClusterApi, helpers::shutdown_on_signal, informer::InformerFactory};

use self::{
    reconciler::{
        context::ReconcilerContext, ingress_guard::IngressGuardReconciler,
        service_guard::ServiceGuardReconciler, workload::WorkloadReconciler,
    },
    worker::{EventKind, Worker},
};

pub mod reconciler;
pub mod worker;

/// Runs the workload controller and both guards until the process is asked
/// to terminate.
pub async fn main_controller(client: Client, config: ExposeConfig) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut factory =
        InformerFactory::new(client.clone(), config.watch_namespace.clone(), shutdown_rx.clone());

    let mut workloads = factory.informer::<Deployment>();
    let mut services = factory.informer::<Service>();
    let mut ingresses = factory.informer::<Ingress>();

    let max_retries = config.max_retries;
    let context = Arc::new(ReconcilerContext {
        cluster: Arc::new(KubeClusterApi::new(client)),
        config,
    });

    let workload_worker = Worker::new(
        WorkloadReconciler::new(context.clone(), workloads.store()),
        max_retries,
    );
    let service_guard = Worker::new(ServiceGuardReconciler::new(context.clone()), max_retries);
    let ingress_guard = Worker::new(IngressGuardReconciler::new(context), max_retries);

    workloads.add_event_handler(workload_worker.handler(&[EventKind::Added, EventKind::Deleted]));
    services.add_event_handler(service_guard.handler(&[EventKind::Deleted]));
    ingresses.add_event_handler(ingress_guard.handler(&[EventKind::Deleted]));

    info!("Starting informers...");

    factory.start(workloads);
    factory.start(services);
    factory.start(ingresses);

    let signal = tokio::spawn(shutdown_on_signal(shutdown_tx));

    if factory.wait_for_cache_sync().await {
        info!("Starting controllers...");

        join!(
            workload_worker.run(shutdown_rx.clone()),
            service_guard.run(shutdown_rx.clone()),
            ingress_guard.run(shutdown_rx),
        );
    } else {
        warn!("Shutdown requested before the caches have synced!");
    }

    factory.join().await;
    signal.abort();

    info!("Controllers stopped!");
}
