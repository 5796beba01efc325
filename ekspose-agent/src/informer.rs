use std::{collections::HashSet, fmt::Debug, pin::pin, sync::Arc};

use ekspose_core::{helpers::pretty_type_name, kubernetes::GetApi};
use futures::StreamExt;
use k8s_openapi::{serde::de::DeserializeOwned, NamespaceResourceScope};
use kube::{
    runtime::{
        reflector::{self, store::Writer, ObjectRef, Store},
        watcher::{self, watcher, Config},
        WatchStreamExt,
    },
    Api, Client, Resource,
};
use log::{info, warn};
use tokio::{sync::watch, task::JoinHandle};

/// Receives notifications about objects observed by an informer. Every
/// notification is delivered after the informer's cache has been updated.
pub trait ResourceEventHandler<K>: Send + Sync {
    fn on_add(&self, _object: &K) {}
    fn on_update(&self, _object: &K) {}
    fn on_delete(&self, _object: &K) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification<K> {
    Added(K),
    Updated(K),
    Deleted(K),
}

/// Cache, handlers and sync flag of a single informer, kept apart from the
/// watch stream feeding them.
pub struct InformerState<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    store: Store<K>,
    writer: Writer<K>,
    handlers: Vec<Arc<dyn ResourceEventHandler<K>>>,
    synced: watch::Sender<bool>,
}

impl<K> InformerState<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    pub fn new() -> Self {
        let (store, writer) = reflector::store();
        let (synced, _) = watch::channel(false);

        Self {
            store,
            writer,
            handlers: Vec::new(),
            synced,
        }
    }

    pub fn store(&self) -> Store<K> {
        self.store.clone()
    }

    pub fn has_synced(&self) -> watch::Receiver<bool> {
        self.synced.subscribe()
    }

    pub fn add_event_handler(&mut self, handler: Arc<dyn ResourceEventHandler<K>>) {
        self.handlers.push(handler);
    }

    /// Updates the cache with the watch event and notifies the handlers. A
    /// relist marks the cache as synced.
    pub fn apply(&mut self, event: watcher::Event<K>) {
        let notifications = diff_event(&self.store, &event);

        self.writer.apply_watcher_event(&event);

        for notification in &notifications {
            for handler in &self.handlers {
                match notification {
                    Notification::Added(object) => handler.on_add(object),
                    Notification::Updated(object) => handler.on_update(object),
                    Notification::Deleted(object) => handler.on_delete(object),
                }
            }
        }

        if let watcher::Event::Restarted(_) = event {
            self.synced.send_if_modified(|synced| !std::mem::replace(synced, true));
        }
    }
}

impl<K> Default for InformerState<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Turns a watch event into add/update/delete notifications by comparing it
/// with the cache contents from before the event.
///
/// A relist reports objects missing from the new listing as deleted, since
/// their delete events were lost while the watch was down.
pub fn diff_event<K>(store: &Store<K>, event: &watcher::Event<K>) -> Vec<Notification<K>>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let observed = |object: &K| {
        match store.get(&ObjectRef::from_obj(object)) {
            Some(_) => Notification::Updated(object.clone()),
            None => Notification::Added(object.clone()),
        }
    };

    match event {
        watcher::Event::Applied(object) => vec![observed(object)],
        watcher::Event::Deleted(object) => vec![Notification::Deleted(object.clone())],
        watcher::Event::Restarted(objects) => {
            let listed = objects
                .iter()
                .map(ObjectRef::from_obj)
                .collect::<HashSet<_>>();
            let stale = store
                .state()
                .into_iter()
                .filter(|cached| !listed.contains(&ObjectRef::from_obj(cached.as_ref())))
                .map(|cached| Notification::Deleted(cached.as_ref().clone()));

            stale.chain(objects.iter().map(observed)).collect()
        }
    }
}

/// A watch stream feeding an [`InformerState`].
pub struct Informer<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    api: Api<K>,
    state: InformerState<K>,
}

impl<K> Informer<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    pub fn new(api: Api<K>) -> Self {
        Self {
            api,
            state: InformerState::new(),
        }
    }

    pub fn store(&self) -> Store<K> {
        self.state.store()
    }

    pub fn has_synced(&self) -> watch::Receiver<bool> {
        self.state.has_synced()
    }

    pub fn add_event_handler(&mut self, handler: Arc<dyn ResourceEventHandler<K>>) {
        self.state.add_event_handler(handler);
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let kind = pretty_type_name::<K>();
        let Informer { api, mut state } = self;
        let mut events = pin!(watcher(api, Config::default()).backoff(watcher::default_backoff()));

        info!("Starting {kind} informer...");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                event = events.next() => match event {
                    Some(Ok(event)) => state.apply(event),
                    Some(Err(error)) => warn!("{kind} watcher has failed, retrying! {error}"),
                    None => break,
                },
            }
        }

        info!("Exiting {kind} informer!");
    }
}

/// Creates informers sharing one client and namespace scope, runs them and
/// tracks their cache sync.
pub struct InformerFactory {
    client: Client,
    namespace: Option<String>,
    shutdown: watch::Receiver<bool>,
    synced: Vec<(&'static str, watch::Receiver<bool>)>,
    tasks: Vec<JoinHandle<()>>,
}

impl InformerFactory {
    pub fn new(client: Client, namespace: Option<String>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            client,
            namespace,
            shutdown,
            synced: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn informer<K>(&self) -> Informer<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug
            + Send
            + Sync
            + 'static,
    {
        Informer::new(self.client.scoped_api(self.namespace.as_deref()))
    }

    pub fn start<K>(&mut self, informer: Informer<K>)
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        self.synced
            .push((pretty_type_name::<K>(), informer.has_synced()));
        self.tasks
            .push(tokio::spawn(informer.run(self.shutdown.clone())));
    }

    /// Waits until every started informer has listed its resources. Returns
    /// `false` if shutdown was requested first.
    pub async fn wait_for_cache_sync(&self) -> bool {
        for (kind, synced) in &self.synced {
            info!("Waiting for {kind} cache to sync...");

            if !wait_for_sync(synced.clone(), self.shutdown.clone()).await {
                return false;
            }
        }

        info!("Caches synced!");

        true
    }

    pub async fn join(self) {
        for task in self.tasks {
            if let Err(error) = task.await {
                warn!("Informer task has failed! {error}");
            }
        }
    }
}

pub async fn wait_for_sync(
    mut synced: watch::Receiver<bool>,
    mut shutdown: watch::Receiver<bool>,
) -> bool {
    loop {
        if *synced.borrow() {
            return true;
        }

        if *shutdown.borrow() {
            return false;
        }

        tokio::select! {
            changed = synced.changed() => {
                if changed.is_err() {
                    return *synced.borrow();
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}
