use std::sync::Arc;

use kube::Resource;
use log::{debug, error, info, warn};
use tokio::{join, sync::watch};

use crate::{informer::ResourceEventHandler, queue::WorkQueue};

use super::reconciler::{ObjectKey, ReconcileOutcome, Reconciler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Updated,
    Deleted,
}

/// Drains a work queue of object keys into a reconciler, one key at a time.
pub struct Worker<R> {
    reconciler: Arc<R>,
    queue: WorkQueue<ObjectKey>,
    max_retries: u32,
}

impl<R> Worker<R>
where
    R: Reconciler + 'static,
{
    pub fn new(reconciler: R, max_retries: u32) -> Self {
        let queue = WorkQueue::new(reconciler.name());

        Self::with_queue(reconciler, queue, max_retries)
    }

    pub fn with_queue(reconciler: R, queue: WorkQueue<ObjectKey>, max_retries: u32) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            queue,
            max_retries,
        }
    }

    #[cfg(test)]
    pub fn queue(&self) -> &WorkQueue<ObjectKey> {
        &self.queue
    }

    /// Event handler enqueueing the keys of objects for the given kinds of
    /// events and ignoring the rest.
    pub fn handler<K: Resource + 'static>(
        &self,
        events: &[EventKind],
    ) -> Arc<dyn ResourceEventHandler<K>> {
        Arc::new(EnqueueHandler {
            queue: self.queue.clone(),
            events: events.to_vec(),
        })
    }

    /// Reconciles the next key. Returns `false` once the queue is shut down.
    pub async fn process_next_item(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };

        let outcome = ReconcileOutcome::from(self.reconciler.reconcile(&key).await);
        self.handle_outcome(&key, outcome);
        self.queue.done(&key);

        true
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let name = self.reconciler.name();
        info!("Starting {name} worker...");

        let queue = self.queue.clone();
        let stopper = async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }

            queue.shutdown();
        };
        let processor = async { while self.process_next_item().await {} };

        join!(stopper, processor);

        info!("Exiting {name} worker!");
    }

    fn handle_outcome(&self, key: &ObjectKey, outcome: ReconcileOutcome) {
        let name = self.reconciler.name();

        match outcome {
            ReconcileOutcome::Success => {
                debug!("Reconciled '{key}' ({name})!");
                self.queue.forget(key);
            }
            ReconcileOutcome::RetryableFailure(reason) => {
                let retries = self.queue.num_requeues(key);

                if retries < self.max_retries {
                    warn!("Reconciling '{key}' ({name}) has failed, retrying! {reason}");
                    self.queue.add_rate_limited(key.clone());
                } else {
                    error!("Giving up on '{key}' ({name}) after {retries} retries! {reason}");
                    self.queue.forget(key);
                }
            }
            ReconcileOutcome::FatalFailure(reason) => {
                error!("Reconciling '{key}' ({name}) has failed! {reason}");
                self.queue.forget(key);
            }
        }
    }
}

struct EnqueueHandler {
    queue: WorkQueue<ObjectKey>,
    events: Vec<EventKind>,
}

impl EnqueueHandler {
    fn enqueue<K: Resource>(&self, event: EventKind, object: &K) {
        if !self.events.contains(&event) {
            return;
        }

        match ObjectKey::from_resource(object) {
            Ok(key) => {
                debug!("{event:?} '{key}', queueing into '{}'...", self.queue.name());
                self.queue.add(key);
            }
            Err(error) => warn!("Couldn't queue {event:?} object! {error}"),
        }
    }
}

impl<K: Resource> ResourceEventHandler<K> for EnqueueHandler {
    fn on_add(&self, object: &K) {
        self.enqueue(EventKind::Added, object);
    }

    fn on_update(&self, object: &K) {
        self.enqueue(EventKind::Updated, object);
    }

    fn on_delete(&self, object: &K) {
        self.enqueue(EventKind::Deleted, object);
    }
}
