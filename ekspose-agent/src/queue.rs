use std::{
    collections::{HashMap, HashSet, VecDeque},
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::debug;
use tokio::sync::Notify;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5 * 60);

/// A deduplicating work queue.
///
/// An item sits in the queue at most once. Adding an item that is being
/// processed parks it until [`WorkQueue::done`] is called for it, so a
/// single item is never handed out twice at the same time.
///
/// Failed items can be re-added with an exponential delay through
/// [`WorkQueue::add_rate_limited`]; [`WorkQueue::forget`] resets that delay.
pub struct WorkQueue<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    name: &'static str,
    state: Mutex<State<T>>,
    notify: Notify,
    base_delay: Duration,
    max_delay: Duration,
}

struct State<T> {
    queue: VecDeque<T>,
    dirty: HashSet<T>,
    processing: HashSet<T>,
    failures: HashMap<T, u32>,
    shutting_down: bool,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> WorkQueue<T>
where
    T: Clone + Eq + Hash + Send + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self::with_backoff(name, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }

    pub fn with_backoff(name: &'static str, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                    failures: HashMap::new(),
                    shutting_down: false,
                }),
                notify: Notify::new(),
                base_delay,
                max_delay,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn add(&self, item: T) {
        let mut state = self.lock();

        if state.shutting_down || state.dirty.contains(&item) {
            return;
        }

        state.dirty.insert(item.clone());

        if state.processing.contains(&item) {
            return;
        }

        state.queue.push_back(item);
        drop(state);

        self.inner.notify.notify_one();
    }

    /// Waits for the next item. Returns `None` once the queue is shut down,
    /// even if items are still pending.
    pub async fn get(&self) -> Option<T> {
        loop {
            {
                let mut state = self.lock();

                if state.shutting_down {
                    return None;
                }

                if let Some(item) = state.queue.pop_front() {
                    state.dirty.remove(&item);
                    state.processing.insert(item.clone());

                    return Some(item);
                }
            }

            self.inner.notify.notified().await;
        }
    }

    /// Marks the item as processed, requeueing it if it was added again in
    /// the meantime.
    pub fn done(&self, item: &T) {
        let mut state = self.lock();

        state.processing.remove(item);

        if !state.shutting_down && state.dirty.contains(item) {
            state.queue.push_back(item.clone());
            drop(state);

            self.inner.notify.notify_one();
        }
    }

    /// Clears the failure history of the item.
    pub fn forget(&self, item: &T) {
        self.lock().failures.remove(item);
    }

    pub fn num_requeues(&self, item: &T) -> u32 {
        self.lock().failures.get(item).copied().unwrap_or_default()
    }

    /// Adds the item after a delay growing exponentially with the number of
    /// its previous failures.
    pub fn add_rate_limited(&self, item: T) {
        let failures = {
            let mut state = self.lock();
            let failures = state.failures.entry(item.clone()).or_default();
            let previous = *failures;
            *failures += 1;

            previous
        };

        let delay = backoff_delay(self.inner.base_delay, self.inner.max_delay, failures);

        debug!(
            "Requeueing item in '{}' queue in {delay:?} (attempt {})...",
            self.inner.name,
            failures + 1
        );

        self.add_after(item, delay);
    }

    pub fn add_after(&self, item: T, delay: Duration) {
        if delay.is_zero() {
            self.add(item);
            return;
        }

        if self.is_shutting_down() {
            return;
        }

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(item);
        });
    }

    pub fn shutdown(&self) {
        {
            let mut state = self.lock();
            state.shutting_down = true;
            state.queue.clear();
            state.dirty.clear();
        }

        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn backoff_delay(base: Duration, max: Duration, failures: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(failures)).min(max)
}
