//! Run-now-or-when-ready operations on top of the [`ServiceLocator`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use super::{ServiceKey, ServiceLocator};

/// Outcome of submitting work that depends on a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredStatus {
    /// The service was available and the operation already ran.
    Ran,
    /// The operation is parked until the service is provided.
    Queued,
}

#[derive(Default)]
struct QueueStats {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    /// Operations that ran or were discarded unrun.
    settled: AtomicUsize,
}

/// Owned by a queued operation. Dropping it, whether after the operation ran
/// or when the locator discarded the waiter, settles the operation.
struct Settle(Arc<QueueStats>);

impl Drop for Settle {
    fn drop(&mut self) {
        self.0.settled.fetch_add(1, Ordering::Relaxed);
    }
}

/// Queue of operations that need a collaborator which may not exist yet.
///
/// Cloning is cheap; clones share the locator and the counters. Each
/// operation is an `FnOnce` registered as a single waiter, so it runs at most
/// once no matter how many times the service is provided afterwards.
#[derive(Clone)]
pub struct DeferredQueue {
    locator: Arc<ServiceLocator>,
    stats: Arc<QueueStats>,
}

impl DeferredQueue {
    pub fn new(locator: Arc<ServiceLocator>) -> Self {
        Self {
            locator,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// The locator this queue submits to, for synchronous lookups.
    pub fn locator(&self) -> &Arc<ServiceLocator> {
        &self.locator
    }

    /// Runs `operation` with the service under `key`, now if it is available,
    /// otherwise exactly once when it is first provided.
    pub fn enqueue_until_ready<T, F>(&self, key: ServiceKey<T>, operation: F) -> DeferredStatus
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        let settle = Settle(Arc::clone(&self.stats));
        let status = self.locator.on_ready(key, move |instance| {
            operation(instance);
            settle.0.completed.fetch_add(1, Ordering::Relaxed);
        });

        if status == DeferredStatus::Queued {
            debug!(
                target: "spell::services",
                service = key.name(),
                pending = self.pending(),
                "Deferred operation until service is provided"
            );
        }
        status
    }

    /// Operations still waiting for their service.
    pub fn pending(&self) -> usize {
        let submitted = self.stats.submitted.load(Ordering::Relaxed);
        let settled = self.stats.settled.load(Ordering::Relaxed);
        submitted.saturating_sub(settled)
    }

    /// Operations that have run so far.
    pub fn completed(&self) -> usize {
        self.stats.completed.load(Ordering::Relaxed)
    }

    /// Operations discarded without running, because the locator was cleared
    /// or the service was provided under a different type.
    pub fn dropped(&self) -> usize {
        let settled = self.stats.settled.load(Ordering::Relaxed);
        settled.saturating_sub(self.completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const PHYSICS: ServiceKey<&'static str> = ServiceKey::new("physics");

    #[test]
    fn enqueue_before_provide_runs_once_after_provide() {
        let queue = DeferredQueue::new(ServiceLocator::shared());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&calls);
        let status = queue.enqueue_until_ready(PHYSICS, move |provider| {
            sink.lock().unwrap().push(provider);
        });
        assert_eq!(status, DeferredStatus::Queued);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(queue.pending(), 1);

        queue.locator().provide(PHYSICS, "x");
        queue.locator().provide(PHYSICS, "y");

        assert_eq!(*calls.lock().unwrap(), vec!["x"]);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.completed(), 1);
    }

    #[test]
    fn enqueue_after_provide_runs_immediately_once() {
        let queue = DeferredQueue::new(ServiceLocator::shared());
        queue.locator().provide(PHYSICS, "x");

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let status = queue.enqueue_until_ready(PHYSICS, move |provider| {
            sink.lock().unwrap().push(provider);
        });

        assert_eq!(status, DeferredStatus::Ran);
        assert_eq!(*calls.lock().unwrap(), vec!["x"]);

        queue.locator().provide(PHYSICS, "y");
        assert_eq!(*calls.lock().unwrap(), vec!["x"]);
    }

    #[test]
    fn clones_share_counters() {
        let queue = DeferredQueue::new(ServiceLocator::shared());
        let other = queue.clone();

        other.enqueue_until_ready(PHYSICS, |_| {});
        assert_eq!(queue.pending(), 1);

        queue.locator().provide(PHYSICS, "ready");
        assert_eq!(other.completed(), 1);
    }

    #[test]
    fn discarded_operations_stop_counting_as_pending() {
        let queue = DeferredQueue::new(ServiceLocator::shared());
        queue.enqueue_until_ready(PHYSICS, |_| {});
        queue.enqueue_until_ready(PHYSICS, |_| {});
        assert_eq!(queue.pending(), 2);

        queue.locator().clear();

        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.completed(), 0);
        assert_eq!(queue.dropped(), 2);
    }

    #[test]
    fn mistyped_provider_discards_the_operation() {
        let queue = DeferredQueue::new(ServiceLocator::shared());
        let ran = Arc::new(Mutex::new(false));

        let flag = Arc::clone(&ran);
        queue.enqueue_until_ready(PHYSICS, move |_| *flag.lock().unwrap() = true);
        queue.locator().provide(ServiceKey::<u32>::new("physics"), 9);

        assert!(!*ran.lock().unwrap());
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.dropped(), 1);
    }
}
