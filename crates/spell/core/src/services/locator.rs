//! Name-keyed registry of late-bound collaborators.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use super::{DeferredStatus, ServiceError};

type Provided = Arc<dyn Any + Send + Sync>;
type Waiter = Box<dyn FnOnce(&Provided) + Send>;

/// Typed name under which a collaborator is published.
///
/// `T` is the handle callers receive, usually an `Arc<dyn Trait>`. Two keys
/// with the same name but different `T` refer to the same slot; reading it
/// with the wrong type yields [`ServiceError::TypeMismatch`].
pub struct ServiceKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceKey<T> {}

impl<T> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceKey").field(&self.name).finish()
    }
}

#[derive(Default)]
struct Registry {
    providers: HashMap<&'static str, Provided>,
    waiters: HashMap<&'static str, Vec<Waiter>>,
}

/// Registry of collaborators with synchronous lookup and one-shot readiness
/// callbacks.
///
/// # Architecture
///
/// ```text
/// ServiceLocator
/// ├── providers: name → current instance   (one writer per name)
/// └── waiters:   name → [one-shot callback] (fired in registration order)
/// ```
///
/// The internal lock is never held while a callback runs, so callbacks may
/// call back into the locator (provide other services, register waiters).
#[derive(Default)]
pub struct ServiceLocator {
    registry: Mutex<Registry>,
}

impl ServiceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a locator ready to be shared between the session and its
    /// collaborators.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `instance` under `key`.
    ///
    /// All pending waiters for the name fire in registration order and are
    /// then discarded. Providing again replaces the instance for future
    /// lookups but never re-fires a waiter that was already satisfied.
    pub fn provide<T>(&self, key: ServiceKey<T>, instance: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let provided: Provided = Arc::new(instance);

        let (waiters, replaced) = {
            let mut registry = self.lock();
            let replaced = registry
                .providers
                .insert(key.name, Arc::clone(&provided))
                .is_some();
            let waiters = registry.waiters.remove(key.name).unwrap_or_default();
            (waiters, replaced)
        };

        debug!(
            target: "spell::services",
            service = key.name,
            replaced,
            waiters = waiters.len(),
            "Service provided"
        );

        for waiter in waiters {
            waiter(&provided);
        }
    }

    /// Returns the current provider, if any. Never subscribes.
    pub fn request<T>(&self, key: ServiceKey<T>) -> Option<T>
    where
        T: Clone + 'static,
    {
        match self.try_request(key) {
            Ok(instance) => Some(instance),
            Err(error) => {
                trace!(target: "spell::services", service = key.name, %error, "Request missed");
                None
            }
        }
    }

    /// Like [`request`](Self::request) but reports why the lookup failed.
    pub fn try_request<T>(&self, key: ServiceKey<T>) -> Result<T, ServiceError>
    where
        T: Clone + 'static,
    {
        let provided = self
            .lock()
            .providers
            .get(key.name)
            .cloned()
            .ok_or(ServiceError::Unavailable { name: key.name })?;
        downcast(key.name, &provided)
    }

    /// Registers a one-shot callback for `key`.
    ///
    /// If the service is already provided the callback runs synchronously
    /// before this returns ([`DeferredStatus::Ran`]); otherwise it runs on the
    /// next `provide` ([`DeferredStatus::Queued`]). The availability check and
    /// the registration happen under one lock, so no `provide` can slip in
    /// between and leave the callback stranded.
    pub fn on_ready<T, F>(&self, key: ServiceKey<T>, callback: F) -> DeferredStatus
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let name = key.name;
        let mut registry = self.lock();

        if let Some(provided) = registry.providers.get(name).cloned() {
            drop(registry);
            deliver(name, &provided, callback);
            return DeferredStatus::Ran;
        }

        registry
            .waiters
            .entry(name)
            .or_default()
            .push(Box::new(move |provided: &Provided| {
                deliver(name, provided, callback)
            }));
        DeferredStatus::Queued
    }

    /// Returns true if something is currently provided under `name`.
    pub fn is_available(&self, name: &str) -> bool {
        self.lock().providers.contains_key(name)
    }

    /// Number of callbacks still waiting for `name`.
    pub fn pending_waiters(&self, name: &str) -> usize {
        self.lock().waiters.get(name).map_or(0, Vec::len)
    }

    /// Drops every provider and pending waiter (session teardown).
    pub fn clear(&self) {
        let mut registry = self.lock();
        let dropped_waiters: usize = registry.waiters.values().map(Vec::len).sum();
        debug!(
            target: "spell::services",
            providers = registry.providers.len(),
            dropped_waiters,
            "Clearing service locator"
        );
        registry.providers.clear();
        registry.waiters.clear();
    }
}

fn downcast<T>(name: &'static str, provided: &Provided) -> Result<T, ServiceError>
where
    T: Clone + 'static,
{
    (**provided)
        .downcast_ref::<T>()
        .cloned()
        .ok_or(ServiceError::TypeMismatch { name })
}

fn deliver<T, F>(name: &'static str, provided: &Provided, callback: F)
where
    T: Clone + 'static,
    F: FnOnce(T),
{
    match downcast::<T>(name, provided) {
        Ok(instance) => callback(instance),
        Err(error) => warn!(
            target: "spell::services",
            service = name,
            %error,
            "Dropping waiter for mistyped service"
        ),
    }
}
