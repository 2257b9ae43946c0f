use std::collections::HashMap;
use std::sync::Arc;

use spell_core::{ActionCatalog, DeferredQueue, ServiceLocator};
use tracing::info;

use super::CastSession;
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::events::EventBus;
use crate::replication::ReplicationBridge;

/// Builder for [`CastSession`].
///
/// The catalog is required. The locator and event bus default to fresh
/// instances; pass shared ones when collaborators or subscribers are set up
/// before the session.
pub struct SessionBuilder {
    config: RuntimeConfig,
    catalog: Option<ActionCatalog>,
    locator: Option<Arc<ServiceLocator>>,
    events: Option<EventBus>,
}

impl SessionBuilder {
    pub(super) fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
            locator: None,
            events: None,
        }
    }

    /// Override runtime configuration
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the actions available in this session (required)
    #[must_use]
    pub fn catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn locator(mut self, locator: Arc<ServiceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<CastSession> {
        let catalog = self.catalog.ok_or(RuntimeError::MissingCatalog)?;
        if catalog.is_empty() {
            return Err(RuntimeError::EmptyCatalog);
        }

        let locator = self.locator.unwrap_or_else(ServiceLocator::shared);
        let events = self
            .events
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let open_page = catalog.iter().filter_map(|action| action.page()).min();

        info!(
            target: "spell::session",
            actions = catalog.len(),
            slots = catalog.total_slots(),
            peer = ?self.config.peer_id,
            clamp_remote = self.config.replication.clamp_remote_payloads,
            "Cast session ready"
        );

        Ok(CastSession {
            bridge: ReplicationBridge::new(self.config.replication.clone()),
            services: DeferredQueue::new(locator),
            config: self.config,
            catalog,
            events,
            open_page,
            held: HashMap::new(),
        })
    }
}
