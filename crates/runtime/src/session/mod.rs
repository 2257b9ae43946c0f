//! Cast session: the dispatcher between input, the state machines, and peers.
//!
//! A [`CastSession`] owns the catalog for the lifetime of a realtime session.
//! Every handler runs a transition to completion and returns the outbound
//! messages it produced; the caller forwards them to the transport.
//!
//! ```text
//! InputEvent ──▶ handle_input ──▶ ActionDefinition ──▶ ReplicationMessage ──▶ peers
//! peers ──▶ handle_remote ──▶ ReplicationBridge::decode ──▶ remote_cast
//! timer ──▶ poll_timeouts ──▶ expire_channel ──▶ ReplicationMessage ──▶ peers
//! ```

mod builder;
mod input;

use std::collections::HashMap;

use spell_core::{
    ActionCatalog, ActionId, ActorId, CAMERA, CastContext, CastSummary, DeferredQueue, Phase,
    RemoteReplay, SpellError, Timestamp,
};
use tracing::{debug, info, trace, warn};

use crate::config::RuntimeConfig;
use crate::events::{CastEvent, EventBus, ReplicationEvent};
use crate::replication::{ReplicationBridge, ReplicationError, ReplicationMessage};

pub use builder::SessionBuilder;
pub use input::InputEvent;

/// Channel progress of one open session, for renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSample {
    pub action_id: ActionId,
    pub actor: ActorId,
    pub progress: f64,
}

pub struct CastSession {
    config: RuntimeConfig,
    catalog: ActionCatalog,
    services: DeferredQueue,
    bridge: ReplicationBridge,
    events: EventBus,
    open_page: Option<u32>,
    /// Trigger codes currently held down, with the action each press
    /// resolved to. A release goes to the same action even if the open page
    /// changed in between. A code maps to at most one action until released.
    held: HashMap<String, ActionId>,
}

impl CastSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn services(&self) -> &DeferredQueue {
        &self.services
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn open_page(&self) -> Option<u32> {
        self.open_page
    }

    /// Turns the spellbook to `page`. Returns false if no action lives there.
    pub fn set_open_page(&mut self, page: u32) -> bool {
        if self.catalog.by_page(page).is_none() {
            debug!(target: "spell::session", page, "Ignoring empty page");
            return false;
        }
        self.open_page = Some(page);
        true
    }

    // ========================================================================
    // Local input
    // ========================================================================

    /// Runs a local press or release. Returns the message to replicate, if
    /// the edge did anything.
    pub fn handle_input(
        &mut self,
        input: &InputEvent,
        now: Timestamp,
    ) -> Option<ReplicationMessage> {
        match input.phase {
            Phase::Down => self.press(&input.trigger_code, now),
            Phase::Up => self.release(&input.trigger_code, now),
        }
    }

    fn press(&mut self, code: &str, now: Timestamp) -> Option<ReplicationMessage> {
        // Repeats of a held code (key auto-repeat, or a page turn mid-hold)
        // must not rebind it, or the first action could never be released.
        if let Some(held) = self.held.get(code) {
            trace!(
                target: "spell::session",
                trigger = code,
                action = %held,
                "Trigger already held"
            );
            return None;
        }

        let Some(action_id) = self.resolve(code) else {
            trace!(target: "spell::session", trigger = code, "No action bound to trigger");
            return None;
        };

        let cast = local_context(&self.services);
        let action = self.catalog.get_mut(action_id.as_str())?;

        match action.try_cast_down(&cast, now, &self.services) {
            Ok(()) => {
                self.held.insert(code.to_owned(), action_id.clone());
                self.events.publish(CastEvent::Started {
                    action_id: action_id.clone(),
                    actor: cast.actor,
                    at: now,
                });
                let message = self.bridge.encode(&action_id, &cast, None, Phase::Down);
                self.sent(message)
            }
            Err(rejection) => {
                self.events.publish(CastEvent::Rejected {
                    action_id,
                    code: rejection.error_code(),
                });
                None
            }
        }
    }

    fn release(&mut self, code: &str, now: Timestamp) -> Option<ReplicationMessage> {
        let action_id = self.held.remove(code).or_else(|| self.resolve(code))?;

        let cast = local_context(&self.services);
        let action = self.catalog.get_mut(action_id.as_str())?;

        match action.try_cast_up(&cast, now, &self.services) {
            Ok(summary) => {
                let message = self
                    .bridge
                    .encode(&action_id, &cast, Some(&summary), Phase::Up);
                self.events.publish(CastEvent::Released { summary });
                self.sent(message)
            }
            Err(rejection) => {
                trace!(
                    target: "spell::session",
                    action = %action_id,
                    code = rejection.error_code(),
                    "Release without a matching press"
                );
                self.events.publish(CastEvent::Rejected {
                    action_id,
                    code: rejection.error_code(),
                });
                None
            }
        }
    }

    /// Picks the action a trigger code refers to: the one on the open page
    /// if several share the code, otherwise the lowest page.
    fn resolve(&self, code: &str) -> Option<ActionId> {
        let candidates = self.catalog.by_trigger_code(code);
        candidates
            .iter()
            .find(|action| self.open_page.is_some() && action.page() == self.open_page)
            .or_else(|| candidates.first())
            .map(|action| action.id().clone())
    }

    fn sent(&self, message: Option<ReplicationMessage>) -> Option<ReplicationMessage> {
        if let Some(message) = &message {
            self.events.publish(ReplicationEvent::Sent {
                message: message.clone(),
            });
        }
        message
    }

    // ========================================================================
    // Remote casts
    // ========================================================================

    /// Replays a peer's cast. Bad messages are dropped with a warning and
    /// never reach the state machine.
    pub fn handle_remote(
        &mut self,
        message: ReplicationMessage,
        sender: ActorId,
        now: Timestamp,
    ) -> Option<RemoteReplay> {
        if self.config.peer_id == Some(sender) {
            self.drop_inbound(sender, &ReplicationError::InvalidSender { sender });
            return None;
        }

        let action_id = message.action_id.clone();
        match self
            .bridge
            .decode(&mut self.catalog, message, sender, now, &self.services)
        {
            Ok(replay) => {
                self.events.publish(ReplicationEvent::Received {
                    action_id: action_id.clone(),
                    sender,
                });
                match &replay {
                    RemoteReplay::Started => self.events.publish(CastEvent::Started {
                        action_id,
                        actor: sender,
                        at: now,
                    }),
                    RemoteReplay::Released(summary) => self.events.publish(CastEvent::Released {
                        summary: summary.clone(),
                    }),
                }
                Some(replay)
            }
            Err(error) => {
                self.drop_inbound(sender, &error);
                None
            }
        }
    }

    /// [`handle_remote`](Self::handle_remote) for a raw JSON message.
    pub fn handle_remote_json(
        &mut self,
        raw: &str,
        sender: ActorId,
        now: Timestamp,
    ) -> Option<RemoteReplay> {
        match self.bridge.from_json(raw) {
            Ok(message) => self.handle_remote(message, sender, now),
            Err(error) => {
                self.drop_inbound(sender, &error);
                None
            }
        }
    }

    fn drop_inbound(&self, sender: ActorId, error: &ReplicationError) {
        let severity = error.severity();
        if severity.is_noteworthy() {
            warn!(
                target: "spell::replication",
                %sender,
                code = error.error_code(),
                severity = severity.as_str(),
                %error,
                "Dropped inbound cast"
            );
        } else {
            debug!(
                target: "spell::replication",
                %sender,
                code = error.error_code(),
                severity = severity.as_str(),
                %error,
                "Dropped inbound cast"
            );
        }
        self.events.publish(ReplicationEvent::Dropped {
            sender,
            code: error.error_code(),
            reason: error.to_string(),
        });
    }

    // ========================================================================
    // Timers and teardown
    // ========================================================================

    /// Earliest moment a local channel will force a release.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.catalog
            .iter()
            .filter_map(|action| action.channel_deadline())
            .min_by(|a, b| a.as_secs().total_cmp(&b.as_secs()))
    }

    /// Releases every local channel that reached its maximum duration and
    /// returns the resulting messages.
    pub fn poll_timeouts(&mut self, now: Timestamp) -> Vec<ReplicationMessage> {
        let cast = local_context(&self.services);
        let mut outbound = Vec::new();

        for action in self.catalog.iter_mut() {
            let Some(summary) = action.expire_channel(&cast, now, &self.services) else {
                continue;
            };
            self.held.retain(|_, held| *held != *action.id());

            debug!(
                target: "spell::session",
                action = %action.id(),
                progress = ?summary.progress(),
                "Channel reached its maximum"
            );

            if let Some(message) = self
                .bridge
                .encode(action.id(), &cast, Some(&summary), Phase::Up)
            {
                self.events.publish(ReplicationEvent::Sent {
                    message: message.clone(),
                });
                outbound.push(message);
            }
            self.events.publish(CastEvent::TimedOut { summary });
        }

        outbound
    }

    /// Force-releases every open cast, local and remote, without replicating
    /// anything. Used when leaving the session.
    pub fn dispose(&mut self, now: Timestamp) -> Vec<CastSummary> {
        let mut released = Vec::new();
        for action in self.catalog.iter_mut() {
            released.extend(action.dispose(now, &self.services));
        }
        self.held.clear();

        for summary in &released {
            self.events.publish(CastEvent::Disposed {
                summary: summary.clone(),
            });
        }
        info!(target: "spell::session", released = released.len(), "Session disposed");
        released
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    pub fn channel_progress(
        &self,
        actor: ActorId,
        action_id: &str,
        now: Timestamp,
    ) -> Option<f64> {
        self.catalog.get(action_id)?.channel_progress(actor, now)
    }

    /// Progress of every open channel, local and remote.
    pub fn active_channels(&self, now: Timestamp) -> Vec<ChannelSample> {
        let mut samples: Vec<ChannelSample> = self
            .catalog
            .iter()
            .flat_map(|action| {
                action.sessions().filter_map(move |session| {
                    Some(ChannelSample {
                        action_id: action.id().clone(),
                        actor: session.actor,
                        progress: action.channel_progress(session.actor, now)?,
                    })
                })
            })
            .collect();
        samples.sort_by(|a, b| (&a.action_id, a.actor).cmp(&(&b.action_id, b.actor)));
        samples
    }
}

/// Context for a local cast, aimed from the current camera pose when a
/// camera is available.
fn local_context(services: &DeferredQueue) -> CastContext {
    let Some(camera) = services.locator().request(CAMERA) else {
        return CastContext::local();
    };

    let pose = camera.query_camera_pose();
    let cast = CastContext::local().with_aim(pose.position, pose.direction);
    match camera.query_target() {
        Some(target) => cast.with_target(target),
        None => cast,
    }
}
