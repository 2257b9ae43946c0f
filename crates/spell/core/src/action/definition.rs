//! Action definitions and the cast state machine.
//!
//! # States
//!
//! ```text
//!            cast_down (ready)             cast_up / timeout / dispose
//!   Idle ───────────────────────▶ Active ─────────────────────────────▶ Idle
//!    │  cast_down (cooling down)                                        ▲
//!    └──────────── no-op ───────────────────────────────────────────────┘
//! ```
//!
//! The cooldown gate applies only to local casts. Remote replays skip it and
//! never touch `last_cast` or `key_down`, so a peer's casts can never be
//! throttled by local state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::behavior::{ActionBehavior, NoopBehavior};
use super::channel::{ChannelCurve, ChannelSession, ChannelSpec};
use super::context::{CastContext, CastSummary, ReleaseFlags};
use super::error::{CastRejection, DefinitionError};
use super::trigger::Trigger;
use crate::config::CastConfig;
use crate::error::SpellError;
use crate::services::DeferredQueue;
use crate::types::{ActionId, ActorId, Phase, Timestamp};

/// Outcome of replaying a peer's cast.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteReplay {
    Started,
    Released(CastSummary),
}

/// One castable action: identity, timing rules, behavior, and live cast state.
///
/// Created once at catalog setup and mutated on every cast for the rest of
/// the session.
pub struct ActionDefinition {
    id: ActionId,
    trigger: Trigger,
    page: Option<u32>,
    cooldown_seconds: f64,
    channel: Option<ChannelSpec>,
    behavior: Arc<dyn ActionBehavior>,

    last_cast: Option<Timestamp>,
    key_down: bool,
    /// Open channels, at most one per actor.
    sessions: HashMap<ActorId, ChannelSession>,
}

impl ActionDefinition {
    pub fn builder(id: impl Into<ActionId>, trigger: Trigger) -> ActionDefinitionBuilder {
        ActionDefinitionBuilder::new(id.into(), trigger)
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub(crate) fn assign_page(&mut self, page: u32) {
        self.page = Some(page);
    }

    pub fn cooldown_seconds(&self) -> f64 {
        self.cooldown_seconds
    }

    pub fn channel(&self) -> Option<&ChannelSpec> {
        self.channel.as_ref()
    }

    pub fn channel_max_seconds(&self) -> Option<f64> {
        self.channel.as_ref().map(ChannelSpec::max_seconds)
    }

    pub fn is_channel_capable(&self) -> bool {
        self.channel.is_some()
    }

    pub fn last_cast(&self) -> Option<Timestamp> {
        self.last_cast
    }

    pub fn is_key_down(&self) -> bool {
        self.key_down
    }

    pub fn session(&self, actor: ActorId) -> Option<&ChannelSession> {
        self.sessions.get(&actor)
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Open channel sessions, in no particular order.
    pub fn sessions(&self) -> impl Iterator<Item = &ChannelSession> + '_ {
        self.sessions.values()
    }

    // ========================================================================
    // Cooldown
    // ========================================================================

    /// True if a local cast_down at `now` would pass the cooldown gate.
    pub fn is_ready(&self, now: Timestamp) -> bool {
        if self.cooldown_seconds <= 0.0 {
            return true;
        }
        match self.last_cast {
            Some(last) => now.since(last) >= self.cooldown_seconds,
            None => true,
        }
    }

    pub fn cooldown_remaining(&self, now: Timestamp) -> f64 {
        if self.is_ready(now) {
            return 0.0;
        }
        self.last_cast
            .map_or(0.0, |last| self.cooldown_seconds - now.since(last))
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Idle → Active. Returns false (and does nothing) if the cast is rejected.
    pub fn cast_down(
        &mut self,
        cast: &CastContext,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> bool {
        match self.try_cast_down(cast, now, services) {
            Ok(()) => true,
            Err(rejection) => {
                trace!(
                    target: "spell::cast",
                    action = %self.id,
                    code = rejection.error_code(),
                    %rejection,
                    "cast_down ignored"
                );
                false
            }
        }
    }

    /// Idle → Active, reporting why a rejected cast did nothing.
    ///
    /// Local casts must be idle and off cooldown; they stamp `last_cast` and
    /// set `key_down`. Remote casts always start and touch neither.
    pub fn try_cast_down(
        &mut self,
        cast: &CastContext,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> Result<(), CastRejection> {
        if !cast.is_remote {
            if self.key_down {
                return Err(CastRejection::AlreadyActive);
            }
            if !self.is_ready(now) {
                return Err(CastRejection::OnCooldown {
                    remaining: self.cooldown_remaining(now),
                });
            }
            self.last_cast = Some(now);
            self.key_down = true;
        }

        // A peer pressed again without us seeing its release: close the old
        // channel first so its stop hook retires what it spawned.
        if let Some(stale) = self.sessions.remove(&cast.actor) {
            debug!(
                target: "spell::cast",
                action = %self.id,
                actor = %cast.actor,
                stale_start = stale.start.as_secs(),
                "Releasing stale channel session"
            );
            self.release(
                &owner_context(stale.actor),
                Some(stale),
                now,
                ReleaseFlags::DISPOSED,
                services,
            );
        }

        let mut session = self
            .channel
            .as_ref()
            .map(|_| ChannelSession::new(cast.actor, now));

        self.behavior.on_start(cast, session.as_mut(), services);

        if let Some(session) = session {
            self.sessions.insert(cast.actor, session);
        }

        debug!(
            target: "spell::cast",
            action = %self.id,
            actor = %cast.actor,
            remote = cast.is_remote,
            at = now.as_secs(),
            "Cast started"
        );
        Ok(())
    }

    /// Active → Idle. Returns `None` for a local release with no matching
    /// press; never panics.
    pub fn cast_up(
        &mut self,
        cast: &CastContext,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> Option<CastSummary> {
        match self.try_cast_up(cast, now, services) {
            Ok(summary) => Some(summary),
            Err(rejection) => {
                trace!(
                    target: "spell::cast",
                    action = %self.id,
                    code = rejection.error_code(),
                    %rejection,
                    "cast_up ignored"
                );
                None
            }
        }
    }

    /// Active → Idle, reporting why a rejected release did nothing.
    ///
    /// Remote releases always run: the payload computed by the originating
    /// peer is carried into the summary verbatim.
    pub fn try_cast_up(
        &mut self,
        cast: &CastContext,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> Result<CastSummary, CastRejection> {
        if !cast.is_remote {
            if !self.key_down {
                return Err(CastRejection::NotActive);
            }
            self.key_down = false;
        }

        let session = self.sessions.remove(&cast.actor);
        Ok(self.release(cast, session, now, ReleaseFlags::empty(), services))
    }

    /// Replays a peer's cast. `cast` must be a remote context built from the
    /// peer's message.
    pub fn remote_cast(
        &mut self,
        phase: Phase,
        cast: &CastContext,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> RemoteReplay {
        debug_assert!(cast.is_remote, "remote_cast requires a remote context");

        match phase {
            Phase::Down => {
                // Remote casts bypass every local gate, so this cannot fail.
                let _ = self.try_cast_down(cast, now, services);
                RemoteReplay::Started
            }
            Phase::Up => {
                let session = self.sessions.remove(&cast.actor);
                RemoteReplay::Released(self.release(
                    cast,
                    session,
                    now,
                    ReleaseFlags::empty(),
                    services,
                ))
            }
        }
    }

    // ========================================================================
    // Channel timeout and disposal
    // ========================================================================

    /// When the local channel forces a release, if one is open.
    pub fn channel_deadline(&self) -> Option<Timestamp> {
        let spec = self.channel.as_ref()?;
        let session = self.sessions.get(&ActorId::LOCAL)?;
        Some(session.start.offset(spec.max_seconds()))
    }

    /// Releases the local channel if it has reached its maximum duration.
    ///
    /// Behaves exactly like cast_up and fires at most once per channel: the
    /// session is closed and `key_down` cleared, so a later key release is a
    /// no-op. Remote channels are closed by their owner's release message,
    /// never by a local timer.
    pub fn expire_channel(
        &mut self,
        cast: &CastContext,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> Option<CastSummary> {
        let deadline = self.channel_deadline()?;
        if now < deadline {
            return None;
        }

        let session = self.sessions.remove(&ActorId::LOCAL)?;
        self.key_down = false;
        Some(self.release(cast, Some(session), now, ReleaseFlags::TIMED_OUT, services))
    }

    /// Force-releases every open cast (local and remote), running each
    /// stop hook once. Summaries are flagged `DISPOSED` and must not be
    /// replicated.
    pub fn dispose(&mut self, now: Timestamp, services: &DeferredQueue) -> Vec<CastSummary> {
        let mut sessions: Vec<ChannelSession> = self.sessions.drain().map(|(_, s)| s).collect();
        sessions.sort_by_key(|session| session.actor);

        let local_was_held = std::mem::take(&mut self.key_down);
        let mut released = Vec::with_capacity(sessions.len() + 1);

        for session in sessions {
            released.push(self.release(
                &owner_context(session.actor),
                Some(session),
                now,
                ReleaseFlags::DISPOSED,
                services,
            ));
        }

        let local_released = released.iter().any(|summary| summary.actor.is_local());
        if local_was_held && !local_released {
            released.push(self.release(
                &CastContext::local(),
                None,
                now,
                ReleaseFlags::DISPOSED,
                services,
            ));
        }

        released
    }

    /// Current channel progress for `actor`, for renderers sampling on their
    /// own schedule.
    pub fn channel_progress(&self, actor: ActorId, now: Timestamp) -> Option<f64> {
        let spec = self.channel.as_ref()?;
        let session = self.sessions.get(&actor)?;
        Some(spec.progress(session.elapsed(now)))
    }

    fn release(
        &self,
        cast: &CastContext,
        session: Option<ChannelSession>,
        now: Timestamp,
        mut flags: ReleaseFlags,
        services: &DeferredQueue,
    ) -> CastSummary {
        let held_seconds = session.as_ref().map(|session| session.elapsed(now));

        let channel = if cast.is_remote {
            flags |= ReleaseFlags::REMOTE;
            cast.payload.clone()
        } else {
            self.channel
                .as_ref()
                .map(|spec| spec.payload_after(held_seconds.unwrap_or(0.0)))
        };
        if channel.is_some() {
            flags |= ReleaseFlags::CHANNELED;
        }

        let summary = CastSummary {
            action_id: self.id.clone(),
            actor: cast.actor,
            held_seconds,
            channel,
            flags,
        };

        self.behavior
            .on_stop(cast, &summary, session.as_ref(), services);

        debug!(
            target: "spell::cast",
            action = %self.id,
            actor = %cast.actor,
            progress = ?summary.progress(),
            flags = ?summary.flags,
            "Cast released"
        );
        summary
    }
}

/// Context for force-releasing a session owned by `actor`.
fn owner_context(actor: ActorId) -> CastContext {
    if actor.is_local() {
        CastContext::local()
    } else {
        CastContext::remote(actor)
    }
}

impl fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("id", &self.id)
            .field("trigger", &self.trigger)
            .field("page", &self.page)
            .field("cooldown_seconds", &self.cooldown_seconds)
            .field("channel", &self.channel)
            .field("last_cast", &self.last_cast)
            .field("key_down", &self.key_down)
            .field("open_sessions", &self.sessions.len())
            .finish()
    }
}

/// Validating builder for [`ActionDefinition`].
pub struct ActionDefinitionBuilder {
    id: ActionId,
    trigger: Trigger,
    page: Option<u32>,
    cooldown_seconds: f64,
    channel: Option<(f64, Vec<ChannelCurve>)>,
    behavior: Arc<dyn ActionBehavior>,
}

impl ActionDefinitionBuilder {
    fn new(id: ActionId, trigger: Trigger) -> Self {
        Self {
            id,
            trigger,
            page: None,
            cooldown_seconds: 0.0,
            channel: None,
            behavior: Arc::new(NoopBehavior),
        }
    }

    /// Pins the action to a spellbook page. Unpinned actions get the next
    /// free page when registered.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn cooldown(mut self, seconds: f64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    /// Makes the action channel-capable.
    #[must_use]
    pub fn channel(mut self, max_seconds: f64, curves: Vec<ChannelCurve>) -> Self {
        self.channel = Some((max_seconds, curves));
        self
    }

    #[must_use]
    pub fn behavior(self, behavior: impl ActionBehavior + 'static) -> Self {
        self.shared_behavior(Arc::new(behavior))
    }

    #[must_use]
    pub fn shared_behavior(mut self, behavior: Arc<dyn ActionBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn build(self) -> Result<ActionDefinition, DefinitionError> {
        if self.id.as_str().is_empty() {
            return Err(DefinitionError::EmptyId);
        }
        if !self.cooldown_seconds.is_finite() || self.cooldown_seconds < 0.0 {
            return Err(DefinitionError::InvalidCooldown(self.cooldown_seconds));
        }
        if let Some(page) = self.page
            && page >= CastConfig::MAX_PAGES
        {
            return Err(DefinitionError::PageOutOfRange {
                page,
                limit: CastConfig::MAX_PAGES - 1,
            });
        }

        let channel = self
            .channel
            .map(|(max_seconds, curves)| ChannelSpec::new(max_seconds, curves))
            .transpose()?;

        Ok(ActionDefinition {
            id: self.id,
            trigger: self.trigger,
            page: self.page,
            cooldown_seconds: self.cooldown_seconds,
            channel,
            behavior: self.behavior,
            last_cast: None,
            key_down: false,
            sessions: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ChannelPayload, Easing};
    use crate::services::ServiceLocator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl ActionBehavior for Arc<Counting> {
        fn on_start(&self, _: &CastContext, _: Option<&mut ChannelSession>, _: &DeferredQueue) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stop(
            &self,
            _: &CastContext,
            _: &CastSummary,
            _: Option<&ChannelSession>,
            _: &DeferredQueue,
        ) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn services() -> DeferredQueue {
        DeferredQueue::new(ServiceLocator::shared())
    }

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn zoltraak(counter: &Arc<Counting>) -> ActionDefinition {
        ActionDefinition::builder("zoltraak", Trigger::hold_key("KeyZ"))
            .channel(3.0, vec![ChannelCurve::new("damage", 1.0, 10.0, Easing::Cubic)])
            .behavior(Arc::clone(counter))
            .build()
            .unwrap()
    }

    #[test]
    fn cooldown_allows_one_cast_per_window() {
        let services = services();
        let mut action = ActionDefinition::builder("bolt", Trigger::shape("line"))
            .cooldown(2.0)
            .build()
            .unwrap();
        let local = CastContext::local();

        assert!(action.cast_down(&local, at(0.0), &services));
        assert!(action.cast_up(&local, at(0.1), &services).is_some());
        assert!(!action.cast_down(&local, at(1.9), &services));
        assert_eq!(
            action.try_cast_down(&local, at(1.5), &services),
            Err(CastRejection::OnCooldown { remaining: 0.5 })
        );
        assert!(action.cast_down(&local, at(2.0), &services));
    }

    #[test]
    fn cast_up_without_cast_down_is_a_no_op() {
        let services = services();
        let counter = Arc::new(Counting::default());
        let mut action = zoltraak(&counter);

        assert_eq!(
            action.try_cast_up(&CastContext::local(), at(1.0), &services),
            Err(CastRejection::NotActive)
        );
        assert_eq!(counter.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn second_local_press_while_held_is_rejected() {
        let services = services();
        let counter = Arc::new(Counting::default());
        let mut action = zoltraak(&counter);
        let local = CastContext::local();

        assert!(action.cast_down(&local, at(0.0), &services));
        assert_eq!(
            action.try_cast_down(&local, at(0.5), &services),
            Err(CastRejection::AlreadyActive)
        );
        assert_eq!(counter.starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remote_casts_ignore_local_cooldown() {
        let services = services();
        let counter = Arc::new(Counting::default());
        let mut action = ActionDefinition::builder("fireball", Trigger::shape("circle"))
            .cooldown(5.0)
            .behavior(Arc::clone(&counter))
            .build()
            .unwrap();
        let peer = CastContext::remote(ActorId(7));

        assert!(action.cast_down(&CastContext::local(), at(0.0), &services));
        assert_eq!(action.remote_cast(Phase::Down, &peer, at(0.1), &services), RemoteReplay::Started);
        assert_eq!(action.remote_cast(Phase::Down, &peer, at(0.2), &services), RemoteReplay::Started);

        assert_eq!(counter.starts.load(Ordering::SeqCst), 3);
        assert_eq!(action.last_cast(), Some(at(0.0)));
        assert!(action.is_key_down());
    }

    #[test]
    fn remote_release_uses_payload_verbatim() {
        let services = services();
        let counter = Arc::new(Counting::default());
        let mut action = zoltraak(&counter);
        let payload = ChannelPayload {
            progress: 0.25,
            derived: [("damage".to_string(), 1.140625)].into_iter().collect(),
        };
        let peer = CastContext::remote(ActorId(3)).with_payload(payload.clone());

        action.remote_cast(Phase::Down, &peer, at(10.0), &services);
        // Local clock says 2.9s of hold; the peer's value wins.
        let RemoteReplay::Released(summary) =
            action.remote_cast(Phase::Up, &peer, at(12.9), &services)
        else {
            panic!("expected a release");
        };

        assert_eq!(summary.channel, Some(payload));
        assert!(summary.flags.contains(ReleaseFlags::REMOTE | ReleaseFlags::CHANNELED));
        assert!(!summary.is_replicable());
        assert_eq!(action.open_sessions(), 0);
    }

    #[test]
    fn channel_times_out_exactly_once() {
        let services = services();
        let counter = Arc::new(Counting::default());
        let mut action = zoltraak(&counter);
        let local = CastContext::local();

        action.cast_down(&local, at(1.0), &services);
        assert_eq!(action.channel_deadline(), Some(at(4.0)));
        assert!(action.expire_channel(&local, at(3.9), &services).is_none());

        let summary = action.expire_channel(&local, at(4.2), &services).unwrap();
        assert_eq!(summary.progress(), Some(1.0));
        assert_eq!(summary.derived("damage"), Some(10.0));
        assert!(summary.flags.contains(ReleaseFlags::TIMED_OUT));

        assert!(action.expire_channel(&local, at(5.0), &services).is_none());
        assert!(action.cast_up(&local, at(5.0), &services).is_none());
        assert_eq!(counter.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispose_releases_every_open_cast_without_replication() {
        let services = services();
        let counter = Arc::new(Counting::default());
        let mut action = zoltraak(&counter);

        action.cast_down(&CastContext::local(), at(0.0), &services);
        action.remote_cast(Phase::Down, &CastContext::remote(ActorId(2)), at(0.0), &services);

        let released = action.dispose(at(1.0), &services);
        assert_eq!(released.len(), 2);
        assert!(released.iter().all(|s| s.flags.contains(ReleaseFlags::DISPOSED)));
        assert!(released.iter().all(|s| !s.is_replicable()));
        assert_eq!(counter.stops.load(Ordering::SeqCst), 2);
        assert!(!action.is_key_down());
        assert_eq!(action.open_sessions(), 0);
    }

    #[test]
    fn builder_rejects_invalid_setup() {
        assert_eq!(
            ActionDefinition::builder("", Trigger::shape("x")).build().unwrap_err(),
            DefinitionError::EmptyId
        );
        assert_eq!(
            ActionDefinition::builder("a", Trigger::shape("x"))
                .cooldown(-1.0)
                .build()
                .unwrap_err(),
            DefinitionError::InvalidCooldown(-1.0)
        );
        assert!(matches!(
            ActionDefinition::builder("a", Trigger::shape("x"))
                .page(CastConfig::MAX_PAGES)
                .build(),
            Err(DefinitionError::PageOutOfRange { .. })
        ));
    }
}
