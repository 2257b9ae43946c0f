//! Outbound encoding and inbound replay of casts.

use spell_core::{
    ActionCatalog, ActionId, ActorId, CastContext, CastSummary, DeferredQueue, Phase,
    RemoteReplay, Timestamp,
};
use tracing::debug;

use super::{ReplicationError, ReplicationMessage};
use crate::config::ReplicationConfig;

/// Translates between local casts and [`ReplicationMessage`]s.
///
/// Derived channel values are computed once by the casting peer and carried
/// verbatim; receivers never recompute them from their own clock. With
/// [`ReplicationConfig::clamp_remote_payloads`] on, inbound values are only
/// bounded to what the local definition could produce.
#[derive(Clone, Debug, Default)]
pub struct ReplicationBridge {
    config: ReplicationConfig,
}

impl ReplicationBridge {
    pub fn new(config: ReplicationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Builds the message for a locally initiated cast edge.
    ///
    /// Returns `None` for replays (a peer's cast is never echoed back) and
    /// for releases that must stay local, such as a forced dispose.
    pub fn encode(
        &self,
        action_id: &ActionId,
        cast: &CastContext,
        summary: Option<&CastSummary>,
        phase: Phase,
    ) -> Option<ReplicationMessage> {
        if cast.is_remote {
            return None;
        }
        if let Some(summary) = summary
            && !summary.is_replicable()
        {
            return None;
        }

        Some(ReplicationMessage {
            action_id: action_id.clone(),
            phase,
            origin_position: cast.origin,
            direction: cast.direction,
            target_id: cast.target_id.clone(),
            channel_payload: match phase {
                Phase::Down => None,
                Phase::Up => summary.and_then(|summary| summary.channel.clone()),
            },
        })
    }

    pub fn to_json(&self, message: &ReplicationMessage) -> Result<String, ReplicationError> {
        Ok(serde_json::to_string(message)?)
    }

    pub fn from_json(&self, raw: &str) -> Result<ReplicationMessage, ReplicationError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Replays `message` from `sender` on the matching action.
    ///
    /// Never touches the local cooldown or key state.
    pub fn decode(
        &self,
        catalog: &mut ActionCatalog,
        message: ReplicationMessage,
        sender: ActorId,
        now: Timestamp,
        services: &DeferredQueue,
    ) -> Result<RemoteReplay, ReplicationError> {
        let action_id = message.action_id.clone();
        let phase = message.phase;
        let cast = self.remote_context(catalog, message, sender)?;
        let action = catalog
            .get_mut(action_id.as_str())
            .ok_or_else(|| ReplicationError::UnknownAction {
                action_id: action_id.clone(),
            })?;

        debug!(
            target: "spell::replication",
            action = %action_id,
            %phase,
            %sender,
            "Replaying remote cast"
        );
        Ok(action.remote_cast(phase, &cast, now, services))
    }

    /// Validates `message` and turns it into the context of a remote cast.
    fn remote_context(
        &self,
        catalog: &ActionCatalog,
        message: ReplicationMessage,
        sender: ActorId,
    ) -> Result<CastContext, ReplicationError> {
        if sender.is_local() {
            return Err(ReplicationError::InvalidSender { sender });
        }

        let action = catalog.get(message.action_id.as_str()).ok_or_else(|| {
            ReplicationError::UnknownAction {
                action_id: message.action_id.clone(),
            }
        })?;

        if !message.is_finite() {
            return Err(ReplicationError::InvalidPayload {
                action_id: message.action_id,
                reason: "non-finite number",
            });
        }

        let payload = match (message.channel_payload, action.channel()) {
            (Some(payload), Some(spec)) if self.config.clamp_remote_payloads => {
                Some(spec.clamp_payload(&payload))
            }
            (Some(_), None) if self.config.clamp_remote_payloads => None,
            (payload, _) => payload,
        };

        Ok(CastContext {
            actor: sender,
            origin: message.origin_position,
            direction: message.direction,
            target_id: message.target_id,
            is_remote: true,
            payload,
        })
    }
}
