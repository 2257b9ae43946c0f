//! Wire representation of a replicated cast.

use serde::{Deserialize, Serialize};
use spell_core::{ActionId, ChannelPayload, Phase, Vec3};

/// One edge of a cast, as exchanged between peers.
///
/// Field names are camelCase and absent values are sent as `null` so every
/// peer in a session sees the same shape:
///
/// ```json
/// {"actionId":"zoltraak","phase":"up","originPosition":null,"direction":null,
///  "targetId":null,"channelPayload":{"progress":0.5,"derived":{"damage":2.125}}}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationMessage {
    pub action_id: ActionId,
    pub phase: Phase,
    pub origin_position: Option<Vec3>,
    pub direction: Option<Vec3>,
    pub target_id: Option<String>,
    /// Computed once by the casting peer, only on `up`.
    pub channel_payload: Option<ChannelPayload>,
}

impl ReplicationMessage {
    /// Every number in the message is finite.
    pub fn is_finite(&self) -> bool {
        self.origin_position.is_none_or(Vec3::is_finite)
            && self.direction.is_none_or(Vec3::is_finite)
            && self
                .channel_payload
                .as_ref()
                .is_none_or(ChannelPayload::is_finite)
    }
}
