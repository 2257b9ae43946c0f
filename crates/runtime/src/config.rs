//! Runtime configuration.
use std::env;

use spell_core::{ActorId, CastConfig};

/// Settings for one cast session.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// This node's id on the network. Inbound messages claiming to come from
    /// it are dropped as loopback.
    pub peer_id: Option<ActorId>,
    pub cast: CastConfig,
    pub replication: ReplicationConfig,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            peer_id: None,
            cast: CastConfig::default(),
            replication: ReplicationConfig::default(),
            event_buffer_size: 100,
        }
    }
}

impl RuntimeConfig {
    /// Construct runtime configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SPELL_PEER_ID` - This node's peer id (default: unset)
    /// - `SPELL_CHANNEL_TICK_MS` - Channel visual tick in milliseconds (default: 50)
    /// - `SPELL_CLAMP_REMOTE` - Clamp inbound channel payloads (default: true)
    /// - `SPELL_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(peer) = read_env::<u64>("SPELL_PEER_ID") {
            config.peer_id = Some(ActorId(peer));
        }
        if let Some(ms) = read_env::<u64>("SPELL_CHANNEL_TICK_MS") {
            config.cast = CastConfig::with_channel_tick_seconds(ms.max(1) as f64 / 1000.0);
        }
        if let Some(clamp) = read_env::<bool>("SPELL_CLAMP_REMOTE") {
            config.replication.clamp_remote_payloads = clamp;
        }
        if let Some(buffer) = read_env::<usize>("SPELL_EVENT_BUFFER") {
            config.event_buffer_size = buffer.max(1);
        }

        config
    }
}

/// How inbound casts are treated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Bound peer-computed channel values to the local curves. Values are
    /// still taken from the peer, never re-derived.
    pub clamp_remote_payloads: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            clamp_remote_payloads: true,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
