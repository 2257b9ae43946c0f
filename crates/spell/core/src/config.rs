/// Casting configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastConfig {
    /// Interval at which presentation layers are expected to sample channel
    /// progress. The state machine itself never depends on it.
    pub channel_tick_seconds: f64,
}

impl CastConfig {
    // ===== compile-time limits =====
    /// Highest page index the catalog will hand out or accept.
    pub const MAX_PAGES: u32 = 64;
    /// Maximum number of derived fields a channel may declare.
    pub const MAX_CHANNEL_CURVES: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CHANNEL_TICK_SECONDS: f64 = 0.05;

    pub fn new() -> Self {
        Self {
            channel_tick_seconds: Self::DEFAULT_CHANNEL_TICK_SECONDS,
        }
    }

    pub fn with_channel_tick_seconds(channel_tick_seconds: f64) -> Self {
        Self {
            channel_tick_seconds,
        }
    }
}

impl Default for CastConfig {
    fn default() -> Self {
        Self::new()
    }
}
