//! Decoded input consumed by the session.

use serde::{Deserialize, Serialize};
use spell_core::Phase;

/// A press or release reported by the input decoder.
///
/// Gesture and key decoding happen elsewhere; the session only sees the
/// resulting trigger code, e.g. `{"triggerCode": "KeyZ", "phase": "down"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub trigger_code: String,
    pub phase: Phase,
}

impl InputEvent {
    pub fn down(trigger_code: impl Into<String>) -> Self {
        Self {
            trigger_code: trigger_code.into(),
            phase: Phase::Down,
        }
    }

    pub fn up(trigger_code: impl Into<String>) -> Self {
        Self {
            trigger_code: trigger_code.into(),
            phase: Phase::Up,
        }
    }
}
