//! Input bindings.

use strum::{Display, EnumString};

/// How an action is triggered by the input decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TriggerKind {
    /// A discrete gesture recognized as a shape (circle, zig-zag, ...).
    /// Several pages may bind the same shape; the open page decides.
    Shape,
    /// A press-and-hold key, usually channel-capable.
    HoldKey,
}

/// Binding of an action to a trigger code emitted by the input decoder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trigger {
    pub kind: TriggerKind,
    pub code: String,
}

impl Trigger {
    pub fn shape(code: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::Shape,
            code: code.into(),
        }
    }

    pub fn hold_key(code: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::HoldKey,
            code: code.into(),
        }
    }
}
