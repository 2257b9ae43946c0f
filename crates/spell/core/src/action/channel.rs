//! Hold-to-charge channels.
//!
//! A channel-capable action opens a [`ChannelSession`] on cast_down. On
//! release, elapsed hold time becomes `progress` in `[0, 1]` and every
//! [`ChannelCurve`] maps progress onto a derived output (damage, size, mass,
//! velocity). Curves are eased so a quick tap yields a disproportionately
//! small effect and only a sustained hold approaches the maximum.

use std::collections::{BTreeMap, HashSet};

use strum::{Display, EnumString};

use super::error::DefinitionError;
use crate::config::CastConfig;
use crate::types::{ActorId, EffectHandle, Timestamp};

/// Monotonic easing applied to channel progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Easing {
    Linear,
    #[default]
    Quadratic,
    Cubic,
}

impl Easing {
    /// Maps `progress` (clamped to `[0, 1]`) onto `[0, 1]`, non-decreasing.
    pub fn apply(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            Self::Linear => p,
            Self::Quadratic => p * p,
            Self::Cubic => p * p * p,
        }
    }
}

/// One derived output of a channel: `min + ease(progress) * (max - min)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelCurve {
    pub field: String,
    pub min: f64,
    pub max: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub easing: Easing,
}

impl ChannelCurve {
    pub fn new(field: impl Into<String>, min: f64, max: f64, easing: Easing) -> Self {
        Self {
            field: field.into(),
            min,
            max,
            easing,
        }
    }

    pub fn sample(&self, progress: f64) -> f64 {
        self.min + self.easing.apply(progress) * (self.max - self.min)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn is_monotonic(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max >= self.min
    }
}

/// Channel parameters of an action.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSpec {
    max_seconds: f64,
    curves: Vec<ChannelCurve>,
}

impl ChannelSpec {
    /// Validates and builds a channel spec.
    ///
    /// Every curve must be non-decreasing so that every derived output is a
    /// non-decreasing function of hold time.
    pub fn new(max_seconds: f64, curves: Vec<ChannelCurve>) -> Result<Self, DefinitionError> {
        if !max_seconds.is_finite() || max_seconds <= 0.0 {
            return Err(DefinitionError::InvalidChannelDuration(max_seconds));
        }
        if curves.len() > CastConfig::MAX_CHANNEL_CURVES {
            return Err(DefinitionError::TooManyCurves {
                count: curves.len(),
                limit: CastConfig::MAX_CHANNEL_CURVES,
            });
        }

        let mut seen = HashSet::new();
        for curve in &curves {
            if !curve.is_monotonic() {
                return Err(DefinitionError::DecreasingCurve {
                    field: curve.field.clone(),
                });
            }
            if !seen.insert(curve.field.as_str()) {
                return Err(DefinitionError::DuplicateCurve {
                    field: curve.field.clone(),
                });
            }
        }

        Ok(Self {
            max_seconds,
            curves,
        })
    }

    pub fn max_seconds(&self) -> f64 {
        self.max_seconds
    }

    pub fn curves(&self) -> &[ChannelCurve] {
        &self.curves
    }

    pub fn curve(&self, field: &str) -> Option<&ChannelCurve> {
        self.curves.iter().find(|curve| curve.field == field)
    }

    /// `min(1, elapsed / max_seconds)`, saturating at 1.
    pub fn progress(&self, elapsed: f64) -> f64 {
        (elapsed / self.max_seconds).clamp(0.0, 1.0)
    }

    /// Samples every curve at `progress`.
    pub fn derive(&self, progress: f64) -> BTreeMap<String, f64> {
        self.curves
            .iter()
            .map(|curve| (curve.field.clone(), curve.sample(progress)))
            .collect()
    }

    /// Progress and derived outputs after holding for `elapsed` seconds.
    pub fn payload_after(&self, elapsed: f64) -> ChannelPayload {
        let progress = self.progress(elapsed);
        ChannelPayload {
            progress,
            derived: self.derive(progress),
        }
    }

    /// Bounds a peer-supplied payload to what this channel can produce.
    ///
    /// Values are kept as sent, only clamped: progress to `[0, 1]` and each
    /// known field to its curve's `[min, max]`. Fields this channel does not
    /// declare are dropped.
    pub fn clamp_payload(&self, payload: &ChannelPayload) -> ChannelPayload {
        let derived = self
            .curves
            .iter()
            .filter_map(|curve| {
                payload
                    .derived
                    .get(&curve.field)
                    .map(|value| (curve.field.clone(), curve.clamp(*value)))
            })
            .collect();

        ChannelPayload {
            progress: payload.progress.clamp(0.0, 1.0),
            derived,
        }
    }
}

/// Channel outcome carried in a cast summary and on the wire.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelPayload {
    pub progress: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub derived: BTreeMap<String, f64>,
}

impl ChannelPayload {
    pub fn value(&self, field: &str) -> Option<f64> {
        self.derived.get(field).copied()
    }

    pub fn is_finite(&self) -> bool {
        self.progress.is_finite() && self.derived.values().all(|value| value.is_finite())
    }
}

/// A channel in progress for one actor on one action.
///
/// Exists strictly between cast_down and the release that ends it (cast_up,
/// timeout, or forced dispose). `start` is the single authoritative time
/// source; renderers sample elapsed time on their own schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSession {
    pub actor: ActorId,
    pub start: Timestamp,
    /// Effect created by the start hook, owned by the effect spawner.
    pub effect: Option<EffectHandle>,
}

impl ChannelSession {
    pub fn new(actor: ActorId, start: Timestamp) -> Self {
        Self {
            actor,
            start,
            effect: None,
        }
    }

    pub fn elapsed(&self, now: Timestamp) -> f64 {
        now.since(self.start)
    }
}
