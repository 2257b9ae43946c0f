//! Primitive value types shared by every layer of the casting core.

use core::fmt;

use strum::{Display, EnumString};

/// Seconds since the start of the session, as sampled by the driver clock.
///
/// The core never reads a clock itself; callers pass `now` into every
/// transition so tests can drive time explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub const ZERO: Self = Self(0.0);

    pub const fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed since `earlier`, never negative.
    pub fn since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn offset(self, secs: f64) -> Timestamp {
        Timestamp(self.0 + secs)
    }
}

/// Participant in a session. The local player is always [`ActorId::LOCAL`];
/// remote peers are numbered by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActorId(pub u64);

impl ActorId {
    pub const LOCAL: Self = Self(0);

    pub const fn is_local(self) -> bool {
        self.0 == Self::LOCAL.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_local() {
            write!(f, "local")
        } else {
            write!(f, "peer#{}", self.0)
        }
    }
}

/// Unique, human-readable action identifier ("fireball", "zoltraak").
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl core::borrow::Borrow<str> for ActionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Edge of a cast: key/gesture pressed or released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Phase {
    Down,
    Up,
}

/// World-space vector used for origins, directions, and impulses.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, -1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Unit vector in the same direction, or `None` for a zero-length input.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len > f64::EPSILON).then(|| self.scale(1.0 / len))
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Opaque id of an effect created by an external spawner.
///
/// The core only stores the id; the spawner owns the effect itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectHandle(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_never_goes_negative() {
        let later = Timestamp::from_secs(2.0);
        let earlier = Timestamp::from_secs(5.0);
        assert_eq!(later.since(earlier), 0.0);
        assert_eq!(earlier.since(later), 3.0);
    }

    #[test]
    fn phase_parses_lowercase() {
        assert_eq!("down".parse::<Phase>().unwrap(), Phase::Down);
        assert_eq!(Phase::Up.to_string(), "up");
        assert!("DOWN".parse::<Phase>().is_err());
    }

    #[test]
    fn normalized_rejects_zero_vector() {
        assert!(Vec3::ZERO.normalized().is_none());
        let unit = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((unit.length() - 1.0).abs() < 1e-12);
    }
}
