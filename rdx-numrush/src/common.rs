//! Contains common, primitive types shared across the engine.
//!
//! This module defines the identifier types used to tell sessions and timers
//! apart, plus the normalized `Position` of a target inside the play frame.
//! Using distinct types keeps a stale session id from being mixed up with a
//! timer key or a raw counter.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a pending deferred timer.
    ///
    /// Keys are generational: once a timer is cancelled or fired its key is
    /// never valid again, so a late cancel is a harmless no-op.
    pub struct TimerId;
}

/// Identifies one play-through of the game.
///
/// Every call to `start()` hands out the next id. Anything scheduled on behalf
/// of a session (clock ticks, deferred transitions) carries the id it was
/// created under and is dropped if it no longer matches the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Returns the id that follows this one.
    pub fn next(self) -> Self {
        SessionId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A target's top-left corner as fractions of the frame's width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rounds a seconds value to one decimal place.
///
/// Countdowns are stored pre-rounded so repeated fixed-step subtraction never
/// accumulates into values like `2.6999999`.
#[inline]
pub fn round_tenths(secs: f64) -> f64 {
    (secs * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_advance() {
        let id = SessionId::default();
        assert_eq!(id.next(), SessionId(1));
        assert_eq!(id.next().next(), SessionId(2));
    }

    #[test]
    fn round_tenths_removes_float_noise() {
        assert_eq!(round_tenths(3.0 - 0.1 - 0.1 - 0.1), 2.7);
        assert_eq!(round_tenths(0.04), 0.0);
        assert_eq!(round_tenths(0.05), 0.1);
    }
}
