//! Error taxonomy for the engine.
//!
//! Wrong or stale click values are not errors: they are ordinary game input
//! and end the session. Errors here only ever reject an operation outright,
//! leaving the session exactly as it was.

use crate::game::Phase;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A point count outside `1..=MAX_POINT_COUNT` was requested.
    #[error(
        "invalid configuration: point count must be between 1 and {max} (got {point_count})",
        max = crate::config::MAX_POINT_COUNT
    )]
    InvalidConfig { point_count: u32 },

    /// The operation is not permitted in the session's current phase.
    #[error("`{operation}` is not allowed while the game is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },

    /// The engine's dispatcher has shut down and can no longer take commands.
    #[error("the engine has stopped")]
    EngineStopped,
}
