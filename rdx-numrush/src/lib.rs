//! # Numrush
//!
//! The game state machine and timing engine behind an ordered number-clicking
//! reaction game.
//!
//! A set of numbered targets is scattered across a frame. The player must click
//! them in ascending order; any other click ends the game. Clicked targets
//! count down and fade away, and an optional autoplay mode plays the sequence
//! on a fixed cadence.
//!
//! ## Core Concepts
//!
//! - **GameSession**: the synchronous state machine. It validates clicks,
//!   drives target countdowns and decides when a game is cleared or over.
//! - **Fixed-step clock**: every tick advances game time by the same delta, so
//!   countdowns are deterministic regardless of scheduler jitter.
//! - **Session generations**: each start hands out a new `SessionId`. Ticks and
//!   deferred timers carry the id they were created under and are dropped if
//!   it is no longer current.
//! - **Engine**: `NumrushEngine` hosts a session on a single dispatcher task
//!   and exposes the event-submission API plus a `Snapshot` for rendering.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use numrush::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = NumrushEngine::start(NumrushConfig::default())?;
//!
//!     let mut snapshots = engine.watch_snapshots();
//!     engine.configure(3).await?;
//!     engine.set_autoplay_enabled(true).await?;
//!     engine.start_game().await?;
//!
//!     let done = snapshots.wait_for(|s| s.phase.is_terminal()).await?.clone();
//!     println!("{} after {:.1}s", done.message, done.elapsed_secs);
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Numrush Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod game;
pub mod snapshot;
pub mod time;

/// A prelude module for easy importing of the most common numrush types.
pub mod prelude {
    pub use crate::common::{Position, SessionId};
    pub use crate::config::{FramePolicy, NumrushConfig};
    pub use crate::engine::NumrushEngine;
    pub use crate::error::GameError;
    pub use crate::events::{EventBus, GameEvent, SystemEvent};
    pub use crate::game::{ClickOutcome, GameSession, Phase};
    pub use crate::snapshot::{MessageTone, Snapshot, TargetView, VisualState};
}
