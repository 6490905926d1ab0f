//! Defines all public event types broadcast by the numrush engine.
//!
//! This module acts as the public API for the engine's event system. A
//! presentation layer normally only needs the snapshot, but listeners can
//! subscribe to these strongly-typed streams to log, animate or test against
//! discrete transitions.

use crate::common::SessionId;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::broadcast;

/// Gameplay transitions of a session and its targets.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Fired when `start()` has generated a fresh target set.
    SessionStarted {
        session: SessionId,
        point_count: u32,
        started_at: DateTime<Utc>,
    },
    /// Fired when a click matched the expected value.
    TargetHit { session: SessionId, value: u32 },
    /// Fired when a click did not match the expected value.
    TargetMissed {
        session: SessionId,
        value: u32,
        expected: u32,
    },
    /// Fired when a faded target has been swept out of the pool.
    TargetRemoved { session: SessionId, value: u32 },
    /// Fired on the final correct click, before the clear grace period.
    AllTargetsHit { session: SessionId },
    /// Fired when the session reaches the `Cleared` phase.
    Cleared { session: SessionId, elapsed: Duration },
    /// Fired when the session reaches the `GameOver` phase.
    GameOver { session: SessionId, elapsed: Duration },
}

impl GameEvent {
    /// The session this event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            GameEvent::SessionStarted { session, .. }
            | GameEvent::TargetHit { session, .. }
            | GameEvent::TargetMissed { session, .. }
            | GameEvent::TargetRemoved { session, .. }
            | GameEvent::AllTargetsHit { session }
            | GameEvent::Cleared { session, .. }
            | GameEvent::GameOver { session, .. } => *session,
        }
    }
}

/// Events related to the engine itself and its timers.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemEvent {
    /// Fired once when the engine's dispatcher begins.
    EngineStarted,
    /// Fired once when the engine's dispatcher is about to exit.
    EngineShutdown,
    /// Fired when the session clock begins ticking.
    ClockStarted { session: SessionId },
    /// Fired when the session clock is stopped.
    ClockStopped { session: SessionId },
    /// Fired when the autoplay driver becomes active.
    AutoplayStarted { session: SessionId },
    /// Fired when the autoplay driver stops, for any reason.
    AutoplayStopped { session: SessionId },
    /// Fired when a tick from an already-ended session was discarded.
    StaleTickDropped { session: SessionId },
}

/// The pair of broadcast channels every event is published on.
///
/// Sending never blocks and never fails the caller: with no subscribers the
/// event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    game_event_sender: broadcast::Sender<GameEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (game_event_sender, _) = broadcast::channel(capacity);
        let (system_event_sender, _) = broadcast::channel(capacity);
        Self {
            game_event_sender,
            system_event_sender,
        }
    }

    pub fn emit_game(&self, event: GameEvent) {
        self.game_event_sender.send(event).ok();
    }

    pub fn emit_system(&self, event: SystemEvent) {
        self.system_event_sender.send(event).ok();
    }

    /// Subscribes to the `GameEvent` stream.
    pub fn subscribe_game_events(&self) -> broadcast::Receiver<GameEvent> {
        self.game_event_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
