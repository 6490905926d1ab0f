//! Session-scoped one-shot timers.
//!
//! Every timer remembers the session it was scheduled for. When the queue is
//! advanced on behalf of a different session, those timers are discarded
//! rather than fired, so nothing left over from a finished game can touch the
//! next one.

use crate::common::{SessionId, TimerId};
use slotmap::SlotMap;
use std::time::Duration;
use tracing::{debug, trace};

/// What a deferred timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Move the session to `Cleared`.
    ClearSession,
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub(crate) struct DeferredTimer {
    session: SessionId,
    remaining: Duration,
    action: TimerAction,
}

/// A timer that came due during `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub session: SessionId,
    pub action: TimerAction,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: SlotMap<TimerId, DeferredTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to fire once `delay` of clock time has passed.
    pub fn schedule(&mut self, session: SessionId, delay: Duration, action: TimerAction) -> TimerId {
        let id = self.timers.insert(DeferredTimer {
            session,
            remaining: delay,
            action,
        });
        debug!(%session, ?id, ?delay, ?action, "timer scheduled");
        id
    }

    /// Cancels a single timer. Returns `true` if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Cancels every pending timer, returning how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.timers.len();
        self.timers.clear();
        if dropped > 0 {
            debug!(dropped, "pending timers cancelled");
        }
        dropped
    }

    /// Advances all timers by `delta` and returns the ones that came due for
    /// `current`. Timers that belong to any other session are removed
    /// without firing.
    pub fn advance(&mut self, delta: Duration, current: SessionId) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        self.timers.retain(|id, timer| {
            if timer.session != current {
                trace!(?id, session = %timer.session, "stale timer discarded");
                return false;
            }
            timer.remaining = timer.remaining.saturating_sub(delta);
            if timer.remaining.is_zero() {
                fired.push(FiredTimer {
                    id,
                    session: timer.session,
                    action: timer.action,
                });
                return false;
            }
            true
        });
        fired
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    #[test]
    fn fires_once_the_delay_has_passed() {
        let mut queue = TimerQueue::new();
        let session = SessionId(1);
        let id = queue.schedule(session, Duration::from_millis(500), TimerAction::ClearSession);

        for _ in 0..4 {
            assert!(queue.advance(STEP, session).is_empty());
        }
        let fired = queue.advance(STEP, session);
        assert_eq!(
            fired,
            vec![FiredTimer {
                id,
                session,
                action: TimerAction::ClearSession
            }]
        );
        assert!(!queue.is_pending(id));
        assert!(queue.advance(STEP, session).is_empty());
    }

    #[test]
    fn timers_from_an_old_session_never_fire() {
        let mut queue = TimerQueue::new();
        queue.schedule(SessionId(1), Duration::from_millis(100), TimerAction::ClearSession);
        assert!(queue.advance(STEP, SessionId(2)).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_timers_stay_cancelled() {
        let mut queue = TimerQueue::new();
        let session = SessionId(4);
        let id = queue.schedule(session, STEP, TimerAction::ClearSession);
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(queue.advance(STEP, session).is_empty());

        queue.schedule(session, STEP, TimerAction::ClearSession);
        queue.schedule(session, STEP * 2, TimerAction::ClearSession);
        assert_eq!(queue.cancel_all(), 2);
        assert!(queue.advance(STEP * 5, session).is_empty());
    }
}
