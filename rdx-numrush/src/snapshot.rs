//! The read-only view handed to the presentation layer.
//!
//! A `Snapshot` is rebuilt after every mutation and is all a renderer needs:
//! it never has to reach into the session itself.

use crate::common::{round_tenths, Position, SessionId};
use crate::components::pool::{Target, TargetState};
use crate::game::{GameSession, Phase};
use serde::Serialize;

/// How the banner message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTone {
    Neutral,
    Success,
    Failure,
}

impl From<Phase> for MessageTone {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Cleared => MessageTone::Success,
            Phase::GameOver => MessageTone::Failure,
            Phase::Idle | Phase::Playing => MessageTone::Neutral,
        }
    }
}

/// Visible state of a target still in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    Idle,
    Revealed,
    Fading,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetView {
    pub value: u32,
    pub position: Position,
    /// Seconds left, one-decimal precision. Only set once clicked.
    pub countdown_remaining: Option<f64>,
    pub visual_state: VisualState,
    pub is_game_over: bool,
    /// Stacking order; higher layers draw on top. Lower values sit higher.
    pub layer: u32,
}

impl TargetView {
    fn from_target(target: &Target, total: u32) -> Option<Self> {
        let visual_state = match target.state {
            TargetState::Idle => VisualState::Idle,
            TargetState::Revealed => VisualState::Revealed,
            TargetState::Fading => VisualState::Fading,
            TargetState::Removed => return None,
        };
        Some(Self {
            value: target.value,
            position: target.position,
            countdown_remaining: target.countdown_remaining(),
            visual_state,
            is_game_over: target.is_game_over,
            layer: total.saturating_sub(target.value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub session: SessionId,
    pub phase: Phase,
    pub message: String,
    pub tone: MessageTone,
    /// Seconds since `start()`, one-decimal precision.
    pub elapsed_secs: f64,
    pub expected_next: u32,
    /// The "next" prompt; hidden outside play and once every target is hit.
    pub next_hint: Option<u32>,
    pub point_count: u32,
    /// `false` until the first game; lets the UI label Play vs Restart.
    pub has_started: bool,
    pub autoplay_enabled: bool,
    pub autoplay_active: bool,
    pub targets: Vec<TargetView>,
}

impl Snapshot {
    /// Captures the current state of `session`.
    pub fn capture(session: &GameSession) -> Self {
        let pool = session.pool();
        let total = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        let targets = pool
            .targets()
            .filter_map(|t| TargetView::from_target(t, total))
            .collect();

        let phase = session.phase();
        let expected_next = session.expected_next();
        let next_hint = (phase == Phase::Playing && expected_next <= session.point_count())
            .then_some(expected_next);

        Self {
            session: session.id(),
            phase,
            message: session.message().to_string(),
            tone: phase.into(),
            elapsed_secs: round_tenths(session.elapsed().as_secs_f64()),
            expected_next,
            next_hint,
            point_count: session.point_count(),
            has_started: session.has_started(),
            autoplay_enabled: session.autoplay().is_enabled(),
            autoplay_active: session.autoplay().is_active(),
            targets,
        }
    }

    /// The view of the target holding `value`, if it is still in the frame.
    pub fn target(&self, value: u32) -> Option<&TargetView> {
        self.targets.iter().find(|t| t.value == value)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }
}

impl GameSession {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NumrushConfig;
    use crate::events::EventBus;
    use crate::game::{MESSAGE_GAME_OVER, MESSAGE_READY};

    fn session(point_count: u32) -> GameSession {
        let config = NumrushConfig {
            point_count,
            seed: Some(5),
            ..Default::default()
        };
        GameSession::new(config, EventBus::default()).unwrap()
    }

    #[test]
    fn idle_snapshot_has_no_targets_or_hint() {
        let snap = session(4).snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.message, MESSAGE_READY);
        assert_eq!(snap.tone, MessageTone::Neutral);
        assert!(snap.targets.is_empty());
        assert_eq!(snap.next_hint, None);
        assert!(!snap.has_started);
    }

    #[test]
    fn playing_snapshot_lists_targets_with_layers() {
        let mut session = session(4);
        session.start().unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.next_hint, Some(1));
        let layers: Vec<(u32, u32)> = snap.targets.iter().map(|t| (t.value, t.layer)).collect();
        assert_eq!(layers, vec![(1, 3), (2, 2), (3, 1), (4, 0)]);
        assert!(snap
            .targets
            .iter()
            .all(|t| t.visual_state == VisualState::Idle && t.countdown_remaining.is_none()));
    }

    #[test]
    fn game_over_snapshot_highlights_the_culprit() {
        let mut session = session(3);
        session.start().unwrap();
        session.submit_click(1);
        session.submit_click(3);
        let snap = session.snapshot();
        assert_eq!(snap.message, MESSAGE_GAME_OVER);
        assert_eq!(snap.tone, MessageTone::Failure);
        assert_eq!(snap.next_hint, None);
        let culprit = snap.target(3).unwrap();
        assert!(culprit.is_game_over);
        assert_eq!(culprit.visual_state, VisualState::Revealed);
        assert_eq!(snap.target(1).unwrap().visual_state, VisualState::Fading);
        assert!(!snap.target(2).unwrap().is_game_over);
    }

    #[test]
    fn elapsed_is_reported_in_tenths() {
        let mut session = session(2);
        session.start().unwrap();
        for _ in 0..3 {
            session.advance_clock();
        }
        assert_eq!(session.snapshot().elapsed_secs, 0.3);
    }

    #[test]
    fn snapshot_serializes_for_renderers() {
        let mut session = session(1);
        session.start().unwrap();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["phase"], "playing");
        assert_eq!(json["targets"][0]["visual_state"], "idle");
        assert_eq!(json["next_hint"], 1);
    }
}
