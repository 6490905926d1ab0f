//! The target pool: the numbered targets of one session and their countdowns.

use crate::common::{round_tenths, Position};
use crate::config::{check_point_count, FramePolicy, TargetConfig};
use crate::error::GameError;
use rand::Rng;
use std::time::Duration;
use tracing::trace;

/// Lifecycle of a single target.
///
/// The game-over highlight is deliberately not a variant here; it is an
/// independent flag on [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Placed and waiting to be clicked.
    Idle,
    /// Clicked; shows a countdown.
    Revealed,
    /// Clicked in order; counting down towards removal.
    Fading,
    /// Swept out of the frame. Never revisited.
    Removed,
}

/// A single numbered target.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub value: u32,
    pub position: Position,
    pub state: TargetState,
    /// Set on the target whose click ended the game.
    pub is_game_over: bool,
    countdown: Option<f64>,
    fade_started: Option<Duration>,
}

impl Target {
    fn new(value: u32, position: Position) -> Self {
        Self {
            value,
            position,
            state: TargetState::Idle,
            is_game_over: false,
            countdown: None,
            fade_started: None,
        }
    }

    /// Seconds left on the target's countdown, one-decimal precision.
    ///
    /// Only `Revealed` and `Fading` targets carry a countdown.
    pub fn countdown_remaining(&self) -> Option<f64> {
        match self.state {
            TargetState::Revealed | TargetState::Fading => self.countdown,
            TargetState::Idle | TargetState::Removed => None,
        }
    }

    fn is_present(&self) -> bool {
        self.state != TargetState::Removed
    }
}

/// Outcome of a click as far as the pool is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    /// The click matched the expected value.
    Hit,
    /// The click ended the game.
    Miss,
}

/// Owns the targets of a single session.
#[derive(Debug, Clone)]
pub struct TargetPool {
    targets: Vec<Target>,
    fade_display_secs: f64,
    removal_delay: Duration,
    /// Time elapsed on this pool, advanced by `tick`.
    now: Duration,
}

impl TargetPool {
    /// An empty pool, used before the first session starts. The display
    /// countdown is snapped to tenths of a second.
    pub fn empty(timings: &TargetConfig) -> Self {
        Self {
            targets: Vec::new(),
            fade_display_secs: round_tenths(timings.fade_display_secs.max(0.0)),
            removal_delay: timings.removal_delay(),
            now: Duration::ZERO,
        }
    }

    /// Generates `count` targets valued `1..=count` at random positions that
    /// keep each target's footprint inside `frame`.
    pub fn generate<R: Rng>(
        count: u32,
        frame: &FramePolicy,
        timings: &TargetConfig,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        check_point_count(count)?;
        let (max_x, max_y) = frame.max_fractions();
        let targets = (1..=count)
            .map(|value| {
                let position = Position::new(rng.random::<f64>() * max_x, rng.random::<f64>() * max_y);
                Target::new(value, position)
            })
            .collect();

        Ok(Self {
            targets,
            ..Self::empty(timings)
        })
    }

    /// Decays every running countdown by `delta`, floored at zero and kept at
    /// one-decimal precision. Does not remove anything.
    pub fn tick(&mut self, delta: Duration) {
        self.now += delta;
        let step = delta.as_secs_f64();
        for target in &mut self.targets {
            if !matches!(target.state, TargetState::Revealed | TargetState::Fading) {
                continue;
            }
            if let Some(remaining) = target.countdown.as_mut() {
                if *remaining > 0.0 {
                    *remaining = round_tenths((*remaining - step).max(0.0));
                }
            }
        }
    }

    /// Applies a click to the target holding `value`.
    ///
    /// A hit moves an `Idle` target to `Revealed`. A miss flags the target as
    /// the game-over culprit without touching its removal schedule; an `Idle`
    /// culprit is also revealed so its countdown shows. Unknown or removed
    /// values are ignored. Returns whether a target was touched.
    pub fn reveal(&mut self, value: u32, outcome: Reveal) -> bool {
        let fade_display_secs = self.fade_display_secs;
        let Some(target) = self.find_mut(value) else {
            return false;
        };
        if outcome == Reveal::Miss {
            target.is_game_over = true;
        }
        if target.state == TargetState::Idle {
            target.state = TargetState::Revealed;
            target.countdown = Some(fade_display_secs);
        }
        true
    }

    /// Starts the cosmetic fade of the target holding `value`: its countdown
    /// is reset to the display duration and its removal delay starts now.
    pub fn begin_fade(&mut self, value: u32) -> bool {
        let now = self.now;
        let fade_display_secs = self.fade_display_secs;
        let Some(target) = self.find_mut(value) else {
            return false;
        };
        target.state = TargetState::Fading;
        target.countdown = Some(fade_display_secs);
        target.fade_started = Some(now);
        true
    }

    /// Removes every fading target whose removal delay has elapsed, returning
    /// the removed values in ascending order.
    pub fn sweep(&mut self) -> Vec<u32> {
        let now = self.now;
        let removal_delay = self.removal_delay;
        let mut removed = Vec::new();
        for target in &mut self.targets {
            if target.state != TargetState::Fading {
                continue;
            }
            let due = target
                .fade_started
                .is_some_and(|started| now.saturating_sub(started) >= removal_delay);
            if due {
                target.state = TargetState::Removed;
                target.countdown = None;
                target.fade_started = None;
                removed.push(target.value);
            }
        }
        if !removed.is_empty() {
            trace!(?removed, "swept faded targets");
        }
        removed
    }

    /// Looks up a target that has not been removed.
    pub fn get(&self, value: u32) -> Option<&Target> {
        self.targets.iter().find(|t| t.value == value && t.is_present())
    }

    /// Iterates over the targets still in the frame, in value order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(|t| t.is_present())
    }

    /// Number of targets still in the frame.
    pub fn remaining(&self) -> usize {
        self.targets().count()
    }

    /// Number of targets generated for this session.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn find_mut(&mut self, value: u32) -> Option<&mut Target> {
        self.targets
            .iter_mut()
            .find(|t| t.value == value && t.is_present())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const STEP: Duration = Duration::from_millis(100);

    fn pool(count: u32) -> TargetPool {
        let mut rng = Pcg32::seed_from_u64(7);
        TargetPool::generate(count, &FramePolicy::default(), &TargetConfig::default(), &mut rng)
            .unwrap()
    }

    #[test]
    fn generate_numbers_targets_from_one() {
        let pool = pool(4);
        let values: Vec<u32> = pool.targets().map(|t| t.value).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        assert!(pool.targets().all(|t| t.state == TargetState::Idle));
        assert!(pool.targets().all(|t| t.countdown_remaining().is_none()));
    }

    #[test]
    fn generate_rejects_zero_targets() {
        let mut rng = Pcg32::seed_from_u64(7);
        let err = TargetPool::generate(0, &FramePolicy::default(), &TargetConfig::default(), &mut rng)
            .unwrap_err();
        assert_eq!(err, GameError::InvalidConfig { point_count: 0 });
    }

    #[test]
    fn positions_stay_inside_the_frame() {
        let frame = FramePolicy::Fixed {
            width: 400.0,
            height: 200.0,
            target_size: 40.0,
        };
        let mut rng = Pcg32::seed_from_u64(99);
        let pool = TargetPool::generate(200, &frame, &TargetConfig::default(), &mut rng).unwrap();
        for target in pool.targets() {
            assert!((0.0..=0.9).contains(&target.position.x));
            assert!((0.0..=0.8).contains(&target.position.y));
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let a: Vec<Position> = pool(6).targets().map(|t| t.position).collect();
        let b: Vec<Position> = pool(6).targets().map(|t| t.position).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn countdown_decays_in_tenths_and_floors_at_zero() {
        let mut pool = pool(2);
        pool.reveal(1, Reveal::Hit);
        pool.begin_fade(1);
        for _ in 0..3 {
            pool.tick(STEP);
        }
        assert_eq!(pool.get(1).unwrap().countdown_remaining(), Some(2.7));

        let mut pool = pool_with_short_fade();
        pool.reveal(1, Reveal::Hit);
        for _ in 0..5 {
            pool.tick(STEP);
        }
        assert_eq!(pool.get(1).unwrap().countdown_remaining(), Some(0.0));
    }

    fn pool_with_short_fade() -> TargetPool {
        let timings = TargetConfig {
            fade_display_secs: 0.25,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        TargetPool::generate(1, &FramePolicy::default(), &timings, &mut rng).unwrap()
    }

    #[test]
    fn display_countdown_is_snapped_to_tenths() {
        let mut pool = pool_with_short_fade();
        pool.reveal(1, Reveal::Hit);
        assert_eq!(pool.get(1).unwrap().countdown_remaining(), Some(0.3));
        pool.begin_fade(1);
        assert_eq!(pool.get(1).unwrap().countdown_remaining(), Some(0.3));
    }

    #[test]
    fn generate_rejects_oversized_pools() {
        let mut rng = Pcg32::seed_from_u64(7);
        let err = TargetPool::generate(
            u32::MAX,
            &FramePolicy::default(),
            &TargetConfig::default(),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, GameError::InvalidConfig { point_count: u32::MAX });
    }

    #[test]
    fn idle_targets_do_not_count_down() {
        let mut pool = pool(1);
        pool.tick(STEP);
        assert_eq!(pool.get(1).unwrap().countdown_remaining(), None);
    }

    #[test]
    fn sweep_waits_for_the_removal_delay() {
        let mut pool = pool(3);
        pool.reveal(1, Reveal::Hit);
        pool.begin_fade(1);
        for _ in 0..9 {
            pool.tick(STEP);
            assert!(pool.sweep().is_empty());
        }
        pool.tick(STEP);
        assert_eq!(pool.sweep(), vec![1]);
        assert!(pool.get(1).is_none());
        assert_eq!(pool.remaining(), 2);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn miss_flags_without_scheduling_removal() {
        let mut pool = pool(3);
        assert!(pool.reveal(3, Reveal::Miss));
        let culprit = pool.get(3).unwrap();
        assert!(culprit.is_game_over);
        assert_eq!(culprit.state, TargetState::Revealed);
        assert_eq!(culprit.countdown_remaining(), Some(3.0));

        for _ in 0..20 {
            pool.tick(STEP);
        }
        assert!(pool.sweep().is_empty());
        assert!(pool.get(3).is_some());
    }

    #[test]
    fn reveal_of_unknown_or_removed_value_is_a_no_op() {
        let mut pool = pool(2);
        assert!(!pool.reveal(9, Reveal::Hit));

        pool.reveal(1, Reveal::Hit);
        pool.begin_fade(1);
        for _ in 0..10 {
            pool.tick(STEP);
        }
        pool.sweep();
        assert!(!pool.reveal(1, Reveal::Miss));
        assert!(pool.targets().all(|t| !t.is_game_over));
    }
}
