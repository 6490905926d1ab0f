//! Game rules exercised through `GameSession` with a fixed-step clock.

use numrush::prelude::*;
use proptest::prelude::*;

fn session(point_count: u32, seed: u64) -> GameSession {
    let config = NumrushConfig {
        point_count,
        seed: Some(seed),
        ..Default::default()
    };
    GameSession::new(config, EventBus::default()).unwrap()
}

fn ticks(session: &mut GameSession, n: usize) {
    for _ in 0..n {
        session.advance_clock();
    }
}

/// 0.5s of clear grace at 100ms per tick.
const GRACE_TICKS: usize = 5;

#[test]
fn three_in_order_clears() {
    let mut s = session(3, 1);
    s.start().unwrap();
    for value in 1..=3 {
        s.submit_click(value);
        ticks(&mut s, 2);
    }
    ticks(&mut s, GRACE_TICKS);
    let snap = s.snapshot();
    assert_eq!(snap.phase, Phase::Cleared);
    assert_eq!(snap.message, "ALL CLEARED");
    assert_eq!(snap.tone, MessageTone::Success);
}

#[test]
fn skipping_ahead_is_game_over() {
    let mut s = session(3, 1);
    s.start().unwrap();
    s.submit_click(1);
    s.submit_click(3);
    let snap = s.snapshot();
    assert_eq!(snap.phase, Phase::GameOver);
    assert_eq!(snap.message, "GAME OVER");
    assert_eq!(snap.expected_next, 2);

    ticks(&mut s, 30);
    s.submit_click(2);
    assert_eq!(s.expected_next(), 2);
    assert_eq!(s.phase(), Phase::GameOver);
}

#[test]
fn single_target_clears_after_grace() {
    let mut s = session(1, 1);
    s.start().unwrap();
    s.submit_click(1);
    ticks(&mut s, GRACE_TICKS - 1);
    assert_eq!(s.phase(), Phase::Playing);
    assert!(s.clear_pending());
    ticks(&mut s, 1);
    assert_eq!(s.phase(), Phase::Cleared);
}

#[test]
fn clicking_a_removed_target_still_ends_the_game() {
    let mut s = session(4, 2);
    s.start().unwrap();
    s.submit_click(1);
    ticks(&mut s, 10);
    assert!(s.snapshot().target(1).is_none());

    assert_eq!(
        s.submit_click(1),
        ClickOutcome::Miss {
            value: 1,
            expected: 2
        }
    );
    let snap = s.snapshot();
    assert_eq!(snap.phase, Phase::GameOver);
    assert!(snap.targets.iter().all(|t| !t.is_game_over));
}

#[test]
fn fading_targets_leave_after_one_second() {
    let mut s = session(3, 3);
    s.start().unwrap();
    s.submit_click(1);
    ticks(&mut s, 4);
    s.submit_click(2);

    ticks(&mut s, 6);
    let snap = s.snapshot();
    assert!(snap.target(1).is_none());
    let second = snap.target(2).unwrap();
    assert_eq!(second.visual_state, VisualState::Fading);
    assert_eq!(second.countdown_remaining, Some(2.4));

    ticks(&mut s, 4);
    assert!(s.snapshot().target(2).is_none());
    assert_eq!(s.pool().remaining(), 1);
}

#[test]
fn countdown_expiry_alone_never_ends_the_game() {
    let mut s = session(2, 4);
    s.start().unwrap();
    ticks(&mut s, 200);
    assert_eq!(s.phase(), Phase::Playing);
    assert_eq!(s.snapshot().elapsed_secs, 20.0);
}

#[test]
fn restart_resets_everything() {
    let mut s = session(4, 5);
    s.start().unwrap();
    ticks(&mut s, 12);
    s.submit_click(1);
    s.submit_click(4);
    assert!(s.snapshot().targets.iter().any(|t| t.is_game_over));

    s.start().unwrap();
    let snap = s.snapshot();
    assert_eq!(snap.phase, Phase::Playing);
    assert_eq!(snap.elapsed_secs, 0.0);
    assert_eq!(snap.expected_next, 1);
    assert_eq!(snap.message, "LET'S PLAY");
    assert_eq!(snap.targets.len(), 4);
    assert!(snap
        .targets
        .iter()
        .all(|t| !t.is_game_over && t.visual_state == VisualState::Idle));
}

#[test]
fn autoplay_toggled_mid_game_picks_up_the_sequence() {
    let mut s = session(4, 6);
    s.start().unwrap();
    s.submit_click(1);
    s.submit_click(2);
    s.set_autoplay_enabled(true);
    assert!(s.snapshot().autoplay_active);

    ticks(&mut s, 5);
    assert_eq!(s.expected_next(), 4);
    ticks(&mut s, 5);
    assert_eq!(s.expected_next(), 5);
    assert!(!s.snapshot().autoplay_active);
    ticks(&mut s, GRACE_TICKS);
    assert_eq!(s.phase(), Phase::Cleared);
}

#[test]
fn re_enabling_running_autoplay_keeps_its_cadence() {
    let mut s = session(2, 8);
    s.set_autoplay_enabled(true);
    s.start().unwrap();
    for _ in 0..5 {
        ticks(&mut s, 4);
        s.set_autoplay_enabled(true);
    }
    assert_eq!(s.phase(), Phase::Cleared);
    assert_eq!(s.elapsed(), std::time::Duration::from_millis(1500));
}

#[test]
fn short_fade_is_reported_in_tenths() {
    let config = NumrushConfig {
        point_count: 2,
        seed: Some(9),
        targets: numrush::config::TargetConfig {
            fade_display_secs: 0.25,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = GameSession::new(config, EventBus::default()).unwrap();
    s.start().unwrap();
    s.submit_click(1);
    assert_eq!(s.snapshot().target(1).unwrap().countdown_remaining, Some(0.3));
}

#[test]
fn autoplay_enabled_during_grace_stops_itself() {
    let mut s = session(1, 7);
    s.start().unwrap();
    s.submit_click(1);
    s.set_autoplay_enabled(true);
    assert!(s.autoplay().is_active());
    ticks(&mut s, 1);
    assert!(!s.autoplay().is_active());
    assert_eq!(s.phase(), Phase::Playing);
    ticks(&mut s, GRACE_TICKS - 1);
    assert_eq!(s.phase(), Phase::Cleared);
}

proptest! {
    #[test]
    fn ordered_clicks_clear_regardless_of_timing(
        gaps in prop::collection::vec(0usize..25, 1..30)
    ) {
        let n = gaps.len() as u32;
        let mut s = session(n, 9);
        s.start().unwrap();
        for (i, gap) in gaps.iter().enumerate() {
            ticks(&mut s, *gap);
            prop_assert_eq!(s.phase(), Phase::Playing);
            s.submit_click(i as u32 + 1);
        }
        prop_assert_eq!(s.phase(), Phase::Playing);
        ticks(&mut s, GRACE_TICKS);
        prop_assert_eq!(s.phase(), Phase::Cleared);
        prop_assert_eq!(s.message(), "ALL CLEARED");
    }

    #[test]
    fn any_mismatch_is_game_over(
        n in 1u32..20,
        progress in 0u32..20,
        wrong in 1u32..30,
    ) {
        let progress = progress % n;
        prop_assume!(wrong != progress + 1);

        let mut s = session(n, 10);
        s.start().unwrap();
        for value in 1..=progress {
            s.submit_click(value);
        }
        let outcome = s.submit_click(wrong);
        prop_assert_eq!(outcome, ClickOutcome::Miss { value: wrong, expected: progress + 1 });
        prop_assert_eq!(s.phase(), Phase::GameOver);
        prop_assert_eq!(s.expected_next(), progress + 1);
    }

    #[test]
    fn expected_next_never_decreases(
        actions in prop::collection::vec(prop_oneof![
            (1u32..8).prop_map(Some),
            Just(None),
        ], 1..60)
    ) {
        let mut s = session(6, 11);
        s.start().unwrap();
        let mut last = s.expected_next();
        for action in actions {
            match action {
                Some(value) => { s.submit_click(value); }
                None => { s.advance_clock(); }
            }
            prop_assert!(s.expected_next() >= last);
            last = s.expected_next();
        }
    }

    #[test]
    fn countdowns_stay_non_negative_tenths(
        n in 1u32..12,
        clicks in 0u32..12,
        steps in 0usize..80,
    ) {
        let mut s = session(n, 12);
        s.start().unwrap();
        for value in 1..=clicks.min(n) {
            s.submit_click(value);
            ticks(&mut s, 3);
        }
        ticks(&mut s, steps);
        for target in s.snapshot().targets {
            if let Some(c) = target.countdown_remaining {
                prop_assert!(c >= 0.0);
                prop_assert_eq!((c * 10.0).round() / 10.0, c);
            }
        }
    }

    #[test]
    fn autoplay_clears_within_its_budget(n in 1u32..25) {
        let mut s = session(n, 13);
        s.set_autoplay_enabled(true);
        s.start().unwrap();
        let budget = n as usize * 5 + GRACE_TICKS;
        ticks(&mut s, budget);
        prop_assert_eq!(s.phase(), Phase::Cleared);
        prop_assert!(s.snapshot().elapsed_secs <= budget as f64 * 0.1 + 1e-9);
    }
}
