//! Property tests for the interval timer state machine.

use std::sync::Arc;

use hiit_core::{
    CueScheduler, Event, IntervalTimer, ManualClock, Phase, RestPolicy, SessionConfig,
    TimerSettings,
};
use proptest::prelude::*;

fn timer(settings: TimerSettings) -> (IntervalTimer, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let timer = IntervalTimer::new(
        SessionConfig::quick(settings),
        Arc::new(clock.clone()),
        CueScheduler::silent(),
    );
    (timer, clock)
}

fn policy() -> impl Strategy<Value = RestPolicy> {
    prop_oneof![
        Just(RestPolicy::SkipTrailingRest),
        Just(RestPolicy::RestAfterFinalRound),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn remaining_time_never_increases_within_a_phase(
        steps in prop::collection::vec(1u64..3_000, 1..200),
    ) {
        let (mut t, clock) = timer(TimerSettings::new(20, 10, 3));
        t.start();
        let mut last = (t.phase(), t.round(), t.remaining_ms());
        for step in steps {
            clock.advance_ms(step);
            t.tick();
            let now = (t.phase(), t.round(), t.remaining_ms());
            if now.0 == last.0 && now.1 == last.1 {
                prop_assert!(now.2 <= last.2, "remaining went up: {:?} -> {:?}", last, now);
            }
            prop_assert_eq!(t.display_remaining_ms(), now.2);
            last = now;
        }
    }

    #[test]
    fn every_session_completes_exactly_once(
        work in 5u32..=30,
        rest in 5u32..=30,
        rounds in 1u32..=8,
        rest_policy in policy(),
        step in 50u64..2_500,
    ) {
        let mut settings = TimerSettings::new(work, rest, rounds);
        settings.rest_policy = rest_policy;
        let expected_rests = match rest_policy {
            RestPolicy::SkipTrailingRest => rounds - 1,
            RestPolicy::RestAfterFinalRound => rounds,
        };
        let (mut t, clock) = timer(settings);
        let planned = t.total_duration_secs();
        t.start();

        let mut completions = 0;
        let mut works = 0;
        let mut rests = 0;
        let mut elapsed_ms = 0u64;
        while t.is_running() {
            clock.advance_ms(step);
            elapsed_ms += step;
            for event in t.tick() {
                match event {
                    Event::WorkoutCompleted { rounds: r, .. } => {
                        prop_assert_eq!(r, rounds);
                        completions += 1;
                    }
                    Event::PhaseChanged { to: Phase::Work, .. } => works += 1,
                    Event::PhaseChanged { to: Phase::Rest, .. } => rests += 1,
                    _ => {}
                }
            }
            prop_assert!(elapsed_ms <= (planned + 10) * 1000 + step, "session overran");
        }

        prop_assert_eq!(completions, 1);
        prop_assert_eq!(works, rounds);
        prop_assert_eq!(rests, expected_rests);
        prop_assert_eq!(t.phase(), Phase::Complete);
        prop_assert_eq!(t.round(), rounds);
        // Session ends on the first tick at or after warmup + planned time.
        let end_ms = (5 + planned) * 1000;
        prop_assert!(elapsed_ms >= end_ms && elapsed_ms < end_ms + step);
        prop_assert!(t.tick().is_empty());
    }

    #[test]
    fn pause_then_resume_keeps_remaining_time(
        before_pause in 0u64..60_000,
        paused_for in 0u64..600_000,
    ) {
        let (mut t, clock) = timer(TimerSettings::new(45, 15, 3));
        t.start();
        clock.advance_ms(before_pause);
        t.tick();
        let phase = t.phase();
        let remaining = t.remaining_ms();

        t.pause();
        prop_assert_eq!(t.remaining_ms(), remaining);
        clock.advance_ms(paused_for);
        prop_assert!(t.tick().is_empty());
        t.resume();

        prop_assert_eq!(t.phase(), phase);
        prop_assert_eq!(t.remaining_ms(), remaining);
    }
}

#[test]
fn double_tick_after_expiry_advances_once() {
    let (mut t, clock) = timer(TimerSettings::new(45, 15, 3));
    t.start();
    clock.advance_secs(5 + 45);
    t.tick();
    assert_eq!(t.phase(), Phase::Rest);

    clock.advance_secs(15);
    let first = t.tick();
    let second = t.tick();
    assert_eq!(first.iter().filter(|e| e.name() == "phase_changed").count(), 1);
    assert!(second.is_empty());
    assert_eq!((t.phase(), t.round()), (Phase::Work, 2));
}

#[test]
fn example_session_45_15_3() {
    let (mut t, clock) = timer(TimerSettings::new(45, 15, 3));
    t.start();
    assert_eq!((t.phase(), t.remaining_ms()), (Phase::Warmup, 5_000));

    let mut completions = 0;
    let mut visited = Vec::new();
    for _ in 0..(5 + 45 * 3 + 15 * 2) * 10 {
        clock.advance_ms(100);
        for event in t.tick() {
            match event {
                Event::PhaseChanged { to, round, .. } => visited.push((to, round, t.remaining_ms())),
                Event::WorkoutCompleted { .. } => completions += 1,
                _ => {}
            }
        }
    }

    assert_eq!(
        visited,
        vec![
            (Phase::Work, 1, 45_000),
            (Phase::Rest, 1, 15_000),
            (Phase::Work, 2, 45_000),
            (Phase::Rest, 2, 15_000),
            (Phase::Work, 3, 45_000),
            (Phase::Complete, 3, 0),
        ]
    );
    assert_eq!(completions, 1);
    assert!(!t.is_running());
    assert_eq!(t.formatted_remaining(), "0:00");
}
