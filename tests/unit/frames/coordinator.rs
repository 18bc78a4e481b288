use super::*;
use crate::config::{FrameConfig, GatePolicy, SequenceConfig};
use crate::viewport::Direction;

fn config(durations: &[u64]) -> SequenceConfig {
    SequenceConfig::new(
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| FrameConfig::new(i as u32, d).with_element(format!("frame-{i}")))
            .collect(),
    )
}

fn frames(durations: &[u64]) -> SequentialFrames {
    SequentialFrames::new(config(durations)).unwrap()
}

fn frames_with(durations: &[u64], policy: SequencePolicy) -> SequentialFrames {
    SequentialFrames::new(config(durations).with_policy(policy)).unwrap()
}

fn enter() -> ViewportSignal {
    ViewportSignal::new(Action::Enter, Direction::Down)
}

fn leave_up() -> ViewportSignal {
    ViewportSignal::new(Action::Leave, Direction::Up)
}

fn leave_down() -> ViewportSignal {
    ViewportSignal::new(Action::Leave, Direction::Down)
}

fn kinds_for(seq: &SequentialFrames, position: usize) -> Vec<FrameEventKind> {
    seq.events()
        .iter()
        .filter(|e| e.position == Some(position))
        .map(|e| e.kind)
        .collect()
}

#[test]
fn entry_enter_activates_and_completes_after_duration() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    assert!(seq.is_active(0));
    assert!(!seq.is_animation_complete(0));

    seq.advance_to(Millis(1999));
    assert!(!seq.is_animation_complete(0));
    seq.advance_to(Millis(2000));
    assert!(seq.is_animation_complete(0));
    assert_eq!(
        kinds_for(&seq, 0),
        vec![FrameEventKind::Activated, FrameEventKind::Completed]
    );
}

#[test]
fn successor_entering_early_waits_then_activates_on_completion() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(500));
    seq.handle_signal(1, enter());
    assert!(!seq.is_active(1));
    assert!(seq.is_waiting(1));

    seq.advance_to(Millis(1999));
    assert!(!seq.is_active(1));

    seq.advance_to(Millis(2000));
    assert!(seq.is_active(1));
    assert!(!seq.is_waiting(1));
    let activated_at = seq
        .events()
        .iter()
        .find(|e| e.position == Some(1) && e.kind == FrameEventKind::Activated)
        .map(|e| e.at);
    assert_eq!(activated_at, Some(Millis(2000)));

    seq.advance_to(Millis(3000));
    assert!(seq.is_animation_complete(1));
}

#[test]
fn successor_entering_after_completion_activates_without_waiting() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(2500));
    seq.handle_signal(1, enter());
    assert!(seq.is_active(1));
    assert!(!kinds_for(&seq, 1).contains(&FrameEventKind::WaitRegistered));
}

#[test]
fn leave_up_while_waiting_tears_the_wait_down() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(500));
    seq.handle_signal(1, enter());
    assert!(seq.is_waiting(1));

    seq.advance_to(Millis(1000));
    seq.handle_signal(1, leave_up());
    assert!(!seq.is_waiting(1));
    assert!(!seq.is_active(1));

    seq.advance_to(Millis(5000));
    assert!(seq.is_animation_complete(0));
    assert!(!seq.is_active(1));
    assert_eq!(
        kinds_for(&seq, 1),
        vec![FrameEventKind::WaitRegistered, FrameEventKind::WaitCancelled]
    );
}

#[test]
fn successor_stays_active_when_predecessor_later_deactivates() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(2000));
    seq.handle_signal(1, enter());
    seq.advance_to(Millis(3000));
    assert!(seq.is_animation_complete(1));

    // Entry frame leaving is recorded only under the default policy.
    seq.handle_signal(0, leave_down());
    assert!(seq.is_active(0));
    assert!(!seq.frame(0).unwrap().in_viewport());

    seq.deactivate(0, DeactivateMode::Immediate);
    assert!(!seq.is_active(0));
    assert!(seq.is_active(1));
    assert!(seq.is_animation_complete(1));
}

#[test]
fn deactivation_before_duration_prevents_completion() {
    let mut seq = frames(&[2000]);
    seq.activate(0);
    seq.advance_to(Millis(1000));
    seq.deactivate(0, DeactivateMode::FadeOut);
    seq.advance_to(Millis(10_000));
    assert!(!seq.is_animation_complete(0));
    assert!(!kinds_for(&seq, 0).contains(&FrameEventKind::Completed));
}

#[test]
fn reactivation_restarts_the_timer_from_scratch() {
    let mut seq = frames(&[2000]);
    seq.activate(0);
    seq.advance_to(Millis(1500));
    seq.deactivate(0, DeactivateMode::Immediate);
    seq.activate(0);

    // The first activation's timer would have fired at 2000.
    seq.advance_to(Millis(3499));
    assert!(!seq.is_animation_complete(0));
    seq.advance_to(Millis(3500));
    assert!(seq.is_animation_complete(0));
}

#[test]
fn activating_an_active_frame_keeps_its_timer() {
    let mut seq = frames(&[2000]);
    seq.activate(0);
    seq.advance_to(Millis(1000));
    seq.activate(0);
    seq.advance_to(Millis(2000));
    assert!(seq.is_animation_complete(0));
    assert_eq!(
        kinds_for(&seq, 0)
            .iter()
            .filter(|k| **k == FrameEventKind::Activated)
            .count(),
        1
    );
}

#[test]
fn registering_twice_keeps_a_single_watch() {
    let mut seq = frames(&[2000, 1000]);
    seq.activate(0);
    let first = seq.await_predecessor(1);
    let second = seq.await_predecessor(1);
    assert!(first.is_some());
    assert!(second.is_some());
    assert_eq!(seq.watches().len(), 1);
    assert_eq!(seq.watches().replaced(), 1);

    // Disposing through the stale handle does nothing.
    assert!(!seq.dispose_wait(first.unwrap()));
    assert!(seq.is_waiting(1));
    assert!(seq.dispose_wait(second.unwrap()));
    assert!(!seq.is_waiting(1));

    seq.advance_to(Millis(2000));
    assert!(!seq.is_active(1));
}

#[test]
fn await_resolves_immediately_when_condition_already_holds() {
    let mut seq = frames(&[2000, 1000]);
    assert!(seq.await_predecessor(1).is_none());
    assert!(seq.is_active(1));
    assert!(seq.watches().is_empty());
    assert_eq!(kinds_for(&seq, 1), vec![FrameEventKind::Activated]);

    assert!(seq.await_predecessor(0).is_none());
    assert!(seq.is_active(0));
}

#[test]
fn lenient_gate_lets_an_inactive_predecessor_through() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(1, enter());
    assert!(seq.is_active(1));
}

#[test]
fn strict_gate_waits_for_an_inactive_predecessor() {
    let policy = SequencePolicy {
        gate: GatePolicy::CompleteOnly,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[2000, 1000], policy);
    seq.handle_signal(1, enter());
    assert!(!seq.is_active(1));
    assert!(seq.is_waiting(1));

    seq.advance_to(Millis(100));
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(2099));
    assert!(!seq.is_active(1));
    seq.advance_to(Millis(2100));
    assert!(seq.is_active(1));
}

#[test]
fn predecessor_leaving_releases_a_waiting_successor_under_lenient_gate() {
    let policy = SequencePolicy {
        entry_leave: EntryLeavePolicy::Deactivate,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[2000, 1000], policy);
    seq.handle_signal(0, enter());
    seq.handle_signal(1, enter());
    assert!(seq.is_waiting(1));

    seq.advance_to(Millis(300));
    seq.handle_signal(0, leave_up());
    assert!(!seq.is_active(0));
    assert!(seq.is_active(1));
}

#[test]
fn strict_gate_builds_a_waterfall() {
    let policy = SequencePolicy {
        gate: GatePolicy::CompleteOnly,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[1000, 500, 300], policy);
    for i in 0..3 {
        seq.handle_signal(i, enter());
    }
    assert!(seq.is_active(0));
    assert!(seq.is_waiting(1));
    assert!(seq.is_waiting(2));

    seq.advance_to(Millis(1000));
    assert!(seq.is_active(1));
    assert!(!seq.is_active(2));

    seq.advance_to(Millis(1500));
    assert!(seq.is_active(2));
    seq.advance_to(Millis(1800));
    assert!(seq.snapshot().iter().all(|f| f.is_animation_complete));
}

#[test]
fn leave_down_is_ignored_and_leave_up_deactivates() {
    let mut seq = frames(&[100, 100]);
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(100));
    seq.handle_signal(1, enter());

    seq.handle_signal(1, leave_down());
    assert!(seq.is_active(1));
    assert!(!seq.frame(1).unwrap().in_viewport());

    seq.handle_signal(1, leave_up());
    assert!(!seq.is_active(1));
}

#[test]
fn any_leave_policy_deactivates_in_both_directions() {
    let policy = SequencePolicy {
        leave: LeavePolicy::AnyLeave,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[100, 100], policy);
    seq.handle_signal(1, enter());
    seq.handle_signal(1, leave_down());
    assert!(!seq.is_active(1));
}

#[test]
fn never_leave_policy_keeps_frames_active() {
    let policy = SequencePolicy {
        leave: LeavePolicy::Never,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[100, 100], policy);
    seq.handle_signal(1, enter());
    seq.handle_signal(1, leave_up());
    assert!(seq.is_active(1));
}

#[test]
fn entry_deactivate_policy_drops_entry_frame_on_leave() {
    let mut seq = frames_with(&[100, 100], SequencePolicy::strict());
    seq.handle_signal(0, enter());
    seq.handle_signal(0, leave_down());
    assert!(!seq.is_active(0));
}

#[test]
fn intersection_is_classified_from_scroll_delta() {
    let mut seq = frames(&[100, 100]);
    seq.on_intersection(1, true);
    assert!(seq.is_active(1));

    seq.on_scroll(400.0);
    seq.on_intersection(1, false);
    assert!(seq.is_active(1), "LEAVE_DOWN keeps the frame");

    seq.on_scroll(300.0);
    seq.on_intersection(1, false);
    assert!(!seq.is_active(1), "LEAVE_UP deactivates");
}

#[test]
fn out_of_range_operations_are_silent_noops() {
    let mut seq = frames(&[100]);
    seq.activate(7);
    seq.deactivate(7, DeactivateMode::Animated);
    assert!(seq.await_predecessor(7).is_none());
    seq.handle_signal(7, enter());
    assert!(!seq.bind(7, "nope"));
    assert!(seq.events().is_empty());
    assert!(!seq.is_active(7));
}

#[test]
fn reconcile_initial_is_idempotent() {
    let mut seq = frames(&[2000, 1000, 500]);
    for i in 0..3 {
        seq.store.set_in_viewport(i, true);
    }

    seq.reconcile_initial();
    let once = seq.snapshot();
    let waiting_once: Vec<_> = (0..3).filter(|&i| seq.is_waiting(i)).collect();
    let events_once = seq.events().len();
    let watch_once = seq.watches().get(1).map(|w| w.id);

    seq.reconcile_initial();
    assert_eq!(seq.snapshot(), once);
    let waiting_twice: Vec<_> = (0..3).filter(|&i| seq.is_waiting(i)).collect();
    assert_eq!(waiting_once, waiting_twice);
    assert_eq!(seq.watches().len(), 1);
    assert_eq!(seq.events().len(), events_once);
    assert_eq!(seq.watches().replaced(), 0);
    assert_eq!(seq.watches().get(1).map(|w| w.id), watch_once);

    // Frame 1 waits on an active, incomplete entry frame; frame 2 sees an inactive
    // predecessor and goes straight through under the lenient gate.
    assert!(once[0].is_active);
    assert!(!once[1].is_active);
    assert_eq!(waiting_once, vec![1]);
    assert!(once[2].is_active);
}

#[test]
fn attach_skips_unbound_frames_and_reconciles_after_settle_delay() {
    let mut seq = frames(&[1000, 1000, 1000]);
    assert!(seq.unbind(1));
    seq.store.set_in_viewport(0, true);

    seq.attach();
    assert!(seq.is_attached());
    assert_eq!(kinds_for(&seq, 1), vec![FrameEventKind::Skipped]);

    seq.advance_to(Millis(99));
    assert!(!seq.is_active(0));
    seq.advance_to(Millis(100));
    assert!(seq.is_active(0));

    // Signals for the unbound frame are dropped; the rest keep working.
    seq.handle_signal(1, enter());
    assert!(!seq.frame(1).unwrap().in_viewport());
    assert!(!seq.is_active(1));
    seq.handle_signal(2, enter());
    assert!(seq.is_active(2));
}

#[test]
fn unbound_middle_frame_does_not_stall_a_strict_sequence() {
    let mut seq = frames_with(&[100, 100, 100], SequencePolicy::strict());
    assert!(seq.unbind(1));
    seq.attach();

    seq.handle_signal(0, enter());
    seq.advance_to(Millis(500));
    assert!(seq.is_animation_complete(0));

    seq.handle_signal(2, enter());
    assert!(seq.is_active(2));
    assert!(!seq.is_waiting(2));
    assert!(!seq.is_active(1));

    seq.advance_to(Millis(10_000));
    assert!(seq.is_animation_complete(2));
}

#[test]
fn repeated_enter_while_waiting_keeps_the_same_watch() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.handle_signal(1, enter());
    let first = seq.watches().get(1).map(|w| w.id);

    seq.handle_signal(1, enter());
    assert_eq!(seq.watches().get(1).map(|w| w.id), first);
    assert_eq!(seq.watches().replaced(), 0);
    assert_eq!(kinds_for(&seq, 1), vec![FrameEventKind::WaitRegistered]);
}

#[test]
fn binding_after_attach_makes_a_frame_observable() {
    let mut seq = frames(&[100, 100]);
    seq.unbind(1);
    seq.attach();
    seq.handle_signal(1, enter());
    assert!(!seq.is_active(1));

    assert!(seq.bind(1, "late"));
    seq.handle_signal(1, enter());
    assert!(seq.is_active(1));
}

#[test]
fn reset_deactivates_settles_and_reconciles() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.advance_to(Millis(2000));
    seq.handle_signal(1, enter());
    seq.advance_to(Millis(3000));

    assert!(seq.reset_all());
    assert!(seq.is_resetting());
    assert!(!seq.is_active(0));
    assert!(!seq.is_active(1));

    // Fade-out (500) plus settle (100).
    seq.advance_to(Millis(3599));
    assert!(seq.is_resetting());
    seq.advance_to(Millis(3600));
    assert!(!seq.is_resetting());

    // Both frames are still in the viewport: the entry frame reactivates, frame 1 waits.
    assert!(seq.is_active(0));
    assert!(seq.is_waiting(1));
    seq.advance_to(Millis(5600));
    assert!(seq.is_active(1));

    let deactivated = seq
        .events()
        .iter()
        .filter(|e| {
            e.kind
                == FrameEventKind::Deactivated {
                    mode: DeactivateMode::FadeOut,
                }
        })
        .count();
    assert_eq!(deactivated, 2);
}

#[test]
fn concurrent_reset_is_dropped_not_queued() {
    let mut seq = frames(&[100]);
    seq.activate(0);
    assert!(seq.reset_all());
    assert!(!seq.reset_all_with(DeactivateMode::Immediate));
    assert!(
        seq.events()
            .iter()
            .any(|e| e.kind == FrameEventKind::ResetDropped)
    );

    seq.advance_to(Millis(10_000));
    let finished = seq
        .events()
        .iter()
        .filter(|e| e.kind == FrameEventKind::ResetFinished)
        .count();
    assert_eq!(finished, 1);
}

#[test]
fn signals_during_reset_only_update_viewport_flags() {
    let mut seq = frames(&[100, 100]);
    seq.activate(0);
    seq.reset_all_with(DeactivateMode::Immediate);
    seq.handle_signal(1, enter());
    assert!(!seq.is_active(1));
    assert!(seq.frame(1).unwrap().in_viewport());

    seq.advance_to(Millis(100));
    assert!(!seq.is_resetting());
    // Frame 1 is picked up by the post-reset reconciliation.
    assert!(seq.is_active(1));
}

#[test]
fn reset_cancels_pending_waits_and_timers() {
    let mut seq = frames(&[2000, 1000]);
    seq.handle_signal(0, enter());
    seq.handle_signal(1, enter());
    assert!(seq.is_waiting(1));

    seq.reset_all_with(DeactivateMode::Immediate);
    assert!(seq.watches().is_empty());
    seq.handle_signal(0, leave_up());
    seq.handle_signal(1, leave_up());
    seq.advance_to(Millis(10_000));
    assert!(seq.snapshot().iter().all(|f| !f.is_active && !f.is_animation_complete));
}

#[test]
fn scrolling_across_the_top_threshold_resets_once() {
    let mut seq = frames(&[100]);
    seq.on_scroll(800.0);
    seq.handle_signal(0, enter());

    seq.on_scroll(5.0);
    assert!(seq.is_resetting());
    seq.advance_to(Millis(1000));
    assert!(!seq.is_resetting());
    assert!(seq.is_active(0), "entry frame is still in view after the reset");

    seq.on_scroll(2.0);
    assert!(!seq.is_resetting(), "no crossing, no reset");
}

#[test]
fn manual_policy_ignores_scroll_to_top() {
    let mut seq = frames_with(&[100], SequencePolicy::manual_reset());
    seq.on_scroll(800.0);
    seq.handle_signal(0, enter());
    seq.on_scroll(0.0);
    assert!(!seq.is_resetting());
    assert!(seq.is_active(0));
    assert!(seq.reset_all());
}

#[test]
fn never_policy_refuses_resets() {
    let policy = SequencePolicy {
        reset: ResetPolicy::Never,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[100], policy);
    seq.activate(0);
    assert!(!seq.reset_all());
    assert!(seq.is_active(0));
}

#[test]
fn teardown_cancels_everything_in_flight() {
    let mut seq = frames(&[1000, 1000]);
    seq.attach();
    seq.activate(0);
    let _ = seq.await_predecessor(1);
    seq.teardown();
    seq.advance_to(Millis(10_000));
    assert!(!seq.is_animation_complete(0));
    assert!(!seq.is_active(1));
    assert!(!seq.is_attached());
}

#[test]
fn drained_events_are_not_reported_twice() {
    let mut seq = frames(&[100]);
    seq.activate(0);
    let first = seq.drain_events();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].frame_id, Some(crate::foundation::core::FrameId(0)));
    assert!(seq.drain_events().is_empty());
}

/// Every activation of a frame past the entry frame happened while its predecessor was active
/// and complete (strict gate), reconstructed from the event log.
#[test]
fn strict_gate_invariant_holds_over_a_noisy_session() {
    let policy = SequencePolicy {
        gate: GatePolicy::CompleteOnly,
        ..SequencePolicy::default()
    };
    let mut seq = frames_with(&[700, 300, 900, 200], policy);

    let mut state = 0x2545_f491u32;
    let mut y = 0.0;
    for step in 0..400u64 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let position = (state % 4) as usize;
        match (state >> 8) % 5 {
            0 | 1 => seq.handle_signal(position, enter()),
            2 => seq.handle_signal(position, leave_up()),
            3 => seq.handle_signal(position, leave_down()),
            _ => {
                y += f64::from((state >> 12) % 200) - 90.0;
                seq.on_scroll(y);
            }
        }
        seq.advance_to(Millis(step * 37));
    }

    let mut active = [false; 4];
    let mut complete = [false; 4];
    for e in seq.events() {
        let Some(p) = e.position else {
            if e.kind == FrameEventKind::ResetFinished {
                active = [false; 4];
                complete = [false; 4];
            }
            continue;
        };
        match e.kind {
            FrameEventKind::Activated => {
                if p > 0 {
                    assert!(
                        active[p - 1] && complete[p - 1],
                        "frame {p} activated at {} with predecessor not done",
                        e.at
                    );
                }
                active[p] = true;
                complete[p] = false;
            }
            FrameEventKind::Completed => complete[p] = true,
            FrameEventKind::Deactivated { .. } => {
                active[p] = false;
                complete[p] = false;
            }
            _ => {}
        }
    }
}
