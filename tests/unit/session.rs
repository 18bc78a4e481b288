use super::*;
use crate::config::{FrameConfig, SequencePolicy};
use crate::frames::events::FrameEventKind;

fn section(durations: &[u64]) -> SequenceConfig {
    SequenceConfig::new(
        durations
            .iter()
            .enumerate()
            .map(|(i, &d)| FrameConfig::new(i as u32 + 1, d).with_element(format!("f{i}")))
            .collect(),
    )
}

#[test]
fn sequences_share_the_session_clock() {
    let mut s = ScrollSession::open(SessionOpts::default());
    let a = s.add_sequence("section-a", section(&[2000, 1000])).unwrap();
    s.advance_to(Millis(400)).unwrap();
    let b = s.add_sequence("section-b", section(&[500])).unwrap();
    assert_eq!(s.sequence(b).unwrap().now(), Millis(400));

    s.intersect(a, 0, true).unwrap();
    s.intersect(b, 0, true).unwrap();
    s.advance_to(Millis(900)).unwrap();
    assert!(s.sequence(b).unwrap().is_animation_complete(0));
    assert!(!s.sequence(a).unwrap().is_animation_complete(0));
    assert_eq!(s.key("section-a"), Some(a));
    assert_eq!(s.len(), 2);
}

#[test]
fn duplicate_names_are_rejected() {
    let mut s = ScrollSession::open(SessionOpts::default());
    s.add_sequence("a", section(&[100])).unwrap();
    let err = s.add_sequence("a", section(&[100])).unwrap_err();
    assert!(err.to_string().contains("already registered"));
}

#[test]
fn invalid_config_surfaces_as_config_error() {
    let mut s = ScrollSession::open(SessionOpts::default());
    let err = s.add_sequence("a", section(&[])).unwrap_err();
    assert!(matches!(err, SeqError::Config(_)));
    assert!(s.is_empty());
}

#[test]
fn clock_cannot_go_backwards() {
    let mut s = ScrollSession::open(SessionOpts::default());
    s.advance_to(Millis(50)).unwrap();
    assert!(s.advance_to(Millis(10)).is_err());
    s.advance_by(Millis(25)).unwrap();
    assert_eq!(s.now(), Millis(75));
}

#[test]
fn scroll_fans_out_and_drives_direction() {
    let mut s = ScrollSession::open(SessionOpts {
        initial_scroll_y: 600.0,
    });
    let a = s.add_sequence("a", section(&[100, 100])).unwrap();
    s.intersect(a, 1, true).unwrap();
    assert!(s.sequence(a).unwrap().is_active(1));

    s.scroll_to(650.0).unwrap();
    s.intersect(a, 1, false).unwrap();
    assert!(s.sequence(a).unwrap().is_active(1));

    s.scroll_to(620.0).unwrap();
    s.intersect(a, 1, false).unwrap();
    assert!(!s.sequence(a).unwrap().is_active(1));
    assert_eq!(s.scroll_y(), 620.0);
}

#[test]
fn scroll_to_top_resets_only_sequences_whose_policy_allows_it() {
    let mut s = ScrollSession::open(SessionOpts {
        initial_scroll_y: 300.0,
    });
    let auto = s.add_sequence("auto", section(&[100])).unwrap();
    let manual = s
        .add_sequence(
            "manual",
            section(&[100]).with_policy(SequencePolicy::manual_reset()),
        )
        .unwrap();
    s.intersect(auto, 0, true).unwrap();
    s.intersect(manual, 0, true).unwrap();

    s.scroll_to(0.0).unwrap();
    assert!(s.sequence(auto).unwrap().is_resetting());
    assert!(!s.sequence(manual).unwrap().is_resetting());
    assert!(s.reset(manual).unwrap());
}

#[test]
fn drained_events_are_time_ordered_and_tagged() {
    let mut s = ScrollSession::open(SessionOpts::default());
    let a = s.add_sequence("a", section(&[300])).unwrap();
    let b = s.add_sequence("b", section(&[100])).unwrap();
    s.intersect(a, 0, true).unwrap();
    s.intersect(b, 0, true).unwrap();
    s.advance_to(Millis(1000)).unwrap();

    let events = s.drain_events();
    let summary: Vec<_> = events
        .iter()
        .map(|e| (e.sequence.as_str(), e.event.at.0, e.event.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a", 0, FrameEventKind::Activated),
            ("b", 0, FrameEventKind::Activated),
            ("b", 100, FrameEventKind::Completed),
            ("a", 300, FrameEventKind::Completed),
        ]
    );
    assert!(s.drain_events().is_empty());
}

#[test]
fn attach_all_schedules_reconciliation_for_every_sequence() {
    let mut s = ScrollSession::open(SessionOpts::default());
    let a = s.add_sequence("a", section(&[100])).unwrap();
    assert!(s.bind(a, 0, "hero").unwrap());
    assert!(!s.bind(a, 3, "missing").unwrap());
    s.attach_all().unwrap();
    assert!(s.sequence(a).unwrap().is_attached());
}

#[test]
fn closed_session_refuses_input_but_allows_reads() {
    let mut s = ScrollSession::open(SessionOpts::default());
    let a = s.add_sequence("a", section(&[1000])).unwrap();
    s.intersect(a, 0, true).unwrap();

    let leftover = s.close().unwrap();
    assert_eq!(leftover.len(), 1);
    assert!(!s.is_open());

    assert!(s.scroll_to(10.0).is_err());
    assert!(s.intersect(a, 0, false).is_err());
    assert!(s.advance_to(Millis(5000)).is_err());
    assert!(s.add_sequence("b", section(&[1])).is_err());
    assert!(s.close().is_err());

    // The completion timer was cancelled by close.
    let seq = s.sequence(a).unwrap();
    assert!(seq.is_active(0));
    assert!(!seq.is_animation_complete(0));
}

#[test]
fn unknown_key_is_a_session_error() {
    let mut s = ScrollSession::open(SessionOpts::default());
    let a = s.add_sequence("a", section(&[1])).unwrap();
    let mut other = ScrollSession::open(SessionOpts::default());
    assert!(matches!(other.attach(a), Err(SeqError::Session(_))));
    assert!(other.sequence(a).is_err());
    assert!(s.attach(a).is_ok());
}
