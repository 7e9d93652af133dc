use super::*;

fn tap_all(trigger: &mut GestureTrigger, times_ms: &[u64]) -> std::vec::Vec<GestureOutput> {
    times_ms.iter().map(|&t| trigger.tap(t)).collect()
}

fn log_entries(trigger: &GestureTrigger) -> std::vec::Vec<u64> {
    trigger.tap_log().iter().copied().collect()
}

#[test]
fn five_fast_taps_request_authentication_once() {
    let mut trigger = GestureTrigger::new();
    let outputs = tap_all(&mut trigger, &[0, 500, 1_000, 1_500, 2_000]);

    for output in &outputs[..4] {
        assert_eq!(output.actions.authenticate_attempt(), None);
    }
    let fifth = outputs[4];
    assert_eq!(fifth.actions.authenticate_attempt(), Some(AttemptId(1)));
    assert_eq!(fifth.actions.cleared_reason(), Some(ResetReason::Qualified));
    assert_eq!(fifth.actions.counter_value(), Some(1));
    assert_eq!(fifth.actions.expiry_due_ms(), Some(5_000));
    assert_eq!(fifth.trace.qualified, 1);
    assert!(trigger.tap_log().is_empty());
    assert_eq!(trigger.display_counter(), 1);

    let granted = trigger.auth_resolved(AttemptId(1), true);
    assert_eq!(granted.actions.navigate_target(), Some(PRIVILEGED_ROUTE));
    assert_eq!(granted.actions.len(), 1);
}

#[test]
fn span_just_under_window_qualifies() {
    let mut trigger = GestureTrigger::new();
    let outputs = tap_all(&mut trigger, &[0, 1_000, 2_000, 2_500, 2_999]);

    assert_eq!(outputs[4].actions.authenticate_attempt(), Some(AttemptId(1)));
}

#[test]
fn span_equal_to_window_does_not_qualify() {
    let mut trigger = GestureTrigger::new();
    let outputs = tap_all(&mut trigger, &[0, 1_000, 2_000, 2_500, 3_000]);

    assert_eq!(outputs[4].actions.authenticate_attempt(), None);
    assert_eq!(outputs[4].trace.reject_reason, RejectReason::WindowTooWide);
    assert_eq!(outputs[4].trace.span_ms, 3_000);
    assert_eq!(trigger.tap_log().len(), 5);
}

#[test]
fn slow_sequence_keeps_sliding_window() {
    let mut trigger = GestureTrigger::new();
    let outputs = tap_all(&mut trigger, &[0, 800, 1_600, 2_400, 3_200]);

    assert!(outputs
        .iter()
        .all(|output| output.actions.authenticate_attempt().is_none()));
    assert_eq!(log_entries(&trigger), [0, 800, 1_600, 2_400, 3_200]);

    let sixth = trigger.tap(4_000);
    assert_eq!(sixth.actions.authenticate_attempt(), None);
    assert_eq!(log_entries(&trigger), [800, 1_600, 2_400, 3_200, 4_000]);

    // Window 1600..4100 spans 2500 ms.
    let seventh = trigger.tap(4_100);
    assert_eq!(seventh.actions.authenticate_attempt(), Some(AttemptId(1)));
    assert!(trigger.tap_log().is_empty());
}

#[test]
fn log_length_is_capped_at_five() {
    let mut trigger = GestureTrigger::new();
    for n in 0..10u64 {
        let output = trigger.tap(n * 1_000);
        assert_eq!(output.actions.authenticate_attempt(), None);
        assert_eq!(trigger.tap_log().len(), core::cmp::min(n as usize + 1, 5));
    }
}

#[test]
fn next_qualification_needs_five_new_taps() {
    let mut trigger = GestureTrigger::new();
    let first = tap_all(&mut trigger, &[0, 100, 200, 300, 400]);
    assert_eq!(first[4].actions.authenticate_attempt(), Some(AttemptId(1)));

    let partial = tap_all(&mut trigger, &[500, 600, 700, 800]);
    assert!(partial
        .iter()
        .all(|output| output.actions.authenticate_attempt().is_none()));
    assert_eq!(trigger.tap_log().len(), 4);

    let completing = trigger.tap(900);
    assert_eq!(completing.actions.authenticate_attempt(), Some(AttemptId(2)));
}

#[test]
fn expiry_check_on_empty_log_is_noop() {
    let mut trigger = GestureTrigger::new();

    for now_ms in [10_000, 10_000, 20_000] {
        let output = trigger.expiry_check(now_ms);
        assert!(output.actions.is_empty());
        assert_eq!(output.trace.reject_reason, RejectReason::LogEmpty);
        assert!(trigger.tap_log().is_empty());
    }
}

#[test]
fn abandoned_sequence_is_cleared_by_expiry() {
    let mut trigger = GestureTrigger::new();
    let _ = tap_all(&mut trigger, &[0, 100, 200, 300]);
    assert_eq!(trigger.display_counter(), 4);

    // Scheduled by the first tap; the newest tap is still recent.
    let early = trigger.expiry_check(3_001);
    assert!(early.actions.is_empty());
    assert_eq!(early.trace.reject_reason, RejectReason::StillFresh);
    assert_eq!(trigger.tap_log().len(), 4);

    let stale = trigger.expiry_check(3_301);
    assert_eq!(stale.actions.cleared_reason(), Some(ResetReason::Expired));
    assert_eq!(stale.actions.counter_value(), Some(0));
    assert!(trigger.tap_log().is_empty());
    assert_eq!(trigger.display_counter(), 0);

    let fresh = trigger.tap(3_400);
    assert_eq!(fresh.trace.tap_count, 1);
    assert_eq!(trigger.display_counter(), 1);
}

#[test]
fn expiry_exactly_at_window_keeps_sequence() {
    let mut trigger = GestureTrigger::new();
    let _ = tap_all(&mut trigger, &[0, 100, 200, 300]);

    let output = trigger.expiry_check(3_300);
    assert!(output.actions.is_empty());
    assert_eq!(trigger.tap_log().len(), 4);
}

#[test]
fn denied_authentication_is_silent_and_allows_retry() {
    let mut trigger = GestureTrigger::new();
    let _ = tap_all(&mut trigger, &[0, 100, 200, 300, 400]);

    let denied = trigger.auth_resolved(AttemptId(1), false);
    assert!(denied.actions.is_empty());
    assert_eq!(denied.trace.reject_reason, RejectReason::AuthDenied);
    assert!(trigger.tap_log().is_empty());
    assert_eq!(trigger.display_counter(), 1);

    let retry = tap_all(&mut trigger, &[450, 500, 550, 600, 650]);
    assert_eq!(retry[4].actions.authenticate_attempt(), Some(AttemptId(2)));
}

#[test]
fn tap_during_pending_authentication_starts_fresh_count() {
    let mut trigger = GestureTrigger::new();
    let _ = tap_all(&mut trigger, &[0, 100, 200, 300, 400]);

    let during = trigger.tap(450);
    assert_eq!(during.actions.authenticate_attempt(), None);
    assert_eq!(during.trace.tap_count, 1);
    assert_eq!(during.trace.state_id, GestureStateId::Idle);
    assert_eq!(during.trace.display_counter, 2);

    let granted = trigger.auth_resolved(AttemptId(1), true);
    assert_eq!(granted.actions.navigate_target(), Some(PRIVILEGED_ROUTE));
    assert_eq!(log_entries(&trigger), [450]);
}

#[test]
fn display_counter_wraps_after_four() {
    let mut trigger = GestureTrigger::new();
    let counters: std::vec::Vec<u8> = (0..6u64)
        .map(|n| trigger.tap(n * 10_000).actions.counter_value().unwrap_or(u8::MAX))
        .collect();

    assert_eq!(counters, [1, 2, 3, 4, 0, 1]);
}

#[test]
fn unmount_ignores_late_callbacks() {
    let mut trigger = GestureTrigger::new();
    let _ = tap_all(&mut trigger, &[0, 100, 200, 300, 400]);
    let _ = trigger.tap(500);

    let unmounted = trigger.unmount();
    assert_eq!(
        unmounted.actions.cleared_reason(),
        Some(ResetReason::Unmounted)
    );
    assert!(!trigger.is_mounted());
    assert!(trigger.tap_log().is_empty());

    let late_auth = trigger.auth_resolved(AttemptId(1), true);
    assert!(late_auth.actions.is_empty());
    assert_eq!(late_auth.trace.reject_reason, RejectReason::Unmounted);

    let late_tap = trigger.tap(600);
    assert!(late_tap.actions.is_empty());
    assert!(trigger.tap_log().is_empty());

    let late_expiry = trigger.expiry_check(9_000);
    assert!(late_expiry.actions.is_empty());
    assert_eq!(late_expiry.trace.state_id, GestureStateId::Unmounted);
}

#[test]
fn clock_regression_keeps_log_ordered() {
    let mut trigger = GestureTrigger::new();
    let _ = tap_all(&mut trigger, &[1_000, 900, 1_200]);

    assert_eq!(log_entries(&trigger), [1_000, 1_000, 1_200]);
}
