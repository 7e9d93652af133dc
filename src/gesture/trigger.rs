use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use super::{
    config::{EXPIRY_DELAY_MS, PRIVILEGED_ROUTE, TAP_LOG_CAPACITY},
    trace::GestureTraceSample,
    types::{
        ActionBuffer, AttemptId, DisplayCounter, GestureAction, GestureStateId, RejectReason,
        ResetReason, TapLog,
    },
};

#[derive(Clone, Copy, Debug)]
enum GestureEvent {
    Tap { now_ms: u64 },
    ExpiryCheck { now_ms: u64 },
    AuthResolved { attempt: AttemptId, granted: bool },
    Unmount,
}

#[derive(Default)]
struct DispatchContext {
    actions: ActionBuffer,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GestureOutput {
    pub actions: ActionBuffer,
    pub trace: GestureTraceSample,
}

/// Hidden title-tap detector.
///
/// Purely reactive: callers feed taps, expiry checks and authentication
/// results with the current time and carry out the returned actions.
pub struct GestureTrigger {
    machine: statig::blocking::StateMachine<GestureHsm>,
}

impl Default for GestureTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureTrigger {
    pub fn new() -> Self {
        Self {
            machine: GestureHsm::new().state_machine(),
        }
    }

    pub fn tap(&mut self, now_ms: u64) -> GestureOutput {
        self.dispatch(GestureEvent::Tap { now_ms })
    }

    pub fn expiry_check(&mut self, now_ms: u64) -> GestureOutput {
        self.dispatch(GestureEvent::ExpiryCheck { now_ms })
    }

    pub fn auth_resolved(&mut self, attempt: AttemptId, granted: bool) -> GestureOutput {
        self.dispatch(GestureEvent::AuthResolved { attempt, granted })
    }

    pub fn unmount(&mut self) -> GestureOutput {
        self.dispatch(GestureEvent::Unmount)
    }

    pub fn tap_log(&self) -> &TapLog {
        &self.machine.inner().log
    }

    pub fn display_counter(&self) -> u8 {
        self.machine.inner().counter.value()
    }

    pub fn is_mounted(&self) -> bool {
        self.machine.inner().mounted
    }

    pub fn last_trace(&self) -> GestureTraceSample {
        self.machine.inner().last_trace
    }

    fn dispatch(&mut self, event: GestureEvent) -> GestureOutput {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        GestureOutput {
            actions: context.actions,
            trace: self.machine.inner().last_trace,
        }
    }
}

struct GestureHsm {
    log: TapLog,
    counter: DisplayCounter,
    next_attempt: u32,
    last_attempt: Option<AttemptId>,
    mounted: bool,
    last_trace: GestureTraceSample,
}

impl GestureHsm {
    fn new() -> Self {
        Self {
            log: TapLog::new(),
            counter: DisplayCounter::default(),
            next_attempt: 1,
            last_attempt: None,
            mounted: true,
            last_trace: GestureTraceSample::default(),
        }
    }

    fn update_trace(
        &mut self,
        state_id: GestureStateId,
        now_ms: u64,
        reject_reason: RejectReason,
        qualified: bool,
    ) {
        self.last_trace = GestureTraceSample {
            now_ms,
            state_id,
            reject_reason,
            tap_count: self.log.len() as u8,
            span_ms: self.log.span_ms(),
            display_counter: self.counter.value(),
            qualified: if qualified { 1 } else { 0 },
            last_attempt: self.last_attempt,
        };
    }

    fn reject_with_reason(&mut self, state_id: GestureStateId, reason: RejectReason) {
        let now_ms = self.last_trace.now_ms;
        self.update_trace(state_id, now_ms, reason, false);
    }

    fn clear_log(&mut self, context: &mut DispatchContext, reason: ResetReason) {
        self.log.clear();
        self.counter.reset();
        context
            .actions
            .push(GestureAction::LogCleared { reason });
    }

    fn issue_attempt(&mut self) -> AttemptId {
        let attempt = AttemptId(self.next_attempt);
        self.next_attempt = self.next_attempt.wrapping_add(1);
        self.last_attempt = Some(attempt);
        attempt
    }

    /// Records a tap and runs the qualification check. Returns `true` when the
    /// tap completed a qualifying sequence.
    fn handle_tap(
        &mut self,
        context: &mut DispatchContext,
        state_id: GestureStateId,
        now_ms: u64,
    ) -> bool {
        let at = self.log.record(now_ms);
        let qualified = self.log.is_qualifying();

        if qualified {
            let span_ms = self.log.span_ms();
            let attempt = self.issue_attempt();
            self.clear_log(context, ResetReason::Qualified);
            context
                .actions
                .push(GestureAction::Authenticate { attempt });
            log::debug!(
                "gesture: qualified attempt={} span_ms={}",
                attempt.0,
                span_ms
            );
        }
        // Runs after any reset, so the qualifying tap shows as the first of the
        // next sequence.
        self.counter.advance();
        context
            .actions
            .push(GestureAction::CounterChanged(self.counter.value()));
        context.actions.push(GestureAction::ScheduleExpiry {
            due_ms: at.saturating_add(EXPIRY_DELAY_MS),
        });

        let reason = if qualified {
            RejectReason::None
        } else if self.log.len() < TAP_LOG_CAPACITY {
            RejectReason::TooFewTaps
        } else {
            RejectReason::WindowTooWide
        };
        self.update_trace(state_id, at, reason, qualified);
        qualified
    }
}

#[state_machine(initial = "State::idle()")]
impl GestureHsm {
    #[state(superstate = "mounted")]
    fn idle(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        match event {
            GestureEvent::Tap { now_ms } => {
                if self.handle_tap(context, GestureStateId::Idle, *now_ms) {
                    return Handled;
                }
                Transition(State::collecting())
            }
            GestureEvent::ExpiryCheck { now_ms } => {
                self.update_trace(GestureStateId::Idle, *now_ms, RejectReason::LogEmpty, false);
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "mounted")]
    fn collecting(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureEvent,
    ) -> Outcome<State> {
        match event {
            GestureEvent::Tap { now_ms } => {
                if self.handle_tap(context, GestureStateId::Collecting, *now_ms) {
                    return Transition(State::idle());
                }
                Handled
            }
            GestureEvent::ExpiryCheck { now_ms } => {
                let Some(newest) = self.log.newest() else {
                    self.update_trace(
                        GestureStateId::Idle,
                        *now_ms,
                        RejectReason::LogEmpty,
                        false,
                    );
                    return Transition(State::idle());
                };

                let idle_ms = now_ms.saturating_sub(newest);
                if idle_ms <= EXPIRY_DELAY_MS {
                    self.update_trace(
                        GestureStateId::Collecting,
                        *now_ms,
                        RejectReason::StillFresh,
                        false,
                    );
                    return Handled;
                }

                log::debug!(
                    "gesture: sequence_expired taps={} idle_ms={}",
                    self.log.len(),
                    idle_ms
                );
                self.clear_log(context, ResetReason::Expired);
                context.actions.push(GestureAction::CounterChanged(0));
                self.update_trace(GestureStateId::Idle, *now_ms, RejectReason::None, false);
                Transition(State::idle())
            }
            _ => Super,
        }
    }

    #[state]
    fn unmounted(&mut self, event: &GestureEvent) -> Outcome<State> {
        let now_ms = match event {
            GestureEvent::Tap { now_ms } | GestureEvent::ExpiryCheck { now_ms } => *now_ms,
            GestureEvent::AuthResolved { .. } | GestureEvent::Unmount => self.last_trace.now_ms,
        };
        self.update_trace(
            GestureStateId::Unmounted,
            now_ms,
            RejectReason::Unmounted,
            false,
        );
        Handled
    }

    #[superstate]
    fn mounted(&mut self, context: &mut DispatchContext, event: &GestureEvent) -> Outcome<State> {
        let state_id = self.last_trace.state_id;
        match event {
            GestureEvent::AuthResolved { attempt, granted } => {
                if *granted {
                    log::info!("gesture: access_granted attempt={}", attempt.0);
                    context.actions.push(GestureAction::Navigate {
                        target: PRIVILEGED_ROUTE,
                    });
                    self.reject_with_reason(state_id, RejectReason::None);
                } else {
                    // Denial stays silent towards the user.
                    log::debug!("gesture: access_denied attempt={}", attempt.0);
                    self.reject_with_reason(state_id, RejectReason::AuthDenied);
                }
                Handled
            }
            GestureEvent::Unmount => {
                self.mounted = false;
                self.clear_log(context, ResetReason::Unmounted);
                log::debug!("gesture: unmounted");
                self.reject_with_reason(GestureStateId::Unmounted, RejectReason::Unmounted);
                Transition(State::unmounted())
            }
            _ => Super,
        }
    }
}

#[cfg(test)]
mod tests;
