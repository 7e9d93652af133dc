//! Cooperative driver that connects [`GestureTrigger`] to a tap source, a clock
//! and the authentication/navigation collaborators.
//!
//! Everything runs on one executor: taps, expiry checks and the authentication
//! continuation are interleaved, never concurrent.

use core::{future::pending, pin::pin};

use embassy_futures::select::{select3, select4, Either3, Either4};
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel, signal::Signal};
use heapless::Deque;

use crate::gesture::{
    config::{
        EXPIRY_QUEUE_DEPTH, EXPIRY_SLACK_MS, TAP_INPUT_DEPTH, TRACE_CHANNEL_DEPTH,
    },
    AttemptId, AuthGate, Clock, GestureAction, GestureOutput, GestureTraceSample,
    GestureTrigger, Navigator,
};

/// One tap on the header title.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tap;

pub type TapChannel<M> = Channel<M, Tap, TAP_INPUT_DEPTH>;
pub type TraceChannel<M> = Channel<M, GestureTraceSample, TRACE_CHANNEL_DEPTH>;

pub struct GestureIo<'a, M: RawMutex> {
    pub taps: &'a TapChannel<M>,
    pub unmount: &'a Signal<M, ()>,
    pub counter: Option<&'a Signal<M, u8>>,
    pub traces: Option<&'a TraceChannel<M>>,
}

/// Qualifications waiting for their `authenticate()` call.
///
/// The detector issues attempt ids in sequence and the runtime serves them in
/// the same order, so the backlog is always a contiguous run of ids. Holding
/// the first id and a count keeps every qualification without a capacity limit.
#[derive(Default)]
struct AttemptQueue {
    head: u32,
    len: u32,
}

impl AttemptQueue {
    fn enqueue(&mut self, attempt: AttemptId) {
        if self.len == 0 {
            self.head = attempt.0;
        } else {
            debug_assert_eq!(attempt.0, self.head.wrapping_add(self.len));
        }
        self.len = self.len.saturating_add(1);
    }

    fn next(&mut self) -> Option<AttemptId> {
        if self.len == 0 {
            return None;
        }
        let attempt = AttemptId(self.head);
        self.head = self.head.wrapping_add(1);
        self.len -= 1;
        Some(attempt)
    }

    fn len(&self) -> usize {
        self.len as usize
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

#[derive(Default)]
struct ExpiryQueue {
    deadlines: Deque<u64, EXPIRY_QUEUE_DEPTH>,
}

impl ExpiryQueue {
    fn schedule(&mut self, due_ms: u64) {
        // An older check can never clear the log once a newer tap exists, so
        // dropping the earliest deadline is harmless.
        if self.deadlines.is_full() {
            let _ = self.deadlines.pop_front();
        }
        let _ = self.deadlines.push_back(due_ms);
    }

    fn next_due(&self) -> Option<u64> {
        self.deadlines.front().copied()
    }

    fn pop_due(&mut self) {
        let _ = self.deadlines.pop_front();
    }

    fn len(&self) -> usize {
        self.deadlines.len()
    }

    fn clear(&mut self) {
        self.deadlines.clear();
    }
}

async fn wait_for_deadline<C: Clock>(clock: &C, due_ms: Option<u64>) {
    match due_ms {
        Some(due_ms) => clock.sleep_until(due_ms).await,
        None => pending::<()>().await,
    }
}

pub struct GestureRuntime<'a, C, A, N> {
    trigger: GestureTrigger,
    clock: &'a C,
    auth: &'a A,
    navigator: N,
    expiries: ExpiryQueue,
    attempts: AttemptQueue,
}

impl<'a, C, A, N> GestureRuntime<'a, C, A, N>
where
    C: Clock,
    A: AuthGate,
    N: Navigator,
{
    pub fn new(clock: &'a C, auth: &'a A, navigator: N) -> Self {
        Self {
            trigger: GestureTrigger::new(),
            clock,
            auth,
            navigator,
            expiries: ExpiryQueue::default(),
            attempts: AttemptQueue::default(),
        }
    }

    pub fn trigger(&self) -> &GestureTrigger {
        &self.trigger
    }

    pub fn pending_expiry_checks(&self) -> usize {
        self.expiries.len()
    }

    /// Serves taps until the unmount signal fires. Outstanding expiry checks
    /// and any in-flight authentication are dropped on the way out.
    pub async fn run<M: RawMutex>(&mut self, io: &GestureIo<'_, M>) {
        log::debug!("gesture: runtime_start");
        loop {
            if let Some(attempt) = self.attempts.next() {
                let Some(granted) = self.serve_attempt(io, attempt).await else {
                    return;
                };
                let output = self.trigger.auth_resolved(attempt, granted);
                self.apply(io, output);
                continue;
            }

            let due_ms = self.expiries.next_due();
            let event = select3(
                io.taps.receive(),
                wait_for_deadline(self.clock, due_ms),
                io.unmount.wait(),
            )
            .await;
            match event {
                Either3::First(Tap) => self.on_tap(io),
                Either3::Second(()) => self.on_expiry(io),
                Either3::Third(()) => {
                    self.on_unmount(io);
                    return;
                }
            }
        }
    }

    /// Keeps serving taps and expiry checks while `attempt` authenticates.
    /// Returns `None` when unmounted before the verdict arrives.
    async fn serve_attempt<M: RawMutex>(
        &mut self,
        io: &GestureIo<'_, M>,
        attempt: AttemptId,
    ) -> Option<bool> {
        log::debug!("gesture: authenticate_start attempt={}", attempt.0);
        let auth = self.auth;
        let mut verdict = pin!(auth.authenticate());
        loop {
            let due_ms = self.expiries.next_due();
            let event = select4(
                io.taps.receive(),
                wait_for_deadline(self.clock, due_ms),
                io.unmount.wait(),
                verdict.as_mut(),
            )
            .await;
            match event {
                Either4::First(Tap) => self.on_tap(io),
                Either4::Second(()) => self.on_expiry(io),
                Either4::Third(()) => {
                    log::debug!("gesture: authenticate_cancelled attempt={}", attempt.0);
                    self.on_unmount(io);
                    return None;
                }
                Either4::Fourth(granted) => return Some(granted),
            }
        }
    }

    fn on_tap<M: RawMutex>(&mut self, io: &GestureIo<'_, M>) {
        let output = self.trigger.tap(self.clock.now_ms());
        self.apply(io, output);
    }

    fn on_expiry<M: RawMutex>(&mut self, io: &GestureIo<'_, M>) {
        self.expiries.pop_due();
        let output = self.trigger.expiry_check(self.clock.now_ms());
        self.apply(io, output);
    }

    fn on_unmount<M: RawMutex>(&mut self, io: &GestureIo<'_, M>) {
        self.expiries.clear();
        self.attempts.clear();
        let output = self.trigger.unmount();
        self.apply(io, output);
        log::debug!("gesture: runtime_stop");
    }

    fn apply<M: RawMutex>(&mut self, io: &GestureIo<'_, M>, output: GestureOutput) {
        for action in output.actions.iter() {
            match *action {
                GestureAction::Authenticate { attempt } => {
                    self.attempts.enqueue(attempt);
                    log::trace!(
                        "gesture: attempt_queued attempt={} backlog={}",
                        attempt.0,
                        self.attempts.len()
                    );
                }
                GestureAction::Navigate { target } => self.navigator.navigate(target),
                GestureAction::ScheduleExpiry { due_ms } => {
                    self.expiries.schedule(due_ms.saturating_add(EXPIRY_SLACK_MS));
                }
                GestureAction::CounterChanged(value) => {
                    if let Some(counter) = io.counter {
                        counter.signal(value);
                    }
                }
                GestureAction::LogCleared { reason } => {
                    log::trace!("gesture: log_cleared reason={:?}", reason);
                }
            }
        }

        if let Some(traces) = io.traces {
            let _ = traces.try_send(output.trace);
        }
    }
}
