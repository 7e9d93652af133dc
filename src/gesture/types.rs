use heapless::Deque;

use super::config::{DISPLAY_COUNTER_WRAP, QUALIFY_WINDOW_MS, TAP_LOG_CAPACITY};

/// Recent tap timestamps in milliseconds, oldest first.
#[derive(Clone, Debug, Default)]
pub struct TapLog {
    taps: Deque<u64, TAP_LOG_CAPACITY>,
}

impl TapLog {
    pub const fn new() -> Self {
        Self {
            taps: Deque::new(),
        }
    }

    /// Appends a tap, evicting the oldest one when the window is full.
    ///
    /// A clock that steps backwards is clamped to the newest entry so the log
    /// stays non-decreasing. Returns the timestamp actually stored.
    pub fn record(&mut self, now_ms: u64) -> u64 {
        let at = self.newest().map_or(now_ms, |newest| now_ms.max(newest));
        if self.taps.is_full() {
            let _ = self.taps.pop_front();
        }
        // Cannot fail: a slot was freed above when the deque was full.
        let _ = self.taps.push_back(at);
        at
    }

    pub fn clear(&mut self) {
        self.taps.clear();
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn oldest(&self) -> Option<u64> {
        self.taps.front().copied()
    }

    pub fn newest(&self) -> Option<u64> {
        self.taps.back().copied()
    }

    pub fn span_ms(&self) -> u64 {
        match (self.oldest(), self.newest()) {
            (Some(oldest), Some(newest)) => newest.saturating_sub(oldest),
            _ => 0,
        }
    }

    pub fn is_qualifying(&self) -> bool {
        self.taps.len() == TAP_LOG_CAPACITY && self.span_ms() < QUALIFY_WINDOW_MS
    }

    pub fn iter(&self) -> impl Iterator<Item = &u64> {
        self.taps.iter()
    }
}

/// Cosmetic tap counter for the header's debug indicator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DisplayCounter(u8);

impl DisplayCounter {
    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 = if self.0 < DISPLAY_COUNTER_WRAP {
            self.0 + 1
        } else {
            0
        };
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct AttemptId(pub u32);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum ResetReason {
    Qualified = 1,
    Expired = 2,
    Unmounted = 3,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GestureAction {
    Authenticate { attempt: AttemptId },
    Navigate { target: &'static str },
    ScheduleExpiry { due_ms: u64 },
    CounterChanged(u8),
    LogCleared { reason: ResetReason },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActionBuffer {
    len: usize,
    slots: [Option<GestureAction>; Self::MAX],
}

impl ActionBuffer {
    pub const MAX: usize = 4;

    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [None; Self::MAX],
        }
    }

    pub fn push(&mut self, action: GestureAction) {
        if self.len >= Self::MAX {
            log::warn!("gesture: action_buffer_full dropped={:?}", action);
            return;
        }
        self.slots[self.len] = Some(action);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureAction> {
        self.slots[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn authenticate_attempt(&self) -> Option<AttemptId> {
        self.iter().find_map(|action| match action {
            GestureAction::Authenticate { attempt } => Some(*attempt),
            _ => None,
        })
    }

    pub fn navigate_target(&self) -> Option<&'static str> {
        self.iter().find_map(|action| match action {
            GestureAction::Navigate { target } => Some(*target),
            _ => None,
        })
    }

    pub fn expiry_due_ms(&self) -> Option<u64> {
        self.iter().find_map(|action| match action {
            GestureAction::ScheduleExpiry { due_ms } => Some(*due_ms),
            _ => None,
        })
    }

    pub fn counter_value(&self) -> Option<u8> {
        self.iter().find_map(|action| match action {
            GestureAction::CounterChanged(value) => Some(*value),
            _ => None,
        })
    }

    pub fn cleared_reason(&self) -> Option<ResetReason> {
        self.iter().find_map(|action| match action {
            GestureAction::LogCleared { reason } => Some(*reason),
            _ => None,
        })
    }
}

impl Default for ActionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum RejectReason {
    #[default]
    None = 0,
    TooFewTaps = 1,
    WindowTooWide = 2,
    LogEmpty = 3,
    StillFresh = 4,
    AuthDenied = 5,
    Unmounted = 6,
}

impl RejectReason {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum GestureStateId {
    #[default]
    Idle = 0,
    Collecting = 1,
    Unmounted = 2,
}

impl GestureStateId {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}
