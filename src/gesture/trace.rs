use super::types::{AttemptId, GestureStateId, RejectReason};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GestureTraceSample {
    pub now_ms: u64,
    pub state_id: GestureStateId,
    pub reject_reason: RejectReason,
    pub tap_count: u8,
    pub span_ms: u64,
    pub display_counter: u8,
    pub qualified: u8,
    pub last_attempt: Option<AttemptId>,
}
