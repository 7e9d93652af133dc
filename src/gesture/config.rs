/// Taps kept in the sliding window; exactly this many are needed to qualify.
pub const TAP_LOG_CAPACITY: usize = 5;
/// Oldest-to-newest span must stay strictly below this to qualify.
pub const QUALIFY_WINDOW_MS: u64 = 3_000;
/// Delay between a tap and the expiry check it schedules.
pub const EXPIRY_DELAY_MS: u64 = 3_000;
// Timers may fire exactly on the deadline; the check compares with `>`, so the
// runtime waits one extra millisecond to see an abandoned tap as stale.
pub const EXPIRY_SLACK_MS: u64 = 1;
/// The debug counter wraps back to zero after showing this value.
pub const DISPLAY_COUNTER_WRAP: u8 = 4;
/// Destination for a granted gesture.
pub const PRIVILEGED_ROUTE: &str = "/seguranca";

pub const TAP_INPUT_DEPTH: usize = 8;
pub const EXPIRY_QUEUE_DEPTH: usize = 8;
pub const TRACE_CHANNEL_DEPTH: usize = 16;
