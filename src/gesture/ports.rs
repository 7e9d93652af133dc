use embassy_time::{Instant, Timer};

/// Monotonic millisecond time source plus the ability to wait for a deadline.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now_ms(&self) -> u64;

    async fn sleep_until(&self, deadline_ms: u64);
}

/// Privileged-access authentication. `false` means "do not navigate".
#[allow(async_fn_in_trait)]
pub trait AuthGate {
    async fn authenticate(&self) -> bool;
}

pub trait Navigator {
    fn navigate(&mut self, target: &str);
}

/// Clock backed by the embassy time driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    async fn sleep_until(&self, deadline_ms: u64) {
        Timer::at(Instant::from_millis(deadline_ms)).await;
    }
}
