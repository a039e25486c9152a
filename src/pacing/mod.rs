//! Request pacing for the synthesis provider.
//!
//! [`RateLimiter`] keeps a rolling window of request timestamps and blocks
//! the caller in [`RateLimiter::throttle`] once the window is full.  It is
//! advisory backpressure for a single sequential caller, not an admission
//! gate: nothing here is synchronised.
//!
//! Time comes from a [`Clock`] so tests can drive the limiter without
//! sleeping.
//!
//! ```rust
//! use std::time::Duration;
//! use podcast_gen::pacing::RateLimiter;
//!
//! let mut limiter = RateLimiter::new(3, Duration::from_secs(60), Duration::from_millis(50));
//! limiter.throttle(); // first three calls return immediately
//! assert_eq!(limiter.in_window(), 1);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::PacingConfig;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Monotonic time source.
pub trait Clock: Send {
    /// Time elapsed since the clock's own origin.
    fn now(&self) -> Duration;
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by [`Instant`] and `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// RateLimiter
// ---------------------------------------------------------------------------

/// Rolling-window request limiter.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    margin: Duration,
    stamps: VecDeque<Duration>,
    clock: Box<dyn Clock>,
}

impl RateLimiter {
    /// Limiter on the system clock.
    pub fn new(max_requests: usize, window: Duration, margin: Duration) -> Self {
        Self::with_clock(max_requests, window, margin, Box::new(SystemClock::new()))
    }

    /// Limiter on an injected clock.
    pub fn with_clock(
        max_requests: usize,
        window: Duration,
        margin: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            max_requests,
            window,
            margin,
            stamps: VecDeque::with_capacity(max_requests + 1),
            clock,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(config.window_secs),
            Duration::from_millis(config.safety_margin_ms),
        )
    }

    /// Record one outgoing request, blocking first if the window is full.
    ///
    /// Timestamps older than the window are pruned from the front.  When
    /// `max_requests` or more remain, the caller sleeps until the oldest one
    /// leaves the window plus the safety margin.  The new timestamp is taken
    /// after any sleep.
    pub fn throttle(&mut self) {
        let now = self.clock.now();
        while let Some(&oldest) = self.stamps.front() {
            if now.saturating_sub(oldest) > self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }

        if self.stamps.len() >= self.max_requests {
            if let Some(&oldest) = self.stamps.front() {
                let wait = (self.window + self.margin).saturating_sub(now.saturating_sub(oldest));
                log::info!(
                    "rate limit reached ({} requests / {:?}); waiting {:.2}s",
                    self.max_requests,
                    self.window,
                    wait.as_secs_f64()
                );
                self.clock.sleep(wait);
            }
        }

        self.stamps.push_back(self.clock.now());
    }

    /// Number of timestamps currently held.
    pub fn in_window(&self) -> usize {
        self.stamps.len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .field("margin", &self.margin)
            .field("in_window", &self.stamps.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ManualClock  (test-only)
// ---------------------------------------------------------------------------

/// A clock that only moves when told to; `sleep` advances it instantly.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: std::sync::Arc<std::sync::Mutex<Duration>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, at: Duration) {
        *self.now.lock().unwrap() = at;
    }

    pub fn get(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.get()
    }

    fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(clock: &ManualClock) -> RateLimiter {
        RateLimiter::with_clock(
            3,
            Duration::from_secs(60),
            Duration::from_millis(50),
            Box::new(clock.clone()),
        )
    }

    #[test]
    fn calls_under_the_ceiling_do_not_block() {
        let clock = ManualClock::new();
        let mut limiter = limiter(&clock);
        for _ in 0..3 {
            limiter.throttle();
        }
        assert_eq!(clock.get(), Duration::ZERO);
        assert_eq!(limiter.in_window(), 3);
    }

    #[test]
    fn fourth_call_blocks_until_oldest_leaves_window() {
        let clock = ManualClock::new();
        let mut limiter = limiter(&clock);
        for _ in 0..3 {
            limiter.throttle();
        }

        clock.set(Duration::from_millis(100));
        limiter.throttle();

        // 60 s window + 50 ms margin, measured from t = 0.
        assert_eq!(clock.get(), Duration::from_millis(60_050));
        assert_eq!(limiter.in_window(), 4);
    }

    #[test]
    fn expired_stamps_are_pruned() {
        let clock = ManualClock::new();
        let mut limiter = limiter(&clock);
        for _ in 0..3 {
            limiter.throttle();
        }

        clock.set(Duration::from_secs(61));
        limiter.throttle();

        assert_eq!(clock.get(), Duration::from_secs(61));
        assert_eq!(limiter.in_window(), 1);
    }

    #[test]
    fn stamp_exactly_at_window_edge_is_kept() {
        let clock = ManualClock::new();
        let mut limiter = limiter(&clock);
        for _ in 0..3 {
            limiter.throttle();
        }

        clock.set(Duration::from_secs(60));
        limiter.throttle();

        // Not strictly older than the window, so the call still waits the margin.
        assert_eq!(clock.get(), Duration::from_millis(60_050));
    }

    #[test]
    fn spaced_calls_never_wait() {
        let clock = ManualClock::new();
        let mut limiter = limiter(&clock);
        for i in 0..10 {
            clock.set(Duration::from_secs(21 * i));
            limiter.throttle();
            assert_eq!(clock.get(), Duration::from_secs(21 * i));
        }
    }

    #[test]
    fn independent_limiters_share_nothing() {
        let clock = ManualClock::new();
        let mut a = limiter(&clock);
        let mut b = limiter(&clock);
        for _ in 0..3 {
            a.throttle();
        }
        b.throttle();
        assert_eq!(clock.get(), Duration::ZERO);
        assert_eq!(b.in_window(), 1);
    }
}
