/*!
 * Process-wide admission control for the generative capability.
 *
 * A fixed-window counter: up to `capacity` acquisitions are granted per window
 * of `window` length. Bursts of `capacity` right after a reset are allowed.
 * One limiter is built per process and shared by reference with every
 * narrator, so all requests draw from the same budget.
 */

use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

use crate::app_config::RateLimitConfig;
use crate::errors::RateLimited;

/// Source of monotonic time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Wall-independent clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

#[derive(Debug)]
struct WindowState {
    count: u32,
    window_reset_at: Instant,
}

/// Fixed-window rate limiter
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    capacity: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<WindowState>,
}

impl FixedWindowRateLimiter {
    /// Default number of grants per window
    pub const DEFAULT_CAPACITY: u32 = 10;

    /// Default window length
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

    /// Create a limiter; the first window starts now
    pub fn new(capacity: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let window_reset_at = clock.now() + window;
        Self {
            capacity,
            window,
            clock,
            state: Mutex::new(WindowState {
                count: 0,
                window_reset_at,
            }),
        }
    }

    /// Create a limiter on the monotonic clock from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.capacity,
            Duration::from_secs(config.window_secs),
            Arc::new(MonotonicClock),
        )
    }

    /// Try to take one unit of budget from the current window
    pub fn try_acquire(&self) -> Result<(), RateLimited> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if now >= state.window_reset_at {
            state.count = 0;
            state.window_reset_at = now + self.window;
        }

        if state.count >= self.capacity {
            let remaining = state.window_reset_at.saturating_duration_since(now);
            let retry_after_secs = remaining.as_millis().div_ceil(1000) as u64;
            debug!(
                "Rate limit reached ({}/{}), retry in {}s",
                state.count, self.capacity, retry_after_secs
            );
            return Err(RateLimited { retry_after_secs });
        }

        state.count += 1;
        Ok(())
    }

    /// Grants consumed in the current window
    pub fn count(&self) -> u32 {
        self.state.lock().count
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for FixedWindowRateLimiter {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_CAPACITY,
            Self::DEFAULT_WINDOW,
            Arc::new(MonotonicClock),
        )
    }
}
