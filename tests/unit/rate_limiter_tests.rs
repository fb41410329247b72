/*!
 * Tests for the fixed-window rate limiter
 */

use std::sync::Arc;
use std::time::Duration;

use narrato::app_config::RateLimitConfig;
use narrato::errors::RateLimited;
use narrato::rate_limiter::{FixedWindowRateLimiter, ManualClock};

fn limiter(capacity: u32, window_secs: u64) -> (Arc<ManualClock>, FixedWindowRateLimiter) {
    let clock = Arc::new(ManualClock::new());
    let limiter = FixedWindowRateLimiter::new(capacity, Duration::from_secs(window_secs), clock.clone());
    (clock, limiter)
}

#[test]
fn test_tryAcquire_afterCapacityGrants_shouldRejectUntilWindowElapses() {
    let (clock, limiter) = limiter(10, 60);

    for _ in 0..10 {
        assert!(limiter.try_acquire().is_ok());
    }
    assert_eq!(limiter.try_acquire(), Err(RateLimited { retry_after_secs: 60 }));

    clock.advance(Duration::from_secs(60));
    assert!(limiter.try_acquire().is_ok());
    assert_eq!(limiter.count(), 1);
}

#[test]
fn test_tryAcquire_retryAfter_shouldRoundUpPartialSeconds() {
    let (clock, limiter) = limiter(1, 60);
    limiter.try_acquire().unwrap();

    clock.advance(Duration::from_millis(58_500));
    assert_eq!(limiter.try_acquire(), Err(RateLimited { retry_after_secs: 2 }));

    clock.advance(Duration::from_millis(1_499));
    assert_eq!(limiter.try_acquire(), Err(RateLimited { retry_after_secs: 1 }));
}

#[test]
fn test_tryAcquire_burstAfterReset_shouldGrantFullCapacity() {
    let (clock, limiter) = limiter(3, 10);
    for _ in 0..3 {
        limiter.try_acquire().unwrap();
    }

    clock.advance(Duration::from_secs(25));
    for _ in 0..3 {
        assert!(limiter.try_acquire().is_ok());
    }
    assert!(limiter.try_acquire().is_err());
}

#[test]
fn test_fromConfig_shouldUseConfiguredBudget() {
    let limiter = FixedWindowRateLimiter::from_config(&RateLimitConfig {
        capacity: 4,
        window_secs: 30,
    });

    assert_eq!(limiter.capacity(), 4);
    assert_eq!(limiter.window(), Duration::from_secs(30));
}
