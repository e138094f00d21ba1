use std::{
    thread,
    time::{Duration, Instant},
};

use tracing::debug;

/// Source of time for the limiter and the gateway's retry sleeps.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        thread::sleep(d);
    }
}

/// Enforces a minimum interval between the starts of consecutive calls.
///
/// One limiter per build. Not synchronized: builds are single-threaded.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    clock: C,
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(clock: C, min_interval: Duration) -> Self {
        Self {
            clock,
            min_interval,
            last_call: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until `min_interval` has passed since the previous turn.
    pub fn wait_turn(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!("rate limit: sleeping {:.1}s", remaining.as_secs_f64());
                self.clock.sleep(remaining);
            }
        }
        self.last_call = Some(self.clock.now());
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeClock;
    use super::*;

    #[test]
    fn first_turn_does_not_sleep() {
        let clock = FakeClock::new();
        let mut limiter = RateLimiter::new(clock.clone(), Duration::from_secs(90));
        limiter.wait_turn();
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn sleeps_for_the_remaining_interval() {
        let clock = FakeClock::new();
        let mut limiter = RateLimiter::new(clock.clone(), Duration::from_secs(90));

        limiter.wait_turn();
        clock.advance(Duration::from_secs(5));
        limiter.wait_turn();

        assert_eq!(clock.sleeps(), vec![Duration::from_secs(85)]);
        assert_eq!(clock.elapsed(), Duration::from_secs(90));
    }

    #[test]
    fn no_sleep_once_interval_has_passed() {
        let clock = FakeClock::new();
        let mut limiter = RateLimiter::new(clock.clone(), Duration::from_secs(10));

        limiter.wait_turn();
        clock.advance(Duration::from_secs(11));
        limiter.wait_turn();

        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn consecutive_turns_are_spaced_by_the_interval() {
        let clock = FakeClock::new();
        let mut limiter = RateLimiter::new(clock.clone(), Duration::from_secs(10));

        let mut starts = Vec::new();
        for _ in 0..3 {
            limiter.wait_turn();
            starts.push(clock.elapsed());
        }

        assert_eq!(
            starts,
            vec![Duration::ZERO, Duration::from_secs(10), Duration::from_secs(20)]
        );
    }
}
