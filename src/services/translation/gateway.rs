use std::time::Duration;

use tracing::{error, warn};

use super::rate_limit::{Clock, RateLimiter, SystemClock};
use crate::error::LlmError;

/// A hosted language model: one prompt in, raw text out.
///
/// Implementations classify failures as `QuotaExceeded` or
/// `TransientFailure`; retry policy lives in [`Gateway`].
pub trait Backend {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, quota and transient failures alike.
    pub max_attempts: u32,
    pub transient_delay: Duration,
    pub quota_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            transient_delay: Duration::from_secs(10),
            quota_cooldown: Duration::from_secs(90),
        }
    }
}

/// Rate-limited, retrying front door to a [`Backend`].
pub struct Gateway<B: Backend, C: Clock = SystemClock> {
    backend: B,
    limiter: RateLimiter<C>,
    policy: RetryPolicy,
    calls: u64,
}

impl<B: Backend, C: Clock> Gateway<B, C> {
    pub fn new(backend: B, limiter: RateLimiter<C>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            limiter,
            policy,
            calls: 0,
        }
    }

    /// Number of backend requests issued so far, retries included.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }

    pub fn call(&mut self, prompt: &str) -> Result<String, LlmError> {
        let max = self.policy.max_attempts.max(1);
        let mut last = String::new();

        for attempt in 1..=max {
            self.limiter.wait_turn();
            self.calls += 1;

            let err = match self.backend.generate(prompt) {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            let delay = match &err {
                LlmError::QuotaExceeded(msg) => {
                    warn!("model quota exhausted ({attempt}/{max}): {}", snippet(msg));
                    last = msg.clone();
                    self.policy.quota_cooldown
                }
                LlmError::TransientFailure(msg) => {
                    warn!("model call failed ({attempt}/{max}): {}", snippet(msg));
                    last = msg.clone();
                    self.policy.transient_delay
                }
                LlmError::FatalFailure { .. } => return Err(err),
            };

            if attempt < max {
                warn!("retrying in {}s", delay.as_secs());
                self.limiter.clock().sleep(delay);
            }
        }

        error!("model call failed after {max} attempts");
        Err(LlmError::FatalFailure {
            attempts: max,
            last,
        })
    }
}

fn snippet(msg: &str) -> &str {
    match msg.char_indices().nth(500) {
        Some((i, _)) => &msg[..i],
        None => msg,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;
    use crate::services::translation::rate_limit::testing::FakeClock;

    fn gateway(
        backend: &ScriptedBackend,
        clock: &FakeClock,
        max_attempts: u32,
    ) -> Gateway<ScriptedBackend, FakeClock> {
        let limiter = RateLimiter::new(clock.clone(), Duration::from_secs(10));
        let policy = RetryPolicy {
            max_attempts,
            transient_delay: Duration::from_secs(3),
            quota_cooldown: Duration::from_secs(90),
        };
        Gateway::new(backend.clone(), limiter, policy)
    }

    #[test]
    fn returns_first_success() {
        let backend = ScriptedBackend::new();
        backend.reply("ok");
        let clock = FakeClock::new();

        let mut gw = gateway(&backend, &clock, 3);
        assert_eq!(gw.call("p").unwrap(), "ok");
        assert_eq!(gw.calls(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn transient_failure_uses_short_delay() {
        let backend = ScriptedBackend::new();
        backend
            .fail(LlmError::TransientFailure("503".into()))
            .reply("ok");
        let clock = FakeClock::new();

        let mut gw = gateway(&backend, &clock, 3);
        assert_eq!(gw.call("p").unwrap(), "ok");
        assert_eq!(gw.calls(), 2);
        // retry delay, then the limiter tops up to the 10s interval
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(3), Duration::from_secs(7)]
        );
    }

    #[test]
    fn quota_failure_uses_long_cooldown() {
        let backend = ScriptedBackend::new();
        backend
            .fail(LlmError::QuotaExceeded("429".into()))
            .reply("ok");
        let clock = FakeClock::new();

        let mut gw = gateway(&backend, &clock, 3);
        assert_eq!(gw.call("p").unwrap(), "ok");
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(90)]);
    }

    #[test]
    fn exhausted_budget_is_fatal() {
        let backend = ScriptedBackend::new();
        backend
            .fail(LlmError::TransientFailure("a".into()))
            .fail(LlmError::QuotaExceeded("b".into()))
            .fail(LlmError::TransientFailure("c".into()));
        let clock = FakeClock::new();

        let mut gw = gateway(&backend, &clock, 3);
        let err = gw.call("p").unwrap_err();
        assert_eq!(
            err,
            LlmError::FatalFailure {
                attempts: 3,
                last: "c".into()
            }
        );
        assert_eq!(gw.calls(), 3);
        assert_eq!(backend.prompts().len(), 3);
    }

    #[test]
    fn every_attempt_goes_through_the_limiter() {
        let backend = ScriptedBackend::new();
        backend
            .fail(LlmError::TransientFailure("a".into()))
            .fail(LlmError::TransientFailure("b".into()))
            .reply("ok");
        let clock = FakeClock::new();

        let mut gw = gateway(&backend, &clock, 5);
        gw.call("p").unwrap();

        // 3s retry delay is shorter than the 10s interval, so each retry
        // is topped up by the limiter.
        assert_eq!(clock.elapsed(), Duration::from_secs(20));
    }
}
