//! Bounded retry with a fixed delay between attempts.
//!
//! The review server materializes a new project's metadata ref only after
//! some delay, so the access-control engine polls. The sleep is injected so
//! the policy is unit-testable without real waiting.

use std::time::Duration;

/// Maximum attempt count plus the fixed pause between attempts.
///
/// No backoff, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted,
    /// invoking `sleep` between attempts. `op` receives the 1-based
    /// attempt number; the final error is returned on exhaustion.
    pub fn run<T, E>(
        &self,
        sleep: &mut dyn FnMut(Duration),
        mut op: impl FnMut(u32) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.attempts => return Err(err),
                Err(_) => {
                    sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    /// The server-polling budget: 10 attempts, 2 seconds apart.
    fn default() -> Self {
        RetryPolicy::fixed(10, Duration::from_secs(2))
    }
}

/// Production sleep hook.
pub fn thread_sleep(duration: Duration) {
    std::thread::sleep(duration);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
