use crate::types::constants::{
    INITIAL_RECONNECT_DELAY, MAX_RECONNECT_ATTEMPTS, MAX_RECONNECT_DELAY, RECONNECT_JITTER,
};
use rand::Rng;
use std::time::Duration;

/// Exponential backoff state for reconnection attempts.
///
/// The delay doubles each time a scheduled attempt fires and is clamped to
/// `max_delay`. Jitter only affects the sleep handed out by
/// [`scheduled_delay`](Self::scheduled_delay); the underlying progression
/// stays exact.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    jitter: f64,
    current_delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            jitter: 0.0,
            current_delay: initial_delay,
            attempts: 0,
        }
    }

    /// Randomize each scheduled delay by up to `±jitter` (a fraction, clamped to `0..=1`)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// No more attempts may be scheduled
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Get the sleep before the next attempt
    pub fn scheduled_delay(&self) -> Duration {
        apply_jitter(self.current_delay, self.jitter)
    }

    /// Record that a scheduled attempt fired and escalate the delay
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
        self.current_delay = self.current_delay.saturating_mul(2).min(self.max_delay);
    }

    /// Reset the policy after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_delay = self.initial_delay;
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(INITIAL_RECONNECT_DELAY),
            Duration::from_millis(MAX_RECONNECT_DELAY),
            MAX_RECONNECT_ATTEMPTS,
        )
        .with_jitter(RECONNECT_JITTER)
    }
}

fn apply_jitter(delay: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 {
        return delay;
    }
    let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
    delay.mul_f64(factor)
}
