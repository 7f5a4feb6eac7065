use rand::Rng;
use std::time::Duration;

/// Pacing between attempts while waiting for a contended lock.
///
/// The delay starts at `initial_interval`, grows by 1.5x after every
/// contended attempt and is capped at `max_interval`. A random jitter of up
/// to `max_jitter` is added to each sleep so that waiters released by the
/// same unlock do not retry in lockstep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_jitter: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(10),
            max_jitter: Duration::from_millis(1),
        }
    }
}

impl PollConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry immediately after every contended attempt, with no sleep at all
    pub fn busy() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub(crate) fn backoff(&self) -> Backoff<'_> {
        Backoff {
            config: self,
            current: self.initial_interval,
        }
    }
}

/// Per-wait backoff state
pub(crate) struct Backoff<'a> {
    config: &'a PollConfig,
    current: Duration,
}

impl Backoff<'_> {
    /// Delay before the next attempt; advances the backoff
    pub(crate) fn next_delay<R: Rng>(&mut self, rng: &mut R) -> Duration {
        let base = self.current.min(self.config.max_interval);

        let jitter_micros = self.config.max_jitter.as_micros().min(u64::MAX as u128) as u64;
        let jitter = if jitter_micros == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(rng.gen_range(0..=jitter_micros))
        };

        self.current = base
            .checked_mul(3)
            .map(|d| d / 2)
            .unwrap_or(self.config.max_interval)
            .min(self.config.max_interval);

        base.saturating_add(jitter)
    }
}
