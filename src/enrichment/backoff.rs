use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Source of randomness for backoff jitter, sampled in `[0.0, 1.0)`
pub trait JitterSource: Send + Sync + 'static {
    fn sample(&self) -> f64;
}

/// Jitter source that always yields zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample(&self) -> f64 {
        0.0
    }
}

/// Seeded, reproducible jitter source
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }
}

/// Capped exponential backoff
///
/// Delay `n` is `initial_delay * multiplier^n`, never above `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Fraction of the delay added as random jitter, in `[0.0, 1.0]`
    pub jitter_ratio: f64,
}

impl BackoffPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay: initial_delay.min(max_delay),
            max_delay,
            multiplier: 2.0,
            jitter_ratio: 0.0,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        self
    }

    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = if jitter_ratio.is_finite() {
            jitter_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Delay that follows `current`
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next = current.as_secs_f64() * self.multiplier;
        if next >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(next)
        }
    }

    /// `delay` plus up to `jitter_ratio * delay`, still capped at `max_delay`
    pub fn apply_jitter(&self, delay: Duration, source: &dyn JitterSource) -> Duration {
        if self.jitter_ratio <= 0.0 {
            return delay;
        }
        let extra = delay.as_secs_f64() * self.jitter_ratio * source.sample().clamp(0.0, 1.0);
        let jittered = delay.as_secs_f64() + extra;
        if jittered >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(jittered)
        }
    }

    /// Infinite sequence of un-jittered delays, starting at `initial_delay`
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay), move |d| Some(self.next_delay(*d)))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(10))
    }
}
