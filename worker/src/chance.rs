//! Sources of nondeterminism: random draws and artificial delays.
//!
//! Both are capabilities handed to the processor and the workers rather than module-level calls,
//! so that tests can swap in [`Fixed`] draws and [`NoDelay`] delays.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use rand::Rng;

/// A source of uniform random values.
pub trait RandomSource: Send + Sync {
    /// Draw a value in `[0, 1)`.
    fn sample(&self) -> f64;
}

/// A way to wait for some time.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Thread-local `rand` generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    #[inline]
    fn sample(&self) -> f64 {
        rand::thread_rng().gen()
    }
}

/// Always draws the same value, clamped to `[0, 1]`.
///
/// Drawing `1.0` (which a real source never does) forces every attempt to succeed, `0.0` forces every attempt to fail.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub f64);

impl RandomSource for Fixed {
    #[inline]
    fn sample(&self) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    #[inline]
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Sleeper for NoDelay {
    #[inline]
    fn sleep(&self, _: Duration) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}

/// A cheap, cloneable bundle of a [`RandomSource`] and a [`Sleeper`].
#[derive(Clone)]
pub struct Chance {
    random: Arc<dyn RandomSource>,
    sleeper: Arc<dyn Sleeper>,
}

impl Chance {
    pub fn new(random: impl RandomSource + 'static, sleeper: impl Sleeper + 'static) -> Self {
        Self {
            random: Arc::new(random),
            sleeper: Arc::new(sleeper),
        }
    }

    /// Real randomness and real delays.
    #[inline]
    pub fn system() -> Self {
        Self::new(ThreadRandom, TokioSleeper)
    }

    /// Always draw `value` and never wait.
    #[inline]
    pub fn fixed(value: f64) -> Self {
        Self::new(Fixed(value), NoDelay)
    }

    #[inline]
    pub fn sample(&self) -> f64 {
        self.random.sample()
    }

    /// Wait for a duration drawn uniformly from `[0, max]`.
    pub async fn jitter(&self, max: Duration) {
        let duration = max.mul_f64(self.sample());

        if !duration.is_zero() {
            self.sleeper.sleep(duration).await;
        }
    }
}

impl Default for Chance {
    #[inline]
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Chance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chance").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_range() {
        for _ in 0..1_000 {
            let value = ThreadRandom.sample();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_fixed_is_clamped() {
        assert_eq!(Fixed(-1.0).sample(), 0.0);
        assert_eq!(Fixed(2.0).sample(), 1.0);
        assert_eq!(Fixed(0.5).sample(), 0.5);
    }

    #[tokio::test]
    async fn test_jitter_is_bounded() {
        tokio::time::pause();

        let chance = Chance::new(Fixed(0.5), TokioSleeper);
        let start = tokio::time::Instant::now();

        chance.jitter(Duration::from_secs(4)).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3), "{elapsed:?}");
    }
}
