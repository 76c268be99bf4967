//! Resource processing.

use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::chance::Chance;
use crate::resource::{ProcessedResource, Resource};
use crate::Error;

/// Processing of a single raw resource.
pub trait Process: Send + Sync {
    /// Run one processing attempt on `resource`.
    ///
    /// Fails with [`Error::InvalidResource`] when the resource cannot be validated, in which case it must not be retried.
    /// A failed attempt that may be retried is not an error but an outcome with `processed == false`.
    fn process<'a>(&'a self, resource: &'a Value) -> BoxFuture<'a, Result<ProcessedResource, Error>>;
}

/// The stand-in processor: validate, simulate some work, then toss a biased coin.
#[derive(Debug, Clone)]
pub struct Processor {
    chance: Chance,
    /// Upper bound of the simulated work duration.
    processing_time: Duration,
    /// Probability of a failed attempt, within `[0, 1]`.
    failure_rate: f64,
}

impl Processor {
    /// Create a processor failing `failure_rate` percent of its attempts.
    pub fn new(chance: Chance, processing_time: Duration, failure_rate: f64) -> Self {
        Self {
            chance,
            processing_time,
            failure_rate: (failure_rate / 100.0).clamp(0.0, 1.0),
        }
    }

    pub async fn process(&self, resource: &Value) -> Result<ProcessedResource, Error> {
        let resource = Resource::from_value(resource)?;

        self.chance.jitter(self.processing_time).await;

        let processed = self.chance.sample() > self.failure_rate;

        Ok(ProcessedResource::now(processed, resource))
    }
}

impl Process for Processor {
    #[inline]
    fn process<'a>(&'a self, resource: &'a Value) -> BoxFuture<'a, Result<ProcessedResource, Error>> {
        Processor::process(self, resource).boxed()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::resource::{self, tests::sample_resource};

    fn processor(chance: Chance) -> Processor {
        Processor::new(chance, Duration::from_secs(5), 25.0)
    }

    fn assert_unchanged(outcome: &ProcessedResource) {
        assert_eq!(outcome.resource.retries, 0);
        assert_eq!(serde_json::to_value(&outcome.resource.record).unwrap(), sample_resource());
    }

    #[tokio::test]
    async fn test_successfully_processed_resource() {
        let before = chrono::Utc::now().naive_utc();

        let outcome = processor(Chance::fixed(1.0)).process(&sample_resource()).await.unwrap();

        assert!(outcome.processed);
        assert!(outcome.processing_date >= before);
        assert_unchanged(&outcome);
    }

    #[tokio::test]
    async fn test_failed_processed_resource() {
        let outcome = processor(Chance::fixed(0.0)).process(&sample_resource()).await.unwrap();

        assert!(!outcome.processed);
        assert_unchanged(&outcome);
    }

    #[tokio::test]
    async fn test_failure_threshold_is_strict() {
        let outcome = processor(Chance::fixed(0.25)).process(&sample_resource()).await.unwrap();
        assert!(!outcome.processed);

        let outcome = processor(Chance::fixed(0.26)).process(&sample_resource()).await.unwrap();
        assert!(outcome.processed);
    }

    #[tokio::test]
    async fn test_retries_are_carried() {
        let resource = resource::with_retries(&sample_resource(), 2);

        let outcome = processor(Chance::fixed(1.0)).process(&resource).await.unwrap();

        assert_eq!(outcome.resource.retries, 2);
    }

    #[tokio::test]
    async fn test_invalid_resource() {
        let err = processor(Chance::fixed(1.0)).process(&json!({})).await.unwrap_err();

        assert!(matches!(err, Error::InvalidResource(_)));
    }

    #[tokio::test]
    async fn test_invalid_resource_does_no_work() {
        tokio::time::pause();

        let processor = Processor::new(Chance::new(crate::chance::Fixed(1.0), crate::chance::TokioSleeper), Duration::from_secs(60), 0.0);
        let start = tokio::time::Instant::now();

        assert!(processor.process(&json!({})).await.is_err());
        assert!(start.elapsed().is_zero());
    }
}
