//! Workers taking resources off the work queue and routing their outcome.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::chance::Chance;
use crate::process::Process;
use crate::queue::Queue;
use crate::resource::{self, Record};

/// Run counters shared by all workers.
///
/// They are only meant for reporting and never drive any decision.
#[derive(Debug, Default)]
pub struct Stats {
    succeeded: AtomicUsize,
    retried: AtomicUsize,
    exhausted: AtomicUsize,
    invalid: AtomicUsize,
}

/// A point-in-time copy of [`Stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Resources forwarded to the output.
    pub succeeded: usize,
    /// Retries put back onto the work queue.
    pub retried: usize,
    /// Resources dropped after their last permitted attempt.
    pub exhausted: usize,
    /// Resources dropped as invalid.
    pub invalid: usize,
}

impl Stats {
    pub fn summary(&self) -> Summary {
        Summary {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
        }
    }

    #[inline]
    fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// What happened to a resource after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forwarded to the result queue.
    Output,
    /// Put back onto the work queue with the given retry counter.
    Retry(u32),
    /// Dropped after its last permitted attempt.
    Exhausted,
    /// Dropped as invalid.
    Invalid,
}

/// A worker of the pool.
///
/// It owns exactly one resource at a time, from the moment it takes it off the work queue until it has been routed.
#[derive(Debug)]
pub struct Worker<P> {
    id: usize,
    work: Arc<Queue<Value>>,
    results: Arc<Queue<Record>>,
    processor: Arc<P>,
    chance: Chance,
    /// Upper bound of the dispatch delay preceding every attempt.
    delay_time: Duration,
    max_attempts: NonZeroU32,
    stats: Arc<Stats>,
}

impl<P: Process> Worker<P> {
    pub fn new(id: usize, work: Arc<Queue<Value>>, results: Arc<Queue<Record>>, processor: Arc<P>) -> Self {
        Self {
            id,
            work,
            results,
            processor,
            chance: Chance::default(),
            delay_time: Duration::ZERO,
            max_attempts: NonZeroU32::MIN,
            stats: Default::default(),
        }
    }

    #[inline]
    pub fn with_chance(self, chance: Chance) -> Self {
        Self { chance, ..self }
    }

    #[inline]
    pub fn with_delay_time(self, delay_time: Duration) -> Self {
        Self { delay_time, ..self }
    }

    #[inline]
    pub fn with_max_attempts(self, max_attempts: NonZeroU32) -> Self {
        Self { max_attempts, ..self }
    }

    #[inline]
    pub fn with_stats(self, stats: Arc<Stats>) -> Self {
        Self { stats, ..self }
    }

    /// Process resources forever.
    ///
    /// This never returns: the worker has to be aborted once the work queue has been joined.
    pub async fn run(self) {
        loop {
            self.step().await;
        }
    }

    /// Take one resource, process it, route it, then only mark it done.
    pub async fn step(&self) -> Route {
        let resource = self.work.take().await;

        let route = self.handle(&resource).await;

        // must come last: any retry has to be put before the work queue may drain
        self.work.task_done();

        route
    }

    async fn handle(&self, raw: &Value) -> Route {
        let id = self.id;

        self.chance.jitter(self.delay_time).await;

        let processed = match self.processor.process(raw).await {
            Ok(processed) => processed,
            Err(err) => {
                let resource_id = raw.get("id").and_then(Value::as_str).unwrap_or("unknown");
                tracing::error!("Invalid resource: {resource_id} (worker-{id}): {err}");

                Stats::incr(&self.stats.invalid);
                return Route::Invalid;
            }
        };

        let retries = processed.resource.retries;
        let record = processed.resource.into_record();

        if processed.processed {
            tracing::info!("Successfully processed resource: {} (worker-{id})", record.id);

            self.results.put(record);
            Stats::incr(&self.stats.succeeded);
            Route::Output
        } else if retries < self.max_attempts.get() - 1 {
            let retries = retries + 1;
            tracing::warn!("Retry #{retries} for resource: {} (worker-{id})", record.id);

            self.work.put(resource::with_retries(raw, retries));
            Stats::incr(&self.stats.retried);
            Route::Retry(retries)
        } else {
            tracing::error!("Max retries exceeded for resource: {} (worker-{id})", record.id);

            Stats::incr(&self.stats.exhausted);
            Route::Exhausted
        }
    }
}
