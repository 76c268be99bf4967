//! Orchestration of a whole batch run.

use std::sync::Arc;

use serde_json::Value;

use crate::chance::Chance;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::process::{Process, Processor};
use crate::queue::Queue;
use crate::task::TaskGroup;
use crate::worker::{Stats, Summary, Worker};
use crate::writer::Writer;
use crate::Error;

/// Fetch the resources configured as input, then process them all.
///
/// A failed fetch aborts the run before any worker gets started.
pub async fn run(config: &Config) -> Result<Summary, Error> {
    let resources = Fetcher::new().fetch(&config.input).await?;

    let chance = Chance::system();
    let processor = Processor::new(chance.clone(), config.processing_time, config.failure_rate);

    Ok(run_batch(config, resources, Arc::new(processor), chance).await)
}

/// Process an already fetched batch of raw resources.
///
/// Returns once every resource has either been written out or dropped, with every task torn down.
/// An empty batch returns right away without starting anything nor touching the output.
pub async fn run_batch<P>(config: &Config, resources: Vec<Value>, processor: Arc<P>, chance: Chance) -> Summary
where
    P: Process + 'static,
{
    if resources.is_empty() {
        tracing::info!("No resources to process");
        return Summary::default();
    }

    let work = Arc::new(Queue::new());
    let results = Arc::new(Queue::new());
    let stats = Arc::new(Stats::default());

    let mut tasks = TaskGroup::default();

    for id in 0..config.workers.get() {
        let worker = Worker::new(id, Arc::clone(&work), Arc::clone(&results), Arc::clone(&processor))
            .with_chance(chance.clone())
            .with_delay_time(config.delay_time)
            .with_max_attempts(config.max_attempts)
            .with_stats(Arc::clone(&stats));

        tasks.spawn(format!("worker-{id}"), worker.run());
    }

    tasks.spawn("writer", Writer::new(config.output.clone(), Arc::clone(&results)).run());

    tracing::info!("Processing {} resources with {} workers", resources.len(), config.workers);

    for resource in resources {
        work.put(resource);
    }

    // no result can be produced once the work queue is drained, only then may the result queue drain for good
    work.join().await;
    results.join().await;

    tasks.shutdown().await;

    let summary = stats.summary();

    tracing::info!(
        "Processed resources: {} succeeded, {} retried, {} exhausted, {} invalid",
        summary.succeeded,
        summary.retried,
        summary.exhausted,
        summary.invalid
    );

    summary
}
