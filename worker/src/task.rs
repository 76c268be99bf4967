//! This module provides ownership over long-lived background tasks.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, FutureExt};
use tokio::task::{JoinError, JoinHandle};

/// A group of named background tasks with no natural end.
///
/// Tasks spawned into a group keep running until the group is shut down, which aborts all of them and waits for them to be torn down.
/// The group holds the only handles on its tasks: dropping it without shutting it down aborts them too.
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// # use resource_worker::task::TaskGroup;
/// let mut group = TaskGroup::default();
///
/// for i in 0..3 {
///     group.spawn(format!("ticker-{i}"), async move {
///         loop {
///             tokio::task::yield_now().await;
///         }
///     });
/// }
///
/// assert_eq!(group.len(), 3);
///
/// group.shutdown().await;
/// # })
/// ```
#[derive(Debug, Default)]
pub struct TaskGroup {
    tasks: Vec<Task>,
}

impl TaskGroup {
    /// Spawn `future` on the current runtime as a task named `name`.
    ///
    /// # Panics
    /// This method panics if called outside of a tokio runtime.
    pub fn spawn(&mut self, name: impl Into<String>, future: impl Future<Output = ()> + Send + 'static) {
        self.tasks.push(Task::new(name.into(), future));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort all tasks and wait for them to be torn down.
    ///
    /// Tasks are not given any chance to finish what they are doing. Once shut down, the group is empty and can be reused.
    pub async fn shutdown(&mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        let results = future::join_all(tasks.into_iter().inspect(|task| {
            tracing::debug!("Stopping {}...", task.name);
            task.handle.abort();
        }))
        .await;

        for (name, result) in results {
            match result {
                Ok(()) => tracing::debug!("{name} had already completed"),
                Err(err) if err.is_cancelled() => tracing::trace!("{name} stopped"),
                Err(err) => tracing::error!("{name} panicked: {err}"),
            }
        }
    }
}

#[derive(Debug)]
struct Task {
    name: String,
    handle: JoinHandle<()>,
}

impl Task {
    fn new(name: String, future: impl Future<Output = ()> + Send + 'static) -> Task {
        tracing::debug!("Starting {name}...");

        Task {
            name,
            handle: tokio::spawn(future),
        }
    }
}

impl Future for Task {
    type Output = (String, Result<(), JoinError>);

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.handle.poll_unpin(cx).map(|result| (std::mem::take(&mut self.name), result))
    }
}

impl Drop for TaskGroup {
    fn drop(&mut self) {
        self.tasks.iter().for_each(|task| task.handle.abort());
    }
}
