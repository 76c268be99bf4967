//! An unbounded FIFO queue tracking unfinished items.
//!
//! Every [`Queue::put()`] increments an unfinished count that only an explicit [`Queue::task_done()`] decrements,
//! so that [`Queue::join()`] can wait for every item ever put to be fully handled, not just taken.
//!
//! A consumer putting follow-up items back (eg. a retry) must do so **before** marking the originating item done:
//! the count then never drops to zero while a follow-up is pending.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Mutex;

use tokio::sync::Notify;

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    unfinished: usize,
}

/// A FIFO queue with `join` semantics.
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// # use resource_worker::queue::Queue;
/// let queue = Queue::new();
/// queue.put("Hello world!");
///
/// let msg = queue.take().await;
/// println!("{msg}");
/// queue.task_done();
///
/// queue.join().await;
/// # })
/// ```
#[derive(Debug)]
pub struct Queue<T> {
    state: Mutex<State<T>>,
    /// Signaled once per put, for takers.
    available: Notify,
    /// Signaled when the unfinished count drops to zero, for joiners.
    drained: Notify,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                unfinished: 0,
            }),
            available: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Put an item at the back of the queue.
    pub fn put(&self, item: T) {
        {
            let mut state = self.lock();
            state.items.push_back(item);
            state.unfinished += 1;
        }

        self.available.notify_one();
    }

    /// Take the item at the front of the queue, waiting for one to be available.
    ///
    /// The caller must eventually call [`Queue::task_done()`] exactly once for the taken item.
    pub async fn take(&self) -> T {
        let mut available = pin!(self.available.notified());

        loop {
            // register before checking so that no put in between can go unnoticed
            available.as_mut().enable();

            if let Some(item) = self.try_take() {
                return item;
            }

            available.as_mut().await;
            available.set(self.available.notified());
        }
    }

    /// Take the item at the front of the queue, if any.
    pub fn try_take(&self) -> Option<T> {
        self.lock().items.pop_front()
    }

    /// Mark a previously taken item as fully handled.
    ///
    /// # Panics
    /// This method panics if called more times than there were items put.
    pub fn task_done(&self) {
        let mut state = self.lock();

        assert!(state.unfinished > 0, "task_done() called more times than items were put");
        state.unfinished -= 1;

        if state.unfinished == 0 {
            drop(state);
            self.drained.notify_waiters();
        }
    }

    /// Wait until every item ever put has been marked done.
    pub async fn join(&self) {
        loop {
            let mut drained = pin!(self.drained.notified());
            // same as in `take()`, for a concurrent `task_done()`
            drained.as_mut().enable();

            if self.unfinished() == 0 {
                return;
            }

            drained.await;
        }
    }

    /// Number of items waiting to be taken.
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items put but not marked done yet.
    #[inline]
    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }

    #[inline]
    fn lock(&self) -> std::sync::MutexGuard<'_, State<T>> {
        // the state is always left consistent, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<T> Default for Queue<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
