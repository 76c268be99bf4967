//! A batch resource worker.
//!
//! Resources are fetched once from a remote (or local) source, then fanned out to a bounded pool of workers that process them concurrently,
//! retrying failed attempts up to a fixed bound, while a single writer persists every successfully processed resource as it completes.
//!
//! ```text
//!     fetched resources
//!       L work queue <-----------------------------.
//!         L worker pool --> (success) result queue  |
//!         |                   L writer --> output  |
//!         L (failure, attempts left) --------------'
//!         L (failure, no attempt left | invalid) --> dropped, logged
//! ```
//!
//! Both queues are FIFO queues tracking unfinished items (see [`queue::Queue`]): the orchestrator knows a batch is done once the work queue
//! and then the result queue have been joined. This only holds because a worker always puts a retry back **before** it acknowledges the attempt
//! it comes from, so that the work queue never looks drained while a retry is about to be put.
//!
//! Processing itself is a stand-in: validate the resource shape, wait for some random time, then toss a biased coin. Randomness and delays
//! are injected through [`chance::Chance`] so that runs can be made deterministic.
//!
//! As a **strong hypothesis**, resource ids are assumed to be unique within a batch. Nothing relies on it but the logs.

mod error;
pub use error::Error;

pub mod chance;
pub mod config;
pub mod fetch;
pub mod orchestrator;
pub mod process;
pub mod queue;
pub mod resource;
pub mod task;
pub mod worker;
pub mod writer;

pub use config::Config;
pub use orchestrator::{run, run_batch};
