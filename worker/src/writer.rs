//! The single consumer of the result queue.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::{fs, io};

use crate::queue::Queue;
use crate::resource::Record;

const TEMP_EXT: &str = "tmp";

/// Output writer.
///
/// Every record taken off the result queue is appended to an in-memory accumulator, which is then persisted as a whole.
/// The output file therefore always holds a complete JSON array of everything written so far, in completion order.
#[derive(Debug)]
pub struct Writer {
    path: PathBuf,
    results: Arc<Queue<Record>>,
    records: Vec<Record>,
}

impl Writer {
    pub fn new(path: PathBuf, results: Arc<Queue<Record>>) -> Self {
        Self {
            path,
            results,
            records: Vec::new(),
        }
    }

    /// Records written so far.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Write records forever.
    ///
    /// This never returns: the writer has to be aborted once the result queue has been joined.
    pub async fn run(mut self) {
        tracing::debug!("Writing records to `{}`", self.path.display());

        loop {
            self.step().await;
        }
    }

    /// Take one record, persist the whole accumulator, then mark the record done.
    ///
    /// A failed snapshot is logged but does not hold the record back: the next snapshot will contain it.
    pub async fn step(&mut self) {
        let record = self.results.take().await;
        self.records.push(record);

        match self.persist().await {
            Ok(()) => tracing::debug!("Wrote {} records to `{}`", self.records.len(), self.path.display()),
            Err(err) => tracing::error!("Failed to write {} records to `{}`: {err}", self.records.len(), self.path.display()),
        }

        self.results.task_done();
    }

    /// Atomically replace the output file with the current accumulator.
    async fn persist(&self) -> io::Result<()> {
        let json = serde_json::to_vec(&self.records)?;

        let tmp = self.tmp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await
    }

    fn tmp_path(&self) -> PathBuf {
        let mut path = OsString::from(self.path.as_os_str());
        path.push(".");
        path.push(TEMP_EXT);
        path.into()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::resource::tests::sample_resource;
    use crate::resource::Resource;

    fn record(id: &str) -> Record {
        let mut record = Resource::from_value(&sample_resource()).unwrap().into_record();
        record.id = id.to_owned();
        record
    }

    fn read(path: &Path) -> serde_json::Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        let results = Arc::new(Queue::new());

        let handle = tokio::spawn(Writer::new(path.clone(), Arc::clone(&results)).run());

        results.put(record("924c8cfbd9f94155985bf262cf2c3c67"));
        results.join().await;

        assert_eq!(read(&path), serde_json::Value::Array(vec![sample_resource()]));
        assert!(!dir.path().join("output.json.tmp").exists());
        handle.abort();
    }

    #[tokio::test]
    async fn test_every_snapshot_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        let results = Arc::new(Queue::new());
        let mut writer = Writer::new(path.clone(), Arc::clone(&results));

        let ids = ["c", "a", "b"];

        for (n, id) in ids.iter().enumerate() {
            results.put(record(id));
            writer.step().await;

            let written: Vec<Record> = serde_json::from_value(read(&path)).unwrap();
            let expected: Vec<_> = ids[..=n].iter().map(|id| record(id)).collect();

            assert_eq!(written, expected);
            assert_eq!(writer.records(), expected);
        }

        assert_eq!(results.unfinished(), 0);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_write_failure_still_acknowledges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("output.json");
        let results = Arc::new(Queue::new());
        let mut writer = Writer::new(path.clone(), Arc::clone(&results));

        results.put(record("a"));
        writer.step().await;

        assert_eq!(results.unfinished(), 0);
        assert!(!path.exists());
        assert!(logs_contain("Failed to write 1 records"));
    }
}
