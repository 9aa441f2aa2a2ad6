//! Per-run result aggregation
//!
//! Each run gets its own append-only bucket behind its own lock, so workers
//! appending to different runs never contend. The bucket map itself is only
//! write-locked when a run is seen for the first time.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Batch, ResultRecord, RunId};

/// Accumulates result records per run until flush
///
/// Appenders share the map's read lock while pushing into their bucket, so a
/// drain (which takes the write lock) never races an in-flight append.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    buckets: RwLock<HashMap<RunId, Mutex<Batch>>>,
}

fn lock(bucket: &Mutex<Batch>) -> MutexGuard<'_, Batch> {
    bucket.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RunId, Mutex<Batch>>> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RunId, Mutex<Batch>>> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record to the batch of `run_id`, creating the batch if absent
    pub fn append(&self, run_id: RunId, record: ResultRecord) {
        {
            let buckets = self.read();
            if let Some(bucket) = buckets.get(&run_id) {
                lock(bucket).push(record);
                return;
            }
        }

        let mut buckets = self.write();
        lock(buckets.entry(run_id).or_default()).push(record);
    }

    /// Take every accumulated batch, leaving the aggregator empty
    pub fn drain(&self) -> BTreeMap<RunId, Batch> {
        let buckets = std::mem::take(&mut *self.write());

        buckets
            .into_iter()
            .map(|(run_id, bucket)| {
                let batch = bucket.into_inner().unwrap_or_else(PoisonError::into_inner);
                (run_id, batch)
            })
            .collect()
    }

    /// Take the batch of a single run, if any records arrived for it
    pub fn take(&self, run_id: RunId) -> Option<Batch> {
        let bucket = self.write().remove(&run_id)?;
        let batch = bucket.into_inner().unwrap_or_else(PoisonError::into_inner);
        (!batch.is_empty()).then_some(batch)
    }

    /// Number of records waiting across all runs
    pub fn pending(&self) -> usize {
        self.read().values().map(|bucket| lock(bucket).len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InstanceId, Verdict};
    use std::sync::Arc;
    use std::thread;

    fn record(instance: u64, verdict: Verdict) -> ResultRecord {
        ResultRecord::new(InstanceId(instance), verdict, 1)
    }

    #[test]
    fn test_append_and_drain() {
        let aggregator = ResultAggregator::new();
        aggregator.append(RunId(10), record(5001, Verdict::Passed));
        aggregator.append(RunId(11), record(6001, Verdict::Retest));
        aggregator.append(RunId(10), record(5002, Verdict::Failed));
        assert_eq!(aggregator.pending(), 3);

        let batches = aggregator.drain();
        assert_eq!(batches.len(), 2);
        let run10: Vec<_> = batches[&RunId(10)].iter().map(|r| r.instance_id).collect();
        assert_eq!(run10, vec![InstanceId(5001), InstanceId(5002)]);
        assert_eq!(batches[&RunId(11)].len(), 1);

        assert_eq!(aggregator.pending(), 0);
        assert!(aggregator.drain().is_empty());
    }

    #[test]
    fn test_append_after_drain_starts_fresh_batch() {
        let aggregator = ResultAggregator::new();
        aggregator.append(RunId(10), record(5001, Verdict::Passed));
        let _ = aggregator.drain();

        aggregator.append(RunId(10), record(5002, Verdict::Failed));
        let batches = aggregator.drain();
        assert_eq!(batches[&RunId(10)].len(), 1);
        assert_eq!(batches[&RunId(10)].records()[0].instance_id, InstanceId(5002));
    }

    #[test]
    fn test_take_single_run() {
        let aggregator = ResultAggregator::new();
        aggregator.append(RunId(10), record(5001, Verdict::Passed));
        aggregator.append(RunId(11), record(6001, Verdict::Passed));

        assert_eq!(aggregator.take(RunId(10)).map(|b| b.len()), Some(1));
        assert!(aggregator.take(RunId(10)).is_none());
        assert!(aggregator.take(RunId(99)).is_none());
        assert_eq!(aggregator.pending(), 1);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let aggregator = Arc::new(ResultAggregator::new());
        let workers: Vec<_> = (0..8u64)
            .map(|worker| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || {
                    for i in 0..250u64 {
                        let run_id = RunId(10 + (i % 3));
                        aggregator.append(run_id, record(worker * 1000 + i, Verdict::Passed));
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        let batches = aggregator.drain();
        let total: usize = batches.values().map(Batch::len).sum();
        assert_eq!(total, 8 * 250);
        assert_eq!(batches.len(), 3);
    }
}
