//! Fixed-size worker pool over round-robin partitions of identifiers

use futures::future::join_all;
use std::future::Future;
use tracing::{debug, error};

/// Assign `ids[i]` to worker `i % workers`.
pub fn partition_round_robin(ids: &[String], workers: usize) -> Vec<Vec<String>> {
    let workers = workers.max(1);
    let mut partitions = vec![Vec::new(); workers.min(ids.len().max(1))];
    let count = partitions.len();
    for (index, id) in ids.iter().enumerate() {
        partitions[index % count].push(id.clone());
    }
    partitions
}

/// Run `task` for every identifier. With one worker the ids are handled in
/// order on the current task; otherwise each partition runs sequentially on
/// its own tokio task and results come back grouped by worker.
///
/// A worker that panics loses its results; its ids are reported through
/// `on_lost` so they can be counted as failed.
pub async fn run<T, F, Fut>(ids: Vec<String>, workers: usize, task: F, mut on_lost: impl FnMut(&str)) -> Vec<(String, T)>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    if workers <= 1 || ids.len() <= 1 {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = task(id.clone()).await;
            results.push((id, outcome));
        }
        return results;
    }

    let partitions = partition_round_robin(&ids, workers);
    debug!("Spawning {} download workers for {} ids", partitions.len(), ids.len());

    let handles: Vec<_> = partitions
        .iter()
        .cloned()
        .map(|partition| {
            let task = task.clone();
            tokio::spawn(async move {
                let mut results = Vec::with_capacity(partition.len());
                for id in partition {
                    let outcome = task(id.clone()).await;
                    results.push((id, outcome));
                }
                results
            })
        })
        .collect();

    let mut results = Vec::with_capacity(ids.len());
    for (partition, joined) in partitions.iter().zip(join_all(handles).await) {
        match joined {
            Ok(worker_results) => results.extend(worker_results),
            Err(e) => {
                error!("Download worker failed: {}", e);
                partition.iter().for_each(|id| on_lost(id));
            }
        }
    }
    results
}
