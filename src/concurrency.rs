//! Concurrency helper: limit the number of datasets extracted in parallel.

use crate::dataset::Dataset;
use rayon::prelude::*;

/// Map `f` over `datasets` with at most `limit` in flight, preserving input order.
/// `limit <= 1` runs on the calling thread.
pub fn for_each_dataset_limited<T, F>(datasets: &[Dataset], limit: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Sync + Fn(Dataset) -> T,
{
    if limit <= 1 {
        return datasets.iter().map(|d| f(*d)).collect();
    }
    let mut out = Vec::with_capacity(datasets.len());
    for chunk in datasets.chunks(limit) {
        let part: Vec<T> = chunk.par_iter().map(|d| f(*d)).collect();
        out.extend(part);
    }
    out
}
