//! # Workers Module
//!
//! Row-level offloading onto an externally owned rayon pool. Rows are split into
//! chunks, each chunk is mapped on the pool, and the results are flattened back
//! in input order so they can be merged by position.

use log::trace;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Map `rows` through `task`, on `pool` when one is supplied
///
/// Without a pool the rows are processed on the calling thread. The output
/// always has the same length and order as `rows`.
pub fn map_rows<T, R, F>(rows: &[T], pool: Option<&ThreadPool>, chunk_size: usize, task: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    match pool {
        None => rows.iter().map(&task).collect(),
        Some(pool) => {
            let chunk_size = chunk_size.max(1);
            trace!(
                "Offloading {} rows in chunks of {} onto {} threads",
                rows.len(),
                chunk_size,
                pool.current_num_threads()
            );
            let chunks: Vec<Vec<R>> = pool.install(|| {
                rows.par_chunks(chunk_size)
                    .map(|chunk| chunk.iter().map(&task).collect())
                    .collect()
            });
            chunks.into_iter().flatten().collect()
        }
    }
}
