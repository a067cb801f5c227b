use rayon::prelude::*;

use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::Result;

/// Evaluate `op(i)` for `i in 0..n`, keeping results in index order.
///
/// `parallelism`: `0` uses the global Rayon pool, `1` runs sequentially and
/// `n > 1` runs on a dedicated pool of `n` threads. Fewer than
/// [`PARALLEL_FRAME_THRESHOLD`] items always run sequentially.
pub fn map_indexed<T, F>(n: usize, parallelism: usize, op: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Send + Sync,
{
    if parallelism == 1 || n < PARALLEL_FRAME_THRESHOLD {
        return (0..n).map(op).collect();
    }
    if parallelism == 0 {
        return (0..n).into_par_iter().map(op).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()?;
    pool.install(|| (0..n).into_par_iter().map(&op).collect())
}
