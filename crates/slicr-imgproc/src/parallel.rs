use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how parallel operations are executed.
///
/// Every operation in this crate produces bit-identical results under all
/// strategies; the strategy only decides where the work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool.
    #[default]
    ParallelElements,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// The pool is built once per [`ExecutionStrategy::install`] call, so wrap a whole
    /// pipeline rather than a single operation.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Run `op` in the context selected by this strategy.
    ///
    /// For [`ExecutionStrategy::Fixed`] a dedicated pool is built and `op` runs
    /// inside it, so every rayon iterator used by `op` is scheduled on that pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread count is zero or the pool cannot be built.
    pub fn install<R, OP>(self, op: OP) -> Result<R, ParallelError>
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match self {
            ExecutionStrategy::Serial | ExecutionStrategy::ParallelElements => Ok(op()),
            ExecutionStrategy::Fixed(n) => {
                if n == 0 {
                    return Err(ParallelError::InvalidThreadCount(n));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?;
                Ok(pool.install(op))
            }
        }
    }

    /// Whether rayon iterators should be used.
    pub fn is_parallel(self) -> bool {
        !matches!(self, ExecutionStrategy::Serial)
    }

    /// Apply `op` to consecutive chunks of `dst`, passing the chunk index.
    ///
    /// With `chunk` equal to the image height each chunk is one pixel column.
    pub fn for_each_chunk_mut<T, F>(self, dst: &mut [T], chunk: usize, op: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        if chunk == 0 {
            return;
        }
        if self.is_parallel() {
            dst.par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(i, c)| op(i, c));
        } else {
            dst.chunks_mut(chunk).enumerate().for_each(|(i, c)| op(i, c));
        }
    }

    /// Apply `op` to matching consecutive chunks of two buffers of the same length.
    pub fn for_each_chunk_pair_mut<A, B, F>(self, a: &mut [A], b: &mut [B], chunk: usize, op: F)
    where
        A: Send,
        B: Send,
        F: Fn(usize, &mut [A], &mut [B]) + Send + Sync,
    {
        if chunk == 0 {
            return;
        }
        if self.is_parallel() {
            a.par_chunks_mut(chunk)
                .zip(b.par_chunks_mut(chunk))
                .enumerate()
                .for_each(|(i, (ca, cb))| op(i, ca, cb));
        } else {
            a.chunks_mut(chunk)
                .zip(b.chunks_mut(chunk))
                .enumerate()
                .for_each(|(i, (ca, cb))| op(i, ca, cb));
        }
    }

    /// Apply `op` to every index of three buffers at once.
    pub fn for_each_zip3_mut<T, F>(self, a: &mut [T], b: &mut [T], c: &mut [T], op: F)
    where
        T: Send,
        F: Fn(usize, &mut T, &mut T, &mut T) + Send + Sync,
    {
        if self.is_parallel() {
            a.par_iter_mut()
                .zip(b.par_iter_mut())
                .zip(c.par_iter_mut())
                .enumerate()
                .for_each(|(i, ((va, vb), vc))| op(i, va, vb, vc));
        } else {
            a.iter_mut()
                .zip(b.iter_mut())
                .zip(c.iter_mut())
                .enumerate()
                .for_each(|(i, ((va, vb), vc))| op(i, va, vb, vc));
        }
    }

    /// Map every index in `0..n` and collect the results in index order.
    pub fn map_indexed<R, F>(self, n: usize, op: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Send + Sync,
    {
        if self.is_parallel() {
            (0..n).into_par_iter().map(op).collect()
        } else {
            (0..n).map(op).collect()
        }
    }
}
