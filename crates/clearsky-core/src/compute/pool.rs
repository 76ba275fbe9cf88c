use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::Result;

/// Explicit worker pool that every parallel stage runs on.
///
/// Wraps a dedicated Rayon pool so the pipeline never touches the global
/// one; `par_iter` calls made inside [`WorkerPool::install`] are scheduled
/// on this pool's threads only.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers, or one per available core when `None`.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("clearsky-{i}"));
        if let Some(n) = threads {
            builder = builder.num_threads(n.max(1));
        }
        let pool = builder.build()?;
        debug!(threads = pool.current_num_threads(), "Worker pool ready");
        Ok(Self { pool })
    }

    /// Single-threaded pool, handy for deterministic tests.
    pub fn single() -> Result<Self> {
        Self::new(Some(1))
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .finish()
    }
}
