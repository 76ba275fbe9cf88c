mod chunk;
mod pool;

pub use chunk::{plan_chunks, SpatialChunk};
pub use pool::WorkerPool;
