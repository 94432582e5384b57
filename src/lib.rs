//! Named chunk sub-allocator.
//!
//! `sycorax` carves one or more large backing regions ("chunks")
//! into named, variable-size blocks using best-fit selection,
//! splitting, and adjacent-free coalescing. A program hands out and
//! reclaims many small, named buffers from a few large reservations
//! instead of making per-buffer system allocations.
//!
//! ```
//! use sycorax::ChunkRegistry;
//!
//! # fn main() -> sycorax::Result<()> {
//! let mut registry = ChunkRegistry::new();
//! let id = registry.init("scratch", 1024)?;
//!
//! let chunk = registry.chunk_mut(id).unwrap();
//! let handle = chunk.alloc(16, "greeting")?;
//! chunk.write(handle, b"hello")?;
//! assert_eq!(chunk.read(handle, 5)?, b"hello");
//!
//! chunk.free("greeting")?;
//! registry.clear_all();
//! # Ok(())
//! # }
//! ```
//!
//! All operations are synchronous and single-threaded; a chunk is
//! mutated through `&mut` access only, and callers that need
//! concurrency serialize externally (for example with one lock per
//! chunk).

mod block;
mod chunk;
mod error;
mod name;
mod registry;

pub use block::{BlockHandle, BlockRecord, Blocks, BLOCK_OVERHEAD};
pub use chunk::Chunk;
pub use error::{MemoryError, Result};
pub use name::Name;
pub use registry::{ChunkId, ChunkRegistry, ChunkSummary};
