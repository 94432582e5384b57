use crate::{
    chunk::Chunk,
    error::{MemoryError, Result},
    name::Name,
};

use std::collections::HashMap;
use std::fmt;
use log::*;

/// Identifier of a chunk registered with a [`ChunkRegistry`].
pub type ChunkId = u64;

/// Owned collection of every live chunk, so a single call can tear
/// all of them down.
///
/// The registry is an explicit context object with its own creation
/// and teardown rather than an ambient global: whichever component
/// manages process lifetime holds it, and dropping it (or calling
/// [`clear_all`]) releases every chunk it owns.
///
/// [`clear_all`]: ChunkRegistry::clear_all
pub struct ChunkRegistry {
    chunks: HashMap<ChunkId, Chunk>,
    id_counter: ChunkId,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
            id_counter: 1,
        }
    }

    /// Create a chunk and register it.
    ///
    /// Registration is automatic, so bulk teardown reaches every
    /// chunk without the caller tracking anything itself.
    pub fn init(&mut self, name: &str, total_size: usize) -> Result<ChunkId> {
        let chunk = Chunk::new(name, total_size)?;

        let id = self.id_counter;
        self.id_counter += 1;
        self.chunks.insert(id, chunk);

        Ok(id)
    }

    /// Access a registered chunk.
    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(&id)
    }

    /// Access a registered chunk for allocation and freeing.
    pub fn chunk_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.chunks.get_mut(&id)
    }

    /// Tear down a single chunk, releasing its blocks and backing
    /// region. The entry is unregistered in the same step, so a
    /// later [`clear_all`](ChunkRegistry::clear_all) cannot reach a
    /// dangling chunk. Any handle into the chunk is stale afterward.
    pub fn dealloc(&mut self, id: ChunkId) -> Result<()> {
        let chunk = self.chunks.remove(&id).ok_or(MemoryError::InvalidArgument(
            "no chunk registered under this id",
        ))?;

        info!(
            "Deallocated chunk \"{}\" of {} bytes",
            chunk.name(),
            chunk.total_size()
        );
        Ok(())
    }

    /// Tear down every registered chunk and reset the registry to
    /// empty. Calling this on an empty registry is a no-op.
    pub fn clear_all(&mut self) {
        if self.chunks.is_empty() {
            return;
        }

        info!("Cleared {} chunks from the registry", self.chunks.len());
        self.chunks.clear();
    }

    /// Read-only summaries of every registered chunk, in creation
    /// order. An empty registry yields an empty sequence.
    pub fn dump_all(&self) -> impl Iterator<Item = ChunkSummary> + '_ {
        // Ids are handed out monotonically, so sorting them
        // recovers creation order out of the map.
        let mut ids: Vec<_> = self.chunks.keys().copied().collect();
        ids.sort_unstable();

        let chunks = &self.chunks;
        ids.into_iter().map(move |id| ChunkSummary::of(&chunks[&id]))
    }

    /// Number of registered chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Default for ChunkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only summary of one chunk, as yielded by
/// [`ChunkRegistry::dump_all`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ChunkSummary {
    /// Stored (possibly truncated) chunk name.
    pub name: Name,
    /// Payload budget requested at creation.
    pub total_size: usize,
    /// Sum of the sizes of allocated blocks.
    pub used_memory: usize,
    /// Sum of the sizes of free blocks.
    pub free_memory: usize,
    /// Number of blocks currently carved from the chunk.
    pub blocks: usize,
}

impl ChunkSummary {
    fn of(chunk: &Chunk) -> Self {
        Self {
            name: chunk.name(),
            total_size: chunk.total_size(),
            used_memory: chunk.used_memory(),
            free_memory: chunk.free_memory(),
            blocks: chunk.blocks().len(),
        }
    }
}

impl fmt::Display for ChunkSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "chunk \"{}\": total {}, used {}, free {}, blocks {}",
            self.name, self.total_size, self.used_memory, self.free_memory, self.blocks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ChunkRegistry;
    use crate::error::MemoryError;

    #[test]
    fn init_registers_the_chunk() {
        let mut registry = ChunkRegistry::new();
        let id = registry.init("C", 1024).unwrap();

        assert_eq!(registry.len(), 1);
        let summary = registry.dump_all().next().unwrap();
        assert_eq!(summary.name.as_str(), "C");
        assert_eq!(summary.total_size, 1024);
        assert_eq!(summary.used_memory, 0);
        assert_eq!(summary.free_memory, 1024);
        assert_eq!(summary.blocks, 1);
        assert!(registry.chunk(id).is_some());
    }

    #[test]
    fn init_failures_register_nothing() {
        let mut registry = ChunkRegistry::new();
        assert!(registry.init("C", 0).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn dealloc_unregisters_the_chunk() {
        let mut registry = ChunkRegistry::new();
        let id = registry.init("C", 1024).unwrap();

        registry.dealloc(id).unwrap();
        assert!(registry.is_empty());
        assert!(registry.chunk(id).is_none());

        // The entry is gone, so a second teardown is refused.
        assert!(matches!(
            registry.dealloc(id),
            Err(MemoryError::InvalidArgument(_)),
        ));
    }

    #[test]
    fn dump_all_preserves_creation_order() {
        let mut registry = ChunkRegistry::new();
        registry.init("first", 100).unwrap();
        registry.init("second", 200).unwrap();
        registry.init("third", 300).unwrap();

        let names: Vec<_> = registry
            .dump_all()
            .map(|summary| summary.name.as_str().to_owned())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut registry = ChunkRegistry::new();
        registry.init("a", 100).unwrap();
        registry.init("b", 200).unwrap();

        registry.clear_all();
        assert!(registry.is_empty());
        assert_eq!(registry.dump_all().count(), 0);

        // A second pass over the already-empty registry is a no-op.
        registry.clear_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_teardown() {
        let mut registry = ChunkRegistry::new();
        let first = registry.init("a", 100).unwrap();
        registry.dealloc(first).unwrap();

        let second = registry.init("b", 100).unwrap();
        assert_ne!(first, second);
        assert!(registry.chunk(first).is_none());
    }

    #[test]
    fn summary_display() {
        let mut registry = ChunkRegistry::new();
        registry.init("joyc", 1024).unwrap();

        let summary = registry.dump_all().next().unwrap();
        assert_eq!(
            summary.to_string(),
            "chunk \"joyc\": total 1024, used 0, free 1024, blocks 1",
        );
    }
}
