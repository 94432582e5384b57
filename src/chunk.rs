use crate::{
    block::{Block, BlockHandle, Blocks, BLOCK_OVERHEAD},
    error::{MemoryError, Result},
    name::Name,
};

use log::*;

/// A large contiguous backing region, subdivided into named blocks.
///
/// A chunk starts life as a single free block spanning the whole
/// region. Allocation selects the best-fitting free block and splits
/// off the remainder; freeing toggles a block back to free and
/// merges it with free neighbors. Memory only returns to the
/// operating system when the chunk itself is dropped.
///
/// All operations assume exclusive single-caller access, which the
/// `&mut self` receivers enforce; callers that need concurrent
/// access must serialize externally.
#[derive(Debug)]
pub struct Chunk {
    /// Stored (possibly truncated) chunk name.
    name: Name,
    /// Payload budget requested at creation, excluding metadata.
    total_size: usize,
    /// Sum of the sizes of allocated blocks.
    used_memory: usize,
    /// Sum of the sizes of free blocks.
    free_memory: usize,
    /// The backing region: the payload budget plus one metadata
    /// slot for the initial block. Splits carve further slots out
    /// of free payload space, so the region never grows.
    storage: Vec<u8>,
    /// Block descriptors in ascending offset order.
    blocks: Vec<Block>,
}

impl Chunk {
    /// Create a chunk with a backing region of `total_size` payload
    /// bytes, spanned by a single free block.
    pub fn new(name: &str, total_size: usize) -> Result<Self> {
        if total_size == 0 {
            return Err(MemoryError::InvalidArgument(
                "chunk size must be non-zero",
            ));
        }

        // Reserve the payload budget plus one metadata slot for the
        // initial block. The reservation is probed first so that an
        // unsatisfiable request comes back as an error instead of
        // aborting the process.
        let backing = total_size + BLOCK_OVERHEAD;
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(backing)
            .map_err(|_| MemoryError::BackingAllocationFailed { requested: backing })?;
        storage.resize(backing, 0);

        let name = stored_name(name);
        let blocks = vec![Block {
            name: Name::new(""),
            offset: 0,
            size: total_size,
            is_free: true,
        }];

        info!("Created chunk \"{}\" of {} bytes", name, total_size);

        Ok(Self {
            name,
            total_size,
            used_memory: 0,
            free_memory: total_size,
            storage,
            blocks,
        })
    }

    /// Allocate `size` bytes under the given name, using best-fit
    /// selection over the free blocks.
    pub fn alloc(&mut self, size: usize, name: &str) -> Result<BlockHandle> {
        if size == 0 {
            return Err(MemoryError::InvalidArgument(
                "allocation size must be non-zero",
            ));
        }

        // Scan the whole list and keep the smallest free block that
        // can hold the request. The strict comparison makes ties
        // resolve to the first candidate in list order, which is
        // also the lowest offset.
        let mut best = None;
        let mut best_size = usize::MAX;
        let mut largest_free = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            if !block.is_free {
                continue;
            }
            largest_free = largest_free.max(block.size);
            if block.size >= size && block.size < best_size {
                best = Some(index);
                best_size = block.size;
            }
        }

        // Free memory may well exceed the request in aggregate and
        // still not satisfy it, if it is fragmented across several
        // smaller blocks.
        let index = best.ok_or(MemoryError::OutOfSpace {
            requested: size,
            largest_free,
        })?;

        if best_size > size + BLOCK_OVERHEAD {
            // Split: the selected block shrinks to the exact
            // request, and the remainder becomes a new free block
            // spliced in right after it, keeping the list in
            // ascending offset order. The remainder's metadata slot
            // is paid for out of the free counter.
            let offset = self.blocks[index].offset;
            let remainder = Block {
                name: Name::new(""),
                offset: offset + BLOCK_OVERHEAD + size,
                size: best_size - size - BLOCK_OVERHEAD,
                is_free: true,
            };
            self.blocks[index].size = size;
            self.blocks.insert(index + 1, remainder);

            self.used_memory += size;
            self.free_memory -= size + BLOCK_OVERHEAD;
        } else {
            // The surplus is too small to track as a block of its
            // own, so the whole block is handed out and the extra
            // bytes stay accounted to it until it is freed.
            self.used_memory += best_size;
            self.free_memory -= best_size;
        }

        let block = &mut self.blocks[index];
        block.is_free = false;
        block.name = stored_name(name);

        debug!(
            "Allocated {} bytes as \"{}\" at offset {} in chunk \"{}\"",
            size, block.name, block.offset, self.name
        );

        let handle = BlockHandle(block.offset);
        self.check_accounting();
        Ok(handle)
    }

    /// Copy `data` into the block's payload. The slice length is the
    /// byte count; nothing is inferred from the data itself.
    pub fn write(&mut self, handle: BlockHandle, data: &[u8]) -> Result<()> {
        let block = self.resolve(handle)?;
        if data.len() > block.size {
            return Err(MemoryError::SizeExceedsBlock {
                requested: data.len(),
                available: block.size,
            });
        }

        let start = block.payload_start();
        self.storage[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Borrow the first `len` bytes of the block's payload.
    pub fn read(&self, handle: BlockHandle, len: usize) -> Result<&[u8]> {
        let block = self.resolve(handle)?;
        if len > block.size {
            return Err(MemoryError::SizeExceedsBlock {
                requested: len,
                available: block.size,
            });
        }

        let start = block.payload_start();
        Ok(&self.storage[start..start + len])
    }

    /// Free the first allocated block in list order whose name
    /// matches, then merge runs of adjacent free blocks.
    pub fn free(&mut self, name: &str) -> Result<()> {
        let target = Name::new(name);

        // Only allocated blocks are candidates; a free block that
        // still carries the same name from an earlier allocation is
        // skipped. Duplicates further down the list keep their
        // allocation.
        let block = self
            .blocks
            .iter_mut()
            .find(|block| !block.is_free && block.name == target)
            .ok_or(MemoryError::BlockNotFound(target))?;

        block.is_free = true;
        let size = block.size;
        self.used_memory -= size;
        self.free_memory += size;

        debug!(
            "Freed block \"{}\" of {} bytes in chunk \"{}\"",
            target, size, self.name
        );

        self.coalesce();
        self.check_accounting();
        Ok(())
    }

    /// Read-only traversal of the block list, in physical order.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks::new(&self.blocks)
    }

    /// Stored (possibly truncated) chunk name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Payload budget requested at creation.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Sum of the sizes of allocated blocks.
    pub fn used_memory(&self) -> usize {
        self.used_memory
    }

    /// Sum of the sizes of free blocks.
    pub fn free_memory(&self) -> usize {
        self.free_memory
    }

    /// Map a handle back to its block, failing on anything that is
    /// not a currently allocated block of this chunk.
    fn resolve(&self, handle: BlockHandle) -> Result<&Block> {
        self.blocks
            .binary_search_by(|block| block.offset.cmp(&handle.0))
            .ok()
            .map(|index| &self.blocks[index])
            .filter(|block| !block.is_free)
            .ok_or(MemoryError::InvalidArgument(
                "handle does not reference an allocated block",
            ))
    }

    /// One forward pass over the list, merging every run of
    /// adjacent free blocks.
    fn coalesce(&mut self) {
        let mut index = 0;
        while index + 1 < self.blocks.len() {
            if self.blocks[index].is_free && self.blocks[index + 1].is_free {
                // The first block absorbs the second's payload and
                // its metadata slot, and the scan stays put so a
                // longer run keeps collapsing into the same block.
                let absorbed = self.blocks.remove(index + 1);
                self.blocks[index].size += BLOCK_OVERHEAD + absorbed.size;
                self.free_memory += BLOCK_OVERHEAD;

                debug!(
                    "Coalesced {} bytes at offset {} in chunk \"{}\"",
                    self.blocks[index].size, self.blocks[index].offset, self.name
                );
            } else {
                index += 1;
            }
        }
    }

    fn check_accounting(&self) {
        debug_assert_eq!(
            self.used_memory + self.free_memory + BLOCK_OVERHEAD * (self.blocks.len() - 1),
            self.total_size,
        );
    }
}

/// Truncate a requested name to its stored form, telling the caller
/// through the log when the two differ.
fn stored_name(requested: &str) -> Name {
    let name = Name::new(requested);
    if name.as_str() != requested {
        warn!(
            "Name \"{}\" exceeds {} bytes, stored as \"{}\"",
            requested,
            Name::MAX_LEN,
            name
        );
    }
    name
}
