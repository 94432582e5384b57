use crate::name::Name;

use thiserror::Error;

/// The ways an operation on a chunk or registry can fail. Every
/// failure is a recoverable return value; the allocator never aborts
/// the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// No free block can satisfy the request. This can happen even
    /// when the aggregate free memory exceeds the request, if that
    /// memory is fragmented across several smaller free blocks.
    #[error("out of space: requested {requested} bytes, largest free block has {largest_free}")]
    OutOfSpace {
        requested: usize,
        largest_free: usize,
    },

    /// A malformed argument: a zero size, an unknown chunk id, or a
    /// handle that no longer references an allocated block.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The backing region for a new chunk could not be reserved.
    #[error("backing allocation of {requested} bytes failed")]
    BackingAllocationFailed { requested: usize },

    /// No allocated block carries the given name.
    #[error("no allocated block named \"{0}\"")]
    BlockNotFound(Name),

    /// A write or read would run past the block's payload.
    #[error("size exceeds block: requested {requested} bytes, block holds {available}")]
    SizeExceedsBlock {
        requested: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, MemoryError>;
