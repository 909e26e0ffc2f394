//! Allocation blocks and the best-fit free list.
//!
//! A [`Block`] records one live allocation. Released blocks become
//! [`FreeBlock`]s in the [`FreeList`], where later requests of an equal or
//! smaller size can pick them up before the arena bumps its cursor.

use std::fmt;
use std::time::Instant;

use tessera_core::Offset;

/// What a block holds, as declared by the caller that allocated it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// A dense `f64` vector.
    Vector {
        /// Element count.
        len: usize,
    },
    /// A row-major `f64` matrix.
    Matrix {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
    },
    /// Untyped words requested through the raw `allocate` ABI.
    Scratch,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector { len } => write!(f, "f64[{len}]"),
            Self::Matrix { rows, cols } => write!(f, "f64[{rows}x{cols}]"),
            Self::Scratch => write!(f, "scratch"),
        }
    }
}

/// A live allocation tracked by the arena.
///
/// Owned by whichever view wraps it until explicitly released. The
/// `serial` is unique per allocation for the lifetime of the arena, so a
/// stale view can be told apart from a new block that reuses its offset.
#[derive(Clone, Debug)]
pub struct Block {
    /// Start of the block (word-aligned).
    pub offset: Offset,
    /// Size in bytes. For reused blocks this is the free block's full size,
    /// which may exceed the request.
    pub size_bytes: usize,
    /// Declared contents.
    pub kind: BlockKind,
    /// Optional caller-supplied label for diagnostics.
    pub label: Option<String>,
    /// Monotonic allocation serial.
    pub serial: u64,
    /// When the block was handed out.
    pub created_at: Instant,
}

/// Summary of a successful allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Allocation {
    /// Start of the block.
    pub offset: Offset,
    /// Serial of the block (see [`Block::serial`]).
    pub serial: u64,
    /// Size of the block in bytes.
    pub size_bytes: usize,
    /// Whether the block came from the free list rather than the cursor.
    pub reused: bool,
}

/// A released range eligible for reuse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlock {
    /// Start of the range.
    pub offset: Offset,
    /// Size in bytes.
    pub size_bytes: usize,
}

/// Released blocks in release order.
///
/// Adjacent free blocks are never coalesced; a workload that frees many
/// small neighbours and then requests one large block will bump the cursor
/// instead of merging them.
#[derive(Clone, Debug, Default)]
pub struct FreeList {
    blocks: Vec<FreeBlock>,
}

impl FreeList {
    /// Create an empty free list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a released block at the back of the list.
    pub fn push(&mut self, block: FreeBlock) {
        self.blocks.push(block);
    }

    /// Index of the smallest block of at least `size_bytes`.
    ///
    /// Scans every block. On a tie the earliest-released block wins.
    pub fn best_fit(&self, size_bytes: usize) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, block) in self.blocks.iter().enumerate() {
            if block.size_bytes < size_bytes {
                continue;
            }
            match best {
                Some((_, best_size)) if block.size_bytes >= best_size => {}
                _ => best = Some((idx, block.size_bytes)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Remove and return the block at `idx`, preserving the order of the rest.
    pub fn take(&mut self, idx: usize) -> FreeBlock {
        self.blocks.remove(idx)
    }

    /// Drop every free block.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Number of free blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Sum of all free block sizes in bytes.
    pub fn total_bytes(&self) -> usize {
        self.blocks.iter().map(|b| b.size_bytes).sum()
    }

    /// Whether any free block starts at `offset`.
    pub fn contains(&self, offset: Offset) -> bool {
        self.blocks.iter().any(|b| b.offset == offset)
    }

    /// Iterate over free blocks in release order.
    pub fn iter(&self) -> impl Iterator<Item = &FreeBlock> {
        self.blocks.iter()
    }
}
