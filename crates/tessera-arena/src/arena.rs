//! The linear-memory arena.
//!
//! [`Arena`] owns one contiguous buffer addressed by byte [`Offset`]s.
//! Allocation is bump-first with best-fit reuse of released blocks:
//!
//! 1. Round the request up to a whole word.
//! 2. Take the smallest free block that fits, if any.
//! 3. Otherwise grow the buffer by whole pages if the cursor would run
//!    past capacity, then bump the cursor.
//!
//! Growth reallocates the backing `Vec`, so any slice borrowed before it
//! is invalid afterwards. The borrow checker already prevents holding one
//! across a `&mut self` call; [`Arena::generation`] additionally lets
//! handle-holding callers observe that a reallocation happened.

use std::time::Instant;

use indexmap::IndexMap;
use tessera_core::{Offset, WORD_BYTES};

use crate::block::{Allocation, Block, BlockKind, FreeBlock, FreeList};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::stats::{ArenaStats, Counters};
use crate::window::OutputWindow;

/// Growable arena with a reserved prefix, bump cursor and free list.
///
/// Designed for single-owner use: the arena performs no locking, and
/// concurrent callers must serialize access themselves (typically by
/// giving each execution context its own arena).
///
/// # Layout
///
/// ```text
/// 0            reserved_prefix        heap_cursor          capacity   max_capacity
/// |── reserved ──|── live + free blocks ──|──── unused ────|·· growth ··|
/// ```
pub struct Arena {
    /// Backing storage, one `f64` per 8-byte word. Zero-initialised.
    words: Vec<f64>,
    /// Next unallocated byte.
    heap_cursor: usize,
    /// Live blocks keyed by offset.
    live: IndexMap<Offset, Block>,
    /// Released blocks eligible for reuse.
    free_list: FreeList,
    /// Incremented every time `words` is reallocated.
    generation: u64,
    /// Next block serial.
    next_serial: u64,
    counters: Counters,
    config: ArenaConfig,
}

impl Arena {
    /// Create an arena with `config.initial_pages` committed pages.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if the config violates
    /// any of the invariants documented on [`ArenaConfig`].
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let words = vec![0.0; config.initial_capacity() / WORD_BYTES];
        Ok(Self {
            words,
            heap_cursor: config.reserved_prefix,
            live: IndexMap::new(),
            free_list: FreeList::new(),
            generation: 0,
            next_serial: 1,
            counters: Counters::default(),
            config,
        })
    }

    /// Allocate `byte_size` bytes of untyped scratch space.
    ///
    /// This is the raw ABI form of [`Arena::allocate_block`].
    pub fn allocate(&mut self, byte_size: usize) -> Result<Offset, ArenaError> {
        self.allocate_block(byte_size, BlockKind::Scratch, None)
            .map(|a| a.offset)
    }

    /// Allocate a block of at least `byte_size` bytes.
    ///
    /// The returned region is word-aligned, lies at or above the reserved
    /// prefix, does not overlap any other live block, and is zero-filled.
    /// Zero-byte requests are treated as one word.
    ///
    /// Fails with [`ArenaError::AllocationFailed`] if the free list has no
    /// fit and growing the buffer would exceed the maximum capacity.
    pub fn allocate_block(
        &mut self,
        byte_size: usize,
        kind: BlockKind,
        label: Option<String>,
    ) -> Result<Allocation, ArenaError> {
        let aligned = Offset::align_up(byte_size.max(1)).ok_or(ArenaError::AllocationFailed {
            requested: byte_size,
            capacity: self.capacity(),
            max_capacity: self.max_capacity(),
        })?;

        if let Some(idx) = self.free_list.best_fit(aligned) {
            let free = self.free_list.take(idx);
            tracing::trace!(offset = %free.offset, requested = aligned, size = free.size_bytes, "reused free block");
            return Ok(self.track(free.offset, free.size_bytes, kind, label, true));
        }

        let available = self.capacity() - self.heap_cursor;
        if available < aligned {
            let capacity = self.capacity();
            self.grow(aligned - available)
                .map_err(|_| ArenaError::AllocationFailed {
                    requested: aligned,
                    capacity,
                    max_capacity: self.max_capacity(),
                })?;
        }

        let offset = Offset(self.heap_cursor);
        self.heap_cursor += aligned;
        Ok(self.track(offset, aligned, kind, label, false))
    }

    fn track(
        &mut self,
        offset: Offset,
        size_bytes: usize,
        kind: BlockKind,
        label: Option<String>,
        reused: bool,
    ) -> Allocation {
        // Reused ranges may hold a previous owner's data; bumped ranges past
        // a reset may too.
        let start = offset.word_index();
        self.words[start..start + size_bytes / WORD_BYTES].fill(0.0);

        let serial = self.next_serial;
        self.next_serial += 1;
        self.live.insert(
            offset,
            Block {
                offset,
                size_bytes,
                kind,
                label,
                serial,
                created_at: Instant::now(),
            },
        );
        self.counters.record_alloc(size_bytes, reused);
        Allocation {
            offset,
            serial,
            size_bytes,
            reused,
        }
    }

    /// Release the block at `offset` to the free list.
    ///
    /// Releasing an offset that is not live (never allocated, already
    /// released, or discarded by a reset) is logged and ignored; the return
    /// value is `false` in that case. Adjacent free blocks are not merged.
    pub fn deallocate(&mut self, offset: Offset) -> bool {
        match self.live.swap_remove(&offset) {
            Some(block) => {
                self.counters.record_dealloc(block.size_bytes);
                self.free_list.push(FreeBlock {
                    offset,
                    size_bytes: block.size_bytes,
                });
                true
            }
            None => {
                self.counters.unknown_deallocations += 1;
                tracing::warn!(%offset, "deallocate of unknown offset ignored");
                false
            }
        }
    }

    /// Discard every allocation and rewind the cursor to the reserved prefix.
    ///
    /// The backing buffer keeps its current capacity.
    pub fn reset(&mut self) {
        self.live.clear();
        self.free_list.clear();
        self.heap_cursor = self.config.reserved_prefix;
        self.counters.record_reset();
    }

    /// Grow the buffer by enough whole pages to cover `additional_bytes`.
    ///
    /// Returns the new capacity. Fails with [`ArenaError::OutOfMemory`]
    /// if the result would exceed the maximum capacity; the buffer is left
    /// untouched in that case. Growing by zero bytes is a no-op.
    pub fn grow(&mut self, additional_bytes: usize) -> Result<usize, ArenaError> {
        let old_capacity = self.capacity();
        if additional_bytes == 0 {
            return Ok(old_capacity);
        }
        let page = self.config.page_size;
        let pages = additional_bytes.div_ceil(page);
        let new_capacity = pages
            .checked_mul(page)
            .and_then(|bytes| old_capacity.checked_add(bytes))
            .filter(|&cap| cap <= self.max_capacity())
            .ok_or(ArenaError::OutOfMemory {
                requested_capacity: old_capacity
                    .saturating_add(pages.saturating_mul(page)),
                max_capacity: self.max_capacity(),
            })?;

        self.words.resize(new_capacity / WORD_BYTES, 0.0);
        self.generation += 1;
        self.counters.grow_events += 1;
        tracing::debug!(
            old_capacity,
            new_capacity,
            generation = self.generation,
            "arena grown"
        );
        Ok(new_capacity)
    }

    /// Check that `size` bytes at `offset` lie inside the addressable region.
    ///
    /// Fails with [`ArenaError::InvalidPointer`] if `offset` is below the
    /// reserved prefix, `offset + size` exceeds the capacity, or `offset`
    /// is not word-aligned.
    pub fn validate(&self, offset: Offset, size: usize) -> Result<(), ArenaError> {
        let in_bounds = offset.0 >= self.config.reserved_prefix
            && offset
                .0
                .checked_add(size)
                .is_some_and(|end| end <= self.capacity());
        if in_bounds && offset.is_aligned() {
            Ok(())
        } else {
            Err(self.invalid_pointer(offset, size))
        }
    }

    fn invalid_pointer(&self, offset: Offset, size: usize) -> ArenaError {
        ArenaError::InvalidPointer {
            offset,
            size,
            reserved_prefix: self.config.reserved_prefix,
            capacity: self.capacity(),
        }
    }

    fn word_range(&self, offset: Offset, len: usize) -> Result<std::ops::Range<usize>, ArenaError> {
        let size = len
            .checked_mul(WORD_BYTES)
            .ok_or_else(|| self.invalid_pointer(offset, usize::MAX))?;
        self.validate(offset, size)?;
        let start = offset.word_index();
        Ok(start..start + len)
    }

    /// Borrow `len` `f64`s starting at `offset`.
    pub fn words(&self, offset: Offset, len: usize) -> Result<&[f64], ArenaError> {
        let range = self.word_range(offset, len)?;
        Ok(&self.words[range])
    }

    /// Mutably borrow `len` `f64`s starting at `offset`.
    pub fn words_mut(&mut self, offset: Offset, len: usize) -> Result<&mut [f64], ArenaError> {
        let range = self.word_range(offset, len)?;
        Ok(&mut self.words[range])
    }

    /// Split the buffer around an output region of `len` words at `offset`.
    ///
    /// See [`OutputWindow`].
    pub fn output_window(
        &mut self,
        offset: Offset,
        len: usize,
    ) -> Result<OutputWindow<'_>, ArenaError> {
        let range = self.word_range(offset, len)?;
        Ok(OutputWindow::new(
            &mut self.words,
            range.start,
            len,
            self.config.reserved_prefix,
        ))
    }

    /// Copy `len` words from `src` to `dst`. The regions may overlap.
    pub fn copy_within(&mut self, src: Offset, dst: Offset, len: usize) -> Result<(), ArenaError> {
        let from = self.word_range(src, len)?;
        let to = self.word_range(dst, len)?;
        self.words.copy_within(from, to.start);
        Ok(())
    }

    /// Encode `len` words at `offset` as little-endian bytes.
    pub fn read_bytes(&self, offset: Offset, len: usize) -> Result<Vec<u8>, ArenaError> {
        let words = self.words(offset, len)?;
        Ok(words.iter().flat_map(|w| w.to_le_bytes()).collect())
    }

    /// Decode little-endian bytes into the words at `offset`.
    ///
    /// `bytes.len()` must be a multiple of 8; a trailing partial word is
    /// rejected as an invalid pointer.
    pub fn write_bytes(&mut self, offset: Offset, bytes: &[u8]) -> Result<(), ArenaError> {
        if bytes.len() % WORD_BYTES != 0 {
            return Err(self.invalid_pointer(offset, bytes.len()));
        }
        let words = self.words_mut(offset, bytes.len() / WORD_BYTES)?;
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(WORD_BYTES)) {
            let mut raw = [0u8; WORD_BYTES];
            raw.copy_from_slice(chunk);
            *word = f64::from_le_bytes(raw);
        }
        Ok(())
    }

    /// The live block starting at `offset`, if any.
    pub fn block(&self, offset: Offset) -> Option<&Block> {
        self.live.get(&offset)
    }

    /// Whether the block at `offset` is still the allocation with `serial`.
    pub fn is_live(&self, offset: Offset, serial: u64) -> bool {
        self.live.get(&offset).is_some_and(|b| b.serial == serial)
    }

    /// Iterate over live blocks.
    pub fn live_blocks(&self) -> impl Iterator<Item = &Block> {
        self.live.values()
    }

    /// Iterate over free blocks in release order.
    pub fn free_blocks(&self) -> impl Iterator<Item = &FreeBlock> {
        self.free_list.iter()
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    /// Maximum capacity in bytes.
    pub fn max_capacity(&self) -> usize {
        self.config.max_capacity()
    }

    /// Bump cursor position in bytes.
    pub fn heap_cursor(&self) -> usize {
        self.heap_cursor
    }

    /// First allocatable byte.
    pub fn reserved_prefix(&self) -> usize {
        self.config.reserved_prefix
    }

    /// Bytes held by live blocks.
    pub fn usage(&self) -> usize {
        self.counters.current_usage
    }

    /// Number of reallocations of the backing buffer so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The config this arena was created with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Snapshot of all counters.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            total_allocations: self.counters.total_allocations,
            total_deallocations: self.counters.total_deallocations,
            current_usage: self.counters.current_usage,
            peak_usage: self.counters.peak_usage,
            capacity: self.capacity(),
            max_capacity: self.max_capacity(),
            heap_cursor: self.heap_cursor,
            live_blocks: self.live.len(),
            free_blocks: self.free_list.len(),
            reuse_hits: self.counters.reuse_hits,
            grow_events: self.counters.grow_events,
            resets: self.counters.resets,
            unknown_deallocations: self.counters.unknown_deallocations,
            generation: self.generation,
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("heap_cursor", &self.heap_cursor)
            .field("live", &self.live.len())
            .field("free", &self.free_list.len())
            .field("generation", &self.generation)
            .finish()
    }
}
