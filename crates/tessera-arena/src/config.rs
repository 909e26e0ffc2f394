//! Arena configuration parameters.

use tessera_core::WORD_BYTES;

use crate::error::ArenaError;

/// Configuration for the arena allocator.
///
/// Controls page sizing, the initial and maximum buffer size, and the
/// reserved prefix excluded from allocation. Validated at construction;
/// all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Growth granularity in bytes.
    ///
    /// Default: 65_536 (64 KiB). Must be a non-zero multiple of 8.
    pub page_size: usize,

    /// Number of pages committed when the arena is created.
    ///
    /// Default: 16 (1 MiB at the default page size).
    pub initial_pages: usize,

    /// Hard ceiling on the number of pages the buffer may grow to.
    ///
    /// Default: 4096 (256 MiB at the default page size). Growth that would
    /// exceed `max_pages * page_size` fails with
    /// [`ArenaError::OutOfMemory`].
    pub max_pages: usize,

    /// Bytes at the start of the buffer that are never handed out.
    ///
    /// Default: 1024. Must be a multiple of 8 and smaller than the initial
    /// capacity. Offsets below this are rejected as invalid pointers, so a
    /// zeroed offset can never alias a live block.
    pub reserved_prefix: usize,
}

impl ArenaConfig {
    /// Default page size: 64 KiB.
    pub const DEFAULT_PAGE_SIZE: usize = 65_536;

    /// Default initial page count.
    pub const DEFAULT_INITIAL_PAGES: usize = 16;

    /// Default maximum page count.
    pub const DEFAULT_MAX_PAGES: usize = 4096;

    /// Default reserved prefix in bytes.
    pub const DEFAULT_RESERVED_PREFIX: usize = 1024;

    /// Create a config with the given initial and maximum page counts.
    ///
    /// Uses default values for all other parameters.
    pub fn with_pages(initial_pages: usize, max_pages: usize) -> Self {
        Self {
            initial_pages,
            max_pages,
            ..Self::default()
        }
    }

    /// Capacity of a freshly created arena in bytes.
    pub fn initial_capacity(&self) -> usize {
        self.initial_pages.saturating_mul(self.page_size)
    }

    /// Upper bound on the arena's capacity in bytes.
    pub fn max_capacity(&self) -> usize {
        self.max_pages.saturating_mul(self.page_size)
    }

    /// Check the structural invariants of this config.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.page_size == 0 || self.page_size % WORD_BYTES != 0 {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "page_size must be a non-zero multiple of {WORD_BYTES} (got {})",
                    self.page_size
                ),
            });
        }
        if self.initial_pages == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "initial_pages must be at least 1".into(),
            });
        }
        if self.initial_pages > self.max_pages {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "initial_pages ({}) exceeds max_pages ({})",
                    self.initial_pages, self.max_pages
                ),
            });
        }
        if self.max_pages.checked_mul(self.page_size).is_none() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "max_pages * page_size overflows ({} * {})",
                    self.max_pages, self.page_size
                ),
            });
        }
        if self.reserved_prefix % WORD_BYTES != 0 {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "reserved_prefix must be a multiple of {WORD_BYTES} (got {})",
                    self.reserved_prefix
                ),
            });
        }
        if self.reserved_prefix >= self.initial_capacity() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "reserved_prefix ({}) must be smaller than the initial capacity ({})",
                    self.reserved_prefix,
                    self.initial_capacity()
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
            initial_pages: Self::DEFAULT_INITIAL_PAGES,
            max_pages: Self::DEFAULT_MAX_PAGES,
            reserved_prefix: Self::DEFAULT_RESERVED_PREFIX,
        }
    }
}
