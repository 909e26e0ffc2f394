//! Allocation counters and the observable [`ArenaStats`] snapshot.

/// Point-in-time view of an arena's counters and geometry.
///
/// Cumulative counters (`total_*`, `reuse_hits`, `grow_events`, `resets`,
/// `unknown_deallocations`) only ever increase. `peak_usage` is a high-water
/// mark that survives [`Arena::reset`](crate::Arena::reset).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Allocations handed out since creation.
    pub total_allocations: u64,
    /// Successful deallocations since creation.
    pub total_deallocations: u64,
    /// Bytes held by live blocks.
    pub current_usage: usize,
    /// Highest `current_usage` ever observed.
    pub peak_usage: usize,
    /// Buffer capacity in bytes.
    pub capacity: usize,
    /// Configured maximum capacity in bytes.
    pub max_capacity: usize,
    /// Bump cursor position in bytes.
    pub heap_cursor: usize,
    /// Number of live blocks.
    pub live_blocks: usize,
    /// Number of blocks on the free list.
    pub free_blocks: usize,
    /// Allocations satisfied from the free list.
    pub reuse_hits: u64,
    /// Number of times the buffer was grown.
    pub grow_events: u64,
    /// Number of resets.
    pub resets: u64,
    /// Deallocations of offsets that were not live.
    pub unknown_deallocations: u64,
    /// Current buffer generation.
    pub generation: u64,
}

/// Mutable counter state owned by the arena.
#[derive(Clone, Debug, Default)]
pub(crate) struct Counters {
    pub total_allocations: u64,
    pub total_deallocations: u64,
    pub current_usage: usize,
    pub peak_usage: usize,
    pub reuse_hits: u64,
    pub grow_events: u64,
    pub resets: u64,
    pub unknown_deallocations: u64,
}

impl Counters {
    pub fn record_alloc(&mut self, size_bytes: usize, reused: bool) {
        self.total_allocations += 1;
        if reused {
            self.reuse_hits += 1;
        }
        self.current_usage += size_bytes;
        self.peak_usage = self.peak_usage.max(self.current_usage);
    }

    pub fn record_dealloc(&mut self, size_bytes: usize) {
        self.total_deallocations += 1;
        self.current_usage -= size_bytes;
    }

    pub fn record_reset(&mut self) {
        self.resets += 1;
        self.current_usage = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = ArenaStats::default();
        assert_eq!(s.total_allocations, 0);
        assert_eq!(s.current_usage, 0);
        assert_eq!(s.peak_usage, 0);
        assert_eq!(s.generation, 0);
    }

    #[test]
    fn peak_is_high_water_mark() {
        let mut c = Counters::default();
        c.record_alloc(64, false);
        c.record_alloc(32, true);
        c.record_dealloc(64);
        assert_eq!(c.current_usage, 32);
        assert_eq!(c.peak_usage, 96);
        assert_eq!(c.reuse_hits, 1);
        c.record_reset();
        assert_eq!(c.current_usage, 0);
        assert_eq!(c.peak_usage, 96);
    }
}
