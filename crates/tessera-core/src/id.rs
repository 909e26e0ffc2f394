//! Strongly-typed identifiers and the [`Offset`] byte address.

use std::fmt;

/// Size of one arena word in bytes.
///
/// Every allocation is rounded up to a whole number of words so that any
/// offset handed out by the arena can be read as a little-endian `f64`.
pub const WORD_BYTES: usize = 8;

/// Byte address into an arena's linear buffer.
///
/// Offsets are raw positions, not handles: they carry no generation or
/// ownership information. The arena validates them on acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset(pub usize);

impl Offset {
    /// Round `bytes` up to the next multiple of [`WORD_BYTES`].
    ///
    /// Returns `None` on overflow.
    pub fn align_up(bytes: usize) -> Option<usize> {
        bytes
            .checked_add(WORD_BYTES - 1)
            .map(|b| b & !(WORD_BYTES - 1))
    }

    /// Whether this offset sits on a word boundary.
    pub fn is_aligned(self) -> bool {
        self.0 % WORD_BYTES == 0
    }

    /// Index of the word this offset starts at.
    pub fn word_index(self) -> usize {
        self.0 / WORD_BYTES
    }

    /// The offset `words` words past this one.
    pub fn add_words(self, words: usize) -> Self {
        Self(self.0 + words * WORD_BYTES)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<usize> for Offset {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Identifies one in-flight compute request within a worker pool.
///
/// Assigned from a per-pool monotonic counter; never reused while the
/// pool is alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a worker within a pool.
///
/// `WorkerId(n)` is the n-th worker spawned by the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WorkerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a subscription in an [`ObserverSet`](crate::ObserverSet).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn align_up_rounds_to_word() {
        assert_eq!(Offset::align_up(0), Some(0));
        assert_eq!(Offset::align_up(1), Some(8));
        assert_eq!(Offset::align_up(8), Some(8));
        assert_eq!(Offset::align_up(100), Some(104));
    }

    #[test]
    fn align_up_overflow_is_none() {
        assert_eq!(Offset::align_up(usize::MAX), None);
    }

    #[test]
    fn word_index_and_add_words() {
        let o = Offset(64);
        assert_eq!(o.word_index(), 8);
        assert_eq!(o.add_words(3), Offset(88));
        assert!(o.is_aligned());
        assert!(!Offset(65).is_aligned());
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Offset(255).to_string(), "0xff");
        assert_eq!(RequestId(7).to_string(), "7");
        assert_eq!(WorkerId(2).to_string(), "2");
    }

    proptest! {
        #[test]
        fn align_up_is_smallest_aligned_cover(bytes in 0usize..1_000_000) {
            let aligned = Offset::align_up(bytes).unwrap();
            prop_assert_eq!(aligned % WORD_BYTES, 0);
            prop_assert!(aligned >= bytes);
            prop_assert!(aligned - bytes < WORD_BYTES);
        }
    }
}
