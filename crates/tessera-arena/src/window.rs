//! Split borrows for kernels that read several regions and write one.
//!
//! The arena's buffer is a single `Vec<f64>`, so a kernel cannot hold a
//! `&mut` output slice and `&` input slices into it at the same time.
//! [`OutputWindow`] splits the buffer around the output region: inputs are
//! served from the words before or after it, and an input that reaches
//! into the output is refused.

use tessera_core::{Offset, WORD_BYTES};

use crate::error::ArenaError;

/// Mutable output region plus shared access to the rest of the buffer.
///
/// Created by [`Arena::output_window`](crate::Arena::output_window).
pub struct OutputWindow<'a> {
    before: &'a [f64],
    output: &'a mut [f64],
    after: &'a [f64],
    out_start: usize,
    out_end: usize,
    reserved_prefix: usize,
}

impl<'a> OutputWindow<'a> {
    pub(crate) fn new(
        words: &'a mut [f64],
        out_start: usize,
        out_len: usize,
        reserved_prefix: usize,
    ) -> Self {
        let (before, rest) = words.split_at_mut(out_start);
        let (output, after) = rest.split_at_mut(out_len);
        Self {
            before,
            output,
            after,
            out_start,
            out_end: out_start + out_len,
            reserved_prefix,
        }
    }

    /// Borrow `len` words starting at `offset` for reading.
    ///
    /// Fails with [`ArenaError::InvalidPointer`] if the region is out of
    /// bounds, unaligned, or overlaps the output region.
    pub fn input(&self, offset: Offset, len: usize) -> Result<&'a [f64], ArenaError> {
        if len == 0 {
            return Ok(&[]);
        }
        let capacity = (self.before.len() + self.output.len() + self.after.len()) * WORD_BYTES;
        let invalid = || ArenaError::InvalidPointer {
            offset,
            size: len * WORD_BYTES,
            reserved_prefix: self.reserved_prefix,
            capacity,
        };
        if !offset.is_aligned() || offset.0 < self.reserved_prefix {
            return Err(invalid());
        }
        let start = offset.word_index();
        let end = start.checked_add(len).ok_or_else(invalid)?;
        let before: &'a [f64] = self.before;
        let after: &'a [f64] = self.after;
        if end <= self.out_start {
            Ok(&before[start..end])
        } else if start >= self.out_end {
            let words_after = after.len();
            if end - self.out_end > words_after {
                return Err(invalid());
            }
            Ok(&after[start - self.out_end..end - self.out_end])
        } else {
            Err(invalid())
        }
    }

    /// The output region.
    pub fn output(&mut self) -> &mut [f64] {
        self.output
    }

    /// Length of the output region in words.
    pub fn output_len(&self) -> usize {
        self.output.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> Vec<f64> {
        (0..16).map(|i| i as f64).collect()
    }

    #[test]
    fn reads_on_both_sides_of_output() {
        let mut words = buffer();
        let mut win = OutputWindow::new(&mut words, 4, 4, 0);
        let left = win.input(Offset(0), 4).unwrap();
        let right = win.input(Offset(8 * 8), 2).unwrap();
        assert_eq!(left, &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(right, &[8.0, 9.0]);
        win.output().copy_from_slice(&[left[0], left[1], right[0], right[1]]);
        drop(win);
        assert_eq!(&words[4..8], &[0.0, 1.0, 8.0, 9.0]);
    }

    #[test]
    fn overlapping_input_rejected() {
        let mut words = buffer();
        let win = OutputWindow::new(&mut words, 4, 4, 0);
        assert!(matches!(
            win.input(Offset(2 * 8), 4),
            Err(ArenaError::InvalidPointer { .. })
        ));
        assert!(win.input(Offset(5 * 8), 1).is_err());
    }

    #[test]
    fn out_of_bounds_input_rejected() {
        let mut words = buffer();
        let win = OutputWindow::new(&mut words, 4, 4, 0);
        assert!(win.input(Offset(14 * 8), 4).is_err());
    }

    #[test]
    fn reserved_prefix_enforced() {
        let mut words = buffer();
        let win = OutputWindow::new(&mut words, 8, 4, 16);
        assert!(win.input(Offset(8), 1).is_err());
        assert!(win.input(Offset(16), 1).is_ok());
    }

    #[test]
    fn empty_input_always_ok() {
        let mut words = buffer();
        let win = OutputWindow::new(&mut words, 4, 4, 0);
        assert!(win.input(Offset(5 * 8), 0).unwrap().is_empty());
    }
}
