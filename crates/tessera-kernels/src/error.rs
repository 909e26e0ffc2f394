//! Kernel error types.

use std::error::Error;
use std::fmt;

use tessera_arena::ArenaError;
use tessera_core::Offset;

/// Errors that can occur when invoking a kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelError {
    /// A region failed arena validation.
    Arena(ArenaError),
    /// Two operands that must have equal length do not.
    LengthMismatch {
        /// Length of the first operand.
        left: usize,
        /// Length of the second operand.
        right: usize,
    },
    /// Inner matrix dimensions disagree.
    DimensionMismatch {
        /// Columns of the left operand.
        left_cols: usize,
        /// Rows of the right operand.
        right_rows: usize,
    },
    /// An output region partially overlaps an input the kernel cannot
    /// compute in place.
    OverlappingRegions {
        /// Start of the input region.
        input: Offset,
        /// Start of the output region.
        output: Offset,
    },
    /// A matrix shape whose element count does not fit in `usize`.
    ShapeOverflow {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },
    /// A write kernel was run where a reduction was expected.
    NotAReduction {
        /// Kernel name.
        kernel: &'static str,
    },
    /// A chunk range with `start > end`.
    EmptyRange {
        /// Requested start index.
        start: usize,
        /// Requested end index.
        end: usize,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::LengthMismatch { left, right } => {
                write!(f, "length mismatch: {left} vs {right}")
            }
            Self::DimensionMismatch {
                left_cols,
                right_rows,
            } => {
                write!(
                    f,
                    "dimension mismatch: left has {left_cols} columns, right has {right_rows} rows"
                )
            }
            Self::OverlappingRegions { input, output } => {
                write!(f, "output at {output} overlaps input at {input}")
            }
            Self::ShapeOverflow { rows, cols } => {
                write!(f, "shape {rows}x{cols} overflows the element count")
            }
            Self::NotAReduction { kernel } => write!(f, "{kernel} is not a reduction"),
            Self::EmptyRange { start, end } => {
                write!(f, "invalid range: start {start} > end {end}")
            }
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for KernelError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}
