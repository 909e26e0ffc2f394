//! Owned compute requests for the worker pool.
//!
//! An [`Operation`] carries its input buffers by value. Submitting it
//! moves those buffers across the channel into the worker thread; the
//! caller cannot touch them afterwards. The worker stages the inputs in
//! its private arena, runs the kernel, and sends back an owned
//! [`ComputeValue`].

use tessera_kernels::MatrixShape;

use crate::compute::ComputeContext;
use crate::error::ComputeError;

/// A kernel invocation with owned inputs.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Σ aᵢ·bᵢ.
    Dot {
        /// First operand.
        a: Vec<f64>,
        /// Second operand.
        b: Vec<f64>,
    },
    /// Euclidean norm.
    Magnitude {
        /// Input vector.
        data: Vec<f64>,
    },
    /// Unit vector in the direction of `data`.
    Normalize {
        /// Input vector.
        data: Vec<f64>,
    },
    /// Element-wise sum.
    Add {
        /// First operand.
        a: Vec<f64>,
        /// Second operand.
        b: Vec<f64>,
    },
    /// Element-wise product with a scalar.
    Scale {
        /// Input vector.
        data: Vec<f64>,
        /// Multiplier.
        factor: f64,
    },
    /// Row-major matrix product.
    MatrixMultiply {
        /// Left operand.
        a: Vec<f64>,
        /// Shape of `a`.
        a_shape: MatrixShape,
        /// Right operand.
        b: Vec<f64>,
        /// Shape of `b`.
        b_shape: MatrixShape,
    },
    /// Matrix transpose.
    Transpose {
        /// Input matrix.
        data: Vec<f64>,
        /// Shape of `data`.
        shape: MatrixShape,
    },
    /// Frobenius norm of a flattened matrix.
    FrobeniusNorm {
        /// Input matrix.
        data: Vec<f64>,
    },
    /// Arithmetic mean.
    Mean {
        /// Samples.
        data: Vec<f64>,
    },
    /// Sample variance.
    Variance {
        /// Samples.
        data: Vec<f64>,
    },
    /// Sample standard deviation.
    StdDev {
        /// Samples.
        data: Vec<f64>,
    },
    /// Centered moving average.
    MovingAverage {
        /// Input signal.
        data: Vec<f64>,
        /// Window width.
        window: usize,
    },
    /// Centered correlation with zero padding.
    Convolve {
        /// Input signal.
        data: Vec<f64>,
        /// Filter taps.
        kernel: Vec<f64>,
    },
    /// Sum of `data[start..end]`.
    ChunkSum {
        /// Input array.
        data: Vec<f64>,
        /// First index.
        start: usize,
        /// One past the last index.
        end: usize,
    },
}

impl Operation {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dot { .. } => "dot",
            Self::Magnitude { .. } => "magnitude",
            Self::Normalize { .. } => "normalize",
            Self::Add { .. } => "add",
            Self::Scale { .. } => "scale",
            Self::MatrixMultiply { .. } => "matrix_multiply",
            Self::Transpose { .. } => "transpose",
            Self::FrobeniusNorm { .. } => "frobenius_norm",
            Self::Mean { .. } => "mean",
            Self::Variance { .. } => "variance",
            Self::StdDev { .. } => "std_dev",
            Self::MovingAverage { .. } => "moving_average",
            Self::Convolve { .. } => "convolve",
            Self::ChunkSum { .. } => "chunk_sum",
        }
    }

    /// Stage the inputs in `ctx`, run the kernel, and copy the result out.
    ///
    /// Leaves the staged blocks allocated; callers that reuse `ctx`
    /// should reset it afterwards.
    pub fn execute(&self, ctx: &mut ComputeContext) -> Result<ComputeValue, ComputeError> {
        match self {
            Self::Dot { a, b } => {
                let a = ctx.vector_from(a)?;
                let b = ctx.vector_from(b)?;
                ctx.dot(a, b).map(ComputeValue::Scalar)
            }
            Self::Magnitude { data } => {
                let v = ctx.vector_from(data)?;
                ctx.magnitude(v).map(ComputeValue::Scalar)
            }
            Self::Normalize { data } => {
                let v = ctx.vector_from(data)?;
                ctx.normalize(v)?;
                ctx.read(v).map(ComputeValue::Vector)
            }
            Self::Add { a, b } => {
                let a = ctx.vector_from(a)?;
                let b = ctx.vector_from(b)?;
                let out = ctx.add(a, b)?;
                ctx.read(out).map(ComputeValue::Vector)
            }
            Self::Scale { data, factor } => {
                let v = ctx.vector_from(data)?;
                ctx.scale_into(v, *factor, v)?;
                ctx.read(v).map(ComputeValue::Vector)
            }
            Self::MatrixMultiply {
                a,
                a_shape,
                b,
                b_shape,
            } => {
                let a = ctx.matrix_from(a_shape.rows, a_shape.cols, a)?;
                let b = ctx.matrix_from(b_shape.rows, b_shape.cols, b)?;
                let out = ctx.matmul(a, b)?;
                Ok(ComputeValue::Matrix {
                    rows: out.rows(),
                    cols: out.cols(),
                    data: ctx.read_matrix(out)?,
                })
            }
            Self::Transpose { data, shape } => {
                let m = ctx.matrix_from(shape.rows, shape.cols, data)?;
                let out = ctx.transpose(m)?;
                Ok(ComputeValue::Matrix {
                    rows: out.rows(),
                    cols: out.cols(),
                    data: ctx.read_matrix(out)?,
                })
            }
            Self::FrobeniusNorm { data } => {
                let m = ctx.matrix_from(1, data.len(), data)?;
                ctx.frobenius_norm(m).map(ComputeValue::Scalar)
            }
            Self::Mean { data } => {
                let v = ctx.vector_from(data)?;
                ctx.mean(v).map(ComputeValue::Scalar)
            }
            Self::Variance { data } => {
                let v = ctx.vector_from(data)?;
                ctx.variance(v).map(ComputeValue::Scalar)
            }
            Self::StdDev { data } => {
                let v = ctx.vector_from(data)?;
                ctx.std_dev(v).map(ComputeValue::Scalar)
            }
            Self::MovingAverage { data, window } => {
                let v = ctx.vector_from(data)?;
                let out = ctx.moving_average(v, *window)?;
                ctx.read(out).map(ComputeValue::Vector)
            }
            Self::Convolve { data, kernel } => {
                let v = ctx.vector_from(data)?;
                let k = ctx.vector_from(kernel)?;
                let out = ctx.convolve(v, k)?;
                ctx.read(out).map(ComputeValue::Vector)
            }
            Self::ChunkSum { data, start, end } => {
                let v = ctx.vector_from(data)?;
                ctx.chunk_sum(v, *start, *end).map(ComputeValue::Scalar)
            }
        }
    }
}

/// Owned result of an [`Operation`].
#[derive(Clone, Debug, PartialEq)]
pub enum ComputeValue {
    /// A reduction result.
    Scalar(f64),
    /// A vector result.
    Vector(Vec<f64>),
    /// A row-major matrix result.
    Matrix {
        /// Row count.
        rows: usize,
        /// Column count.
        cols: usize,
        /// Row-major elements.
        data: Vec<f64>,
    },
}

impl ComputeValue {
    /// The scalar, if this is a reduction result.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// The elements of a vector or matrix result.
    pub fn into_vec(self) -> Option<Vec<f64>> {
        match self {
            Self::Scalar(_) => None,
            Self::Vector(data) | Self::Matrix { data, .. } => Some(data),
        }
    }
}
