use ag_kernel::KernelError;
use thiserror::Error;

/// Failures of shape algebra and array operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NdError {
    #[error("cannot reshape array of size {count} into shape {shape:?}")]
    ReshapeCount { count: usize, shape: Vec<isize> },

    #[error("can only specify one unknown dimension, got {shape:?}")]
    ReshapePlaceholders { shape: Vec<isize> },

    #[error("cannot broadcast {left:?} with {right:?}")]
    BroadcastMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("cannot contract {left:?} with {right:?}")]
    DotMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("axis {axis} is out of range for rank {rank}")]
    AxisOutOfRange { axis: isize, rank: usize },

    #[error("{table:?} is not a permutation of 0..{rank}")]
    BadPermutation { table: Vec<usize>, rank: usize },

    #[error("repetitions must be strictly positive, got {reps:?}")]
    ZeroRepeat { reps: Vec<usize> },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

pub type NdResult<T> = Result<T, NdError>;
