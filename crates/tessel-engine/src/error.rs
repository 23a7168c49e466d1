//! Error taxonomy for the primitive batcher.
//!
//! Every variant except `Device` is a programmer error: the batch was driven out
//! of sequence, a shape was authored larger than the buffers, or the input was
//! malformed. None of them are meant to be retried.

use std::fmt;

/// Which of the two batch buffers a capacity check refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    Vertex,
    Index,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Vertex => f.write_str("vertices"),
            BufferKind::Index => f.write_str("indices"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Begin/end/shape calls issued out of sequence, or the batcher was disposed.
    #[error("invalid batch state: {0}")]
    InvalidState(&'static str),

    /// A single shape needs more room than the whole buffer holds.
    #[error("shape needs {required} {buffer} but the batch buffer holds at most {capacity}")]
    Capacity {
        buffer: BufferKind,
        required: usize,
        capacity: usize,
    },

    /// Geometry whose direction cannot be computed (zero-length segment, zero radius).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// Malformed input such as a polygon with too few vertices or a bad configuration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Draw submission failed inside the graphics device.
    #[error(transparent)]
    Device(#[from] anyhow::Error),
}

pub type BatchResult<T> = Result<T, BatchError>;
