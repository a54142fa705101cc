//! Converter error types

use thiserror::Error;

/// Frame conversion error
///
/// Every variant rejects exactly one frame; none of them is fatal to the pipeline.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Buffer length is not a whole number of rows
    #[error("malformed buffer for sensor '{sensor_id}': {len} bytes is not a multiple of {stride}")]
    MalformedBuffer {
        sensor_id: String,
        len: usize,
        stride: usize,
    },

    /// Declared row stride differs from the expected layout
    #[error("stride mismatch for sensor '{sensor_id}': expected {expected}, got {actual}")]
    StrideMismatch {
        sensor_id: String,
        expected: u32,
        actual: u32,
    },

    /// Declared row count disagrees with the buffer
    #[error("point count mismatch for sensor '{sensor_id}': declared {declared}, buffer holds {actual}")]
    PointCountMismatch {
        sensor_id: String,
        declared: u32,
        actual: usize,
    },

    /// Payload kind does not match the converter
    #[error("unexpected payload for sensor '{sensor_id}': expected {expected}, got {actual}")]
    UnexpectedPayload {
        sensor_id: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Colormap table could not be built
    #[error("invalid colormap: {0}")]
    InvalidColormap(String),
}

impl ConvertError {
    /// Short reason label (used as a metrics label)
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedBuffer { .. } => "malformed_buffer",
            Self::StrideMismatch { .. } => "stride_mismatch",
            Self::PointCountMismatch { .. } => "point_count_mismatch",
            Self::UnexpectedPayload { .. } => "unexpected_payload",
            Self::InvalidColormap(_) => "invalid_colormap",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ConvertError>;
