use alloc::string::String;
use enough::StopReason;

/// Errors from decoding and encoding legacy raster formats.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BitmapError {
    #[error("input ended before the structure was complete")]
    TruncatedInput,

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported BMP compression scheme: {0}")]
    UnsupportedCompression(u32),

    #[error("value out of range: {0}")]
    OutOfRangeValue(String),

    #[error("image too large for addressable memory")]
    OutOfMemory,

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for BitmapError {
    fn from(r: StopReason) -> Self {
        BitmapError::Cancelled(r)
    }
}
