use alloc::string::String;
use enough::StopReason;

use crate::pixel::PixelLayout;

/// Errors from TIFF decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TiffError {
    #[error("invalid byte order marker 0x{0:04X} (expected II or MM)")]
    InvalidByteOrder(u16),

    #[error("invalid TIFF magic number: expected 42, found {0}")]
    InvalidMagic(u16),

    #[error("truncated input: need {needed} bytes at offset {offset}, buffer holds {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("primitive read out of range: {0}")]
    ReadOutOfRange(ReadRange),

    #[error("missing required tag: {0}")]
    MissingTag(&'static str),

    #[error("invalid value for tag {tag}: {reason}")]
    InvalidTag { tag: &'static str, reason: String },

    #[error("StripByteCounts is missing and cannot be inferred for {strips} strips")]
    MissingStripByteCounts { strips: usize },

    #[error("corrupt directory chain: offset {offset} revisited or chain too long")]
    CorruptDirectoryChain { offset: u32 },

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("unsupported: {0}")]
    Unsupported(Unsupported),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: PixelLayout,
        actual: PixelLayout,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

/// Violations of the primitive reader's contract.
///
/// These never come from file contents alone; they mean a caller asked the
/// reader for a width it cannot produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadRange {
    #[error("no bytes requested")]
    NoBytes,
    #[error("too many bytes requested ({0}, maximum 4)")]
    TooManyBytes(usize),
    #[error("no bits requested")]
    NoBits,
    #[error("too many bits requested ({0} bits from the start of the byte, maximum 32)")]
    TooManyBits(u32),
}

/// Features of the format this decoder recognizes but does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Unsupported {
    #[error("compression scheme {0} ({name})", name = compression_name(.0))]
    Compression(u32),
    #[error("photometric interpretation {0} ({name})", name = photometric_name(.0))]
    Photometric(u32),
    #[error("{count} values of field type {field_type} stored out of line")]
    FieldType { field_type: &'static str, count: u32 },
    #[error("{0} bits per sample")]
    BitsPerSample(u32),
    #[error("{0}-bit palette indices")]
    PaletteDepth(u32),
}

// Codes wider than 16 bits name nothing the format defines.
fn compression_name(code: &u32) -> &'static str {
    u16::try_from(*code).map_or("unknown", |c| crate::tiff::Compression::from_u16(c).name())
}

fn photometric_name(code: &u32) -> &'static str {
    u16::try_from(*code).map_or("unknown", |c| crate::tiff::Photometric::from_u16(c).name())
}

/// Coarse classification of a [`TiffError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not a well-formed TIFF.
    Malformed,
    /// The input is valid but uses a feature this decoder does not implement.
    Unsupported,
    /// A decoder invariant was violated.
    Internal,
    /// A configured [`crate::Limits`] bound was exceeded.
    Limit,
    /// The [`enough::Stop`] token requested cancellation.
    Cancelled,
    /// The caller asked for a view the decoded output cannot provide.
    Usage,
}

impl TiffError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TiffError::Unsupported(_) => ErrorKind::Unsupported,
            TiffError::ReadOutOfRange(_) => ErrorKind::Internal,
            TiffError::LayoutMismatch { .. } => ErrorKind::Usage,
            TiffError::DimensionsTooLarge { .. } | TiffError::LimitExceeded(_) => ErrorKind::Limit,
            TiffError::Cancelled(_) => ErrorKind::Cancelled,
            _ => ErrorKind::Malformed,
        }
    }

    /// Whether the file uses a feature this decoder does not implement.
    pub fn is_unsupported(&self) -> bool {
        self.kind() == ErrorKind::Unsupported
    }
}

impl From<StopReason> for TiffError {
    fn from(r: StopReason) -> Self {
        TiffError::Cancelled(r)
    }
}

impl From<ReadRange> for TiffError {
    fn from(r: ReadRange) -> Self {
        TiffError::ReadOutOfRange(r)
    }
}

impl From<Unsupported> for TiffError {
    fn from(u: Unsupported) -> Self {
        TiffError::Unsupported(u)
    }
}
