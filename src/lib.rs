//! # zentiff
//!
//! Strip-based TIFF decoder producing a flat RGBA buffer.
//!
//! The decoder reads an in-memory byte buffer; it never touches the file
//! system and never mutates its input. Decoding runs in four stages, each
//! exposed under [`tiff`]: primitive reads, the directory chain, strip
//! decompression and photometric assembly.
//!
//! ## Supported Input
//!
//! - Little-endian (`II`) and big-endian (`MM`) classic TIFF
//! - Uncompressed and PackBits strips
//! - 1 to 32 bits per sample, including bit-packed samples
//! - WhiteIsZero, BlackIsZero, RGB and palette (ColorMap) images
//! - Alpha from an associated or unassociated ExtraSamples entry
//!
//! The output element width follows the first sample's depth: up to 8 bits
//! gives [`PixelBuffer::Rgba8`], up to 16 bits [`PixelBuffer::Rgba16`], deeper
//! samples [`PixelBuffer::RgbaF32`].
//!
//! ## Non-Goals
//!
//! - Encoding
//! - Tiled images
//! - LZW, JPEG and CCITT compression (reported as [`ErrorKind::Unsupported`])
//! - CMYK, YCbCr and CIELab (likewise unsupported)
//! - Color management
//!
//! ## Usage
//!
//! ```no_run
//! use zentiff::{ImageInfo, Unstoppable};
//!
//! let data: &[u8] = &[]; // your TIFF bytes
//!
//! // Probe without decoding strips
//! let info = ImageInfo::from_bytes(data)?;
//! println!("{}x{} {:?}", info.width, info.height, info.photometric);
//!
//! let decoded = zentiff::decode(data, Unstoppable)?;
//! if let Some(rgba) = decoded.pixels().as_u8() {
//!     assert_eq!(rgba.len(), decoded.width as usize * decoded.height as usize * 4);
//! }
//! for dir in decoded.directories() {
//!     for entry in dir.entries() {
//!         println!("{}: {:?}", entry.name(), entry.values);
//!     }
//! }
//! # Ok::<(), zentiff::TiffError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod error;
mod info;
mod limits;
mod pixel;

pub mod tiff;

mod decode;

use alloc::vec::Vec;

// Re-exports
pub use decode::{DecodeOutput, DecodeRequest};
pub use enough::{Stop, Unstoppable};
pub use error::{ErrorKind, ReadRange, TiffError, Unsupported};
pub use info::ImageInfo;
pub use limits::Limits;
pub use pixel::{PixelBuffer, PixelLayout};
pub use tiff::{Directory, SampleOffsets};

/// Decode the first image of a TIFF buffer to RGBA.
///
/// Shorthand for `DecodeRequest::new(data).decode(stop)`.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<DecodeOutput, TiffError> {
    DecodeRequest::new(data).decode(stop)
}

/// Parse every directory of a TIFF buffer without decoding pixel data.
pub fn read_directories(data: &[u8]) -> Result<Vec<Directory>, TiffError> {
    let (reader, header) = tiff::TiffReader::new(data)?;
    tiff::ifd::parse_directories(&reader, header.first_ifd_offset, Limits::DEFAULT_MAX_DIRECTORIES)
}
