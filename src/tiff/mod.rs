//! TIFF container decoding, one module per pipeline stage.
//!
//! Bytes flow forward only: [`TiffReader`] reads primitives, [`ifd`] walks the
//! directory chain, [`strip`] turns strip bytes into pixels and
//! [`photometric`] maps those pixels to RGBA.

pub mod ifd;
mod image;
pub mod photometric;
mod reader;
pub mod strip;
pub mod tags;

pub use ifd::{Directory, Entry, FieldValues};
pub use image::ImageLayout;
pub(crate) use image::decode_image;
pub use reader::{BitChunk, ByteOrder, TIFF_HEADER_SIZE, TiffHeader, TiffReader};
pub use strip::{SampleDescriptor, SampleOffsets, StripPixels};
pub use tags::{Compression, FieldType, Photometric};
