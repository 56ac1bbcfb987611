use alloc::vec::Vec;

use crate::error::TiffError;
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::tiff::ifd::parse_directories;
use crate::tiff::{Compression, ImageLayout, Photometric, TiffReader};

/// Image metadata, obtained by parsing directories without decoding strips.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Bit depth of each sample, in sample order.
    pub bits_per_sample: Vec<u32>,
    pub compression: Compression,
    pub photometric: Photometric,
    pub strip_count: usize,
    /// Length of the directory chain. Only the first directory is decoded.
    pub directory_count: usize,
    /// Layout [`crate::decode`] will produce.
    pub native_layout: PixelLayout,
}

impl ImageInfo {
    /// Probe the header and directory chain.
    ///
    /// Succeeds for files whose compression or photometric interpretation
    /// is unsupported; those only fail at decode time.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TiffError> {
        let (reader, header) = TiffReader::new(data)?;
        let directories = parse_directories(
            &reader,
            header.first_ifd_offset,
            Limits::DEFAULT_MAX_DIRECTORIES,
        )?;
        let first = directories
            .first()
            .ok_or_else(|| TiffError::InvalidData("file contains no image file directory".into()))?;
        let layout = ImageLayout::from_directory(first)?;
        Ok(Self {
            width: layout.width,
            height: layout.height,
            bits_per_sample: layout.samples.iter().map(|s| s.bits_per_sample()).collect(),
            compression: layout.compression,
            photometric: layout.photometric,
            strip_count: layout.strip_offsets.len(),
            directory_count: directories.len(),
            native_layout: layout.output_layout(),
        })
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.bits_per_sample.len()
    }
}
