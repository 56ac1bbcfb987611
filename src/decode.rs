use alloc::vec::Vec;

#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use enough::Stop;

use crate::error::TiffError;
use crate::limits::Limits;
use crate::pixel::{PixelBuffer, PixelLayout};
use crate::tiff::{Directory, SampleOffsets};

/// Decoded image output: the RGBA pixels of the first directory plus every
/// directory of the file for metadata inspection.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: PixelBuffer,
    pub width: u32,
    pub height: u32,
    directories: Vec<Directory>,
}

impl DecodeOutput {
    pub(crate) fn new(
        pixels: PixelBuffer,
        width: u32,
        height: u32,
        directories: Vec<Directory>,
    ) -> Self {
        Self {
            pixels,
            width,
            height,
            directories,
        }
    }

    /// Access the pixel data (`width * height * 4` channel values).
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Take ownership of the pixel data.
    pub fn into_pixels(self) -> PixelBuffer {
        self.pixels
    }

    pub fn layout(&self) -> PixelLayout {
        self.pixels.layout()
    }

    /// All directories of the file, in chain order. The pixels come from
    /// the first.
    pub fn directories(&self) -> &[Directory] {
        &self.directories
    }

    /// View 8-bit output as typed RGBA pixels.
    ///
    /// Returns [`TiffError::LayoutMismatch`] for 16-bit or float output.
    #[cfg(feature = "rgb")]
    pub fn as_rgba8(&self) -> Result<&[rgb::RGBA8], TiffError> {
        let channels = self
            .pixels
            .as_u8()
            .ok_or_else(|| self.mismatch(PixelLayout::Rgba8))?;
        Ok(channels.as_pixels())
    }

    /// View 16-bit output as typed RGBA pixels.
    ///
    /// Returns [`TiffError::LayoutMismatch`] for 8-bit or float output.
    #[cfg(feature = "rgb")]
    pub fn as_rgba16(&self) -> Result<&[rgb::RGBA16], TiffError> {
        let channels = self
            .pixels
            .as_u16()
            .ok_or_else(|| self.mismatch(PixelLayout::Rgba16))?;
        Ok(channels.as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of 8-bit RGBA pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref_rgba8(&self) -> Result<imgref::ImgRef<'_, rgb::RGBA8>, TiffError> {
        Ok(imgref::ImgRef::new(
            self.as_rgba8()?,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of 8-bit RGBA pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec_rgba8(&self) -> Result<imgref::ImgVec<rgb::RGBA8>, TiffError> {
        Ok(imgref::ImgVec::new(
            self.as_rgba8()?.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of 16-bit RGBA pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec_rgba16(&self) -> Result<imgref::ImgVec<rgb::RGBA16>, TiffError> {
        Ok(imgref::ImgVec::new(
            self.as_rgba16()?.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }

    #[cfg(feature = "rgb")]
    fn mismatch(&self, expected: PixelLayout) -> TiffError {
        TiffError::LayoutMismatch {
            expected,
            actual: self.layout(),
        }
    }
}

/// Decode request builder.
///
/// ```no_run
/// use zentiff::{DecodeRequest, Limits, SampleOffsets, Unstoppable};
///
/// let data: &[u8] = &[]; // TIFF bytes
/// let limits = Limits {
///     max_pixels: Some(64 * 1024 * 1024),
///     ..Limits::default()
/// };
/// let decoded = DecodeRequest::new(data)
///     .with_limits(&limits)
///     .with_sample_offsets(SampleOffsets::Compatible)
///     .decode(Unstoppable)?;
/// # Ok::<(), zentiff::TiffError>(())
/// ```
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    sample_offsets: SampleOffsets,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            sample_offsets: SampleOffsets::default(),
        }
    }

    /// Bound dimensions, output memory and directory chain length.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Choose how uncompressed sample offsets are computed.
    pub fn with_sample_offsets(mut self, sample_offsets: SampleOffsets) -> Self {
        self.sample_offsets = sample_offsets;
        self
    }

    /// Decode the first image of the file to RGBA.
    pub fn decode(self, stop: impl Stop) -> Result<DecodeOutput, TiffError> {
        crate::tiff::decode_image(self.data, self.limits, self.sample_offsets, &stop)
    }
}
