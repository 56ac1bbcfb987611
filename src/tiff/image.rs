//! Image geometry from the first directory, and the decode pipeline.

use alloc::format;
use alloc::vec::Vec;

use enough::Stop;
use log::{debug, warn};

use super::ifd::{Directory, parse_directories};
use super::photometric::{AlphaSource, ColorModel, StripGeometry, assemble};
use super::reader::TiffReader;
use super::strip::{SampleDescriptor, SampleOffsets, decode_strip};
use super::tags::{Compression, Photometric, ids};
use crate::decode::DecodeOutput;
use crate::error::{TiffError, Unsupported};
use crate::limits::Limits;
use crate::pixel::{PixelBuffer, PixelLayout};

/// Largest output of one PackBits input byte, reached by `-127, b` runs.
const PACKBITS_MAX_EXPANSION: u64 = 64;

/// Everything needed to decode the strips of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLayout {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<SampleDescriptor>,
    pub compression: Compression,
    pub photometric: Photometric,
    /// Clamped to the image height.
    pub rows_per_strip: u32,
    pub strip_offsets: Vec<u32>,
    /// Same length as `strip_offsets`.
    pub strip_byte_counts: Vec<u32>,
    pub extra_samples: Vec<u32>,
    pub color_map: Option<Vec<u32>>,
}

impl ImageLayout {
    /// Collect and validate the image tags of `dir`.
    ///
    /// Compression defaults to none and RowsPerStrip to the image height.
    /// A missing StripByteCounts is inferred from the image size when there
    /// is a single strip.
    pub fn from_directory(dir: &Directory) -> Result<Self, TiffError> {
        let width = dir.require_u32(ids::IMAGE_WIDTH)?;
        let height = dir.require_u32(ids::IMAGE_LENGTH)?;
        let samples_per_pixel = dir.require_u32(ids::SAMPLES_PER_PIXEL)? as usize;
        let bits = dir.require_u32s(ids::BITS_PER_SAMPLE)?;
        let photometric = dir.require_u32(ids::PHOTOMETRIC_INTERPRETATION)?;
        let photometric = u16::try_from(photometric)
            .map(Photometric::from_u16)
            .map_err(|_| Unsupported::Photometric(photometric))?;

        if width == 0 || height == 0 {
            return Err(TiffError::InvalidTag {
                tag: if width == 0 { "ImageWidth" } else { "ImageLength" },
                reason: "image dimension is zero".into(),
            });
        }
        if samples_per_pixel == 0 || samples_per_pixel > usize::from(u16::MAX) {
            return Err(TiffError::InvalidTag {
                tag: "SamplesPerPixel",
                reason: format!("{samples_per_pixel} samples per pixel"),
            });
        }

        // A lone BitsPerSample value applies to every sample.
        let samples = match bits.len() {
            1 => alloc::vec![SampleDescriptor::new(bits[0])?; samples_per_pixel],
            n if n >= samples_per_pixel => bits[..samples_per_pixel]
                .iter()
                .map(|&b| SampleDescriptor::new(b))
                .collect::<Result<Vec<_>, _>>()?,
            n => {
                return Err(TiffError::InvalidTag {
                    tag: "BitsPerSample",
                    reason: format!("{n} values for {samples_per_pixel} samples per pixel"),
                });
            }
        };

        let compression = match dir.u32(ids::COMPRESSION) {
            None => Compression::None,
            Some(code) => u16::try_from(code)
                .map(Compression::from_u16)
                .map_err(|_| Unsupported::Compression(code))?,
        };

        let strip_offsets = dir.require_u32s(ids::STRIP_OFFSETS)?.to_vec();
        let bits_per_pixel: u64 = samples.iter().map(|s| u64::from(s.bits_per_sample())).sum();
        let strip_byte_counts = match dir.u32s(ids::STRIP_BYTE_COUNTS) {
            Some(counts) => counts.to_vec(),
            None if strip_offsets.len() == 1 => {
                let inferred = (u64::from(width) * u64::from(height) * bits_per_pixel).div_ceil(8);
                let inferred = u32::try_from(inferred)
                    .map_err(|_| TiffError::DimensionsTooLarge { width, height })?;
                warn!("StripByteCounts missing; inferred {inferred} bytes for the single strip");
                alloc::vec![inferred]
            }
            None => {
                return Err(TiffError::MissingStripByteCounts {
                    strips: strip_offsets.len(),
                });
            }
        };
        if strip_byte_counts.len() != strip_offsets.len() {
            return Err(TiffError::InvalidTag {
                tag: "StripByteCounts",
                reason: format!(
                    "{} byte counts for {} strip offsets",
                    strip_byte_counts.len(),
                    strip_offsets.len()
                ),
            });
        }

        let rows_per_strip = dir.u32(ids::ROWS_PER_STRIP).unwrap_or(height).min(height);
        if rows_per_strip == 0 {
            return Err(TiffError::InvalidTag {
                tag: "RowsPerStrip",
                reason: "zero rows per strip".into(),
            });
        }
        let strips_needed = height.div_ceil(rows_per_strip) as usize;
        if strip_offsets.len() < strips_needed {
            return Err(TiffError::InvalidTag {
                tag: "StripOffsets",
                reason: format!(
                    "{} strips of {rows_per_strip} rows cannot cover {height} rows",
                    strip_offsets.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            samples,
            compression,
            photometric,
            rows_per_strip,
            strip_offsets,
            strip_byte_counts,
            extra_samples: dir.u32s(ids::EXTRA_SAMPLES).map(<[u32]>::to_vec).unwrap_or_default(),
            color_map: dir.u32s(ids::COLOR_MAP).map(<[u32]>::to_vec),
        })
    }

    pub fn samples_per_pixel(&self) -> usize {
        self.samples.len()
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.samples.iter().map(|s| s.bits_per_sample()).sum()
    }

    /// Output element width, chosen from the first sample's depth.
    pub fn output_layout(&self) -> PixelLayout {
        PixelLayout::for_bits_per_sample(self.samples[0].bits_per_sample())
    }

    pub fn geometry(&self) -> StripGeometry {
        StripGeometry {
            width: self.width as usize,
            height: self.height as usize,
            rows_per_strip: self.rows_per_strip as usize,
        }
    }

    /// Bytes of one decompressed row. Rows are padded to a byte boundary.
    pub fn row_bytes(&self) -> u64 {
        (u64::from(self.width) * u64::from(self.bits_per_pixel())).div_ceil(8)
    }

    /// Fail unless every strip covering the image lies inside `reader` and
    /// can expand to the rows it covers.
    ///
    /// Uncompressed strips hold exactly their bytes; a PackBits strip
    /// expands at most 64-fold (a two-byte run emits 128 bytes).
    pub fn check_strip_capacity(&self, reader: &TiffReader<'_>) -> Result<(), TiffError> {
        let geometry = self.geometry();
        let row_bytes = self.row_bytes();
        for (index, (offset, byte_count)) in self.strips().enumerate() {
            let rows = geometry.rows_in_strip(index);
            if rows == 0 {
                break;
            }
            reader.slice(offset, byte_count)?;
            let capacity = match self.compression {
                Compression::PackBits => (byte_count as u64).saturating_mul(PACKBITS_MAX_EXPANSION),
                _ => byte_count as u64,
            };
            let needed = (rows as u64).saturating_mul(row_bytes);
            if capacity < needed {
                return Err(TiffError::InvalidData(format!(
                    "strip {index} holds {byte_count} {} bytes, its {rows} rows need {needed}",
                    self.compression.name()
                )));
            }
        }
        Ok(())
    }

    /// `(offset, byte_count)` of each strip, top to bottom.
    pub fn strips(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.strip_offsets
            .iter()
            .zip(&self.strip_byte_counts)
            .map(|(&o, &c)| (o as usize, c as usize))
    }
}

/// Run the whole pipeline over `data`: header, directory chain, then the
/// strips of the first directory.
pub(crate) fn decode_image(
    data: &[u8],
    limits: Option<&Limits>,
    sample_offsets: SampleOffsets,
    stop: &dyn Stop,
) -> Result<DecodeOutput, TiffError> {
    let (reader, header) = TiffReader::new(data)?;
    let max_directories = limits.map_or(Limits::DEFAULT_MAX_DIRECTORIES, |l| l.max_directories);
    let directories = parse_directories(&reader, header.first_ifd_offset, max_directories)?;
    let first = directories
        .first()
        .ok_or_else(|| TiffError::InvalidData("file contains no image file directory".into()))?;
    let layout = ImageLayout::from_directory(first)?;

    if let Some(limits) = limits {
        limits.check(layout.width, layout.height)?;
    }
    if !layout.compression.is_supported() {
        return Err(Unsupported::Compression(u32::from(layout.compression.to_u16())).into());
    }
    // The strips must be able to fill the buffer before it is allocated.
    layout.check_strip_capacity(&reader)?;

    let color_map = layout.color_map.as_deref();
    let model = ColorModel::resolve(layout.photometric, &layout.samples, color_map)?;
    let alpha = AlphaSource::resolve(&layout.samples, &layout.extra_samples)?;
    let out_layout = layout.output_layout();

    let elements = (layout.width as usize)
        .checked_mul(layout.height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or(TiffError::DimensionsTooLarge {
            width: layout.width,
            height: layout.height,
        })?;
    if let Some(limits) = limits {
        limits.check_memory(elements / 4 * out_layout.bytes_per_pixel())?;
    }

    let geometry = layout.geometry();
    debug!(
        "decoding {geometry}: {} samples, {} bpp, {}, {}, output {out_layout:?}",
        layout.samples_per_pixel(),
        layout.bits_per_pixel(),
        layout.compression.name(),
        layout.photometric.name(),
    );

    stop.check()?;

    let strips = layout.strips().map(|(offset, byte_count)| {
        decode_strip(
            &reader,
            offset,
            byte_count,
            layout.compression,
            &layout.samples,
            geometry.width,
            sample_offsets,
        )
    });
    let pixels: PixelBuffer = assemble(strips, geometry, &model, alpha, out_layout, stop)?;

    Ok(DecodeOutput::new(
        pixels,
        layout.width,
        layout.height,
        directories,
    ))
}
