//! Photometric interpretation: decoded samples to RGBA.

use alloc::format;

use enough::Stop;
use log::debug;

use super::strip::{SampleDescriptor, StripPixels};
use super::tags::Photometric;
use crate::error::{TiffError, Unsupported};
use crate::pixel::{PixelBuffer, PixelLayout};

/// Cancellation is polled once per this many rows.
const ROWS_PER_STOP_CHECK: usize = 16;

/// ExtraSamples values that mark a sample as alpha.
const EXTRA_SAMPLE_ASSOCIATED_ALPHA: u32 = 1;
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u32 = 2;

/// Scale a `bits`-deep sample to the 8-bit range:
/// `floor(sample * 2^(8 - bits) + 2^(8 - bits) - 1)`, floored at 0.
///
/// For depths above 8 the factor is a division, so a zero sample lands at 0
/// and the top of the range at 255.
pub fn scale_to_8bit(sample: u32, bits: u32) -> i64 {
    let sample = i64::from(sample);
    if bits <= 8 {
        let shift = 8 - bits;
        (sample << shift) + ((1 << shift) - 1)
    } else {
        let d = 1i64 << (bits - 8);
        (sample + 1 - d).div_euclid(d).max(0)
    }
}

/// How the color channels of a pixel are derived from its samples.
#[derive(Debug, Clone, Copy)]
pub enum ColorModel<'a> {
    /// One gray sample, replicated into R, G and B after 8-bit scaling.
    Gray { bits: u32, invert: bool },
    /// Samples 0, 1 and 2 are red, green and blue, unscaled.
    Rgb,
    /// Sample 0 indexes the three ColorMap sub-tables.
    Palette { color_map: &'a [u32], entries: usize },
}

impl<'a> ColorModel<'a> {
    /// Pick the model for a photometric interpretation, validating the sample
    /// layout and color map it needs.
    pub fn resolve(
        photometric: Photometric,
        samples: &[SampleDescriptor],
        color_map: Option<&'a [u32]>,
    ) -> Result<Self, TiffError> {
        let first = samples.first().ok_or(TiffError::MissingTag("BitsPerSample"))?;
        let bits = first.bits_per_sample();
        match photometric {
            Photometric::WhiteIsZero | Photometric::BlackIsZero => Ok(Self::Gray {
                bits,
                invert: photometric == Photometric::WhiteIsZero,
            }),
            Photometric::Rgb => {
                if samples.len() < 3 {
                    return Err(TiffError::InvalidTag {
                        tag: "SamplesPerPixel",
                        reason: format!("RGB needs 3 samples, found {}", samples.len()),
                    });
                }
                Ok(Self::Rgb)
            }
            Photometric::Palette => {
                if bits > 16 {
                    return Err(Unsupported::PaletteDepth(bits).into());
                }
                let color_map = color_map.ok_or(TiffError::MissingTag("ColorMap"))?;
                let entries = 1usize << bits;
                if color_map.len() < 3 * entries {
                    return Err(TiffError::InvalidTag {
                        tag: "ColorMap",
                        reason: format!(
                            "{} entries, a {bits}-bit palette needs {}",
                            color_map.len(),
                            3 * entries
                        ),
                    });
                }
                Ok(Self::Palette { color_map, entries })
            }
            other => Err(Unsupported::Photometric(u32::from(other.to_u16())).into()),
        }
    }

    /// Red, green and blue for one pixel.
    fn rgb(&self, pixel: &[u32]) -> Result<[i64; 3], TiffError> {
        match *self {
            Self::Gray { bits, invert } => {
                let sample = pixel[0];
                let sample = if invert {
                    (((1u64 << bits) - 1) as u32).saturating_sub(sample)
                } else {
                    sample
                };
                let v = scale_to_8bit(sample, bits);
                Ok([v, v, v])
            }
            Self::Rgb => Ok([
                i64::from(pixel[0]),
                i64::from(pixel[1]),
                i64::from(pixel[2]),
            ]),
            Self::Palette { color_map, entries } => {
                let index = pixel[0] as usize;
                if index >= entries {
                    return Err(TiffError::InvalidData(format!(
                        "palette index {index} outside {entries}-entry ColorMap"
                    )));
                }
                Ok([
                    scale_to_8bit(color_map[index], 16),
                    scale_to_8bit(color_map[entries + index], 16),
                    scale_to_8bit(color_map[2 * entries + index], 16),
                ])
            }
        }
    }
}

/// Where a pixel's opacity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaSource {
    /// Opacity when no alpha sample exists: full scale of the first sample.
    pub default: i64,
    /// Sample index holding alpha, if ExtraSamples declares one.
    pub sample: Option<usize>,
}

impl AlphaSource {
    /// The first ExtraSamples entry marked as associated or unassociated
    /// alpha selects the alpha sample. Extra samples trail the color samples.
    pub fn resolve(
        samples: &[SampleDescriptor],
        extra_samples: &[u32],
    ) -> Result<Self, TiffError> {
        let first = samples.first().ok_or(TiffError::MissingTag("BitsPerSample"))?;
        if extra_samples.len() > samples.len() {
            return Err(TiffError::InvalidTag {
                tag: "ExtraSamples",
                reason: format!(
                    "{} extra samples but only {} samples per pixel",
                    extra_samples.len(),
                    samples.len()
                ),
            });
        }
        let first_extra = samples.len() - extra_samples.len();
        let sample = extra_samples
            .iter()
            .position(|&v| {
                v == EXTRA_SAMPLE_ASSOCIATED_ALPHA || v == EXTRA_SAMPLE_UNASSOCIATED_ALPHA
            })
            .map(|k| first_extra + k);
        Ok(Self {
            default: first.max_value() as i64,
            sample,
        })
    }

    fn alpha(&self, pixel: &[u32]) -> i64 {
        self.sample
            .and_then(|i| pixel.get(i))
            .map_or(self.default, |&a| i64::from(a))
    }
}

/// Image geometry the assembler maps strips onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripGeometry {
    pub width: usize,
    pub height: usize,
    pub rows_per_strip: usize,
}

impl StripGeometry {
    /// Rows covered by strip `index`; 0 once past the bottom of the image.
    pub fn rows_in_strip(&self, index: usize) -> usize {
        let first_row = index.saturating_mul(self.rows_per_strip);
        self.height.saturating_sub(first_row).min(self.rows_per_strip)
    }
}

/// Assemble the RGBA buffer from the strips, top to bottom.
///
/// Each strip must yield at least the pixels its rows need; surplus pixels
/// are ignored, as are strips past the bottom of the image.
pub fn assemble<'a, I>(
    strips: I,
    geometry: StripGeometry,
    model: &ColorModel<'_>,
    alpha: AlphaSource,
    layout: PixelLayout,
    stop: &dyn Stop,
) -> Result<PixelBuffer, TiffError>
where
    I: IntoIterator<Item = Result<StripPixels<'a>, TiffError>>,
{
    let StripGeometry {
        width,
        height,
        rows_per_strip,
    } = geometry;
    let mut out = PixelBuffer::zeroed(layout, width * height * 4);
    let check_every = ROWS_PER_STOP_CHECK * width;

    for (index, strip) in strips.into_iter().enumerate() {
        let rows = geometry.rows_in_strip(index);
        if rows == 0 {
            debug!("strip {index} lies below the image; skipped");
            break;
        }
        stop.check()?;

        let strip = strip?;
        if !strip.is_supported() {
            let code = u32::from(strip.compression().to_u16());
            return Err(Unsupported::Compression(code).into());
        }

        let first_pixel = index * rows_per_strip * width;
        let needed = rows * width;
        let mut produced = 0;
        for pixel in strip.take(needed) {
            if produced > 0 && produced % check_every == 0 {
                stop.check()?;
            }
            let pixel = pixel?;
            let [r, g, b] = model.rgb(&pixel)?;
            out.put(first_pixel + produced, [r, g, b, alpha.alpha(&pixel)]);
            produced += 1;
        }
        if produced < needed {
            return Err(TiffError::InvalidData(format!(
                "strip {index} decoded to {produced} of {needed} pixels"
            )));
        }
    }

    Ok(out)
}

impl core::fmt::Display for StripGeometry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}x{}, {} rows per strip",
            self.width, self.height, self.rows_per_strip
        )
    }
}
