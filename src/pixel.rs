use alloc::vec::Vec;

/// Pixel memory layout of the decoded RGBA buffer.
///
/// The element width follows the bit depth of the first sample: up to 8 bits
/// decodes to `Rgba8`, up to 16 bits to `Rgba16`, anything deeper to `RgbaF32`.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// 4 channels, 8-bit RGBA.
    Rgba8,
    /// 4 channels, 16-bit RGBA (native endian).
    Rgba16,
    /// 4 channels, 32-bit float RGBA.
    RgbaF32,
}

impl PixelLayout {
    /// Pick the output layout for a first-sample bit depth.
    pub fn for_bits_per_sample(bits: u32) -> Self {
        if bits > 16 {
            Self::RgbaF32
        } else if bits > 8 {
            Self::Rgba16
        } else {
            Self::Rgba8
        }
    }

    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgba16 => 8,
            Self::RgbaF32 => 16,
        }
    }
}

/// Flat, row-major RGBA output buffer (`width * height * 4` elements).
#[derive(Clone, Debug, PartialEq)]
pub enum PixelBuffer {
    Rgba8(Vec<u8>),
    Rgba16(Vec<u16>),
    RgbaF32(Vec<f32>),
}

impl PixelBuffer {
    /// Allocate a zeroed buffer of `elements` channel values.
    pub(crate) fn zeroed(layout: PixelLayout, elements: usize) -> Self {
        match layout {
            PixelLayout::Rgba8 => Self::Rgba8(alloc::vec![0; elements]),
            PixelLayout::Rgba16 => Self::Rgba16(alloc::vec![0; elements]),
            PixelLayout::RgbaF32 => Self::RgbaF32(alloc::vec![0.0; elements]),
        }
    }

    pub fn layout(&self) -> PixelLayout {
        match self {
            Self::Rgba8(_) => PixelLayout::Rgba8,
            Self::Rgba16(_) => PixelLayout::Rgba16,
            Self::RgbaF32(_) => PixelLayout::RgbaF32,
        }
    }

    /// Number of channel values (not pixels).
    pub fn len(&self) -> usize {
        match self {
            Self::Rgba8(v) => v.len(),
            Self::Rgba16(v) => v.len(),
            Self::RgbaF32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::Rgba8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            Self::Rgba16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::RgbaF32(v) => Some(v),
            _ => None,
        }
    }

    /// Store one RGBA pixel at `pixel_index`, saturating each channel into
    /// the element range.
    pub(crate) fn put(&mut self, pixel_index: usize, rgba: [i64; 4]) {
        let base = pixel_index * 4;
        match self {
            Self::Rgba8(v) => {
                for (dst, c) in v[base..base + 4].iter_mut().zip(rgba) {
                    *dst = c.clamp(0, i64::from(u8::MAX)) as u8;
                }
            }
            Self::Rgba16(v) => {
                for (dst, c) in v[base..base + 4].iter_mut().zip(rgba) {
                    *dst = c.clamp(0, i64::from(u16::MAX)) as u16;
                }
            }
            Self::RgbaF32(v) => {
                for (dst, c) in v[base..base + 4].iter_mut().zip(rgba) {
                    *dst = c as f32;
                }
            }
        }
    }
}
