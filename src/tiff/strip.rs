//! Strip decompression into per-pixel sample lists.
//!
//! Every strip decodes lazily: [`StripPixels`] is an iterator that yields one
//! pixel (one `u32` per sample) at a time, so the assembler never needs the
//! whole strip materialized.

use alloc::vec::Vec;

use log::{debug, warn};

use super::reader::{ByteOrder, TiffReader};
use super::tags::Compression;
use crate::error::{TiffError, Unsupported};

/// Decoded samples of one pixel, in sample order.
pub type Pixel = Vec<u32>;

/// Bit depth of one sample of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleDescriptor {
    bits_per_sample: u32,
}

impl SampleDescriptor {
    /// Samples may be 1 to 32 bits deep.
    pub fn new(bits_per_sample: u32) -> Result<Self, TiffError> {
        if !(1..=32).contains(&bits_per_sample) {
            return Err(Unsupported::BitsPerSample(bits_per_sample).into());
        }
        Ok(Self { bits_per_sample })
    }

    pub fn bits_per_sample(self) -> u32 {
        self.bits_per_sample
    }

    /// Byte width, when the bit depth is a whole number of bytes.
    pub fn bytes_per_sample(self) -> Option<usize> {
        (self.bits_per_sample % 8 == 0).then_some(self.bits_per_sample as usize / 8)
    }

    /// Largest value the sample can hold.
    pub fn max_value(self) -> u64 {
        (1u64 << self.bits_per_sample) - 1
    }
}

/// Where each sample of an uncompressed, byte-aligned pixel is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleOffsets {
    /// Sample `m` starts after the bytes of samples `0..m` (TIFF interleaving).
    #[default]
    Interleaved,
    /// Sample `m` starts at `bytes_per_sample(m) * m`. Matches the above when
    /// every sample has the same width and differs for mixed widths; kept for
    /// output compatibility with decoders that compute offsets this way.
    Compatible,
}

/// Lazily decoded pixels of one strip.
#[derive(Debug)]
pub struct StripPixels<'a> {
    compression: Compression,
    inner: Inner<'a>,
}

#[derive(Debug)]
enum Inner<'a> {
    Aligned(AlignedPixels<'a>),
    Packed(PackedPixels<'a>),
    PackBits(PackBitsPixels<'a>),
    Unsupported,
}

/// Start decoding the strip of `byte_count` bytes at `offset`.
///
/// `pixels_per_row` is the image width; bit-packed rows are padded to a
/// byte boundary. Compression schemes without a decoder produce a strip
/// that yields no pixels; check [`StripPixels::is_supported`].
pub fn decode_strip<'a>(
    reader: &TiffReader<'a>,
    offset: usize,
    byte_count: usize,
    compression: Compression,
    samples: &'a [SampleDescriptor],
    pixels_per_row: usize,
    sample_offsets: SampleOffsets,
) -> Result<StripPixels<'a>, TiffError> {
    let data = reader.slice(offset, byte_count)?;
    let byte_aligned = samples.iter().all(|s| s.bytes_per_sample().is_some());

    let inner = match compression {
        Compression::None if byte_aligned => {
            Inner::Aligned(AlignedPixels::new(*reader, offset, byte_count, samples, sample_offsets))
        }
        Compression::None => Inner::Packed(PackedPixels {
            // Packed samples are MSB-first whatever the file's byte order.
            reader: TiffReader::with_byte_order(data, ByteOrder::BigEndian),
            samples,
            byte_offset: 0,
            bit_offset: 0,
            pixels_per_row,
            column: 0,
        }),
        Compression::PackBits => Inner::PackBits(PackBitsPixels {
            bytes: PackBitsBytes::new(data),
            assembler: SampleAssembler::new(samples, pixels_per_row),
        }),
        other => {
            debug!("no decoder for {} strip at {offset}", other.name());
            Inner::Unsupported
        }
    };

    Ok(StripPixels { compression, inner })
}

impl StripPixels<'_> {
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Whether this strip's compression has a decoder. Unsupported strips
    /// yield no pixels.
    pub fn is_supported(&self) -> bool {
        !matches!(self.inner, Inner::Unsupported)
    }
}

impl Iterator for StripPixels<'_> {
    type Item = Result<Pixel, TiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Aligned(p) => p.next(),
            Inner::Packed(p) => p.next(),
            Inner::PackBits(p) => p.next(),
            Inner::Unsupported => None,
        }
    }
}

// ── Uncompressed, byte-aligned samples ──────────────────────────────

#[derive(Debug)]
struct AlignedPixels<'a> {
    reader: TiffReader<'a>,
    samples: &'a [SampleDescriptor],
    offsets: Vec<usize>,
    bytes_per_pixel: usize,
    pos: usize,
    end: usize,
}

impl<'a> AlignedPixels<'a> {
    fn new(
        reader: TiffReader<'a>,
        offset: usize,
        byte_count: usize,
        samples: &'a [SampleDescriptor],
        mode: SampleOffsets,
    ) -> Self {
        let widths: Vec<usize> = samples
            .iter()
            .map(|s| s.bytes_per_sample().unwrap_or(0))
            .collect();
        let offsets = match mode {
            SampleOffsets::Interleaved => widths
                .iter()
                .scan(0, |acc, &w| {
                    let at = *acc;
                    *acc += w;
                    Some(at)
                })
                .collect(),
            SampleOffsets::Compatible => widths.iter().enumerate().map(|(m, &w)| w * m).collect(),
        };
        let bytes_per_pixel: usize = widths.iter().sum();
        if bytes_per_pixel > 0 && byte_count % bytes_per_pixel != 0 {
            warn!(
                "strip at {offset}: {} trailing bytes do not form a whole pixel",
                byte_count % bytes_per_pixel
            );
        }
        Self {
            reader,
            samples,
            offsets,
            bytes_per_pixel,
            pos: offset,
            end: offset + byte_count,
        }
    }

    fn read_pixel(&self) -> Result<Pixel, TiffError> {
        self.samples
            .iter()
            .zip(&self.offsets)
            .map(|(s, &off)| {
                self.reader
                    .read_bytes(s.bytes_per_sample().unwrap_or(0), self.pos + off)
            })
            .collect()
    }
}

impl Iterator for AlignedPixels<'_> {
    type Item = Result<Pixel, TiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes_per_pixel == 0 || self.pos + self.bytes_per_pixel > self.end {
            return None;
        }
        let pixel = self.read_pixel();
        self.pos += self.bytes_per_pixel;
        Some(pixel)
    }
}

// ── Uncompressed, bit-packed samples ────────────────────────────────

#[derive(Debug)]
struct PackedPixels<'a> {
    /// Big-endian view over the strip bytes only.
    reader: TiffReader<'a>,
    samples: &'a [SampleDescriptor],
    byte_offset: usize,
    bit_offset: u32,
    pixels_per_row: usize,
    column: usize,
}

impl PackedPixels<'_> {
    fn bits_left(&self) -> usize {
        (self.reader.len() * 8).saturating_sub(self.byte_offset * 8 + self.bit_offset as usize)
    }

    fn read_sample(&mut self, bits: u32) -> Result<u32, TiffError> {
        // A 32-bit read cannot start mid-byte; split deep samples in two.
        if self.bit_offset + bits > 32 {
            let high = self.read_sample(bits - 16)?;
            let low = self.read_sample(16)?;
            return Ok((high << 16) | low);
        }
        let chunk = self.reader.read_bits(bits, self.byte_offset, self.bit_offset)?;
        self.byte_offset = chunk.byte_offset;
        self.bit_offset = chunk.bit_offset;
        Ok(chunk.value)
    }

    fn read_pixel(&mut self) -> Result<Pixel, TiffError> {
        let samples = self.samples;
        let pixel = samples
            .iter()
            .map(|s| self.read_sample(s.bits_per_sample()))
            .collect::<Result<Pixel, _>>()?;

        self.column += 1;
        if self.column == self.pixels_per_row {
            self.column = 0;
            if self.bit_offset != 0 {
                self.byte_offset += 1;
                self.bit_offset = 0;
            }
        }
        Ok(pixel)
    }
}

impl Iterator for PackedPixels<'_> {
    type Item = Result<Pixel, TiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bits_per_pixel: usize = self.samples.iter().map(|s| s.bits_per_sample() as usize).sum();
        if bits_per_pixel == 0 || self.bits_left() < bits_per_pixel {
            return None;
        }
        Some(self.read_pixel())
    }
}

// ── PackBits ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Next byte is a run header.
    Header,
    /// This many literal bytes remain.
    Literal(usize),
    /// `byte` is emitted `remaining` more times.
    Repeat { byte: u8, remaining: usize },
    /// Input exhausted or failed.
    Done,
}

/// Byte-level PackBits decoder.
///
/// Header `h` in `0..=127` copies the next `h + 1` bytes, `-127..=-1` repeats
/// the next byte `1 - h` times, and `-128` is a no-op.
#[derive(Debug)]
pub struct PackBitsBytes<'a> {
    data: &'a [u8],
    pos: usize,
    state: RunState,
}

impl<'a> PackBitsBytes<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            state: RunState::Header,
        }
    }

    fn take(&mut self, what: &str) -> Result<u8, TiffError> {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => {
                self.state = RunState::Done;
                Err(TiffError::InvalidData(alloc::format!(
                    "PackBits {what} run ends past the strip ({} bytes)",
                    self.data.len()
                )))
            }
        }
    }
}

impl Iterator for PackBitsBytes<'_> {
    type Item = Result<u8, TiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                RunState::Done => return None,
                RunState::Header => {
                    let Some(&header) = self.data.get(self.pos) else {
                        self.state = RunState::Done;
                        return None;
                    };
                    self.pos += 1;
                    match header as i8 {
                        h @ 0..=127 => self.state = RunState::Literal(h as usize + 1),
                        -128 => {}
                        h => {
                            let byte = match self.take("repeat") {
                                Ok(b) => b,
                                Err(e) => return Some(Err(e)),
                            };
                            self.state = RunState::Repeat {
                                byte,
                                remaining: (1 - i16::from(h)) as usize,
                            };
                        }
                    }
                }
                RunState::Literal(remaining) => {
                    let byte = match self.take("literal") {
                        Ok(b) => b,
                        Err(e) => return Some(Err(e)),
                    };
                    self.state = if remaining == 1 {
                        RunState::Header
                    } else {
                        RunState::Literal(remaining - 1)
                    };
                    return Some(Ok(byte));
                }
                RunState::Repeat { byte, remaining } => {
                    self.state = if remaining == 1 {
                        RunState::Header
                    } else {
                        RunState::Repeat {
                            byte,
                            remaining: remaining - 1,
                        }
                    };
                    return Some(Ok(byte));
                }
            }
        }
    }
}

/// Collects decompressed bytes into samples, most significant bit first.
///
/// Multi-byte samples are assembled big-endian; sub-byte samples are
/// unpacked from the high bits down. Leftover bits at the end of a row are
/// padding and get dropped.
#[derive(Debug)]
struct SampleAssembler<'a> {
    samples: &'a [SampleDescriptor],
    pixels_per_row: usize,
    column: usize,
    acc: u64,
    acc_bits: u32,
}

impl<'a> SampleAssembler<'a> {
    fn new(samples: &'a [SampleDescriptor], pixels_per_row: usize) -> Self {
        Self {
            samples,
            pixels_per_row,
            column: 0,
            acc: 0,
            acc_bits: 0,
        }
    }

    /// Pull bytes until a whole pixel is ready. A partial pixel at the end
    /// of the input is dropped.
    fn next_pixel<I>(&mut self, bytes: &mut I) -> Option<Result<Pixel, TiffError>>
    where
        I: Iterator<Item = Result<u8, TiffError>>,
    {
        let mut pixel = Vec::with_capacity(self.samples.len());
        for sample in self.samples {
            let bits = sample.bits_per_sample();
            while self.acc_bits < bits {
                match bytes.next()? {
                    Ok(b) => {
                        self.acc = (self.acc << 8) | u64::from(b);
                        self.acc_bits += 8;
                    }
                    Err(e) => return Some(Err(e)),
                }
            }
            self.acc_bits -= bits;
            pixel.push(((self.acc >> self.acc_bits) & mask(bits)) as u32);
            self.acc &= mask(self.acc_bits);
        }

        self.column += 1;
        if self.column == self.pixels_per_row {
            self.column = 0;
            self.acc = 0;
            self.acc_bits = 0;
        }
        Some(Ok(pixel))
    }
}

#[inline]
fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

#[derive(Debug)]
struct PackBitsPixels<'a> {
    bytes: PackBitsBytes<'a>,
    assembler: SampleAssembler<'a>,
}

impl Iterator for PackBitsPixels<'_> {
    type Item = Result<Pixel, TiffError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.assembler.next_pixel(&mut self.bytes)
    }
}
