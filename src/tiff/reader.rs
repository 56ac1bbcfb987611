//! Byte and bit level access to the source buffer.
//!
//! All reads are stateless: callers pass absolute offsets and get values back,
//! the buffer itself is only ever borrowed.

use crate::error::{ReadRange, TiffError};

const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;
const TIFF_MAGIC: u16 = 42;

/// Size of the classic TIFF header in bytes.
pub const TIFF_HEADER_SIZE: usize = 8;

/// Byte order (endianness) of a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// "II" (Intel)
    LittleEndian,
    /// "MM" (Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Detect byte order from the 2-byte marker at the start of `data`.
    pub fn detect(data: &[u8]) -> Result<Self, TiffError> {
        let marker = data.get(..2).ok_or(TiffError::Truncated {
            offset: 0,
            needed: 2,
            len: data.len(),
        })?;
        // Both markers are palindromes, so the read order does not matter.
        match u16::from_le_bytes([marker[0], marker[1]]) {
            BYTE_ORDER_LITTLE_ENDIAN => Ok(Self::LittleEndian),
            BYTE_ORDER_BIG_ENDIAN => Ok(Self::BigEndian),
            _ => Err(TiffError::InvalidByteOrder(u16::from_be_bytes([
                marker[0], marker[1],
            ]))),
        }
    }

    #[inline]
    fn u16_from(self, b: [u8; 2]) -> u16 {
        match self {
            Self::LittleEndian => u16::from_le_bytes(b),
            Self::BigEndian => u16::from_be_bytes(b),
        }
    }

    #[inline]
    fn u32_from(self, b: [u8; 4]) -> u32 {
        match self {
            Self::LittleEndian => u32::from_le_bytes(b),
            Self::BigEndian => u32::from_be_bytes(b),
        }
    }
}

/// Parsed TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    /// Offset to the first image file directory.
    pub first_ifd_offset: u32,
}

/// Result of a sub-byte read: the value plus the cursor just past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitChunk {
    pub value: u32,
    pub byte_offset: usize,
    pub bit_offset: u32,
}

/// Endian-aware reader over a borrowed TIFF buffer.
#[derive(Debug, Clone, Copy)]
pub struct TiffReader<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
}

impl<'a> TiffReader<'a> {
    /// Create a reader over `data` with an explicit byte order.
    pub fn with_byte_order(data: &'a [u8], byte_order: ByteOrder) -> Self {
        Self { data, byte_order }
    }

    /// Validate the header and create a reader in the file's byte order.
    pub fn new(data: &'a [u8]) -> Result<(Self, TiffHeader), TiffError> {
        let byte_order = ByteOrder::detect(data)?;
        let reader = Self::with_byte_order(data, byte_order);
        if data.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::Truncated {
                offset: 0,
                needed: TIFF_HEADER_SIZE,
                len: data.len(),
            });
        }
        let magic = reader.read_bytes(2, 2)? as u16;
        if magic != TIFF_MAGIC {
            return Err(TiffError::InvalidMagic(magic));
        }
        let first_ifd_offset = reader.read_bytes(4, 4)?;
        Ok((
            reader,
            TiffHeader {
                byte_order,
                first_ifd_offset,
            },
        ))
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], TiffError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(TiffError::Truncated {
                offset,
                needed: len,
                len: self.data.len(),
            })
    }

    fn fixed<const N: usize>(&self, offset: usize) -> Result<[u8; N], TiffError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.slice(offset, N)?);
        Ok(buf)
    }

    #[inline]
    pub fn read_u8(&self, offset: usize) -> Result<u8, TiffError> {
        Ok(self.fixed::<1>(offset)?[0])
    }

    #[inline]
    pub fn read_u16(&self, offset: usize) -> Result<u16, TiffError> {
        Ok(self.byte_order.u16_from(self.fixed(offset)?))
    }

    #[inline]
    pub fn read_u32(&self, offset: usize) -> Result<u32, TiffError> {
        Ok(self.byte_order.u32_from(self.fixed(offset)?))
    }

    /// Read an unsigned integer `num_bytes` wide (1 to 4) at `offset`.
    ///
    /// A 3-byte read is a 4-byte read shifted right by one byte, so it needs
    /// four readable bytes.
    pub fn read_bytes(&self, num_bytes: usize, offset: usize) -> Result<u32, TiffError> {
        match num_bytes {
            0 => Err(ReadRange::NoBytes.into()),
            1 => self.read_u8(offset).map(u32::from),
            2 => self.read_u16(offset).map(u32::from),
            3 => Ok(self.read_u32(offset)? >> 8),
            4 => self.read_u32(offset),
            n => Err(ReadRange::TooManyBytes(n).into()),
        }
    }

    /// Read `num_bits` (1 to 32) starting `bit_offset` bits into the byte at
    /// `byte_offset`, most significant bit first.
    ///
    /// The span is widened to the smallest 8, 16 or 32-bit read that contains
    /// it, in the reader's byte order, then the leading and trailing bits are
    /// shifted away. `bit_offset` may exceed 7; whole bytes are folded into
    /// the byte offset first.
    pub fn read_bits(
        &self,
        num_bits: u32,
        byte_offset: usize,
        bit_offset: u32,
    ) -> Result<BitChunk, TiffError> {
        if num_bits == 0 {
            return Err(ReadRange::NoBits.into());
        }
        let start = byte_offset + (bit_offset / 8) as usize;
        let bit_offset = bit_offset % 8;
        let total_bits = bit_offset + num_bits;

        let (raw, shift_left) = if total_bits <= 8 {
            (u32::from(self.read_u8(start)?), 24 + bit_offset)
        } else if total_bits <= 16 {
            (u32::from(self.read_u16(start)?), 16 + bit_offset)
        } else if total_bits <= 32 {
            (self.read_u32(start)?, bit_offset)
        } else {
            return Err(ReadRange::TooManyBits(total_bits).into());
        };

        Ok(BitChunk {
            value: (raw << shift_left) >> (32 - num_bits),
            byte_offset: start + (total_bits / 8) as usize,
            bit_offset: total_bits % 8,
        })
    }
}
