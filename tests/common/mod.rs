//! Synthetic TIFF writer for tests.
//!
//! Lays a file out as: header, then for each directory its strip data,
//! its entry table, and its out-of-line values. StripOffsets and
//! StripByteCounts are filled in from the strips given.

#![allow(dead_code)]

pub const IMAGE_WIDTH: u16 = 256;
pub const IMAGE_LENGTH: u16 = 257;
pub const BITS_PER_SAMPLE: u16 = 258;
pub const COMPRESSION: u16 = 259;
pub const PHOTOMETRIC: u16 = 262;
pub const IMAGE_DESCRIPTION: u16 = 270;
pub const STRIP_OFFSETS: u16 = 273;
pub const SAMPLES_PER_PIXEL: u16 = 277;
pub const ROWS_PER_STRIP: u16 = 278;
pub const STRIP_BYTE_COUNTS: u16 = 279;
pub const X_RESOLUTION: u16 = 282;
pub const COLOR_MAP: u16 = 320;
pub const EXTRA_SAMPLES: u16 = 338;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Little,
    Big,
}

#[derive(Clone, Debug)]
pub enum Value {
    Byte(Vec<u8>),
    Ascii(&'static str),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    /// Arbitrary type code with pre-encoded value bytes.
    Raw { field_type: u16, count: u32, bytes: Vec<u8> },
}

impl Value {
    pub fn short(v: u16) -> Self {
        Value::Short(vec![v])
    }

    pub fn long(v: u32) -> Self {
        Value::Long(vec![v])
    }

    fn field_type(&self) -> u16 {
        match self {
            Value::Byte(_) => 1,
            Value::Ascii(_) => 2,
            Value::Short(_) => 3,
            Value::Long(_) => 4,
            Value::Rational(_) => 5,
            Value::Raw { field_type, .. } => *field_type,
        }
    }

    fn count(&self) -> u32 {
        match self {
            Value::Byte(v) => v.len() as u32,
            Value::Ascii(s) => s.len() as u32 + 1,
            Value::Short(v) => v.len() as u32,
            Value::Long(v) => v.len() as u32,
            Value::Rational(v) => v.len() as u32,
            Value::Raw { count, .. } => *count,
        }
    }

    fn encode(&self, order: Order) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Value::Byte(v) => out.extend_from_slice(v),
            Value::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            Value::Short(v) => v.iter().for_each(|&x| put16(&mut out, order, x)),
            Value::Long(v) => v.iter().for_each(|&x| put32(&mut out, order, x)),
            Value::Rational(v) => v.iter().for_each(|&(n, d)| {
                put32(&mut out, order, n);
                put32(&mut out, order, d);
            }),
            Value::Raw { bytes, .. } => out.extend_from_slice(bytes),
        }
        out
    }
}

/// One directory to write.
#[derive(Clone, Debug, Default)]
pub struct Ifd {
    entries: Vec<(u16, Value)>,
    strips: Vec<Vec<u8>>,
    omit_byte_counts: bool,
}

impl Ifd {
    /// Directory with the required image tags set.
    pub fn image(width: u32, height: u32, bits: &[u16], photometric: u16) -> Self {
        Self::default()
            .tag(IMAGE_WIDTH, Value::long(width))
            .tag(IMAGE_LENGTH, Value::long(height))
            .tag(SAMPLES_PER_PIXEL, Value::short(bits.len() as u16))
            .tag(BITS_PER_SAMPLE, Value::Short(bits.to_vec()))
            .tag(PHOTOMETRIC, Value::short(photometric))
    }

    /// Set a tag, replacing an earlier value for the same id.
    pub fn tag(mut self, tag: u16, value: Value) -> Self {
        self.entries.retain(|(t, _)| *t != tag);
        self.entries.push((tag, value));
        self
    }

    pub fn without(mut self, tag: u16) -> Self {
        self.entries.retain(|(t, _)| *t != tag);
        self
    }

    pub fn strip(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.strips.push(data.into());
        self
    }

    pub fn without_byte_counts(mut self) -> Self {
        self.omit_byte_counts = true;
        self
    }
}

/// A written file plus where its directories landed.
pub struct Built {
    pub bytes: Vec<u8>,
    pub ifd_offsets: Vec<u32>,
    /// Byte position of each directory's next-IFD link.
    pub next_links: Vec<usize>,
}

pub fn build(order: Order, ifds: &[Ifd]) -> Built {
    let mut out = Vec::new();
    match order {
        Order::Little => out.extend_from_slice(b"II"),
        Order::Big => out.extend_from_slice(b"MM"),
    }
    put16(&mut out, order, 42);
    put32(&mut out, order, 0); // patched below

    let mut ifd_offsets = Vec::new();
    let mut next_links = Vec::new();

    for ifd in ifds {
        let mut offsets = Vec::new();
        for strip in &ifd.strips {
            offsets.push(out.len() as u32);
            out.extend_from_slice(strip);
            pad_even(&mut out);
        }

        let mut entries = ifd.entries.clone();
        if !ifd.strips.is_empty() {
            entries.retain(|(t, _)| *t != STRIP_OFFSETS && *t != STRIP_BYTE_COUNTS);
            entries.push((STRIP_OFFSETS, Value::Long(offsets)));
            if !ifd.omit_byte_counts {
                let counts = ifd.strips.iter().map(|s| s.len() as u32).collect();
                entries.push((STRIP_BYTE_COUNTS, Value::Long(counts)));
            }
        }
        entries.sort_by_key(|(t, _)| *t);

        let ifd_offset = out.len();
        ifd_offsets.push(ifd_offset as u32);
        let table_len = 2 + entries.len() * 12 + 4;
        let mut data_pos = ifd_offset + table_len;
        let mut table = Vec::new();
        let mut data = Vec::new();

        put16(&mut table, order, entries.len() as u16);
        for (tag, value) in &entries {
            let bytes = value.encode(order);
            put16(&mut table, order, *tag);
            put16(&mut table, order, value.field_type());
            put32(&mut table, order, value.count());
            if bytes.len() <= 4 {
                let mut slot = bytes.clone();
                slot.resize(4, 0);
                table.extend_from_slice(&slot);
            } else {
                put32(&mut table, order, data_pos as u32);
                data.extend_from_slice(&bytes);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
                data_pos = ifd_offset + table_len + data.len();
            }
        }
        next_links.push(ifd_offset + table.len());
        put32(&mut table, order, 0);

        out.extend_from_slice(&table);
        out.extend_from_slice(&data);
        pad_even(&mut out);
    }

    if let Some(&first) = ifd_offsets.first() {
        patch32(&mut out, order, 4, first);
    }
    for (link, next) in next_links.iter().zip(ifd_offsets.iter().skip(1)) {
        patch32(&mut out, order, *link, *next);
    }

    Built {
        bytes: out,
        ifd_offsets,
        next_links,
    }
}

pub fn encode(order: Order, ifds: &[Ifd]) -> Vec<u8> {
    build(order, ifds).bytes
}

/// Single-strip, uncompressed 8-bit grayscale image.
pub fn gray8(order: Order, width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    assert_eq!(pixels.len(), (width * height) as usize);
    encode(order, &[Ifd::image(width, height, &[8], 1).strip(pixels)])
}

pub fn patch32(buf: &mut [u8], order: Order, at: usize, v: u32) {
    let bytes = match order {
        Order::Little => v.to_le_bytes(),
        Order::Big => v.to_be_bytes(),
    };
    buf[at..at + 4].copy_from_slice(&bytes);
}

fn put16(out: &mut Vec<u8>, order: Order, v: u16) {
    match order {
        Order::Little => out.extend_from_slice(&v.to_le_bytes()),
        Order::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

fn put32(out: &mut Vec<u8>, order: Order, v: u32) {
    match order {
        Order::Little => out.extend_from_slice(&v.to_le_bytes()),
        Order::Big => out.extend_from_slice(&v.to_be_bytes()),
    }
}

fn pad_even(out: &mut Vec<u8>) {
    if out.len() % 2 == 1 {
        out.push(0);
    }
}

/// Deterministic pseudo-random bytes.
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}
