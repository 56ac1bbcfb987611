//! Static tag, field type, compression and photometric tables.
//!
//! Everything here is immutable lookup data: tag ids resolve to names through a
//! sorted table searched in place, never rebuilt per decode.

use alloc::borrow::Cow;
use alloc::format;

/// Tag ids the decoder reads directly.
pub mod ids {
    pub const IMAGE_WIDTH: u16 = 0x0100;
    pub const IMAGE_LENGTH: u16 = 0x0101;
    pub const BITS_PER_SAMPLE: u16 = 0x0102;
    pub const COMPRESSION: u16 = 0x0103;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 0x0106;
    pub const STRIP_OFFSETS: u16 = 0x0111;
    pub const SAMPLES_PER_PIXEL: u16 = 0x0115;
    pub const ROWS_PER_STRIP: u16 = 0x0116;
    pub const STRIP_BYTE_COUNTS: u16 = 0x0117;
    pub const COLOR_MAP: u16 = 0x0140;
    pub const EXTRA_SAMPLES: u16 = 0x0152;
}

// Baseline, extended, EXIF, IPTC, ICC, XMP, GDAL and Photoshop tags.
// Sorted by id for binary search.
static TAG_NAMES: &[(u16, &str)] = &[
    (0x00FE, "NewSubfileType"),
    (0x00FF, "SubfileType"),
    (0x0100, "ImageWidth"),
    (0x0101, "ImageLength"),
    (0x0102, "BitsPerSample"),
    (0x0103, "Compression"),
    (0x0106, "PhotometricInterpretation"),
    (0x0107, "Threshholding"),
    (0x0108, "CellWidth"),
    (0x0109, "CellLength"),
    (0x010A, "FillOrder"),
    (0x010D, "DocumentName"),
    (0x010E, "ImageDescription"),
    (0x010F, "Make"),
    (0x0110, "Model"),
    (0x0111, "StripOffsets"),
    (0x0112, "Orientation"),
    (0x0115, "SamplesPerPixel"),
    (0x0116, "RowsPerStrip"),
    (0x0117, "StripByteCounts"),
    (0x0118, "MinSampleValue"),
    (0x0119, "MaxSampleValue"),
    (0x011A, "XResolution"),
    (0x011B, "YResolution"),
    (0x011C, "PlanarConfiguration"),
    (0x011D, "PageName"),
    (0x011E, "XPosition"),
    (0x011F, "YPosition"),
    (0x0120, "FreeOffsets"),
    (0x0121, "FreeByteCounts"),
    (0x0122, "GrayResponseUnit"),
    (0x0123, "GrayResponseCurve"),
    (0x0124, "T4Options"),
    (0x0125, "T6Options"),
    (0x0128, "ResolutionUnit"),
    (0x0129, "PageNumber"),
    (0x012D, "TransferFunction"),
    (0x0131, "Software"),
    (0x0132, "DateTime"),
    (0x013B, "Artist"),
    (0x013C, "HostComputer"),
    (0x013D, "Predictor"),
    (0x013E, "WhitePoint"),
    (0x013F, "PrimaryChromaticities"),
    (0x0140, "ColorMap"),
    (0x0141, "HalftoneHints"),
    (0x0142, "TileWidth"),
    (0x0143, "TileLength"),
    (0x0144, "TileOffsets"),
    (0x0145, "TileByteCounts"),
    (0x0146, "BadFaxLines"),
    (0x0147, "CleanFaxData"),
    (0x0148, "ConsecutiveBadFaxLines"),
    (0x014A, "SubIFDs"),
    (0x0150, "DotRange"),
    (0x0152, "ExtraSamples"),
    (0x0153, "SampleFormat"),
    (0x0157, "ClipPath"),
    (0x0158, "XClipPathUnits"),
    (0x0159, "YClipPathUnits"),
    (0x015A, "Indexed"),
    (0x015B, "JPEGTables"),
    (0x01B1, "Decode"),
    (0x01B2, "DefaultImageColor"),
    (0x0211, "YCbCrCoefficients"),
    (0x0212, "YCbCrSubSampling"),
    (0x0213, "YCbCrPositioning"),
    (0x0214, "ReferenceBlackWhite"),
    (0x022F, "StripRowCounts"),
    (0x02BC, "XMP"),
    (0x8298, "Copyright"),
    (0x829A, "ExposureTime"),
    (0x829D, "FNumber"),
    (0x83BB, "IPTC"),
    (0x8649, "Photoshop"),
    (0x8769, "Exif IFD"),
    (0x8773, "ICC Profile"),
    (0x9000, "ExifVersion"),
    (0x9003, "DateTimeOriginal"),
    (0x9004, "DateTimeDigitized"),
    (0x9201, "ShutterSpeedValue"),
    (0x9202, "ApertureValue"),
    (0x9208, "LightSource"),
    (0x9209, "Flash"),
    (0x927C, "MakerNote"),
    (0x9286, "UserComment"),
    (0xA000, "FlashpixVersion"),
    (0xA001, "ColorSpace"),
    (0xA300, "FileSource"),
    (0xA420, "ImageUniqueID"),
    (0xA480, "GDAL_METADATA"),
    (0xA481, "GDAL_NODATA"),
];

/// Known name for a tag id, if any.
pub fn known_tag_name(tag: u16) -> Option<&'static str> {
    TAG_NAMES
        .binary_search_by_key(&tag, |&(id, _)| id)
        .ok()
        .map(|i| TAG_NAMES[i].1)
}

/// Name for a tag id. Unknown ids get a synthesized `Tag<id>` name.
pub fn tag_name(tag: u16) -> Cow<'static, str> {
    match known_tag_name(tag) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Tag{tag}")),
    }
}

/// Reverse lookup: id for a known tag name, or for a synthesized `Tag<id>`.
///
/// Known tags only resolve by their table name, so `"Tag256"` is `None`.
pub fn tag_id(name: &str) -> Option<u16> {
    if let Some(&(id, _)) = TAG_NAMES.iter().find(|&&(_, n)| n == name) {
        return Some(id);
    }
    let id: u16 = name.strip_prefix("Tag")?.parse().ok()?;
    known_tag_name(id).is_none().then_some(id)
}

// =============================================================================
// Field types
// =============================================================================

/// TIFF field types that determine how values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte,
    /// 8-bit character
    Ascii,
    /// Unsigned 16-bit integer
    Short,
    /// Unsigned 32-bit integer
    Long,
    /// Two LONGs: numerator, denominator
    Rational,
    /// Signed 8-bit integer
    SByte,
    /// Opaque byte
    Undefined,
    /// Signed 16-bit integer
    SShort,
    /// Signed 32-bit integer
    SLong,
    /// Two SLONGs: numerator, denominator
    SRational,
    /// IEEE 32-bit float
    Float,
    /// IEEE 64-bit float
    Double,
    /// A type code outside the TIFF 6.0 set
    Unknown(u16),
}

impl FieldType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::Byte,
            2 => Self::Ascii,
            3 => Self::Short,
            4 => Self::Long,
            5 => Self::Rational,
            6 => Self::SByte,
            7 => Self::Undefined,
            8 => Self::SShort,
            9 => Self::SLong,
            10 => Self::SRational,
            11 => Self::Float,
            12 => Self::Double,
            other => Self::Unknown(other),
        }
    }

    /// Size of a single value of this type in bytes; `None` for unknown codes.
    #[inline]
    pub const fn size_in_bytes(self) -> Option<usize> {
        match self {
            Self::Byte | Self::Ascii | Self::SByte | Self::Undefined => Some(1),
            Self::Short | Self::SShort => Some(2),
            Self::Long | Self::SLong | Self::Float => Some(4),
            Self::Rational | Self::SRational | Self::Double => Some(8),
            Self::Unknown(_) => None,
        }
    }

    /// Upper-case TIFF name, e.g. `"SHORT"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::Ascii => "ASCII",
            Self::Short => "SHORT",
            Self::Long => "LONG",
            Self::Rational => "RATIONAL",
            Self::SByte => "SBYTE",
            Self::Undefined => "UNDEFINED",
            Self::SShort => "SSHORT",
            Self::SLong => "SLONG",
            Self::SRational => "SRATIONAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Unknown(_) => "UNKNOWN",
        }
    }

    pub const fn is_rational(self) -> bool {
        matches!(self, Self::Rational | Self::SRational)
    }
}

// =============================================================================
// Compression
// =============================================================================

/// Strip compression scheme, from the `Compression` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    CcittRle,
    Group3Fax,
    Group4Fax,
    Lzw,
    OldJpeg,
    Jpeg,
    PackBits,
    Unknown(u16),
}

impl Compression {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::None,
            2 => Self::CcittRle,
            3 => Self::Group3Fax,
            4 => Self::Group4Fax,
            5 => Self::Lzw,
            6 => Self::OldJpeg,
            7 => Self::Jpeg,
            32773 => Self::PackBits,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::None => 1,
            Self::CcittRle => 2,
            Self::Group3Fax => 3,
            Self::Group4Fax => 4,
            Self::Lzw => 5,
            Self::OldJpeg => 6,
            Self::Jpeg => 7,
            Self::PackBits => 32773,
            Self::Unknown(v) => v,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "uncompressed",
            Self::CcittRle => "CCITT modified Huffman RLE",
            Self::Group3Fax => "CCITT Group 3 fax",
            Self::Group4Fax => "CCITT Group 4 fax",
            Self::Lzw => "LZW",
            Self::OldJpeg => "old-style JPEG",
            Self::Jpeg => "JPEG",
            Self::PackBits => "PackBits",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether strips in this scheme can be decoded.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::None | Self::PackBits)
    }
}

// =============================================================================
// Photometric interpretation
// =============================================================================

/// Color model of decoded samples, from the `PhotometricInterpretation` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Photometric {
    WhiteIsZero,
    BlackIsZero,
    Rgb,
    Palette,
    TransparencyMask,
    Cmyk,
    YCbCr,
    CieLab,
    Unknown(u16),
}

impl Photometric {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::WhiteIsZero,
            1 => Self::BlackIsZero,
            2 => Self::Rgb,
            3 => Self::Palette,
            4 => Self::TransparencyMask,
            5 => Self::Cmyk,
            6 => Self::YCbCr,
            8 => Self::CieLab,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::WhiteIsZero => 0,
            Self::BlackIsZero => 1,
            Self::Rgb => 2,
            Self::Palette => 3,
            Self::TransparencyMask => 4,
            Self::Cmyk => 5,
            Self::YCbCr => 6,
            Self::CieLab => 8,
            Self::Unknown(v) => v,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WhiteIsZero => "WhiteIsZero",
            Self::BlackIsZero => "BlackIsZero",
            Self::Rgb => "RGB",
            Self::Palette => "palette color",
            Self::TransparencyMask => "transparency mask",
            Self::Cmyk => "CMYK",
            Self::YCbCr => "YCbCr",
            Self::CieLab => "CIELab",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_table_is_sorted() {
        assert!(TAG_NAMES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn unknown_tags_get_synthesized_names() {
        assert_eq!(tag_name(ids::IMAGE_WIDTH), "ImageWidth");
        assert_eq!(tag_name(0xC000), "Tag49152");
        assert_eq!(tag_id("Tag49152"), Some(0xC000));
        assert_eq!(tag_id("ColorMap"), Some(ids::COLOR_MAP));
    }

    #[test]
    fn known_tags_have_no_synthesized_alias() {
        assert_eq!(tag_id("Tag256"), None);
        assert_eq!(tag_id("ImageWidth"), Some(256));
        assert_eq!(tag_id("Tag65535"), Some(0xFFFF));
        assert_eq!(tag_id("Tag65536"), None);
    }

    #[test]
    fn field_type_widths() {
        let widths: alloc::vec::Vec<usize> = (1..=12)
            .map(|code| FieldType::from_u16(code).size_in_bytes().unwrap_or(0))
            .collect();
        assert_eq!(widths, [1, 1, 2, 4, 8, 1, 1, 2, 4, 8, 4, 8]);
        assert_eq!(FieldType::from_u16(13).size_in_bytes(), None);
    }
}
