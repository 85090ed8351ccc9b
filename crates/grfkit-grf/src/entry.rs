//! GRF entry table records.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::header::GrfHeader;
use crate::index::normalize_path;

/// Fixed-size fields following each null-terminated name in the entry table.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawEntryTrailer {
    /// Bytes occupied by the compressed payload
    pub compressed_size: U32,
    /// Compressed size rounded up to a multiple of 8
    pub aligned_size: U32,
    /// Size after decompression
    pub uncompressed_size: U32,
    /// Entry flags
    pub flags: u8,
    /// Payload offset, relative to the end of the header
    pub data_offset: U32,
}

impl RawEntryTrailer {
    /// Trailer size in bytes.
    pub const SIZE: usize = 17;
}

const _: () = assert!(std::mem::size_of::<RawEntryTrailer>() == RawEntryTrailer::SIZE);

/// Per-entry flag byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EntryFlags(u8);

impl EntryFlags {
    /// Record is a real file rather than a directory or reserved marker.
    pub const FILE: u8 = 0x01;
    /// Payload uses mixed (per-block) encryption.
    pub const MIXED_CRYPT: u8 = 0x02;
    /// Payload uses header-only encryption.
    pub const HEADER_CRYPT: u8 = 0x04;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_file(self) -> bool {
        self.0 & Self::FILE != 0
    }

    #[inline]
    pub const fn is_encrypted(self) -> bool {
        self.0 & (Self::MIXED_CRYPT | Self::HEADER_CRYPT) != 0
    }
}

/// An entry (file or directory placeholder) within a GRF archive.
///
/// This contains metadata about the entry, not its data.
/// Use [`GrfArchive::read`](crate::GrfArchive::read) to get the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrfEntry {
    /// Stored name, backslash-separated, legacy-encoded.
    name: Box<[u8]>,
    compressed_size: u32,
    aligned_size: u32,
    uncompressed_size: u32,
    flags: EntryFlags,
    data_offset: u32,
}

impl GrfEntry {
    pub(crate) fn from_raw(name: &[u8], trailer: &RawEntryTrailer) -> Self {
        Self {
            name: name.into(),
            compressed_size: trailer.compressed_size.get(),
            aligned_size: trailer.aligned_size.get(),
            uncompressed_size: trailer.uncompressed_size.get(),
            flags: EntryFlags::from_bits(trailer.flags),
            data_offset: trailer.data_offset.get(),
        }
    }

    /// Get the stored name bytes exactly as they appear in the table.
    #[inline]
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// Get the name for diagnostics.
    ///
    /// Bytes that are not valid UTF-8 are replaced; converting legacy
    /// encodings for presentation is left to the caller.
    pub fn display_name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Get the lookup key for this entry.
    pub fn normalized_path(&self) -> Vec<u8> {
        normalize_path(&self.name)
    }

    #[inline]
    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    #[inline]
    pub fn aligned_size(&self) -> u32 {
        self.aligned_size
    }

    #[inline]
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    #[inline]
    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    /// Payload offset as stored, relative to the end of the header.
    #[inline]
    pub fn data_offset(&self) -> u32 {
        self.data_offset
    }

    /// Absolute position of the compressed payload.
    #[inline]
    pub fn payload_position(&self) -> u64 {
        GrfHeader::SIZE as u64 + u64::from(self.data_offset)
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.flags.is_file()
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags.is_encrypted()
    }

    /// Alignment bytes that follow the compressed payload in its slot.
    #[inline]
    pub fn padding(&self) -> u32 {
        self.aligned_size.saturating_sub(self.compressed_size)
    }

    /// Get the relative output path for extraction.
    ///
    /// Returns `None` if the name is empty or would escape the output
    /// directory (absolute paths, `..` components).
    pub fn output_path(&self) -> Option<PathBuf> {
        let normalized = self.display_name().replace('\\', "/");
        let path = Path::new(&normalized);

        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if out.as_os_str().is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &[u8], compressed: u32, aligned: u32, flags: u8) -> GrfEntry {
        let trailer = RawEntryTrailer {
            compressed_size: U32::new(compressed),
            aligned_size: U32::new(aligned),
            uncompressed_size: U32::new(compressed * 2),
            flags,
            data_offset: U32::new(16),
        };
        GrfEntry::from_raw(name, &trailer)
    }

    #[test]
    fn test_trailer_layout_is_little_endian() {
        let bytes = [
            0x0B, 0, 0, 0, // compressed
            0x10, 0, 0, 0, // aligned
            0x20, 0x01, 0, 0, // uncompressed
            0x01, // flags
            0x00, 0x02, 0, 0, // data offset
        ];
        let trailer = RawEntryTrailer::read_from_bytes(&bytes[..]).unwrap();

        assert_eq!(trailer.compressed_size.get(), 11);
        assert_eq!(trailer.aligned_size.get(), 16);
        assert_eq!(trailer.uncompressed_size.get(), 0x120);
        assert_eq!(trailer.flags, 1);
        assert_eq!(trailer.data_offset.get(), 0x200);
    }

    #[test]
    fn test_flags() {
        assert!(EntryFlags::from_bits(0x01).is_file());
        assert!(!EntryFlags::from_bits(0x00).is_file());
        assert!(!EntryFlags::from_bits(0x01).is_encrypted());
        assert!(EntryFlags::from_bits(0x03).is_encrypted());
        assert!(EntryFlags::from_bits(0x05).is_encrypted());
    }

    #[test]
    fn test_padding_and_position() {
        let e = entry(b"data\\a.txt", 11, 16, 1);

        assert_eq!(e.padding(), 5);
        assert_eq!(e.payload_position(), 46 + 16);
    }

    #[test]
    fn test_output_path_normalization() {
        let e = entry(br"data\texture\test.bmp", 1, 8, 1);
        assert_eq!(
            e.output_path(),
            Some(PathBuf::from("data").join("texture").join("test.bmp"))
        );
    }

    #[test]
    fn test_output_path_rejects_escapes() {
        assert_eq!(entry(br"..\evil.txt", 1, 8, 1).output_path(), None);
        assert_eq!(entry(br"data\..\..\evil.txt", 1, 8, 1).output_path(), None);
        assert_eq!(entry(br"\abs.txt", 1, 8, 1).output_path(), None);
        assert_eq!(entry(b"", 1, 8, 1).output_path(), None);
    }
}
