//! Fixed-size archive header.

use grfkit_common::BinaryReader;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{FormatError, Result};

/// On-disk header layout, read once from offset 0.
///
/// All integers are little-endian regardless of host byte order.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawHeader {
    /// Format signature
    pub magic: [u8; 15],
    /// Historically the encryption seed; opaque here
    pub reserved: [u8; 15],
    /// Entry table offset, relative to the end of the header
    pub table_offset: U32,
    /// Bias applied to the file count
    pub seed: U32,
    /// File count biased by `seed + 7`
    pub raw_file_count: U32,
    /// Format version tag
    pub version: U32,
}

const _: () = assert!(std::mem::size_of::<RawHeader>() == GrfHeader::SIZE);

/// A validated archive header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrfHeader {
    reserved: [u8; 15],
    table_offset: u32,
    seed: u32,
    file_count: u32,
    version: u32,
}

impl GrfHeader {
    /// Header signature bytes.
    pub const MAGIC: [u8; 15] = *b"Master of Magic";

    /// Header size in bytes. Table and payload offsets are relative to this.
    pub const SIZE: usize = 46;

    /// Version tags whose table layout this reader understands.
    pub const SUPPORTED_VERSIONS: &'static [u32] = &[0x200];

    /// Parse and validate a header from the first [`Self::SIZE`] bytes of an archive.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw: RawHeader = BinaryReader::new(data).read_struct()?;

        if raw.magic != Self::MAGIC {
            return Err(FormatError::BadMagic(raw.magic).into());
        }

        let version = raw.version.get();
        if !Self::SUPPORTED_VERSIONS.contains(&version) {
            return Err(FormatError::UnsupportedVersion(version).into());
        }

        let raw_file_count = raw.raw_file_count.get();
        let seed = raw.seed.get();
        let file_count = raw_file_count
            .checked_sub(seed)
            .and_then(|n| n.checked_sub(7))
            .ok_or(FormatError::CorruptHeader {
                raw_file_count,
                seed,
            })?;

        Ok(Self {
            reserved: raw.reserved,
            table_offset: raw.table_offset.get(),
            seed,
            file_count,
            version,
        })
    }

    /// Format version tag.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of records in the entry table, bias removed.
    #[inline]
    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The reserved (encryption seed) field, uninterpreted.
    #[inline]
    pub fn reserved(&self) -> &[u8; 15] {
        &self.reserved
    }

    /// Table offset as stored, relative to the end of the header.
    #[inline]
    pub fn table_offset(&self) -> u32 {
        self.table_offset
    }

    /// Absolute position of the entry table block.
    #[inline]
    pub fn table_position(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.table_offset)
    }
}
