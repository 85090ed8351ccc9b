//! Entry table block: location, decompression and record decoding.

use std::io::{Read, Seek, SeekFrom};

use grfkit_common::BinaryReader;
use tracing::{debug, warn};
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::decompress::{self, InflateError};
use crate::entry::{GrfEntry, RawEntryTrailer};
use crate::header::GrfHeader;
use crate::io::read_vec;
use crate::{FormatError, Result};

/// Size fields preceding the compressed table blob.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawTableBlock {
    /// Length of the compressed blob that follows
    pub compressed_size: U32,
    /// Length of the blob once inflated
    pub uncompressed_size: U32,
}

impl RawTableBlock {
    /// Block prefix size in bytes.
    pub const SIZE: usize = 8;
}

/// Smallest possible record: an empty name's terminator plus the trailer.
const MIN_RECORD_SIZE: usize = 1 + RawEntryTrailer::SIZE;

/// Seek to the table block, inflate it and decode every record.
pub(crate) fn read_table<R: Read + Seek>(
    source: &mut R,
    header: &GrfHeader,
) -> Result<Vec<GrfEntry>> {
    source.seek(SeekFrom::Start(header.table_position()))?;

    let prefix = read_vec(source, RawTableBlock::SIZE)?;
    let block: RawTableBlock = BinaryReader::new(&prefix).read_struct()?;
    let compressed_size = block.compressed_size.get() as usize;
    let uncompressed_size = block.uncompressed_size.get() as usize;

    debug!(
        "Entry table at {:#x}: {} bytes compressed, {} bytes inflated",
        header.table_position(),
        compressed_size,
        uncompressed_size
    );

    let compressed = read_vec(source, compressed_size)?;
    let blob = inflate_table(&compressed, uncompressed_size)?;

    decode_table(&blob, header.file_count())
}

/// Inflate a table blob, mapping failures onto table format errors.
pub fn inflate_table(compressed: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    decompress::inflate_exact(compressed, uncompressed_size).map_err(|e| {
        let format_error = match e {
            InflateError::Corrupt(msg) => FormatError::TableDecompressFailed(msg),
            InflateError::SizeMismatch { expected, actual } => {
                FormatError::TableSizeMismatch { expected, actual }
            }
        };
        format_error.into()
    })
}

/// Decode `file_count` records from an inflated table blob.
///
/// Records are laid out back to back as `name\0` followed by a
/// [`RawEntryTrailer`]; the blob carries no count of its own. Directory
/// and reserved records are kept so the sequence mirrors the table.
/// Zero bytes after the last record are accepted as padding; further
/// records mean the header count is too low.
pub fn decode_table(blob: &[u8], file_count: u32) -> Result<Vec<GrfEntry>> {
    let mut reader = BinaryReader::new(blob);
    let mut entries = Vec::with_capacity((file_count as usize).min(blob.len() / MIN_RECORD_SIZE));

    for decoded in 0..file_count {
        let truncated = |_: grfkit_common::Error| FormatError::TruncatedTable {
            expected: file_count,
            decoded,
        };

        let name = reader.read_cstr().map_err(truncated)?;
        let trailer: RawEntryTrailer = reader.read_struct().map_err(truncated)?;
        let entry = GrfEntry::from_raw(name, &trailer);

        if entry.is_file() && entry.aligned_size() < entry.compressed_size() {
            warn!(
                "Entry {} has aligned size {} below compressed size {}",
                entry.display_name(),
                entry.aligned_size(),
                entry.compressed_size()
            );
        }

        entries.push(entry);
    }

    let trailing = reader.remaining_bytes();
    if !is_padding(trailing) {
        let extra = count_records(&mut reader);
        if extra > 0 {
            return Err(FormatError::TruncatedTable {
                expected: file_count,
                decoded: file_count.saturating_add(extra),
            }
            .into());
        }
        return Err(FormatError::TrailingTableData(trailing.len()).into());
    }

    Ok(entries)
}

fn is_padding(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

/// Count whole records left in the reader, stopping at padding or at the
/// first record that does not fit.
fn count_records(reader: &mut BinaryReader<'_>) -> u32 {
    let mut count = 0u32;

    while !is_padding(reader.remaining_bytes()) {
        if reader.read_cstr().is_err() || reader.read_struct::<RawEntryTrailer>().is_err() {
            break;
        }
        count = count.saturating_add(1);
    }

    count
}
