//! Error types for the GRF crate.

use thiserror::Error;

/// Errors that can occur when working with GRF archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Buffer parsing error.
    #[error("{0}")]
    Common(#[from] grfkit_common::Error),

    /// The container is malformed or unsupported.
    #[error("invalid GRF archive: {0}")]
    Format(#[from] FormatError),

    /// A single entry could not be materialized.
    #[error("failed to read entry {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: ReadError,
    },

    /// No entry matches the requested path.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// The archive has been closed.
    #[error("archive is closed")]
    Closed,
}

/// Structural problems with the archive container. All of these are fatal to opening.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Signature at offset 0 does not match.
    #[error("bad magic: {0:02x?}")]
    BadMagic([u8; 15]),

    /// Version tag this reader does not handle.
    #[error("unsupported version: {0:#x}")]
    UnsupportedVersion(u32),

    /// File count field underflows once the bias is removed.
    #[error("corrupt header: raw file count {raw_file_count} is smaller than seed {seed} + 7")]
    CorruptHeader { raw_file_count: u32, seed: u32 },

    /// The entry table blob failed to inflate.
    #[error("entry table decompression failed: {0}")]
    TableDecompressFailed(String),

    /// The entry table inflated to the wrong length.
    #[error("entry table size mismatch: expected {expected} bytes, got {actual}")]
    TableSizeMismatch { expected: usize, actual: usize },

    /// The entry table holds a different number of records than the header
    /// declares: it ran out early, or whole records follow the last one.
    #[error("entry table record count mismatch: expected {expected} records, decoded {decoded}")]
    TruncatedTable { expected: u32, decoded: u32 },

    /// Non-zero bytes that do not form a record follow the last expected one.
    #[error("entry table has {0} unexpected trailing bytes")]
    TrailingTableData(usize),
}

/// Failures scoped to one entry. The archive stays usable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The payload failed to inflate.
    #[error("decompression failed: {0}")]
    DecompressFailed(String),

    /// The payload inflated to the wrong length.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The entry is flagged as encrypted, which this reader does not decode.
    #[error("entry is encrypted (flags {0:#04x})")]
    Encrypted(u8),
}

/// Result type for GRF operations.
pub type Result<T> = std::result::Result<T, Error>;
