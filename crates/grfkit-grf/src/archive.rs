//! GRF archive reader.
//!
//! The header and entry table are decoded once at open time and kept in
//! memory; entry payloads are read from the source on demand. The source
//! sits behind a mutex so concurrent reads never interleave their seeks,
//! while decompression runs outside the lock.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::decompress::{self, InflateError};
use crate::entry::GrfEntry;
use crate::header::GrfHeader;
use crate::index::PathIndex;
use crate::io::read_vec;
use crate::table;
use crate::{Error, ReadError, Result};

/// An open GRF archive.
///
/// Generic over the byte source; [`GrfArchive::open`] uses a [`File`].
/// The archive is `Sync` whenever the source is `Send`, so one instance
/// can serve reads from several threads.
pub struct GrfArchive<R = File> {
    /// Archive file name
    name: String,
    header: GrfHeader,
    index: PathIndex,
    /// `None` once closed
    source: Mutex<Option<R>>,
}

impl GrfArchive<File> {
    /// Open a GRF archive from disk.
    ///
    /// Fails without retaining the file if the header or entry table is invalid.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::from_reader(name, file)
    }
}

impl<R: Read + Seek> GrfArchive<R> {
    /// Open a GRF archive over any seekable byte source.
    pub fn from_reader(name: impl Into<String>, mut source: R) -> Result<Self> {
        let name = name.into();

        source.seek(SeekFrom::Start(0))?;
        let header_bytes = read_vec(&mut source, GrfHeader::SIZE)?;
        let header = GrfHeader::parse(&header_bytes)?;

        let records = table::read_table(&mut source, &header)?;
        let index = PathIndex::build(records);

        info!(
            "Opened GRF archive {} (version {:#x}): {} files, {} records",
            name,
            header.version(),
            index.len(),
            index.records().len()
        );

        Ok(Self {
            name,
            header,
            index,
            source: Mutex::new(Some(source)),
        })
    }

    /// Get the archive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the validated header.
    #[inline]
    pub fn header(&self) -> &GrfHeader {
        &self.header
    }

    /// Get the number of file entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_closed(&self) -> bool {
        self.source.lock().is_none()
    }

    /// List the stored names of all file entries, in table order.
    ///
    /// Names are the raw backslash-separated bytes from the table.
    pub fn list(&self) -> Result<Vec<&[u8]>> {
        self.ensure_open()?;
        Ok(self.index.keys().collect())
    }

    /// Iterate over file entries in table order.
    pub fn entries(&self) -> Result<impl ExactSizeIterator<Item = &GrfEntry> + '_> {
        self.ensure_open()?;
        Ok(self.index.files())
    }

    /// Every decoded record, including directory placeholders.
    pub fn records(&self) -> Result<&[GrfEntry]> {
        self.ensure_open()?;
        Ok(self.index.records())
    }

    /// Check whether a file entry exists, ignoring separator style and ASCII case.
    pub fn contains(&self, path: impl AsRef<[u8]>) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.index.contains(path))
    }

    /// Find the entry metadata for a path.
    pub fn entry(&self, path: impl AsRef<[u8]>) -> Result<&GrfEntry> {
        self.ensure_open()?;
        let path = path.as_ref();
        self.index
            .lookup(path)
            .ok_or_else(|| Error::NotFound(String::from_utf8_lossy(path).into_owned()))
    }

    /// Read and decompress the entry at `path`.
    pub fn read(&self, path: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let entry = self.entry(path)?;
        self.read_entry(entry)
    }

    /// Read and decompress one entry from this archive's index.
    ///
    /// Only the first `compressed_size` bytes of the entry's slot are read;
    /// alignment padding is never decompressed.
    fn read_entry(&self, entry: &GrfEntry) -> Result<Vec<u8>> {
        self.ensure_open()?;

        if entry.is_encrypted() {
            return Err(read_error(
                entry,
                ReadError::Encrypted(entry.flags().bits()),
            ));
        }

        if entry.compressed_size() == 0 && entry.uncompressed_size() == 0 {
            return Ok(Vec::new());
        }

        let compressed = self.read_raw(entry)?;

        trace!(
            "Inflating {}: {} -> {} bytes",
            entry.display_name(),
            entry.compressed_size(),
            entry.uncompressed_size()
        );

        decompress::inflate_exact(&compressed, entry.uncompressed_size() as usize).map_err(|e| {
            let source = match e {
                InflateError::Corrupt(msg) => ReadError::DecompressFailed(msg),
                InflateError::SizeMismatch { expected, actual } => {
                    ReadError::SizeMismatch { expected, actual }
                }
            };
            read_error(entry, source)
        })
    }

    /// Read several entries, decompressing them in parallel.
    ///
    /// Source reads stay serialized; results keep the order of `paths`.
    #[cfg(feature = "parallel")]
    pub fn read_parallel<P>(&self, paths: &[P]) -> Vec<Result<Vec<u8>>>
    where
        P: AsRef<[u8]> + Sync,
        R: Send,
    {
        use rayon::prelude::*;

        paths.par_iter().map(|path| self.read(path)).collect()
    }

    /// Release the byte source.
    ///
    /// Closing twice is a no-op. Every later listing, lookup or read fails
    /// with [`Error::Closed`].
    pub fn close(&self) {
        if self.source.lock().take().is_some() {
            debug!("Closed GRF archive {}", self.name);
        }
    }

    /// Seek to the entry's slot and read its compressed bytes.
    fn read_raw(&self, entry: &GrfEntry) -> Result<Vec<u8>> {
        let mut guard = self.source.lock();
        let source = guard.as_mut().ok_or(Error::Closed)?;

        source.seek(SeekFrom::Start(entry.payload_position()))?;
        Ok(read_vec(source, entry.compressed_size() as usize)?)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

fn read_error(entry: &GrfEntry, source: ReadError) -> Error {
    Error::Read {
        name: entry.display_name().into_owned(),
        source,
    }
}

impl<R> std::fmt::Debug for GrfArchive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrfArchive")
            .field("name", &self.name)
            .field("version", &format_args!("{:#x}", self.header.version()))
            .field("entries", &self.index.len())
            .field("closed", &self.source.lock().is_none())
            .finish()
    }
}
