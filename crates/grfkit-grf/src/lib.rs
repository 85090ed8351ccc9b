//! Random-access reader for GRF game asset archives.
//!
//! A GRF archive bundles thousands of small assets (sprites, models, maps,
//! textures, audio) into one file:
//!
//! - a fixed 46-byte header with a signature, version and biased file count
//! - a zlib-compressed entry table of null-terminated names and offsets
//! - a payload region of zlib-compressed entries, each in an 8-byte aligned slot
//!
//! Opening an archive validates the header and decodes the table into a
//! case-insensitive [`PathIndex`]; entry contents are read and inflated on
//! demand. Entry names are opaque bytes: lookups fold ASCII case and
//! separators only, and converting legacy-encoded names for display is the
//! caller's job.
//!
//! # Example
//!
//! ```no_run
//! use grfkit_grf::GrfArchive;
//!
//! let archive = GrfArchive::open("data.grf")?;
//!
//! for name in archive.list()? {
//!     println!("{}", String::from_utf8_lossy(name));
//! }
//!
//! if archive.contains("data/clientinfo.xml")? {
//!     let data = archive.read("data/clientinfo.xml")?;
//!     println!("{} bytes", data.len());
//! }
//! # Ok::<(), grfkit_grf::Error>(())
//! ```

mod archive;
mod decompress;
mod entry;
mod error;
pub mod header;
mod index;
mod io;
pub mod table;

pub use archive::GrfArchive;
pub use entry::{EntryFlags, GrfEntry, RawEntryTrailer};
pub use error::{Error, FormatError, ReadError, Result};
pub use header::GrfHeader;
pub use index::{normalize_path, PathIndex};
