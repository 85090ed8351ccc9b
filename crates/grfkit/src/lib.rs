//! grfkit - GRF game asset archive reading library.
//!
//! This crate provides a unified interface to the grfkit crates.
//!
//! # Crates
//!
//! - [`grfkit_common`] - Common utilities (bounds-checked binary reading)
//! - [`grfkit_grf`] - GRF archive reading (header, zlib entry table, payloads)
//!
//! # Example
//!
//! ```no_run
//! use grfkit::prelude::*;
//!
//! let archive = GrfArchive::open("data.grf")?;
//!
//! match archive.read("data/sprite/example.spr") {
//!     Ok(data) => println!("{} bytes", data.len()),
//!     Err(GrfError::NotFound(path)) => println!("missing {}", path),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use grfkit_common as common;
pub use grfkit_grf as grf;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use grfkit_common::BinaryReader;
    pub use grfkit_grf::{
        normalize_path, EntryFlags, Error as GrfError, FormatError, GrfArchive, GrfEntry,
        GrfHeader, ReadError,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
