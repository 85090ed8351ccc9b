//! Common utilities for grfkit.
//!
//! This crate provides the binary-reading primitives shared by the grfkit crates:
//!
//! - [`BinaryReader`] - Zero-copy, bounds-checked reading from byte slices
//! - [`Error`] - Errors raised when a buffer ends early or is malformed

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Re-export memchr for SIMD-accelerated byte searching
pub use memchr;
