//! Byte-source helpers.

use std::io::{self, Read};

/// Largest buffer allocated up front; larger reads grow as bytes arrive.
const PREALLOC_LIMIT: usize = 1 << 20;

/// Read exactly `len` bytes into a new buffer.
///
/// A corrupt length field cannot force a huge allocation: the buffer only
/// grows as data is actually read, and a short source is `UnexpectedEof`.
pub(crate) fn read_vec<R: Read>(source: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    source.by_ref().take(len as u64).read_to_end(&mut buf)?;

    if buf.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, source ended after {}", len, buf.len()),
        ));
    }

    Ok(buf)
}
