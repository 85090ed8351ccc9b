//! zlib decompression for GRF tables and payloads.

use flate2::{Decompress, FlushDecompress, Status};

/// Deflate cannot expand input by more than roughly this factor.
const MAX_RATIO: usize = 1032;

/// Extra capacity reserved when the output buffer fills up.
const GROWTH: usize = 16 * 1024;

/// Why a zlib stream did not produce the expected bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InflateError {
    /// The stream is corrupt or ends before its terminator.
    Corrupt(String),
    /// The stream completed but produced a different length.
    SizeMismatch { expected: usize, actual: usize },
}

/// Inflate a complete zlib stream and require exactly `expected_size` output bytes.
///
/// The stream must reach its end marker; running out of input early is
/// reported as [`InflateError::Corrupt`], never as a short success.
pub(crate) fn inflate_exact(data: &[u8], expected_size: usize) -> Result<Vec<u8>, InflateError> {
    let mut inflater = Decompress::new(true);

    // One spare byte so an overlong stream is noticed without regrowing
    let capacity = expected_size.min(data.len().saturating_mul(MAX_RATIO));
    let mut output = Vec::with_capacity(capacity.saturating_add(1));

    loop {
        if output.len() == output.capacity() {
            output.reserve(GROWTH);
        }

        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();

        let status = inflater
            .decompress_vec(&data[consumed..], &mut output, FlushDecompress::None)
            .map_err(|e| InflateError::Corrupt(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                if inflater.total_in() as usize == consumed && inflater.total_out() == produced {
                    return Err(InflateError::Corrupt(
                        "unexpected end of compressed stream".to_string(),
                    ));
                }
            }
        }
    }

    if output.len() != expected_size {
        return Err(InflateError::SizeMismatch {
            expected: expected_size,
            actual: output.len(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_roundtrip() {
        let original = b"Hello, World! This is a test of zlib compression.";
        let compressed = zlib(original);

        let decompressed = inflate_exact(&compressed, original.len()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_inflate_larger_than_growth_step() {
        let original: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = zlib(&original);

        assert_eq!(inflate_exact(&compressed, original.len()).unwrap(), original);
    }

    #[test]
    fn test_inflate_reports_real_length_on_mismatch() {
        let original = vec![7u8; 4096];
        let compressed = zlib(&original);

        assert_eq!(
            inflate_exact(&compressed, 100),
            Err(InflateError::SizeMismatch {
                expected: 100,
                actual: 4096
            })
        );
        assert_eq!(
            inflate_exact(&compressed, 5000),
            Err(InflateError::SizeMismatch {
                expected: 5000,
                actual: 4096
            })
        );
    }

    #[test]
    fn test_inflate_truncated_stream() {
        let original = b"some payload that will lose its checksum";
        let compressed = zlib(original);

        for cut in [1, 4, compressed.len() / 2] {
            let truncated = &compressed[..compressed.len() - cut];
            assert!(
                matches!(
                    inflate_exact(truncated, original.len()),
                    Err(InflateError::Corrupt(_))
                ),
                "cut {} bytes",
                cut
            );
        }
    }

    #[test]
    fn test_inflate_garbage() {
        let garbage = [0xFFu8, 0x00, 0x13, 0x37, 0xAB, 0xCD];
        assert!(matches!(
            inflate_exact(&garbage, 10),
            Err(InflateError::Corrupt(_))
        ));
    }
}
