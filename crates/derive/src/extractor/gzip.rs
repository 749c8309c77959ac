//! ESIP-7: gzip-compressed `data:` URI input.

use flate2::read::GzDecoder;
use std::io::Read;

/// Maximum decompressed size accepted, guarding against decompression bombs
/// in calldata an L1 transaction can otherwise make arbitrarily large only
/// at L1 gas cost; well above any plausible ethscription content size.
const MAX_DECOMPRESSED_LEN: usize = 16 * 1024 * 1024;

/// Decompresses `input` as a gzip stream, returning `None` if it is not
/// valid gzip or exceeds [`MAX_DECOMPRESSED_LEN`].
pub fn decompress(input: &[u8]) -> Option<Vec<u8>> {
    let mut decoder = GzDecoder::new(input);
    let mut out = Vec::new();
    let mut limited = (&mut decoder).take(MAX_DECOMPRESSED_LEN as u64 + 1);
    limited.read_to_end(&mut out).ok()?;
    if out.len() > MAX_DECOMPRESSED_LEN {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn round_trips_gzip_content() {
        let original = b"data:text/plain,hello from gzip";
        let compressed = gzip(original);
        assert_eq!(decompress(&compressed).unwrap(), original);
    }

    #[test]
    fn rejects_non_gzip_input() {
        assert!(decompress(b"not gzip at all").is_none());
    }
}
