//! Data region codec: the concatenated file bytes that follow the
//! directory/file tables, optionally compressed as a single zstd frame.

use crate::error::{CodecError, Result};

/// A pluggable compressor for the data region. The default, feature-gated
/// implementation below wraps `zstd`; callers embedding this crate without
/// the `zstd` feature can supply their own.
pub trait Compressor {
    fn compress(&self, data: &[u8], level: u8) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

#[cfg(feature = "zstd")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdCompressor;

#[cfg(feature = "zstd")]
impl Compressor for ZstdCompressor {
    fn compress(&self, data: &[u8], level: u8) -> Result<Vec<u8>> {
        zstd::stream::encode_all(data, level as i32)
            .map_err(|e| CodecError::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::stream::decode_all(data).map_err(|e| CodecError::Compression(e.to_string()))
    }
}

/// Validates that the (decompressed) data region is large enough to back
/// every file record's `offset + size`, and returns that minimum size.
pub fn required_len<'a>(files: impl Iterator<Item = (u64, u64)> + 'a) -> u64 {
    files.map(|(offset, size)| offset + size).max().unwrap_or(0)
}

pub fn check_len(data_len: u64, required: u64) -> Result<()> {
    if data_len < required {
        Err(CodecError::PayloadTooShort {
            required,
            actual: data_len,
        })
    } else {
        Ok(())
    }
}

/// Decodes the data region: decompresses it first when `compressed` is
/// set, then checks it covers every file's byte range.
pub fn decode(
    raw: &[u8],
    compressed: bool,
    compressor: Option<&dyn Compressor>,
    required: u64,
) -> Result<Vec<u8>> {
    let data = if compressed {
        let compressor = compressor.ok_or_else(|| {
            CodecError::Compression("container is compressed but no compressor was supplied".into())
        })?;
        compressor.decompress(raw)?
    } else {
        raw.to_vec()
    };

    check_len(data.len() as u64, required)?;
    Ok(data)
}

/// Encodes the data region, compressing it when `compressed` is set.
pub fn encode(data: &[u8], compressed: bool, level: u8, compressor: Option<&dyn Compressor>) -> Result<Vec<u8>> {
    if !compressed {
        return Ok(data.to_vec());
    }
    let compressor = compressor.ok_or_else(|| {
        CodecError::Compression("compression requested but no compressor was supplied".into())
    })?;
    compressor.compress(data, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_len_empty() {
        assert_eq!(required_len(std::iter::empty()), 0);
    }

    #[test]
    fn test_required_len_picks_max_end() {
        let files = vec![(0u64, 10u64), (20, 5), (5, 3)];
        assert_eq!(required_len(files.into_iter()), 25);
    }

    #[test]
    fn test_check_len_rejects_short_payload() {
        assert!(matches!(
            check_len(10, 20),
            Err(CodecError::PayloadTooShort {
                required: 20,
                actual: 10
            })
        ));
    }

    #[test]
    fn test_uncompressed_roundtrip() {
        let data = b"hello world".to_vec();
        let encoded = encode(&data, false, 0, None).unwrap();
        let decoded = decode(&encoded, false, None, data.len() as u64).unwrap();
        assert_eq!(decoded, data);
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_zstd_roundtrip() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec();
        let z = ZstdCompressor;
        let encoded = encode(&data, true, 3, Some(&z)).unwrap();
        assert!(encoded.len() < data.len());
        let decoded = decode(&encoded, true, Some(&z), data.len() as u64).unwrap();
        assert_eq!(decoded, data);
    }
}
