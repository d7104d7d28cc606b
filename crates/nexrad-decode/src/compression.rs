//! bzip2 decompression for Archive II records and Level III products.

use crate::{DecodeError, DecodeResult};
use bytes::Bytes;
use std::io::Read;

/// Magic bytes at the start of every bzip2 stream.
pub const BZIP2_MAGIC: &[u8; 3] = b"BZh";

/// Returns true if `data` starts with a bzip2 stream header.
pub fn is_bzip2(data: &[u8]) -> bool {
    data.starts_with(BZIP2_MAGIC)
}

/// Decompress a complete bzip2 stream.
pub fn decompress_bzip2(data: &[u8]) -> DecodeResult<Bytes> {
    let mut decoder = bzip2::read::BzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::Decompression(e.to_string()))?;
    Ok(Bytes::from(decompressed))
}
