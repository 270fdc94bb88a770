//! Payload compression
//!
//! The header engine never looks inside a compressed payload; it hands raw
//! bytes to a [`PayloadCodec`] and writes back whatever comes out.

use std::fmt;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{MetaError, Result};

/// Compresses and decompresses the binary block that may follow a header.
pub trait PayloadCodec: fmt::Debug + Send + Sync {
    /// Compress `raw` at `level`
    fn compress(&self, raw: &[u8], level: i32) -> Result<Vec<u8>>;

    /// Decompress `compressed`. `expected_len` is a capacity hint; 0 means unknown.
    fn decompress(&self, compressed: &[u8], expected_len: usize) -> Result<Vec<u8>>;
}

/// zlib stream codec
#[derive(Debug, Clone, Copy, Default)]
pub struct ZlibCodec;

impl PayloadCodec for ZlibCodec {
    fn compress(&self, raw: &[u8], level: i32) -> Result<Vec<u8>> {
        // Negative levels select the library default
        let level = u32::try_from(level).map(|l| Compression::new(l.min(9))).unwrap_or_default();
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), level);
        encoder
            .write_all(raw)
            .map_err(|e| MetaError::Codec(format!("zlib compression failed: {e}")))?;
        encoder
            .finish()
            .map_err(|e| MetaError::Codec(format!("zlib compression failed: {e}")))
    }

    fn decompress(&self, compressed: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut decompressed = Vec::with_capacity(expected_len);
        ZlibDecoder::new(compressed)
            .read_to_end(&mut decompressed)
            .map_err(|e| MetaError::Codec(format!("zlib decompression failed: {e}")))?;
        Ok(decompressed)
    }
}
