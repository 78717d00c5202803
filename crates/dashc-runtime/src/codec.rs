//! Payload codec
//!
//! Turns arbitrary bytes into text that can sit inside a double-quoted
//! literal nested in a single-quoted shell argument: zlib at the best
//! level, then standard padded base64. The alphabet (`A-Z a-z 0-9 + / =`)
//! contains neither quote character.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

use crate::error::RuntimeError;

/// Compress and encode `bytes`.
pub fn encode(bytes: &[u8]) -> std::io::Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Decode and decompress text produced by [`encode`].
///
/// Truncated, padded-wrong or otherwise damaged input is reported as
/// [`RuntimeError::DataCorruption`]; it never yields a partial result.
pub fn decode(text: &str) -> Result<Vec<u8>, RuntimeError> {
    let compressed = STANDARD
        .decode(text.trim())
        .map_err(|e| RuntimeError::DataCorruption(format!("invalid base64 payload: {}", e)))?;
    inflate(&compressed)
}

/// Inflate a complete zlib stream, insisting on its end-of-stream marker.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>, RuntimeError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(64));
        }

        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::Finish)
            .map_err(|e| RuntimeError::DataCorruption(format!("invalid zlib stream: {}", e)))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() as usize == consumed
                    && inflater.total_out() == produced;
                if stalled {
                    return Err(RuntimeError::DataCorruption(
                        "zlib stream ended before its end-of-stream marker".to_string(),
                    ));
                }
            }
        }
    }

    let consumed = inflater.total_in() as usize;
    if consumed != compressed.len() {
        return Err(RuntimeError::DataCorruption(format!(
            "{} trailing bytes after zlib stream",
            compressed.len() - consumed
        )));
    }

    Ok(out)
}

/// Whether `c` can appear in encoded output.
pub fn is_payload_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}
