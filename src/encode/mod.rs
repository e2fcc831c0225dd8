//! PlantUML text encoding.
//!
//! Turns diagram source into the token used in render service URLs:
//!
//! ```text
//! raw bytes → raw DEFLATE (best compression) → 6-bit encoding → token
//! ```
//!
//! The 6-bit encoding works like base64 but with the alphabet
//! `0-9 A-Z a-z - _`, so the token is safe as a single URL path segment.
//! Both steps are deterministic: the same input always yields the same
//! token, which lets callers detect changes by comparing raw bytes.

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use thiserror::Error;

/// Output alphabet, indexed by 6-bit value.
const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_";

/// Transform failures.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("couldn't compress the data")]
    Compress(#[source] std::io::Error),
}

/// Compress and encode diagram source into a URL-safe token.
pub fn encode(raw: &[u8]) -> Result<String, EncodeError> {
    let compressed = deflate(raw)?;
    Ok(encode_bytes(&compressed))
}

/// Run raw DEFLATE (no zlib/gzip framing) at best compression.
pub fn deflate(input: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(input.len() / 2), Compression::best());
    encoder.write_all(input).map_err(EncodeError::Compress)?;
    encoder.finish().map_err(EncodeError::Compress)
}

/// Map bytes onto the 6-bit alphabet, 3 bytes → 4 characters.
///
/// The final group is zero-padded, so the output length is always a
/// multiple of 4.
pub fn encode_bytes(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.chunks(3) {
        let b1 = chunk[0];
        let b2 = chunk.get(1).copied().unwrap_or(0);
        let b3 = chunk.get(2).copied().unwrap_or(0);

        let sextets = [
            b1 >> 2,
            ((b1 & 0x3) << 4) | (b2 >> 4),
            ((b2 & 0xf) << 2) | (b3 >> 6),
            b3 & 0x3f,
        ];
        for s in sextets {
            out.push(ALPHABET[s as usize] as char);
        }
    }

    out
}

/// Check that a token only uses the encoding alphabet.
pub fn is_token(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
