//! Base58check codec
//!
//! Thin wrapper over `bs58` that appends/verifies the four-byte SHA256d
//! checksum and maps failures onto the crate error taxonomy. A run of leading
//! zero bytes in the payload is encoded as an equal-length run of `'1'`.

use crate::error::{Error, Result};

/// Encode `payload || checksum(payload)` as base58
pub fn encode_check(payload: &[u8]) -> String {
    bs58::encode(payload).with_check().into_string()
}

/// Decode a base58check string and return the payload without its checksum
pub fn decode_check(encoded: &str) -> Result<Vec<u8>> {
    bs58::decode(encoded).with_check(None).into_vec().map_err(|e| match e {
        bs58::decode::Error::InvalidChecksum {
            ..
        } => Error::ChecksumMismatch,
        other => Error::InvalidInput(format!("invalid base58check encoding: {}", other)),
    })
}
