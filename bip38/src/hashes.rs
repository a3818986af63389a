//! Digest helpers: SHA256d for checksums and address hashes, HASH160 for addresses.

use bitcoin_hashes::{Hash, hash160};
use sha2::{Digest, Sha256};

/// Length of a base58check / record checksum
pub const CHECKSUM_LEN: usize = 4;

/// Double SHA256
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut result = [0u8; 32];
    result.copy_from_slice(&second);
    result
}

/// First four bytes of SHA256d, as appended by base58check
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(data);
    let mut result = [0u8; CHECKSUM_LEN];
    result.copy_from_slice(&digest[..CHECKSUM_LEN]);
    result
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_sha256_empty() {
        assert_eq!(
            hex::encode(double_sha256(b"")),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_checksum_is_digest_prefix() {
        let data = b"hello";
        assert_eq!(checksum(data)[..], double_sha256(data)[..4]);
    }

    #[test]
    fn test_hash160_generator_point() {
        let pubkey = hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
            .unwrap();
        assert_eq!(hex::encode(hash160(&pubkey)), "751e76e8199196d454941c45d1b3a323f1433bd6");
    }
}
