//! secp256k1 scalar multiplication and point encoding

use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};

use crate::error::{Error, Result};

/// How a public key is serialized before hashing it into an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicKeyFormat {
    /// 33 bytes, `0x02`/`0x03` parity prefix and x-coordinate
    Compressed,
    /// 65 bytes, `0x04` prefix and both coordinates
    Uncompressed,
}

impl PublicKeyFormat {
    /// Pick the format from a compression flag
    pub fn from_compressed(compressed: bool) -> Self {
        if compressed {
            PublicKeyFormat::Compressed
        } else {
            PublicKeyFormat::Uncompressed
        }
    }

    /// Whether this is the compressed format
    pub fn is_compressed(&self) -> bool {
        matches!(self, PublicKeyFormat::Compressed)
    }

    /// Serialize a point in this format
    pub fn serialize(&self, point: &PublicKey) -> Vec<u8> {
        match self {
            PublicKeyFormat::Compressed => point.serialize().to_vec(),
            PublicKeyFormat::Uncompressed => point.serialize_uncompressed().to_vec(),
        }
    }
}

fn scalar(bytes: &[u8; 32]) -> Result<Scalar> {
    Scalar::from_be_bytes(*bytes).map_err(|_| Error::crypto("scalar is not below the curve order"))
}

/// Interpret 32 bytes as a non-zero scalar below the curve order
pub fn secret_key(bytes: &[u8; 32]) -> Result<SecretKey> {
    Ok(SecretKey::from_slice(bytes)?)
}

/// `scalar * G`
pub fn base_point_multiply(scalar: &[u8; 32]) -> Result<PublicKey> {
    let secp = Secp256k1::new();
    let secret = secret_key(scalar)?;
    Ok(PublicKey::from_secret_key(&secp, &secret))
}

/// `scalar * point`
pub fn point_multiply(point: &PublicKey, scalar_bytes: &[u8; 32]) -> Result<PublicKey> {
    let secp = Secp256k1::new();
    let tweak = scalar(scalar_bytes)?;
    Ok(point.mul_tweak(&secp, &tweak)?)
}

/// `a * b mod n`
pub fn scalar_multiply(a: &[u8; 32], b: &[u8; 32]) -> Result<SecretKey> {
    let key = secret_key(a)?;
    let tweak = scalar(b)?;
    Ok(key.mul_tweak(&tweak)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(n: u8) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[31] = n;
        out
    }

    #[test]
    fn test_generator_encoding() {
        let g = base_point_multiply(&bytes(1)).unwrap();
        assert_eq!(
            hex::encode(g.serialize()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(PublicKeyFormat::Uncompressed.serialize(&g).len(), 65);
        assert_eq!(PublicKeyFormat::Compressed.serialize(&g).len(), 33);
    }

    #[test]
    fn test_point_multiply_commutes_with_base_multiply() {
        let a = [0x11u8; 32];
        let b = [0x22u8; 32];
        let via_point = point_multiply(&base_point_multiply(&a).unwrap(), &b).unwrap();
        let via_scalar = scalar_multiply(&a, &b).unwrap();
        let secp = Secp256k1::new();
        assert_eq!(via_point, PublicKey::from_secret_key(&secp, &via_scalar));
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(base_point_multiply(&[0u8; 32]).is_err());
        assert!(secret_key(&[0xFFu8; 32]).is_err());
    }
}
