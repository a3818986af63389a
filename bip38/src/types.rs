//! Fixed-width byte buffers used by the BIP38 record layouts
//!
//! Every slice boundary of the wire formats goes through one of these types so
//! that a truncation or an off-by-one shows up as an [`Error::InvalidInput`]
//! instead of a plausible-looking wrong key.

use core::fmt;

use secp256k1::{PublicKey, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::hashes::double_sha256;

/// Length of an address hash
pub const ADDRESS_HASH_LEN: usize = 4;
/// Length of ownerentropy (ownersalt plus optional lot/sequence)
pub const OWNER_ENTROPY_LEN: usize = 8;
/// Length of a compressed passpoint
pub const PASS_POINT_LEN: usize = 33;
/// Length of a raw private key scalar
pub const PRIVATE_KEY_LEN: usize = 32;

/// Largest lot number that fits the 20 lot bits
pub const MAX_LOT_NUMBER: u32 = 1_048_575;
/// Largest sequence number that fits the 12 sequence bits
pub const MAX_SEQUENCE_NUMBER: u32 = 4095;

/// Copy a slice into a fixed array, rejecting any other length.
pub(crate) fn array_from_slice<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| {
        Error::InvalidInput(format!("{} must be {} bytes, got {}", what, N, bytes.len()))
    })
}

/// Byte-wise XOR of two equal-length buffers.
pub(crate) fn xor<const N: usize>(a: &[u8; N], b: &[u8; N]) -> [u8; N] {
    let mut out = [0u8; N];
    for i in 0..N {
        out[i] = a[i] ^ b[i];
    }
    out
}

/// Split a 32-byte buffer into its two 16-byte cipher blocks.
pub(crate) fn split_blocks(bytes: &[u8; 32]) -> ([u8; 16], [u8; 16]) {
    let mut lo = [0u8; 16];
    let mut hi = [0u8; 16];
    lo.copy_from_slice(&bytes[..16]);
    hi.copy_from_slice(&bytes[16..]);
    (lo, hi)
}

/// Join two 16-byte cipher blocks back into 32 bytes.
pub(crate) fn join_blocks(lo: &[u8; 16], hi: &[u8; 16]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(lo);
    out[16..].copy_from_slice(hi);
    out
}

/// First four bytes of SHA256d of an encoded address
///
/// Binds a record to the address its key controls, and is the only way to
/// detect a wrong passphrase after decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressHash([u8; ADDRESS_HASH_LEN]);

impl AddressHash {
    /// Hash an encoded address string
    pub fn from_address(address: &str) -> Self {
        let digest = double_sha256(address.as_bytes());
        let mut bytes = [0u8; ADDRESS_HASH_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_HASH_LEN]);
        Self(bytes)
    }

    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice, which must be exactly four bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        array_from_slice(bytes, "address hash").map(Self)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for AddressHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Lot and sequence numbers packed into 32 bits (20 lot bits, 12 sequence bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LotSequence {
    lot: u32,
    sequence: u32,
}

impl LotSequence {
    /// Create from a lot number in `0..=1048575` and a sequence number in `0..=4095`
    pub fn new(lot: u32, sequence: u32) -> Result<Self> {
        if lot > MAX_LOT_NUMBER {
            return Err(Error::InvalidInput(format!(
                "lot number {} out of range 0..={}",
                lot, MAX_LOT_NUMBER
            )));
        }
        if sequence > MAX_SEQUENCE_NUMBER {
            return Err(Error::InvalidInput(format!(
                "sequence number {} out of range 0..={}",
                sequence, MAX_SEQUENCE_NUMBER
            )));
        }
        Ok(Self {
            lot,
            sequence,
        })
    }

    /// Unpack `lot * 4096 + sequence`; every u32 is a valid packing
    pub fn from_packed(packed: u32) -> Self {
        Self {
            lot: packed >> 12,
            sequence: packed & 0xFFF,
        }
    }

    /// Lot number
    pub fn lot(&self) -> u32 {
        self.lot
    }

    /// Sequence number
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// `lot * 4096 + sequence`
    pub fn packed(&self) -> u32 {
        self.lot * 4096 + self.sequence
    }

    /// Big-endian encoding as stored in ownerentropy
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.packed().to_be_bytes()
    }
}

impl fmt::Display for LotSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lot {} sequence {}", self.lot, self.sequence)
    }
}

/// Owner-chosen entropy conveyed by intermediate codes and EC-multiply records
///
/// Either 4 bytes of ownersalt followed by the big-endian lot/sequence, or 8
/// bytes of ownersalt when no lot/sequence is used. Which one applies is not
/// recorded here; it comes from the intermediate code magic or the flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerEntropy([u8; OWNER_ENTROPY_LEN]);

impl OwnerEntropy {
    /// `ownersalt (4) || lotsequence (4)`
    pub fn with_lot_sequence(owner_salt: [u8; 4], lot_sequence: LotSequence) -> Self {
        let mut bytes = [0u8; OWNER_ENTROPY_LEN];
        bytes[..4].copy_from_slice(&owner_salt);
        bytes[4..].copy_from_slice(&lot_sequence.to_be_bytes());
        Self(bytes)
    }

    /// Eight bytes of ownersalt
    pub fn without_lot_sequence(owner_salt: [u8; 8]) -> Self {
        Self(owner_salt)
    }

    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; OWNER_ENTROPY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice, which must be exactly eight bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        array_from_slice(bytes, "owner entropy").map(Self)
    }

    /// The salt fed to scrypt when deriving the prefactor
    pub fn owner_salt(&self, has_lot_sequence: bool) -> &[u8] {
        if has_lot_sequence {
            &self.0[..4]
        } else {
            &self.0[..]
        }
    }

    /// Interpret the trailing four bytes as lot/sequence
    pub fn lot_sequence(&self) -> LotSequence {
        LotSequence::from_packed(u32::from_be_bytes([self.0[4], self.0[5], self.0[6], self.0[7]]))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; OWNER_ENTROPY_LEN] {
        &self.0
    }
}

/// Compressed encoding of `passfactor * G`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassPoint([u8; PASS_POINT_LEN]);

impl PassPoint {
    /// Compressed encoding of a curve point
    pub fn from_public_key(point: &PublicKey) -> Self {
        Self(point.serialize())
    }

    /// Parse and validate a compressed point
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PASS_POINT_LEN] = array_from_slice(bytes, "passpoint")?;
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(Error::InvalidInput(format!(
                "passpoint must be compressed, got prefix {:#04x}",
                bytes[0]
            )));
        }
        PublicKey::from_slice(&bytes)?;
        Ok(Self(bytes))
    }

    /// Decode into a curve point
    pub fn to_public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey::from_slice(&self.0)?)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; PASS_POINT_LEN] {
        &self.0
    }
}

/// A raw 32-byte private key scalar, wiped on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyBytes([u8; PRIVATE_KEY_LEN]);

impl PrivateKeyBytes {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse from a slice, which must be exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        array_from_slice(bytes, "private key").map(Self)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LEN] {
        &self.0
    }

    /// Interpret as a secp256k1 secret key; fails for zero or values >= n
    pub fn to_secret_key(&self) -> Result<SecretKey> {
        Ok(SecretKey::from_slice(&self.0)?)
    }
}

impl From<&SecretKey> for PrivateKeyBytes {
    fn from(secret: &SecretKey) -> Self {
        Self(secret.secret_bytes())
    }
}

impl fmt::Debug for PrivateKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKeyBytes").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_lot_sequence_packing() {
        let ls = LotSequence::new(263183, 1).unwrap();
        assert_eq!(ls.packed(), 263183 * 4096 + 1);
        assert_eq!(LotSequence::from_packed(ls.packed()), ls);
        assert_eq!(ls.to_be_bytes(), (263183u32 * 4096 + 1).to_be_bytes());
    }

    #[test]
    fn test_lot_sequence_bounds() {
        assert!(LotSequence::new(MAX_LOT_NUMBER, MAX_SEQUENCE_NUMBER).is_ok());
        assert_eq!(
            LotSequence::new(MAX_LOT_NUMBER, MAX_SEQUENCE_NUMBER).unwrap().packed(),
            u32::MAX
        );
        assert_matches!(LotSequence::new(MAX_LOT_NUMBER + 1, 0), Err(Error::InvalidInput(_)));
        assert_matches!(LotSequence::new(0, MAX_SEQUENCE_NUMBER + 1), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_owner_entropy_salt_views() {
        let ls = LotSequence::new(806938, 1).unwrap();
        let entropy = OwnerEntropy::with_lot_sequence([1, 2, 3, 4], ls);
        assert_eq!(entropy.owner_salt(true), &[1, 2, 3, 4]);
        assert_eq!(entropy.owner_salt(false).len(), 8);
        assert_eq!(entropy.lot_sequence(), ls);
    }

    #[test]
    fn test_slice_lengths_are_enforced() {
        assert_matches!(AddressHash::from_slice(&[0u8; 5]), Err(Error::InvalidInput(_)));
        assert_matches!(OwnerEntropy::from_slice(&[0u8; 7]), Err(Error::InvalidInput(_)));
        assert_matches!(PrivateKeyBytes::from_slice(&[0u8; 31]), Err(Error::InvalidInput(_)));
        assert_matches!(PassPoint::from_slice(&[0x02u8; 32]), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_pass_point_rejects_uncompressed_prefix() {
        let mut bytes = [0u8; PASS_POINT_LEN];
        bytes[0] = 0x04;
        assert_matches!(PassPoint::from_slice(&bytes), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_xor_is_bytewise_and_keeps_leading_zeros() {
        let a = [0u8; 32];
        let mut b = [0u8; 32];
        b[31] = 0xFF;
        let out = xor(&a, &b);
        assert_eq!(out.len(), 32);
        assert_eq!(out[0], 0);
        assert_eq!(out[31], 0xFF);
        assert_eq!(xor(&out, &b), a);
    }

    #[test]
    fn test_split_join_blocks() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let (lo, hi) = split_blocks(&bytes);
        assert_eq!(lo[0], 0);
        assert_eq!(hi[0], 16);
        assert_eq!(join_blocks(&lo, &hi), bytes);
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let key = PrivateKeyBytes::from_bytes([0x42; 32]);
        let printed = format!("{:?}", key);
        assert!(!printed.contains("42"));
        assert!(printed.contains("REDACTED"));
    }
}
