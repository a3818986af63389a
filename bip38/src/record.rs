//! The 39-byte encrypted key record and its flag byte
//!
//! Layout, before the base58check checksum:
//!
//! ```text
//! non-EC:  01 42 | flag | addresshash(4) | encryptedhalf1(16) | encryptedhalf2(16)
//! EC:      01 43 | flag | addresshash(4) | ownerentropy(8) | encryptedpart1[0..8] | encryptedpart2(16)
//! ```

use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

use crate::base58;
use crate::error::{Error, Result};
use crate::types::{AddressHash, LotSequence, OwnerEntropy, array_from_slice};

/// Length of a record without checksum
pub const RECORD_LEN: usize = 39;

/// Version prefix of non-EC-multiply records (base58 starts with "6P")
pub const PREFIX_NON_EC: [u8; 2] = [0x01, 0x42];
/// Version prefix of EC-multiply records (base58 starts with "6P")
pub const PREFIX_EC: [u8; 2] = [0x01, 0x43];

const FLAG_OFFSET: usize = 2;
const ADDRESS_HASH: core::ops::Range<usize> = 3..7;
const PAYLOAD_OFFSET: usize = 7;
const OWNER_ENTROPY: core::ops::Range<usize> = 7..15;
const ENCRYPTED_PART1_LO: core::ops::Range<usize> = 15..23;
const SECOND_BLOCK: core::ops::Range<usize> = 23..39;

bitflags! {
    /// Bit flags of byte 2 of a record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlagByte: u8 {
        /// Both top bits set: the key was encrypted directly, without EC multiplication
        const NON_EC_MULTIPLY = 0xC0;
        /// The address was formed from the compressed public key
        const COMPRESSED = 0x20;
        /// ownerentropy carries a lot/sequence number (EC-multiply only)
        const LOT_SEQUENCE = 0x04;
    }
}

impl FlagByte {
    /// Flag byte of a non-EC record
    pub fn non_ec(compressed: bool) -> Self {
        let mut flag = FlagByte::NON_EC_MULTIPLY;
        flag.set(FlagByte::COMPRESSED, compressed);
        flag
    }

    /// Flag byte of an EC-multiply record
    pub fn ec_multiply(compressed: bool, has_lot_sequence: bool) -> Self {
        let mut flag = FlagByte::empty();
        flag.set(FlagByte::COMPRESSED, compressed);
        flag.set(FlagByte::LOT_SEQUENCE, has_lot_sequence);
        flag
    }

    /// Validate a raw flag byte for the given mode; reserved bits must be zero
    pub fn parse(raw: u8, mode: Bip38Mode) -> Result<Self> {
        let flag = FlagByte::from_bits(raw).ok_or_else(|| {
            Error::InvalidInput(format!("flag byte {:#04x} has reserved bits set", raw))
        })?;
        let valid = match mode {
            Bip38Mode::NonEcMultiply => {
                flag.contains(FlagByte::NON_EC_MULTIPLY) && !flag.contains(FlagByte::LOT_SEQUENCE)
            }
            Bip38Mode::EcMultiply => !flag.intersects(FlagByte::NON_EC_MULTIPLY),
        };
        if !valid {
            return Err(Error::InvalidInput(format!(
                "flag byte {:#04x} is not valid for {:?} records",
                raw, mode
            )));
        }
        Ok(flag)
    }

    /// Whether the address uses the compressed public key
    pub fn is_compressed(&self) -> bool {
        self.contains(FlagByte::COMPRESSED)
    }

    /// Whether ownerentropy carries lot/sequence
    pub fn has_lot_sequence(&self) -> bool {
        self.contains(FlagByte::LOT_SEQUENCE)
    }
}

/// BIP38 encryption mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bip38Mode {
    /// Non-EC-multiply mode (an existing key, encrypted directly)
    NonEcMultiply,
    /// EC-multiply mode (a key generated from an intermediate code)
    EcMultiply,
}

impl Bip38Mode {
    /// The two-byte version prefix of this mode
    pub fn prefix(&self) -> [u8; 2] {
        match self {
            Bip38Mode::NonEcMultiply => PREFIX_NON_EC,
            Bip38Mode::EcMultiply => PREFIX_EC,
        }
    }
}

/// A validated BIP38 encrypted private key
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncryptedKeyRecord {
    bytes: [u8; RECORD_LEN],
    mode: Bip38Mode,
    flag: FlagByte,
}

impl EncryptedKeyRecord {
    /// Assemble a non-EC record
    pub(crate) fn non_ec(
        flag: FlagByte,
        address_hash: &AddressHash,
        encrypted_half1: &[u8; 16],
        encrypted_half2: &[u8; 16],
    ) -> Self {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[..2].copy_from_slice(&PREFIX_NON_EC);
        bytes[FLAG_OFFSET] = flag.bits();
        bytes[ADDRESS_HASH].copy_from_slice(address_hash.as_bytes());
        bytes[PAYLOAD_OFFSET..23].copy_from_slice(encrypted_half1);
        bytes[SECOND_BLOCK].copy_from_slice(encrypted_half2);
        Self {
            bytes,
            mode: Bip38Mode::NonEcMultiply,
            flag,
        }
    }

    /// Assemble an EC-multiply record
    pub(crate) fn ec_multiply(
        flag: FlagByte,
        address_hash: &AddressHash,
        owner_entropy: &OwnerEntropy,
        encrypted_part1_lo: &[u8; 8],
        encrypted_part2: &[u8; 16],
    ) -> Self {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[..2].copy_from_slice(&PREFIX_EC);
        bytes[FLAG_OFFSET] = flag.bits();
        bytes[ADDRESS_HASH].copy_from_slice(address_hash.as_bytes());
        bytes[OWNER_ENTROPY].copy_from_slice(owner_entropy.as_bytes());
        bytes[ENCRYPTED_PART1_LO].copy_from_slice(encrypted_part1_lo);
        bytes[SECOND_BLOCK].copy_from_slice(encrypted_part2);
        Self {
            bytes,
            mode: Bip38Mode::EcMultiply,
            flag,
        }
    }

    /// Validate raw record bytes (without checksum)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bytes: [u8; RECORD_LEN] = array_from_slice(data, "BIP38 record")?;

        let mode = match [bytes[0], bytes[1]] {
            PREFIX_NON_EC => Bip38Mode::NonEcMultiply,
            PREFIX_EC => Bip38Mode::EcMultiply,
            other => {
                return Err(Error::InvalidInput(format!(
                    "invalid BIP38 prefix {}",
                    hex::encode(other)
                )));
            }
        };
        let flag = FlagByte::parse(bytes[FLAG_OFFSET], mode)?;

        Ok(Self {
            bytes,
            mode,
            flag,
        })
    }

    /// Create from a base58check-encoded BIP38 string
    pub fn from_base58(s: &str) -> Result<Self> {
        let data = base58::decode_check(s).inspect_err(|e| {
            tracing::warn!(error = %e, "rejecting BIP38 record");
        })?;
        Self::from_bytes(&data)
    }

    /// Convert to base58check string
    pub fn to_base58(&self) -> String {
        base58::encode_check(&self.bytes)
    }

    /// Raw record bytes without checksum
    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.bytes
    }

    /// Encryption mode
    pub fn mode(&self) -> Bip38Mode {
        self.mode
    }

    /// Flag byte
    pub fn flag(&self) -> FlagByte {
        self.flag
    }

    /// Whether the address was formed from a compressed public key
    pub fn is_compressed(&self) -> bool {
        self.flag.is_compressed()
    }

    /// Address hash the record is bound to
    pub fn address_hash(&self) -> AddressHash {
        let mut hash = [0u8; 4];
        hash.copy_from_slice(&self.bytes[ADDRESS_HASH]);
        AddressHash::from_bytes(hash)
    }

    /// ownerentropy of an EC-multiply record
    pub fn owner_entropy(&self) -> Option<OwnerEntropy> {
        match self.mode {
            Bip38Mode::EcMultiply => {
                let mut entropy = [0u8; 8];
                entropy.copy_from_slice(&self.bytes[OWNER_ENTROPY]);
                Some(OwnerEntropy::from_bytes(entropy))
            }
            Bip38Mode::NonEcMultiply => None,
        }
    }

    /// Lot/sequence of an EC-multiply record that carries one
    pub fn lot_sequence(&self) -> Option<LotSequence> {
        if !self.flag.has_lot_sequence() {
            return None;
        }
        self.owner_entropy().map(|entropy| entropy.lot_sequence())
    }

    /// encryptedhalf1 of a non-EC record
    pub(crate) fn encrypted_half1(&self) -> [u8; 16] {
        let mut block = [0u8; 16];
        block.copy_from_slice(&self.bytes[PAYLOAD_OFFSET..23]);
        block
    }

    /// encryptedpart1[0..8] of an EC-multiply record
    pub(crate) fn encrypted_part1_lo(&self) -> [u8; 8] {
        let mut part = [0u8; 8];
        part.copy_from_slice(&self.bytes[ENCRYPTED_PART1_LO]);
        part
    }

    /// encryptedhalf2 (non-EC) or encryptedpart2 (EC-multiply)
    pub(crate) fn second_block(&self) -> [u8; 16] {
        let mut block = [0u8; 16];
        block.copy_from_slice(&self.bytes[SECOND_BLOCK]);
        block
    }
}

impl FromStr for EncryptedKeyRecord {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl fmt::Display for EncryptedKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for EncryptedKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedKeyRecord")
            .field("mode", &self.mode)
            .field("flag", &self.flag)
            .field("address_hash", &self.address_hash())
            .field("encoded", &self.to_base58())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_non_ec(flag: u8) -> [u8; RECORD_LEN] {
        let mut bytes = [0xABu8; RECORD_LEN];
        bytes[..2].copy_from_slice(&PREFIX_NON_EC);
        bytes[2] = flag;
        bytes
    }

    #[test]
    fn test_flag_constants() {
        assert_eq!(FlagByte::non_ec(true).bits(), 0xE0);
        assert_eq!(FlagByte::non_ec(false).bits(), 0xC0);
        assert_eq!(FlagByte::ec_multiply(true, true).bits(), 0x24);
        assert_eq!(FlagByte::ec_multiply(false, false).bits(), 0x00);
    }

    #[test]
    fn test_reserved_flag_bits_rejected() {
        for raw in [0xE1u8, 0xC8, 0xD0, 0xC2] {
            assert_matches!(
                EncryptedKeyRecord::from_bytes(&sample_non_ec(raw)),
                Err(Error::InvalidInput(_))
            );
        }
    }

    #[test]
    fn test_mode_specific_flags() {
        // lot/sequence makes no sense without EC multiplication
        assert_matches!(
            FlagByte::parse(0xE4, Bip38Mode::NonEcMultiply),
            Err(Error::InvalidInput(_))
        );
        // half of the non-EC marker
        assert_matches!(FlagByte::parse(0x80, Bip38Mode::NonEcMultiply), Err(Error::InvalidInput(_)));
        assert_matches!(FlagByte::parse(0xE0, Bip38Mode::EcMultiply), Err(Error::InvalidInput(_)));
        assert!(FlagByte::parse(0x24, Bip38Mode::EcMultiply).unwrap().has_lot_sequence());
    }

    #[test]
    fn test_layout_offsets() {
        let hash = AddressHash::from_bytes([1, 2, 3, 4]);
        let record = EncryptedKeyRecord::non_ec(FlagByte::non_ec(true), &hash, &[5; 16], &[6; 16]);
        let bytes = record.as_bytes();
        assert_eq!(bytes[..3], [0x01, 0x42, 0xE0]);
        assert_eq!(bytes[3..7], [1, 2, 3, 4]);
        assert_eq!(bytes[7..23], [5; 16]);
        assert_eq!(bytes[23..], [6; 16]);
        assert_eq!(record.encrypted_half1(), [5; 16]);
        assert_eq!(record.second_block(), [6; 16]);
        assert_eq!(record.owner_entropy(), None);
    }

    #[test]
    fn test_ec_layout_offsets() {
        let hash = AddressHash::from_bytes([9; 4]);
        let ls = LotSequence::new(100000, 1).unwrap();
        let entropy = OwnerEntropy::with_lot_sequence([7; 4], ls);
        let record = EncryptedKeyRecord::ec_multiply(
            FlagByte::ec_multiply(true, true),
            &hash,
            &entropy,
            &[8; 8],
            &[10; 16],
        );
        let reparsed = EncryptedKeyRecord::from_bytes(record.as_bytes()).unwrap();
        assert_eq!(reparsed.mode(), Bip38Mode::EcMultiply);
        assert_eq!(reparsed.owner_entropy(), Some(entropy));
        assert_eq!(reparsed.lot_sequence(), Some(ls));
        assert_eq!(reparsed.encrypted_part1_lo(), [8; 8]);
        assert_eq!(reparsed.second_block(), [10; 16]);
        assert!(reparsed.is_compressed());
    }

    #[test]
    fn test_base58_starts_with_6p() {
        let record = EncryptedKeyRecord::from_bytes(&sample_non_ec(0xC0)).unwrap();
        let encoded = record.to_base58();
        assert!(encoded.starts_with("6P"));
        assert_eq!(encoded.parse::<EncryptedKeyRecord>().unwrap(), record);
    }

    #[test]
    fn test_unknown_prefix_and_length() {
        let mut bytes = sample_non_ec(0xC0);
        bytes[1] = 0x44;
        assert_matches!(EncryptedKeyRecord::from_bytes(&bytes), Err(Error::InvalidInput(_)));
        assert_matches!(EncryptedKeyRecord::from_bytes(&bytes[..38]), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_wif_is_not_a_record() {
        let wif = "5KN7MzqK5wt2TP1fQCYyHBtDrXdJuXbUzm4A9rKAteGu3Qi5CVR";
        assert_matches!(EncryptedKeyRecord::from_base58(wif), Err(Error::InvalidInput(_)));
    }
}
