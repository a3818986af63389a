//! Intermediate codes: the owner's half of the two-factor scheme
//!
//! The owner stretches the passphrase into a secret `passfactor` and hands out
//! only `passpoint = passfactor * G` together with the ownerentropy. A printer
//! holding the code can generate fresh keys for the owner without learning
//! either the passphrase or the resulting private keys.
//!
//! Payload (49 bytes, base58check, string starts with "passphrase"):
//!
//! ```text
//! magic(8) | ownerentropy(8) | passpoint(33)
//! ```

use core::fmt;
use core::str::FromStr;

use zeroize::Zeroizing;

use crate::base58;
use crate::config::ScryptParams;
use crate::ec;
use crate::entropy::{EntropySource, random_array};
use crate::error::{Error, Result};
use crate::hashes::double_sha256;
use crate::kdf::scrypt_derive;
use crate::types::{LotSequence, OwnerEntropy, PASS_POINT_LEN, PassPoint};

/// Payload length of an intermediate code
pub const INTERMEDIATE_CODE_LEN: usize = 49;

/// Magic of codes whose ownerentropy carries lot/sequence
pub const MAGIC_LOT_SEQUENCE: [u8; 8] = [0x2C, 0xE9, 0xB3, 0xE1, 0xFF, 0x39, 0xE2, 0x51];
/// Magic of codes with eight bytes of ownersalt and no lot/sequence
pub const MAGIC_NO_LOT_SEQUENCE: [u8; 8] = [0x2C, 0xE9, 0xB3, 0xE1, 0xFF, 0x39, 0xE2, 0x53];

/// How the lot/sequence part of ownerentropy is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotSequenceChoice {
    /// Draw lot and sequence uniformly from their full ranges
    Random,
    /// Use owner-assigned numbers, e.g. sequential within a batch
    Assigned(LotSequence),
    /// No lot/sequence; ownersalt is eight bytes
    Omit,
}

/// The secret scalar derived from the passphrase, wiped on drop
pub(crate) type PassFactor = Zeroizing<[u8; 32]>;

/// Derive passfactor from the passphrase and ownerentropy
///
/// With lot/sequence: `SHA256d(scrypt(passphrase, ownersalt[0..4]) || ownerentropy)`.
/// Without: the 32-byte prefactor `scrypt(passphrase, ownersalt[0..8])` itself.
pub(crate) fn derive_pass_factor(
    passphrase: &[u8],
    owner_entropy: &OwnerEntropy,
    has_lot_sequence: bool,
    params: &ScryptParams,
) -> Result<PassFactor> {
    let prefactor =
        scrypt_derive::<32>(passphrase, owner_entropy.owner_salt(has_lot_sequence), params)?;
    if !has_lot_sequence {
        return Ok(prefactor);
    }

    let mut material = Zeroizing::new([0u8; 40]);
    material[..32].copy_from_slice(&prefactor[..]);
    material[32..].copy_from_slice(owner_entropy.as_bytes());
    Ok(Zeroizing::new(double_sha256(&material[..])))
}

/// An intermediate passphrase code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntermediateCode {
    owner_entropy: OwnerEntropy,
    pass_point: PassPoint,
    has_lot_sequence: bool,
}

impl IntermediateCode {
    /// Derive the code for an explicit ownerentropy
    ///
    /// Deterministic: the same passphrase and ownerentropy always give the same
    /// passpoint.
    pub fn derive(
        passphrase: &[u8],
        owner_entropy: OwnerEntropy,
        has_lot_sequence: bool,
        params: &ScryptParams,
    ) -> Result<Self> {
        let pass_factor = derive_pass_factor(passphrase, &owner_entropy, has_lot_sequence, params)?;
        let point = ec::base_point_multiply(&pass_factor)?;
        Ok(Self {
            owner_entropy,
            pass_point: PassPoint::from_public_key(&point),
            has_lot_sequence,
        })
    }

    /// Draw ownersalt (and lot/sequence when requested) and derive a fresh code
    pub fn generate(
        passphrase: &[u8],
        choice: LotSequenceChoice,
        entropy: &impl EntropySource,
        params: &ScryptParams,
    ) -> Result<Self> {
        let (owner_entropy, has_lot_sequence) = match choice {
            LotSequenceChoice::Random => {
                let salt: [u8; 4] = random_array(entropy)?;
                let packed = u32::from_be_bytes(random_array(entropy)?);
                (OwnerEntropy::with_lot_sequence(salt, LotSequence::from_packed(packed)), true)
            }
            LotSequenceChoice::Assigned(lot_sequence) => {
                let salt: [u8; 4] = random_array(entropy)?;
                (OwnerEntropy::with_lot_sequence(salt, lot_sequence), true)
            }
            LotSequenceChoice::Omit => {
                (OwnerEntropy::without_lot_sequence(random_array(entropy)?), false)
            }
        };
        Self::derive(passphrase, owner_entropy, has_lot_sequence, params)
    }

    /// Validate the 49-byte payload
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != INTERMEDIATE_CODE_LEN {
            return Err(Error::InvalidInput(format!(
                "intermediate code must be {} bytes, got {}",
                INTERMEDIATE_CODE_LEN,
                data.len()
            )));
        }
        let has_lot_sequence = match &data[..8] {
            magic if magic == MAGIC_LOT_SEQUENCE => true,
            magic if magic == MAGIC_NO_LOT_SEQUENCE => false,
            magic => {
                return Err(Error::InvalidInput(format!(
                    "invalid intermediate code magic {}",
                    hex::encode(magic)
                )));
            }
        };
        Ok(Self {
            owner_entropy: OwnerEntropy::from_slice(&data[8..16])?,
            pass_point: PassPoint::from_slice(&data[16..16 + PASS_POINT_LEN])?,
            has_lot_sequence,
        })
    }

    /// Parse a base58check intermediate code
    pub fn from_base58(s: &str) -> Result<Self> {
        let data = base58::decode_check(s).inspect_err(|e| {
            tracing::warn!(error = %e, "rejecting intermediate code");
        })?;
        Self::from_bytes(&data)
    }

    /// The 49-byte payload
    pub fn to_bytes(&self) -> [u8; INTERMEDIATE_CODE_LEN] {
        let magic = if self.has_lot_sequence {
            MAGIC_LOT_SEQUENCE
        } else {
            MAGIC_NO_LOT_SEQUENCE
        };
        let mut bytes = [0u8; INTERMEDIATE_CODE_LEN];
        bytes[..8].copy_from_slice(&magic);
        bytes[8..16].copy_from_slice(self.owner_entropy.as_bytes());
        bytes[16..].copy_from_slice(self.pass_point.as_bytes());
        bytes
    }

    /// Encode as base58check
    pub fn to_base58(&self) -> String {
        base58::encode_check(&self.to_bytes())
    }

    /// ownerentropy conveyed to the printer
    pub fn owner_entropy(&self) -> &OwnerEntropy {
        &self.owner_entropy
    }

    /// passfactor * G
    pub fn pass_point(&self) -> &PassPoint {
        &self.pass_point
    }

    /// Whether ownerentropy carries lot/sequence
    pub fn has_lot_sequence(&self) -> bool {
        self.has_lot_sequence
    }

    /// Lot/sequence, if the code carries one
    pub fn lot_sequence(&self) -> Option<LotSequence> {
        self.has_lot_sequence.then(|| self.owner_entropy.lot_sequence())
    }
}

impl FromStr for IntermediateCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl fmt::Display for IntermediateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SeededEntropy;
    use assert_matches::assert_matches;

    const FAST: ScryptParams = ScryptParams {
        log_n: 4,
        r: 1,
        p: 1,
    };

    #[test]
    fn test_encoded_code_starts_with_passphrase() {
        let entropy = SeededEntropy::new(1);
        for choice in [LotSequenceChoice::Random, LotSequenceChoice::Omit] {
            let code = IntermediateCode::generate(b"owner", choice, &entropy, &FAST).unwrap();
            let encoded = code.to_base58();
            assert!(encoded.starts_with("passphrase"), "got {}", encoded);
            assert_eq!(encoded.len(), 72);
        }
    }

    #[test]
    fn test_payload_is_49_bytes_plus_checksum() {
        let code = IntermediateCode::generate(
            b"owner",
            LotSequenceChoice::Random,
            &SeededEntropy::new(2),
            &FAST,
        )
        .unwrap();
        let raw = bs58::decode(code.to_base58()).into_vec().unwrap();
        assert_eq!(raw.len(), INTERMEDIATE_CODE_LEN + 4);
        let zeros = raw.iter().take_while(|b| **b == 0).count();
        let ones = code.to_base58().chars().take_while(|c| *c == '1').count();
        assert_eq!(zeros, ones);
    }

    #[test]
    fn test_derivation_is_deterministic_per_salt() {
        let ls = LotSequence::new(100000, 1).unwrap();
        let a = IntermediateCode::derive(
            b"owner",
            OwnerEntropy::with_lot_sequence([1, 2, 3, 4], ls),
            true,
            &FAST,
        )
        .unwrap();
        let b = IntermediateCode::derive(
            b"owner",
            OwnerEntropy::with_lot_sequence([1, 2, 3, 4], ls),
            true,
            &FAST,
        )
        .unwrap();
        let c = IntermediateCode::derive(
            b"owner",
            OwnerEntropy::with_lot_sequence([1, 2, 3, 5], ls),
            true,
            &FAST,
        )
        .unwrap();
        assert_eq!(a.pass_point(), b.pass_point());
        assert_ne!(a.pass_point(), c.pass_point());
    }

    #[test]
    fn test_lot_sequence_changes_pass_point() {
        let a = IntermediateCode::derive(
            b"owner",
            OwnerEntropy::with_lot_sequence([1; 4], LotSequence::new(1, 1).unwrap()),
            true,
            &FAST,
        )
        .unwrap();
        let b = IntermediateCode::derive(
            b"owner",
            OwnerEntropy::with_lot_sequence([1; 4], LotSequence::new(1, 2).unwrap()),
            true,
            &FAST,
        )
        .unwrap();
        assert_ne!(a.pass_point(), b.pass_point());
    }

    #[test]
    fn test_assigned_lot_sequence_is_embedded() {
        let ls = LotSequence::new(806938, 1).unwrap();
        let code = IntermediateCode::generate(
            b"owner",
            LotSequenceChoice::Assigned(ls),
            &SeededEntropy::new(3),
            &FAST,
        )
        .unwrap();
        let parsed: IntermediateCode = code.to_base58().parse().unwrap();
        assert_eq!(parsed, code);
        assert_eq!(parsed.lot_sequence(), Some(ls));
        assert!(parsed.has_lot_sequence());
    }

    #[test]
    fn test_omitted_lot_sequence() {
        let code = IntermediateCode::generate(
            b"owner",
            LotSequenceChoice::Omit,
            &SeededEntropy::new(4),
            &FAST,
        )
        .unwrap();
        assert_eq!(code.to_bytes()[..8], MAGIC_NO_LOT_SEQUENCE);
        assert_eq!(code.lot_sequence(), None);
    }

    #[test]
    fn test_parse_rejects_bad_magic_and_corruption() {
        let code = IntermediateCode::generate(
            b"owner",
            LotSequenceChoice::Random,
            &SeededEntropy::new(5),
            &FAST,
        )
        .unwrap();

        let mut bytes = code.to_bytes();
        bytes[7] = 0x52;
        assert_matches!(IntermediateCode::from_bytes(&bytes), Err(Error::InvalidInput(_)));

        let mut raw = bs58::decode(code.to_base58()).into_vec().unwrap();
        for i in 0..raw.len() {
            raw[i] ^= 0x01;
            let corrupted = bs58::encode(&raw).into_string();
            assert_matches!(IntermediateCode::from_base58(&corrupted), Err(Error::ChecksumMismatch));
            raw[i] ^= 0x01;
        }
    }
}
