//! Confirmation codes
//!
//! A printer that generated a key from an intermediate code hands the owner a
//! confirmation code alongside the address. With the passphrase the owner can
//! check that the address really depends on it before funding it.
//!
//! ```text
//! magic(5) | flag | addresshash(4) | ownerentropy(8) | pointbprefix | pointbx1(16) | pointbx2(16)
//! ```

use core::fmt;
use core::str::FromStr;

use secp256k1::PublicKey;

use crate::address::AddressEncoder;
use crate::base58;
use crate::cipher::BlockCipher;
use crate::config::ScryptParams;
use crate::ec::{self, PublicKeyFormat};
use crate::ec_multiply::seed_halves;
use crate::error::{Error, Result};
use crate::intermediate::derive_pass_factor;
use crate::kdf::DerivedHalves;
use crate::record::{Bip38Mode, FlagByte};
use crate::types::{
    AddressHash, OwnerEntropy, PassPoint, array_from_slice, join_blocks, split_blocks, xor,
};

/// Payload length of a confirmation code, without checksum
pub const CONFIRMATION_CODE_LEN: usize = 51;

/// Magic bytes; base58 strings start with "cfrm38"
pub const CONFIRMATION_MAGIC: [u8; 5] = [0x64, 0x3B, 0xF6, 0xA8, 0x9A];

const FLAG_OFFSET: usize = 5;
const ADDRESS_HASH: core::ops::Range<usize> = 6..10;
const OWNER_ENTROPY: core::ops::Range<usize> = 10..18;
const POINT_B_PREFIX: usize = 18;
const POINT_B_X1: core::ops::Range<usize> = 19..35;
const POINT_B_X2: core::ops::Range<usize> = 35..51;

/// A confirmation code for a key generated from an intermediate code
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmationCode {
    bytes: [u8; CONFIRMATION_CODE_LEN],
    flag: FlagByte,
}

impl ConfirmationCode {
    /// Encrypt pointb = factorb * G under the halves used for seedb
    pub(crate) fn seal(
        flag: FlagByte,
        address_hash: &AddressHash,
        owner_entropy: &OwnerEntropy,
        point_b: &PublicKey,
        derived: &DerivedHalves,
    ) -> Self {
        let serialized = point_b.serialize();
        let mut x = [0u8; 32];
        x.copy_from_slice(&serialized[1..]);

        let cipher = BlockCipher::new(derived.half2());
        let (x_lo, x_hi) = split_blocks(&x);
        let (mask_lo, mask_hi) = split_blocks(derived.half1());

        let mut bytes = [0u8; CONFIRMATION_CODE_LEN];
        bytes[..FLAG_OFFSET].copy_from_slice(&CONFIRMATION_MAGIC);
        bytes[FLAG_OFFSET] = flag.bits();
        bytes[ADDRESS_HASH].copy_from_slice(address_hash.as_bytes());
        bytes[OWNER_ENTROPY].copy_from_slice(owner_entropy.as_bytes());
        bytes[POINT_B_PREFIX] = serialized[0] ^ (derived.half2()[31] & 0x01);
        bytes[POINT_B_X1].copy_from_slice(&cipher.encrypt_block(&xor(&x_lo, &mask_lo)));
        bytes[POINT_B_X2].copy_from_slice(&cipher.encrypt_block(&xor(&x_hi, &mask_hi)));
        Self {
            bytes,
            flag,
        }
    }

    /// Validate the 51-byte payload
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bytes: [u8; CONFIRMATION_CODE_LEN] = array_from_slice(data, "confirmation code")?;
        if bytes[..FLAG_OFFSET] != CONFIRMATION_MAGIC {
            return Err(Error::invalid("invalid confirmation code magic"));
        }
        let flag = FlagByte::parse(bytes[FLAG_OFFSET], Bip38Mode::EcMultiply)?;
        Ok(Self {
            bytes,
            flag,
        })
    }

    /// Parse a base58check "cfrm38..." string
    pub fn from_base58(s: &str) -> Result<Self> {
        Self::from_bytes(&base58::decode_check(s)?)
    }

    /// Base58check encoding
    pub fn to_base58(&self) -> String {
        base58::encode_check(&self.bytes)
    }

    /// Raw payload
    pub fn as_bytes(&self) -> &[u8; CONFIRMATION_CODE_LEN] {
        &self.bytes
    }

    /// Flag byte of the matching encrypted key
    pub fn flag(&self) -> FlagByte {
        self.flag
    }

    /// Address hash of the matching encrypted key
    pub fn address_hash(&self) -> AddressHash {
        let mut hash = [0u8; 4];
        hash.copy_from_slice(&self.bytes[ADDRESS_HASH]);
        AddressHash::from_bytes(hash)
    }

    /// Owner entropy of the intermediate code the key was derived from
    pub fn owner_entropy(&self) -> OwnerEntropy {
        let mut entropy = [0u8; 8];
        entropy.copy_from_slice(&self.bytes[OWNER_ENTROPY]);
        OwnerEntropy::from_bytes(entropy)
    }

    /// Recompute the address from the passphrase
    ///
    /// Returns the confirmed address, or [`Error::AddressMismatch`] when the
    /// passphrase does not belong to this code.
    pub fn verify(
        &self,
        passphrase: &[u8],
        encoder: &impl AddressEncoder,
        passphrase_params: &ScryptParams,
        seed_params: &ScryptParams,
    ) -> Result<String> {
        let owner_entropy = self.owner_entropy();
        let address_hash = self.address_hash();
        let pass_factor = derive_pass_factor(
            passphrase,
            &owner_entropy,
            self.flag.has_lot_sequence(),
            passphrase_params,
        )?;
        let pass_point = PassPoint::from_public_key(&ec::base_point_multiply(&pass_factor)?);
        let derived = seed_halves(&pass_point, &address_hash, &owner_entropy, seed_params)?;

        let cipher = BlockCipher::new(derived.half2());
        let (mask_lo, mask_hi) = split_blocks(derived.half1());
        let mut x1 = [0u8; 16];
        x1.copy_from_slice(&self.bytes[POINT_B_X1]);
        let mut x2 = [0u8; 16];
        x2.copy_from_slice(&self.bytes[POINT_B_X2]);
        let x = join_blocks(
            &xor(&cipher.decrypt_block(&x1), &mask_lo),
            &xor(&cipher.decrypt_block(&x2), &mask_hi),
        );

        let mut serialized = [0u8; 33];
        serialized[0] = self.bytes[POINT_B_PREFIX] ^ (derived.half2()[31] & 0x01);
        serialized[1..].copy_from_slice(&x);
        // A wrong passphrase usually decrypts to an x coordinate off the curve
        let point_b = PublicKey::from_slice(&serialized).map_err(|_| Error::AddressMismatch)?;

        let generated = ec::point_multiply(&point_b, &pass_factor)?;
        let format = PublicKeyFormat::from_compressed(self.flag.is_compressed());
        let address = encoder.address_from_public_key(&format.serialize(&generated))?;
        if AddressHash::from_address(&address) != address_hash {
            return Err(Error::AddressMismatch);
        }
        Ok(address)
    }
}

impl FromStr for ConfirmationCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationCode")
            .field("flag", &self.flag)
            .field("address_hash", &self.address_hash())
            .field("owner_entropy", &hex::encode(self.owner_entropy().as_bytes()))
            .finish()
    }
}
