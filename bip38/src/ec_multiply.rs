//! EC-multiply mode: key generation from an intermediate code
//!
//! The printer draws `seedb`, multiplies the owner's passpoint by
//! `factorb = SHA256d(seedb)` to get the new public key, and encrypts `seedb`
//! under a key stretched from the passpoint. The private key
//! `passfactor * factorb` only exists once the owner decrypts with the
//! passphrase.

use zeroize::Zeroizing;

use crate::address::AddressEncoder;
use crate::cipher::BlockCipher;
use crate::config::ScryptParams;
use crate::confirmation::ConfirmationCode;
use crate::ec::{self, PublicKeyFormat};
use crate::entropy::{EntropySource, random_array};
use crate::error::{Error, Result};
use crate::hashes::double_sha256;
use crate::intermediate::{IntermediateCode, derive_pass_factor};
use crate::kdf::DerivedHalves;
use crate::record::{EncryptedKeyRecord, FlagByte};
use crate::types::{AddressHash, OwnerEntropy, PassPoint, PrivateKeyBytes, split_blocks, xor};

/// Length of seedb
pub const SEED_B_LEN: usize = 24;

/// Output of the printer side: a new address and everything the owner needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKey {
    /// Encrypted private key of `address`
    pub encrypted_key: EncryptedKeyRecord,
    /// The generated address
    pub address: String,
    /// Proof for the owner that `address` depends on their passphrase
    pub confirmation_code: ConfirmationCode,
}

/// scrypt(passpoint, addresshash || ownerentropy) split into halves
pub(crate) fn seed_halves(
    pass_point: &PassPoint,
    address_hash: &AddressHash,
    owner_entropy: &OwnerEntropy,
    params: &ScryptParams,
) -> Result<DerivedHalves> {
    let mut salt = [0u8; 12];
    salt[..4].copy_from_slice(address_hash.as_bytes());
    salt[4..].copy_from_slice(owner_entropy.as_bytes());
    DerivedHalves::derive(pass_point.as_bytes(), &salt, params)
}

/// Generate a new encrypted key from an intermediate code
pub(crate) fn generate(
    code: &IntermediateCode,
    format: PublicKeyFormat,
    encoder: &impl AddressEncoder,
    entropy: &impl EntropySource,
    params: &ScryptParams,
) -> Result<GeneratedKey> {
    let flag = FlagByte::ec_multiply(format.is_compressed(), code.has_lot_sequence());

    let seed_b: Zeroizing<[u8; SEED_B_LEN]> = Zeroizing::new(random_array(entropy)?);
    let factor_b = Zeroizing::new(double_sha256(&seed_b[..]));

    let generated = ec::point_multiply(&code.pass_point().to_public_key()?, &factor_b)?;
    let address = encoder.address_from_public_key(&format.serialize(&generated))?;
    let address_hash = AddressHash::from_address(&address);

    let derived = seed_halves(code.pass_point(), &address_hash, code.owner_entropy(), params)?;
    let cipher = BlockCipher::new(derived.half2());
    let (mask_lo, mask_hi) = split_blocks(derived.half1());

    let mut seed_lo = Zeroizing::new([0u8; 16]);
    seed_lo.copy_from_slice(&seed_b[..16]);
    let encrypted_part1 = cipher.encrypt_block(&xor(&seed_lo, &mask_lo));

    let mut block2 = Zeroizing::new([0u8; 16]);
    block2[..8].copy_from_slice(&encrypted_part1[8..]);
    block2[8..].copy_from_slice(&seed_b[16..]);
    let encrypted_part2 = cipher.encrypt_block(&xor(&block2, &mask_hi));

    let mut part1_lo = [0u8; 8];
    part1_lo.copy_from_slice(&encrypted_part1[..8]);
    let encrypted_key = EncryptedKeyRecord::ec_multiply(
        flag,
        &address_hash,
        code.owner_entropy(),
        &part1_lo,
        &encrypted_part2,
    );

    let point_b = ec::base_point_multiply(&factor_b)?;
    let confirmation_code =
        ConfirmationCode::seal(flag, &address_hash, code.owner_entropy(), &point_b, &derived);

    Ok(GeneratedKey {
        encrypted_key,
        address,
        confirmation_code,
    })
}

/// Recover the private key of an EC-multiply record with the owner's passphrase
///
/// Like the non-EC path, a wrong passphrase yields an unrelated key rather
/// than an error.
pub(crate) fn decrypt(
    record: &EncryptedKeyRecord,
    passphrase: &[u8],
    passphrase_params: &ScryptParams,
    seed_params: &ScryptParams,
) -> Result<PrivateKeyBytes> {
    let owner_entropy = record
        .owner_entropy()
        .ok_or_else(|| Error::invalid("record is not an EC-multiply record"))?;
    let has_lot_sequence = record.flag().has_lot_sequence();

    let pass_factor =
        derive_pass_factor(passphrase, &owner_entropy, has_lot_sequence, passphrase_params)?;
    let pass_point = PassPoint::from_public_key(&ec::base_point_multiply(&pass_factor)?);

    let derived = seed_halves(&pass_point, &record.address_hash(), &owner_entropy, seed_params)?;
    let cipher = BlockCipher::new(derived.half2());
    let (mask_lo, mask_hi) = split_blocks(derived.half1());

    // encryptedpart1[8..16] || seedb[16..24]
    let block2 = Zeroizing::new(xor(&cipher.decrypt_block(&record.second_block()), &mask_hi));

    let mut encrypted_part1 = [0u8; 16];
    encrypted_part1[..8].copy_from_slice(&record.encrypted_part1_lo());
    encrypted_part1[8..].copy_from_slice(&block2[..8]);
    let seed_lo = Zeroizing::new(xor(&cipher.decrypt_block(&encrypted_part1), &mask_lo));

    let mut seed_b = Zeroizing::new([0u8; SEED_B_LEN]);
    seed_b[..16].copy_from_slice(&seed_lo[..]);
    seed_b[16..].copy_from_slice(&block2[8..]);
    let factor_b = Zeroizing::new(double_sha256(&seed_b[..]));

    let key = ec::scalar_multiply(&pass_factor, &factor_b)?;
    Ok(PrivateKeyBytes::from(&key))
}
