//! Non-EC-multiply mode: encryption of an existing private key

use crate::cipher::BlockCipher;
use crate::config::ScryptParams;
use crate::ec::PublicKeyFormat;
use crate::error::Result;
use crate::kdf::DerivedHalves;
use crate::record::{Bip38Mode, EncryptedKeyRecord, FlagByte};
use crate::types::{AddressHash, PrivateKeyBytes, join_blocks, split_blocks, xor};

/// Encrypt `private_key`, binding the record to `address`
///
/// The caller guarantees that `address` is the address of `private_key` in
/// `format`; only its hash is stored.
pub(crate) fn encrypt(
    private_key: &PrivateKeyBytes,
    address: &str,
    passphrase: &[u8],
    params: &ScryptParams,
    format: PublicKeyFormat,
) -> Result<EncryptedKeyRecord> {
    let address_hash = AddressHash::from_address(address);
    let derived = DerivedHalves::derive(passphrase, address_hash.as_bytes(), params)?;

    let (key_lo, key_hi) = split_blocks(private_key.as_bytes());
    let (mask_lo, mask_hi) = split_blocks(derived.half1());

    let cipher = BlockCipher::new(derived.half2());
    let encrypted_half1 = cipher.encrypt_block(&xor(&key_lo, &mask_lo));
    let encrypted_half2 = cipher.encrypt_block(&xor(&key_hi, &mask_hi));

    let flag = FlagByte::non_ec(format.is_compressed());
    Ok(EncryptedKeyRecord::non_ec(flag, &address_hash, &encrypted_half1, &encrypted_half2))
}

/// Recover the key of a non-EC record
///
/// A wrong passphrase silently yields a different 32-byte value.
pub(crate) fn decrypt(
    record: &EncryptedKeyRecord,
    passphrase: &[u8],
    params: &ScryptParams,
) -> Result<PrivateKeyBytes> {
    debug_assert_eq!(record.mode(), Bip38Mode::NonEcMultiply);

    let address_hash = record.address_hash();
    let derived = DerivedHalves::derive(passphrase, address_hash.as_bytes(), params)?;

    let cipher = BlockCipher::new(derived.half2());
    let decrypted_half1 = cipher.decrypt_block(&record.encrypted_half1());
    let decrypted_half2 = cipher.decrypt_block(&record.second_block());

    let key = xor(&join_blocks(&decrypted_half1, &decrypted_half2), derived.half1());
    Ok(PrivateKeyBytes::from_bytes(key))
}
