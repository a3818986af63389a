//! The BIP38 engine
//!
//! [`Bip38Engine`] ties the protocol modules to a configuration, an entropy
//! source and an address encoder. Every operation is a stateless pipeline;
//! an engine can be shared between threads and used concurrently.
//!
//! Passphrases are normalized to Unicode NFC before stretching unless
//! [`Bip38Config::normalize_passphrase`] is turned off.

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::address::{AddressEncoder, P2pkhEncoder, validate_address};
use crate::config::{Bip38Config, ScryptParams};
use crate::confirmation::ConfirmationCode;
use crate::ec::PublicKeyFormat;
use crate::ec_multiply::{self, GeneratedKey};
use crate::entropy::{EntropySource, OsEntropy};
use crate::error::{Error, Result};
use crate::intermediate::{IntermediateCode, LotSequenceChoice};
use crate::non_ec;
use crate::record::{Bip38Mode, EncryptedKeyRecord};
use crate::types::{AddressHash, LotSequence, OwnerEntropy, PrivateKeyBytes, array_from_slice};

/// A private key recovered by [`Bip38Engine::decrypt`]
///
/// A wrong passphrase still produces a `DecryptedKey`. Call
/// [`DecryptedKey::verify`] or use [`Bip38Engine::decrypt_and_verify`] to
/// make sure the key belongs to the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedKey {
    /// The recovered 32-byte key
    pub key: PrivateKeyBytes,
    /// Address hash stored in the record
    pub address_hash: AddressHash,
    /// Whether the record's address uses the compressed public key
    pub compressed: bool,
}

impl DecryptedKey {
    /// Address of the recovered key, in the format named by the record
    pub fn address(&self, encoder: &impl AddressEncoder) -> Result<String> {
        let secret = self.key.to_secret_key()?;
        let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
        let format = PublicKeyFormat::from_compressed(self.compressed);
        encoder.address_from_public_key(&format.serialize(&public))
    }

    /// Check the key against the record's address hash and return its address
    pub fn verify(&self, encoder: &impl AddressEncoder) -> Result<String> {
        // A wrong passphrase can land outside the curve order
        let address = self.address(encoder).map_err(|e| match e {
            Error::Secp256k1(_) => Error::AddressMismatch,
            other => other,
        })?;
        if AddressHash::from_address(&address) != self.address_hash {
            return Err(Error::AddressMismatch);
        }
        Ok(address)
    }
}

/// BIP38 operations over a fixed configuration
#[derive(Debug, Clone)]
pub struct Bip38Engine<E = OsEntropy, A = P2pkhEncoder> {
    config: Bip38Config,
    entropy: E,
    encoder: A,
}

impl Bip38Engine {
    /// Engine with OS randomness and P2PKH addresses for `config.network`
    pub fn new(config: Bip38Config) -> Self {
        Self {
            entropy: OsEntropy,
            encoder: P2pkhEncoder::new(config.network),
            config,
        }
    }
}

impl Default for Bip38Engine {
    fn default() -> Self {
        Self::new(Bip38Config::default())
    }
}

impl<E: EntropySource, A: AddressEncoder> Bip38Engine<E, A> {
    /// Replace the entropy source
    pub fn with_entropy<F: EntropySource>(self, entropy: F) -> Bip38Engine<F, A> {
        Bip38Engine {
            config: self.config,
            entropy,
            encoder: self.encoder,
        }
    }

    /// Replace the address encoder
    pub fn with_encoder<B: AddressEncoder>(self, encoder: B) -> Bip38Engine<E, B> {
        Bip38Engine {
            config: self.config,
            entropy: self.entropy,
            encoder,
        }
    }

    /// The engine configuration
    pub fn config(&self) -> &Bip38Config {
        &self.config
    }

    /// The address encoder used for derived and verified addresses
    pub fn encoder(&self) -> &A {
        &self.encoder
    }

    fn passphrase_bytes(&self, passphrase: &str) -> Zeroizing<Vec<u8>> {
        if self.config.normalize_passphrase {
            Zeroizing::new(passphrase.nfc().collect::<String>().into_bytes())
        } else {
            Zeroizing::new(passphrase.as_bytes().to_vec())
        }
    }

    fn passphrase_params(&self, scrypt_parallelism: u32) -> Result<ScryptParams> {
        if scrypt_parallelism == 0 {
            return Err(Error::invalid("scrypt parallelism must be positive"));
        }
        Ok(self.config.passphrase_kdf.with_parallelism(scrypt_parallelism))
    }

    /// Encrypt a 32-byte private key whose compressed-key address is `address`
    ///
    /// Produces a non-EC record with flag byte `0xE0`. `scrypt_parallelism`
    /// must be shared with whoever decrypts the record; BIP38 fixes it at 8.
    pub fn encrypt(
        &self,
        private_key: &[u8],
        address: &str,
        passphrase: &str,
        scrypt_parallelism: u32,
    ) -> Result<EncryptedKeyRecord> {
        self.encrypt_with_format(
            private_key,
            address,
            passphrase,
            scrypt_parallelism,
            PublicKeyFormat::Compressed,
        )
    }

    /// Like [`encrypt`](Self::encrypt), for an address in the given public key format
    pub fn encrypt_with_format(
        &self,
        private_key: &[u8],
        address: &str,
        passphrase: &str,
        scrypt_parallelism: u32,
        format: PublicKeyFormat,
    ) -> Result<EncryptedKeyRecord> {
        let private_key = PrivateKeyBytes::from_slice(private_key)?;
        validate_address(address)?;
        let params = self.passphrase_params(scrypt_parallelism)?;

        debug!(address, ?format, p = scrypt_parallelism, "encrypting private key");
        let record = non_ec::encrypt(
            &private_key,
            address,
            &self.passphrase_bytes(passphrase),
            &params,
            format,
        )?;
        debug!(flag = record.flag().bits(), "encrypted private key");
        Ok(record)
    }

    /// Encrypt a secret key, deriving its address with the configured encoder
    pub fn encrypt_secret_key(
        &self,
        secret_key: &SecretKey,
        passphrase: &str,
    ) -> Result<EncryptedKeyRecord> {
        let format = PublicKeyFormat::from_compressed(self.config.compressed);
        let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), secret_key);
        let address = self.encoder.address_from_public_key(&format.serialize(&public))?;
        let private_key = PrivateKeyBytes::from(secret_key);

        debug!(address = %address, ?format, "encrypting secret key");
        non_ec::encrypt(
            &private_key,
            &address,
            &self.passphrase_bytes(passphrase),
            &self.config.passphrase_kdf,
            format,
        )
    }

    /// Decrypt a base58check-encoded record
    ///
    /// The checksum, prefix and flag byte are validated before any key
    /// stretching. A wrong passphrase is not detected here.
    pub fn decrypt(
        &self,
        encoded: &str,
        passphrase: &str,
        scrypt_parallelism: u32,
    ) -> Result<DecryptedKey> {
        let record = EncryptedKeyRecord::from_base58(encoded)?;
        self.decrypt_record(&record, passphrase, scrypt_parallelism)
    }

    /// Decrypt an already parsed record
    ///
    /// `scrypt_parallelism` must be positive. It applies to non-EC records;
    /// EC-multiply records always use the configured passphrase and seed
    /// parameters, which the printer had no way to change.
    pub fn decrypt_record(
        &self,
        record: &EncryptedKeyRecord,
        passphrase: &str,
        scrypt_parallelism: u32,
    ) -> Result<DecryptedKey> {
        let params = self.passphrase_params(scrypt_parallelism)?;
        let passphrase = self.passphrase_bytes(passphrase);
        debug!(mode = ?record.mode(), flag = record.flag().bits(), "decrypting record");

        let key = match record.mode() {
            Bip38Mode::NonEcMultiply => non_ec::decrypt(record, &passphrase, &params)?,
            Bip38Mode::EcMultiply => ec_multiply::decrypt(
                record,
                &passphrase,
                &self.config.passphrase_kdf,
                &self.config.seed_kdf,
            )?,
        };

        Ok(DecryptedKey {
            key,
            address_hash: record.address_hash(),
            compressed: record.is_compressed(),
        })
    }

    /// Decrypt and confirm the key against the record's address hash
    ///
    /// Returns [`Error::AddressMismatch`] for a wrong passphrase.
    pub fn decrypt_and_verify(
        &self,
        encoded: &str,
        passphrase: &str,
        scrypt_parallelism: u32,
    ) -> Result<(DecryptedKey, String)> {
        let decrypted = self.decrypt(encoded, passphrase, scrypt_parallelism)?;
        let address = decrypted.verify(&self.encoder).inspect_err(|e| {
            debug!(error = %e, "decrypted key does not match record");
        })?;
        Ok((decrypted, address))
    }

    /// Create an intermediate code for handing to a printer
    pub fn generate_intermediate_code(
        &self,
        passphrase: &str,
        lot_sequence: LotSequenceChoice,
    ) -> Result<IntermediateCode> {
        let code = IntermediateCode::generate(
            &self.passphrase_bytes(passphrase),
            lot_sequence,
            &self.entropy,
            &self.config.passphrase_kdf,
        )?;
        debug!(lot_sequence = ?code.lot_sequence(), "generated intermediate code");
        Ok(code)
    }

    /// Intermediate code for a caller-chosen owner salt
    ///
    /// `owner_salt` is 4 bytes with a lot/sequence number and 8 bytes without.
    pub fn intermediate_code_from_salt(
        &self,
        passphrase: &str,
        owner_salt: &[u8],
        lot_sequence: Option<LotSequence>,
    ) -> Result<IntermediateCode> {
        let owner_entropy = match lot_sequence {
            Some(lot_sequence) => {
                let salt = array_from_slice(owner_salt, "owner salt")?;
                OwnerEntropy::with_lot_sequence(salt, lot_sequence)
            }
            None => OwnerEntropy::without_lot_sequence(array_from_slice(owner_salt, "owner salt")?),
        };
        IntermediateCode::derive(
            &self.passphrase_bytes(passphrase),
            owner_entropy,
            lot_sequence.is_some(),
            &self.config.passphrase_kdf,
        )
    }

    /// Printer side: derive a fresh encrypted key from an encoded intermediate code
    ///
    /// Every call draws a new seed and returns an unrelated key.
    pub fn derive_key_from_intermediate(&self, intermediate_code: &str) -> Result<GeneratedKey> {
        let code = IntermediateCode::from_base58(intermediate_code)?;
        self.derive_key_from_code(&code)
    }

    /// Like [`derive_key_from_intermediate`](Self::derive_key_from_intermediate) for a parsed code
    pub fn derive_key_from_code(&self, code: &IntermediateCode) -> Result<GeneratedKey> {
        let format = PublicKeyFormat::from_compressed(self.config.compressed);
        let generated = ec_multiply::generate(
            code,
            format,
            &self.encoder,
            &self.entropy,
            &self.config.seed_kdf,
        )?;
        debug!(
            address = %generated.address,
            flag = generated.encrypted_key.flag().bits(),
            lot_sequence = ?code.lot_sequence(),
            "derived key from intermediate code"
        );
        Ok(generated)
    }

    /// Owner side: check a confirmation code and return the confirmed address
    pub fn verify_confirmation_code(
        &self,
        confirmation_code: &str,
        passphrase: &str,
    ) -> Result<String> {
        let code = ConfirmationCode::from_base58(confirmation_code)?;
        let address = code.verify(
            &self.passphrase_bytes(passphrase),
            &self.encoder,
            &self.config.passphrase_kdf,
            &self.config.seed_kdf,
        )?;
        debug!(address = %address, "confirmation code verified");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SeededEntropy;
    use assert_matches::assert_matches;

    fn fast_engine() -> Bip38Engine<SeededEntropy> {
        let fast = ScryptParams {
            log_n: 4,
            r: 1,
            p: 1,
        };
        Bip38Engine::new(Bip38Config::default().with_passphrase_kdf(fast).with_seed_kdf(fast))
            .with_entropy(SeededEntropy::new(42))
    }

    #[test]
    fn test_encrypt_validates_before_stretching() {
        let engine = fast_engine();
        assert_matches!(
            engine.encrypt(&[1u8; 31], "1Jq6MksXQVWzrznvZzxkV6oY57oWXD9TXB", "pass", 8),
            Err(Error::InvalidInput(_))
        );
        assert_matches!(engine.encrypt(&[1u8; 32], "", "pass", 8), Err(Error::InvalidInput(_)));
        assert_matches!(
            engine.encrypt(&[1u8; 32], "1Jq6MksXQVWzrznvZzxkV6oY57oWXD9TXB", "pass", 0),
            Err(Error::InvalidInput(_))
        );
    }

    /// Segwit-looking addresses: "bc1q" and the hex HASH160, not base58
    #[derive(Debug)]
    struct HexHashEncoder;

    impl AddressEncoder for HexHashEncoder {
        fn address_from_public_key(&self, public_key: &[u8]) -> Result<String> {
            Ok(format!("bc1q{}", hex::encode(crate::hashes::hash160(public_key))))
        }
    }

    #[test]
    fn test_encrypt_accepts_any_encoder_address() {
        let engine = fast_engine().with_encoder(HexHashEncoder);
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let from_secret = engine.encrypt_secret_key(&secret, "pass").unwrap();

        let (_, address) =
            engine.decrypt_and_verify(&from_secret.to_base58(), "pass", 1).unwrap();
        assert!(address.starts_with("bc1q"));

        let record = engine.encrypt(&secret.secret_bytes(), &address, "pass", 1).unwrap();
        assert_eq!(record, from_secret);
        let decrypted = engine.decrypt(&record.to_base58(), "pass", 1).unwrap();
        assert_eq!(decrypted.key.as_bytes(), &secret.secret_bytes());
        assert_eq!(decrypted.verify(engine.encoder()).unwrap(), address);
    }

    #[test]
    fn test_zero_parallelism_rejected_for_both_modes() {
        let engine = fast_engine();
        let code = engine.generate_intermediate_code("owner", LotSequenceChoice::Omit).unwrap();
        let generated = engine.derive_key_from_code(&code).unwrap();
        assert_matches!(
            engine.decrypt(&generated.encrypted_key.to_base58(), "owner", 0),
            Err(Error::InvalidInput(_))
        );

        let secret = SecretKey::from_slice(&[3u8; 32]).unwrap();
        let record = engine.encrypt_secret_key(&secret, "pass").unwrap();
        assert_matches!(
            engine.decrypt(&record.to_base58(), "pass", 0),
            Err(Error::InvalidInput(_))
        );
    }

    #[test]
    fn test_secret_key_round_trip_verifies() {
        let engine = fast_engine();
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let record = engine.encrypt_secret_key(&secret, "pass").unwrap();
        assert!(record.is_compressed());

        let (decrypted, address) =
            engine.decrypt_and_verify(&record.to_base58(), "pass", 1).unwrap();
        assert_eq!(decrypted.key.as_bytes(), &secret.secret_bytes());
        assert_eq!(AddressHash::from_address(&address), record.address_hash());

        assert_matches!(
            engine.decrypt_and_verify(&record.to_base58(), "wrong", 1),
            Err(Error::AddressMismatch)
        );
    }

    #[test]
    fn test_passphrase_is_nfc_normalized() {
        let engine = fast_engine();
        let secret = SecretKey::from_slice(&[9u8; 32]).unwrap();
        // "é" precomposed vs e + combining acute
        let record = engine.encrypt_secret_key(&secret, "caf\u{e9}").unwrap();
        assert!(engine.decrypt_and_verify(&record.to_base58(), "cafe\u{301}", 1).is_ok());

        let raw = Bip38Engine::new(engine.config().with_passphrase_normalization(false));
        assert_matches!(
            raw.decrypt_and_verify(&record.to_base58(), "cafe\u{301}", 1),
            Err(Error::AddressMismatch)
        );
    }

    #[test]
    fn test_generated_key_decrypts_and_confirms() {
        let engine = fast_engine();
        let code = engine.generate_intermediate_code("owner", LotSequenceChoice::Random).unwrap();
        let generated = engine.derive_key_from_intermediate(&code.to_base58()).unwrap();

        let (_, address) =
            engine.decrypt_and_verify(&generated.encrypted_key.to_base58(), "owner", 8).unwrap();
        assert_eq!(address, generated.address);

        let confirmed = engine
            .verify_confirmation_code(&generated.confirmation_code.to_base58(), "owner")
            .unwrap();
        assert_eq!(confirmed, generated.address);
    }

    #[test]
    fn test_intermediate_code_from_salt_checks_length() {
        let engine = fast_engine();
        let lot = LotSequence::new(1, 1).unwrap();
        assert_matches!(
            engine.intermediate_code_from_salt("owner", &[0u8; 8], Some(lot)),
            Err(Error::InvalidInput(_))
        );
        assert_matches!(
            engine.intermediate_code_from_salt("owner", &[0u8; 4], None),
            Err(Error::InvalidInput(_))
        );
        let code = engine.intermediate_code_from_salt("owner", &[1, 2, 3, 4], Some(lot)).unwrap();
        assert_eq!(code.lot_sequence(), Some(lot));
    }
}
