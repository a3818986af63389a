//! BIP38 passphrase-protected private keys
//!
//! This library implements BIP38 for Bitcoin and Dash style P2PKH addresses:
//! encryption of existing private keys (non-EC-multiply mode), intermediate
//! passphrase codes, and two-factor generation of new keys by a party that
//! never learns the passphrase (EC-multiply mode), including confirmation
//! codes.
//!
//! # Example
//!
//! ```no_run
//! use bip38::Bip38Engine;
//!
//! # fn main() -> bip38::Result<()> {
//! let engine = Bip38Engine::default();
//! let record = engine.encrypt(&[0x11; 32], "1HmPbwsvG5qJ3KJfxzsZRZWhbm1xBMuS8B", "pass", 8)?;
//! let decrypted = engine.decrypt(&record.to_base58(), "pass", 8)?;
//! assert_eq!(decrypted.key.as_bytes(), &[0x11; 32]);
//! # Ok(())
//! # }
//! ```


pub mod address;
pub mod base58;
pub mod cipher;
pub mod config;
pub mod confirmation;
pub mod ec;
mod ec_multiply;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod hashes;
pub mod intermediate;
pub mod kdf;
mod non_ec;
pub mod record;
pub mod types;

pub use address::{AddressEncoder, Network, P2pkhEncoder};
pub use config::{Bip38Config, ScryptParams};
pub use confirmation::ConfirmationCode;
pub use ec::PublicKeyFormat;
pub use ec_multiply::{GeneratedKey, SEED_B_LEN};
pub use engine::{Bip38Engine, DecryptedKey};
pub use entropy::{EntropySource, OsEntropy};
pub use error::{Error, Result};
pub use intermediate::{IntermediateCode, LotSequenceChoice};
pub use record::{Bip38Mode, EncryptedKeyRecord, FlagByte};
pub use types::{AddressHash, LotSequence, OwnerEntropy, PassPoint, PrivateKeyBytes};

#[cfg(any(test, feature = "test-utils"))]
pub use entropy::SeededEntropy;

/// Re-export commonly used types
pub mod prelude {
    pub use super::{
        Bip38Config, Bip38Engine, Bip38Mode, ConfirmationCode, DecryptedKey, EncryptedKeyRecord,
        Error, GeneratedKey, IntermediateCode, LotSequence, LotSequenceChoice, Network, Result,
    };
}

/// Encrypt a private key with the default engine; see [`Bip38Engine::encrypt`]
pub fn encrypt(
    private_key: &[u8],
    address: &str,
    passphrase: &str,
    scrypt_parallelism: u32,
) -> Result<EncryptedKeyRecord> {
    Bip38Engine::default().encrypt(private_key, address, passphrase, scrypt_parallelism)
}

/// Decrypt a record with the default engine; see [`Bip38Engine::decrypt`]
pub fn decrypt(encoded: &str, passphrase: &str, scrypt_parallelism: u32) -> Result<DecryptedKey> {
    Bip38Engine::default().decrypt(encoded, passphrase, scrypt_parallelism)
}

/// Generate an intermediate code with random lot and sequence numbers
pub fn generate_intermediate_code(passphrase: &str) -> Result<IntermediateCode> {
    Bip38Engine::default().generate_intermediate_code(passphrase, LotSequenceChoice::Random)
}

/// Derive a new encrypted key from an intermediate code with the default engine
pub fn derive_key_from_intermediate(intermediate_code: &str) -> Result<GeneratedKey> {
    Bip38Engine::default().derive_key_from_intermediate(intermediate_code)
}
