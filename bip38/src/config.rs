//! Engine configuration
//!
//! This module defines the scrypt cost parameters and the other knobs of the
//! BIP38 engine. The defaults are the values fixed by BIP38; lowering them
//! produces records other implementations cannot decrypt, which is only
//! useful in tests.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::address::Network;
use crate::error::{Error, Result};

/// scrypt cost parameters, with the output length supplied per call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScryptParams {
    /// log2 of the CPU/memory cost N
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelism
    pub p: u32,
}

impl ScryptParams {
    /// N=16384, r=8, p=8: passphrase stretching for non-EC records and prefactors
    pub const fn passphrase() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 8,
        }
    }

    /// N=1024, r=1, p=1: seedb encryption keyed by the passpoint
    pub const fn seed() -> Self {
        Self {
            log_n: 10,
            r: 1,
            p: 1,
        }
    }

    /// Same cost, different parallelism
    pub fn with_parallelism(mut self, p: u32) -> Self {
        self.p = p;
        self
    }

    /// The cost parameter N, or `None` when `log_n` does not fit a u64
    pub fn n(&self) -> Option<u64> {
        1u64.checked_shl(self.log_n.into())
    }

    /// Validate and convert for an output of `len` bytes
    pub(crate) fn to_scrypt_params(&self, len: usize) -> Result<scrypt::Params> {
        if self.p == 0 {
            return Err(Error::invalid("scrypt parallelism must be positive"));
        }
        scrypt::Params::new(self.log_n, self.r, self.p, len)
            .map_err(|e| Error::crypto(format!("invalid scrypt parameters: {}", e)))
    }
}

/// BIP38 engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bip38Config {
    /// Network whose P2PKH version byte is used for generated addresses
    pub network: Network,
    /// Passphrase KDF for non-EC records and EC prefactors
    pub passphrase_kdf: ScryptParams,
    /// KDF protecting seedb in EC-multiply records and confirmation codes
    pub seed_kdf: ScryptParams,
    /// Derive compressed public keys for encrypted and generated keys
    pub compressed: bool,
    /// Apply Unicode NFC to passphrases before stretching
    pub normalize_passphrase: bool,
}

impl Default for Bip38Config {
    fn default() -> Self {
        Self {
            network: Network::Bitcoin,
            passphrase_kdf: ScryptParams::passphrase(),
            seed_kdf: ScryptParams::seed(),
            compressed: true,
            normalize_passphrase: true,
        }
    }
}

impl Bip38Config {
    /// Create a configuration with the BIP38 defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address network
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Set the passphrase KDF parameters
    pub fn with_passphrase_kdf(mut self, params: ScryptParams) -> Self {
        self.passphrase_kdf = params;
        self
    }

    /// Set the seedb KDF parameters
    pub fn with_seed_kdf(mut self, params: ScryptParams) -> Self {
        self.seed_kdf = params;
        self
    }

    /// Choose compressed or uncompressed public keys
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Enable or disable NFC normalisation of passphrases
    pub fn with_passphrase_normalization(mut self, normalize: bool) -> Self {
        self.normalize_passphrase = normalize;
        self
    }
}
