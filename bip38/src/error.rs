//! Error types for the bip38 library

use thiserror::Error;

/// Result type alias for BIP38 operations
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while encrypting, decrypting or generating BIP38 keys.
///
/// A wrong passphrase is deliberately *not* one of these when calling
/// [`Bip38Engine::decrypt`](crate::Bip38Engine::decrypt): the recovered key is
/// structurally valid and the caller has to compare address hashes, or use one
/// of the verifying helpers which report [`Error::AddressMismatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Wrong buffer length, unknown prefix or magic, reserved flag bits, bad encoding
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The base58check checksum does not match the payload
    #[error("Checksum mismatch")]
    ChecksumMismatch,

    /// Entropy source or key derivation primitive failure
    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    /// Point or scalar rejected by secp256k1
    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    /// The re-derived address does not hash to the record's address hash
    #[error("Address hash mismatch (wrong passphrase?)")]
    AddressMismatch,
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub(crate) fn crypto(msg: impl Into<String>) -> Self {
        Error::CryptoFailure(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::invalid("bad prefix").to_string(), "Invalid input: bad prefix");
        assert_eq!(Error::ChecksumMismatch.to_string(), "Checksum mismatch");
        assert_eq!(Error::crypto("rng").to_string(), "Crypto failure: rng");
    }

    #[test]
    fn test_secp256k1_conversion() {
        let err: Error = secp256k1::Error::InvalidPublicKey.into();
        assert_eq!(err, Error::Secp256k1(secp256k1::Error::InvalidPublicKey));
    }
}
