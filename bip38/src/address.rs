//! Address derivation from public keys
//!
//! BIP38 only ever needs addresses as strings: they are hashed into the
//! record's address hash and returned to the caller. The derivation itself is
//! pluggable through [`AddressEncoder`]; [`P2pkhEncoder`] covers the classic
//! base58 pay-to-pubkey-hash addresses of Bitcoin and Dash.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::base58;
use crate::error::{Error, Result};
use crate::hashes::hash160;

/// Network type for address encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Network {
    /// Bitcoin mainnet
    Bitcoin,
    /// Bitcoin testnet
    BitcoinTestnet,
    /// Dash mainnet
    Dash,
    /// Dash testnet
    DashTestnet,
}

impl Network {
    /// Get P2PKH version byte
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0,          // '1' prefix
            Network::BitcoinTestnet => 111, // 'm' or 'n' prefix
            Network::Dash => 76,            // 'X' prefix
            Network::DashTestnet => 140,    // 'y' prefix
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Bitcoin => "bitcoin",
            Network::BitcoinTestnet => "bitcointestnet",
            Network::Dash => "dash",
            Network::DashTestnet => "dashtestnet",
        };
        f.write_str(name)
    }
}

/// Turns a serialized public key into an encoded address string
pub trait AddressEncoder: Send + Sync {
    /// `public_key` is a 33-byte compressed or 65-byte uncompressed SEC1 encoding
    fn address_from_public_key(&self, public_key: &[u8]) -> Result<String>;
}

impl<T: AddressEncoder + ?Sized> AddressEncoder for &T {
    fn address_from_public_key(&self, public_key: &[u8]) -> Result<String> {
        (**self).address_from_public_key(public_key)
    }
}

/// Base58check P2PKH addresses: `version || HASH160(pubkey)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct P2pkhEncoder {
    network: Network,
}

impl P2pkhEncoder {
    /// Create an encoder for the given network
    pub fn new(network: Network) -> Self {
        Self {
            network,
        }
    }

    /// The network this encoder produces addresses for
    pub fn network(&self) -> Network {
        self.network
    }
}

impl Default for P2pkhEncoder {
    fn default() -> Self {
        Self::new(Network::Bitcoin)
    }
}

impl AddressEncoder for P2pkhEncoder {
    fn address_from_public_key(&self, public_key: &[u8]) -> Result<String> {
        match (public_key.len(), public_key.first()) {
            (33, Some(0x02 | 0x03)) | (65, Some(0x04)) => {}
            (len, _) => {
                return Err(Error::InvalidInput(format!(
                    "public key must be a 33 or 65 byte SEC1 encoding, got {} bytes",
                    len
                )));
            }
        }

        let mut data = Vec::with_capacity(21);
        data.push(self.network.p2pkh_version());
        data.extend_from_slice(&hash160(public_key));

        Ok(base58::encode_check(&data))
    }
}

/// Check that an address is non-empty printable ASCII before it is
/// used as salt material.
pub(crate) fn validate_address(address: &str) -> Result<()> {
    if address.is_empty() {
        return Err(Error::invalid("address must not be empty"));
    }
    if !address.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(Error::InvalidInput(format!("malformed address {:?}", address)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use secp256k1::{PublicKey, Secp256k1, SecretKey};

    #[test]
    fn test_bitcoin_p2pkh_of_private_key_one() {
        let secp = Secp256k1::new();
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let secret = SecretKey::from_slice(&bytes).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);

        let encoder = P2pkhEncoder::new(Network::Bitcoin);
        assert_eq!(
            encoder.address_from_public_key(&public.serialize()).unwrap(),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
        assert_eq!(
            encoder.address_from_public_key(&public.serialize_uncompressed()).unwrap(),
            "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm"
        );
    }

    #[test]
    fn test_network_prefixes() {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[1u8; 32]).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret).serialize();

        let dash = P2pkhEncoder::new(Network::Dash).address_from_public_key(&public).unwrap();
        assert!(dash.starts_with('X'));
        let dash_testnet =
            P2pkhEncoder::new(Network::DashTestnet).address_from_public_key(&public).unwrap();
        assert!(dash_testnet.starts_with('y'));
        let testnet =
            P2pkhEncoder::new(Network::BitcoinTestnet).address_from_public_key(&public).unwrap();
        assert!(testnet.starts_with('m') || testnet.starts_with('n'));
    }

    #[test]
    fn test_rejects_bad_public_key_encoding() {
        let encoder = P2pkhEncoder::default();
        assert_matches!(encoder.address_from_public_key(&[0x02; 32]), Err(Error::InvalidInput(_)));
        assert_matches!(encoder.address_from_public_key(&[0x04; 33]), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("1Jq6MksXQVWzrznvZzxkV6oY57oWXD9TXB").is_ok());
        assert!(validate_address("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_ok());
        assert_matches!(validate_address(""), Err(Error::InvalidInput(_)));
        assert_matches!(validate_address("1Jq6Mks XQVWzrzn"), Err(Error::InvalidInput(_)));
        assert_matches!(validate_address("1Jq6Mks\n"), Err(Error::InvalidInput(_)));
        assert_matches!(validate_address("адрес"), Err(Error::InvalidInput(_)));
    }
}
