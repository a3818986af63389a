//! scrypt key derivation and the derivedhalf1/derivedhalf2 split

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::ScryptParams;
use crate::error::{Error, Result};

/// Run scrypt producing exactly `N` bytes
pub fn scrypt_derive<const N: usize>(
    password: &[u8],
    salt: &[u8],
    params: &ScryptParams,
) -> Result<Zeroizing<[u8; N]>> {
    let scrypt_params = params.to_scrypt_params(N)?;
    tracing::trace!(n = ?params.n(), r = params.r, p = params.p, len = N, "running scrypt");

    let mut output = Zeroizing::new([0u8; N]);
    scrypt::scrypt(password, salt, &scrypt_params, &mut output[..])
        .map_err(|e| Error::crypto(format!("scrypt derivation failed: {}", e)))?;
    Ok(output)
}

/// The 64-byte scrypt output split in two
///
/// `half1` is XORed into the plaintext, `half2` keys the block cipher.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedHalves {
    half1: [u8; 32],
    half2: [u8; 32],
}

impl DerivedHalves {
    /// Derive both halves from one 64-byte scrypt run
    pub fn derive(password: &[u8], salt: &[u8], params: &ScryptParams) -> Result<Self> {
        let key = scrypt_derive::<64>(password, salt, params)?;
        let mut half1 = [0u8; 32];
        let mut half2 = [0u8; 32];
        half1.copy_from_slice(&key[..32]);
        half2.copy_from_slice(&key[32..]);
        Ok(Self {
            half1,
            half2,
        })
    }

    /// XOR material
    pub fn half1(&self) -> &[u8; 32] {
        &self.half1
    }

    /// Cipher key
    pub fn half2(&self) -> &[u8; 32] {
        &self.half2
    }
}

impl core::fmt::Debug for DerivedHalves {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DerivedHalves")
            .field("half1", &"[REDACTED]")
            .field("half2", &"[REDACTED]")
            .finish()
    }
}
