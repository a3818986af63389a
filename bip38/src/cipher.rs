//! AES-256 on single 16-byte blocks, no chaining, no padding

use aes::Aes256;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray};

/// Size of one cipher block
pub const BLOCK_LEN: usize = 16;

/// AES-256 keyed with `derivedhalf2`
pub struct BlockCipher {
    inner: Aes256,
}

impl BlockCipher {
    /// Build the key schedule for a 32-byte key
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            inner: Aes256::new(GenericArray::from_slice(key)),
        }
    }

    /// Encrypt one block
    pub fn encrypt_block(&self, block: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
        let mut buf = GenericArray::clone_from_slice(block);
        self.inner.encrypt_block(&mut buf);
        let mut out = [0u8; BLOCK_LEN];
        out.copy_from_slice(&buf);
        out
    }

    /// Decrypt one block
    pub fn decrypt_block(&self, block: &[u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
        let mut buf = GenericArray::clone_from_slice(block);
        self.inner.decrypt_block(&mut buf);
        let mut out = [0u8; BLOCK_LEN];
        out.copy_from_slice(&buf);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fips197_aes256_vector() {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8;
        }
        let plaintext: [u8; 16] =
            hex::decode("00112233445566778899aabbccddeeff").unwrap().try_into().unwrap();
        let cipher = BlockCipher::new(&key);
        let ciphertext = cipher.encrypt_block(&plaintext);
        assert_eq!(hex::encode(ciphertext), "8ea2b7ca516745bfeafc49904b496089");
        assert_eq!(cipher.decrypt_block(&ciphertext), plaintext);
    }
}
