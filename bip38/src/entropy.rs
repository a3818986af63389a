//! Injectable entropy source
//!
//! Ownersalt, random lot/sequence numbers and seedb are the only random inputs
//! of the engine. They are drawn through [`EntropySource`] so tests can swap in
//! a reproducible stream.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// A cryptographically secure byte source, shareable between threads
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely or fail; partial output must never be used
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()>;
}

impl<T: EntropySource + ?Sized> EntropySource for &T {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        (**self).fill_bytes(dest)
    }
}

/// Operating system randomness via `getrandom`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::crypto(format!("entropy source unavailable: {}", e)))
    }
}

/// Draw a fixed-size array from an entropy source
pub(crate) fn random_array<const N: usize>(entropy: &impl EntropySource) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    entropy.fill_bytes(&mut out)?;
    Ok(out)
}

#[cfg(any(test, feature = "test-utils"))]
pub use self::seeded::SeededEntropy;

#[cfg(any(test, feature = "test-utils"))]
mod seeded {
    use std::sync::Mutex;

    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::EntropySource;
    use crate::error::{Error, Result};

    /// Reproducible entropy for tests; never use it for real keys
    #[derive(Debug)]
    pub struct SeededEntropy {
        rng: Mutex<StdRng>,
    }

    impl SeededEntropy {
        /// Seed the stream
        pub fn new(seed: u64) -> Self {
            Self {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }
        }
    }

    impl EntropySource for SeededEntropy {
        fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
            let mut rng =
                self.rng.lock().map_err(|_| Error::crypto("seeded entropy lock poisoned"))?;
            rng.fill_bytes(dest);
            Ok(())
        }
    }
}
