use rand::RngCore;
use rand_core::OsRng;

use crate::error::CryptoError;

/// Generates `len` cryptographically secure random bytes.
///
/// Fails with [`CryptoError::EntropyUnavailable`] if the OS random source
/// cannot be read. The failure is surfaced, never substituted with weaker
/// entropy.
pub fn try_random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    Ok(buf)
}

/// Generates a fixed-size array of cryptographically secure random bytes.
pub fn try_random_bytes_fixed<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
    Ok(buf)
}
