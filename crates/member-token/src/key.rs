//! # Signing Key Derivation
//!
//! Every token is signed with its own 32-byte HMAC key:
//!
//! 1. Start from 32 zero bytes.
//! 2. Copy the shared secret in (truncated, or left zero-padded).
//! 3. XOR the subject bytes in positionally (first 32 bytes only).
//! 4. XOR the header padding in cyclically across all 32 bytes.
//!
//! The key only lives for one issue or validate call and is zeroed on drop.

use crate::TokenError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// HMAC-SHA256 output length in bytes.
pub const SIGNATURE_LEN: usize = 32;

/// Transient per-token signing key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningKey([u8; KEY_LEN]);

impl SigningKey {
    /// Derive the key for `subject` and `padding` from the shared secret.
    pub fn derive(secret: &str, subject: &str, padding: &str) -> Self {
        let mut bytes = [0u8; KEY_LEN];

        for (slot, b) in bytes.iter_mut().zip(secret.as_bytes()) {
            *slot = *b;
        }
        for (slot, b) in bytes.iter_mut().zip(subject.as_bytes()) {
            *slot ^= *b;
        }

        let pad = padding.as_bytes();
        if !pad.is_empty() {
            for (i, slot) in bytes.iter_mut().enumerate() {
                *slot ^= pad[i % pad.len()];
            }
        }

        Self(bytes)
    }

    /// HMAC-SHA256 over `message`.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], TokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        mac.update(message);

        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }

    /// Constant-time signature check.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = match HmacSha256::new_from_slice(&self.0) {
            Ok(m) => m,
            Err(_) => return false,
        };
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}
