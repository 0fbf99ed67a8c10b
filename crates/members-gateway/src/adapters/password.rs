//! Argon2id password hashing.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use std::sync::LazyLock;

/// Verified in place of a missing or unreadable credential.
static DECOY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash("decoy-credential").ok());

#[cfg(test)]
thread_local! {
    static VERIFICATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Argon2 verifications run on this thread so far.
#[cfg(test)]
pub(crate) fn verifications() -> usize {
    VERIFICATIONS.with(|count| count.get())
}

fn salt() -> Result<SaltString, argon2::password_hash::Error> {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    SaltString::encode_b64(&bytes)
}

/// PHC-format hash of `password` with a fresh random salt.
pub fn hash(password: &str) -> Result<String, argon2::password_hash::Error> {
    Argon2::default()
        .hash_password(password.as_bytes(), &salt()?)
        .map(|h| h.to_string())
}

/// Constant-time check of `password` against a stored PHC hash.
/// Unparsable hashes never verify.
pub fn verify(password: &str, hashword: &str) -> bool {
    PasswordHash::new(hashword)
        .map(|parsed| check(password, &parsed))
        .unwrap_or(false)
}

/// Like [`verify`], but a missing or unparsable `stored` hash still costs one
/// full argon2 verification (against the decoy) before returning `false`.
pub fn verify_or_decoy(password: &str, stored: Option<&str>) -> bool {
    match stored.and_then(|h| PasswordHash::new(h).ok()) {
        Some(parsed) => check(password, &parsed),
        None => {
            if let Some(decoy) = DECOY_HASH.as_deref().and_then(|h| PasswordHash::new(h).ok()) {
                check(password, &decoy);
            }
            false
        }
    }
}

fn check(password: &str, parsed: &PasswordHash<'_>) -> bool {
    #[cfg(test)]
    VERIFICATIONS.with(|count| count.set(count.get() + 1));

    Argon2::default()
        .verify_password(password.as_bytes(), parsed)
        .is_ok()
}
