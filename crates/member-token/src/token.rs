//! Compact token encoding: `base64url(header).base64url(payload).base64url(hmac)`.
//!
//! The header carries the random `pad` that feeds key derivation, so a token
//! can only be verified by someone holding the shared secret.

use crate::claims::{now_secs, ClaimPayload, RequiredClaims, SessionClaims};
use crate::key::SigningKey;
use crate::TokenError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

/// Signing algorithm advertised in the header.
pub const ALGORITHM: &str = "HS256";

/// Length of a generated header padding.
pub const PADDING_LEN: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pad: Option<String>,
}

/// Random alphanumeric header padding.
pub fn generate_padding() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PADDING_LEN)
        .map(char::from)
        .collect()
}

/// Sign `claims` with a key derived from `secret`.
///
/// # Errors
///
/// - `Validation` when the subject or secret is empty.
/// - `Signing` when serialization or HMAC fails.
pub fn issue(claims: &SessionClaims, secret: &str) -> Result<String, TokenError> {
    if claims.subject().is_empty() {
        return Err(TokenError::Validation("subject is empty".into()));
    }
    if secret.is_empty() {
        return Err(TokenError::Validation("secret is empty".into()));
    }

    let padding = claims
        .padding()
        .map(str::to_string)
        .unwrap_or_else(generate_padding);

    let header = TokenHeader {
        alg: ALGORITHM.to_string(),
        typ: Some("JWT".to_string()),
        pad: Some(padding.clone()),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|e| TokenError::Signing(e.to_string()))?;
    let payload_json =
        serde_json::to_vec(&claims.to_wire()).map_err(|e| TokenError::Signing(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload_json)
    );

    let key = SigningKey::derive(secret, claims.subject(), &padding);
    let signature = key.sign(signing_input.as_bytes())?;

    debug!(jti = claims.id(), sub = claims.subject(), exp = claims.expiration(), "Session token issued");
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Validate `token` against the current clock.
pub fn validate(
    token: &str,
    secret: &str,
    required: Option<&RequiredClaims>,
) -> Result<SessionClaims, TokenError> {
    validate_at(token, secret, required, now_secs())
}

/// Validate `token` as of `now` (seconds since epoch).
///
/// Checks run in this order: structure, signature, `exp`, `nbf`, then the
/// required claims. Audience wildcards, principal existence and account state
/// are the caller's business.
pub fn validate_at(
    token: &str,
    secret: &str,
    required: Option<&RequiredClaims>,
    now: u64,
) -> Result<SessionClaims, TokenError> {
    let (header_b64, payload_b64, signature_b64) = match token.split('.').collect::<Vec<_>>()[..] {
        [h, p, s] if !h.is_empty() && !p.is_empty() => (h, p, s),
        ref parts => {
            return Err(TokenError::Malformed(format!(
                "expected three segments, found {}",
                parts.len()
            )))
        }
    };

    let header: TokenHeader = decode_segment(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(TokenError::Malformed(format!("unsupported algorithm {}", header.alg)));
    }
    let payload: ClaimPayload = decode_segment(payload_b64, "payload")?;

    let subject = payload.sub.clone().unwrap_or_default();
    let padding = header.pad.unwrap_or_default();

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::BadSignature)?;
    let key = SigningKey::derive(secret, &subject, &padding);
    let signing_input_len = header_b64.len() + 1 + payload_b64.len();
    if !key.verify(&token.as_bytes()[..signing_input_len], &signature) {
        warn!(sub = %subject, "Session token signature mismatch");
        return Err(TokenError::BadSignature);
    }

    if subject.is_empty() {
        return Err(TokenError::MissingClaim("sub"));
    }
    let expiration = payload.exp.ok_or(TokenError::MissingClaim("exp"))?;
    if expiration <= now {
        return Err(TokenError::Expired { expired_at: expiration, now });
    }
    if payload.nbf.is_some_and(|nbf| nbf > now) {
        return Err(TokenError::IncorrectClaim("nbf"));
    }

    let claims = SessionClaims::from_wire(payload, subject, expiration, padding);
    if let Some(required) = required {
        check_required(&claims, required)?;
    }

    Ok(claims)
}

fn check_required(claims: &SessionClaims, required: &RequiredClaims) -> Result<(), TokenError> {
    for (name, expected, actual) in required.expectations(claims) {
        let Some(expected) = expected else { continue };
        if actual.is_empty() {
            return Err(TokenError::MissingClaim(name));
        }
        if actual != expected {
            return Err(TokenError::IncorrectClaim(name));
        }
    }
    Ok(())
}

fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{what}: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(format!("{what}: {e}")))
}
