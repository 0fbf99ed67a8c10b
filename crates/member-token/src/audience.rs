//! Dot-delimited audience matching with `*` segment wildcards.

use crate::TokenError;

/// Segment that matches any value on the other side.
pub const WILDCARD: &str = "*";

/// Check that a token audience covers the required audience.
///
/// Both sides are split on `.` and must have the same number of segments.
/// A `*` on either side matches that segment; any other difference fails.
///
/// ```
/// use member_token::match_audience;
///
/// assert!(match_audience("*.example.com", "api.example.com").is_ok());
/// assert!(match_audience("a.b", "a").is_err());
/// ```
pub fn match_audience(token_audience: &str, required: &str) -> Result<(), TokenError> {
    let mismatch = || TokenError::AudienceMismatch {
        token: token_audience.to_string(),
        required: required.to_string(),
    };

    let token_segments: Vec<&str> = token_audience.split('.').collect();
    let required_segments: Vec<&str> = required.split('.').collect();
    if token_segments.len() != required_segments.len() {
        return Err(mismatch());
    }

    for (have, want) in token_segments.iter().zip(&required_segments) {
        if *have == WILDCARD || *want == WILDCARD {
            continue;
        }
        if have != want {
            return Err(mismatch());
        }
    }

    Ok(())
}
