//! Secret comparison helpers

use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Compare a presented credential against the configured one.
///
/// No configured secret means nothing is accepted.
pub fn secret_matches(presented: Option<&str>, configured: Option<&str>) -> bool {
    match (presented, configured) {
        (Some(p), Some(c)) => constant_time_eq(p, c),
        _ => false,
    }
}
