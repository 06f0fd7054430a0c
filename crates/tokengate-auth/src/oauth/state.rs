//! Anti-CSRF state values.
//!
//! A fresh random value is set as the `state` cookie when login begins and
//! sent to the provider as the `state` parameter. The callback is accepted
//! only when both are present and byte-for-byte equal.

use axum_extra::extract::CookieJar;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::cookies::STATE_COOKIE;
use crate::{AuthError, AuthResult};

/// Generates a 128-bit random state value, base64url encoded.
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Checks the request's `state` cookie against the callback parameter.
///
/// # Errors
/// - `NoStateCookie` if the cookie is absent or empty
/// - `InvalidStateCookie` if the values differ or the parameter is missing
pub fn verify_state(jar: &CookieJar, param: Option<&str>) -> AuthResult<()> {
    let cookie = jar
        .get(STATE_COOKIE)
        .filter(|cookie| !cookie.value().is_empty())
        .ok_or(AuthError::NoStateCookie)?;

    match param {
        Some(param) if param == cookie.value() => Ok(()),
        _ => Err(AuthError::InvalidStateCookie),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookie::Cookie;

    fn jar_with_state(value: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(STATE_COOKIE, value.to_string()))
    }

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), 22);
        assert_ne!(state, generate_state());
    }

    #[test]
    fn test_matching_state() {
        let jar = jar_with_state("abc");
        assert!(verify_state(&jar, Some("abc")).is_ok());
    }

    #[test]
    fn test_missing_cookie() {
        let err = verify_state(&CookieJar::new(), Some("abc")).unwrap_err();
        assert!(matches!(err, AuthError::NoStateCookie));
    }

    #[test]
    fn test_empty_cookie_counts_as_missing() {
        let jar = jar_with_state("");
        assert!(matches!(
            verify_state(&jar, Some("")),
            Err(AuthError::NoStateCookie)
        ));
    }

    #[test]
    fn test_mismatched_state() {
        let jar = jar_with_state("abc");
        for param in [Some("abd"), Some("ABC"), Some("abc "), Some(""), None] {
            assert!(matches!(
                verify_state(&jar, param),
                Err(AuthError::InvalidStateCookie)
            ));
        }
    }
}
