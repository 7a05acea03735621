//! Session token transport over the `SESSIONID` cookie.

use crate::auth::{AuthError, AuthFailure, Authenticator, SESSION_COOKIE_NAME};
use axum::http::{header, HeaderMap};
use tracing::debug;

/// `Set-Cookie` value carrying a new session token.
///
/// No `Max-Age`/`Expires`: the cookie lives for the browser session and
/// expiry is enforced server-side.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={token}; HttpOnly; Secure; Path=/")
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; HttpOnly; Secure; Path=/; Max-Age=0")
}

/// Extract the session token from the Cookie header(s).
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|part| {
            part.trim()
                .strip_prefix(SESSION_COOKIE_NAME)?
                .strip_prefix('=')
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
}

/// Validate the session carried by a request's cookies.
pub fn authenticate_request(
    auth: &dyn Authenticator,
    headers: &HeaderMap,
) -> Result<(), AuthError> {
    let Some(token) = extract_session_token(headers) else {
        debug!("Session rejected: {} token", AuthFailure::MissingToken.as_str());
        return Err(AuthError::Authentication(AuthFailure::MissingToken));
    };
    auth.validate_session(&token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cookies(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extract_among_other_cookies() {
        let headers = cookies("theme=dark; SESSIONID=abc123; lang=en");
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_missing_or_empty() {
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
        assert_eq!(extract_session_token(&cookies("theme=dark")), None);
        assert_eq!(extract_session_token(&cookies("SESSIONID=")), None);
        assert_eq!(extract_session_token(&cookies("SESSIONIDX=abc")), None);
    }

    #[test]
    fn test_extract_from_second_cookie_header() {
        let mut headers = cookies("theme=dark");
        headers.append(header::COOKIE, HeaderValue::from_static("SESSIONID=xyz"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok");
        assert!(cookie.starts_with("SESSIONID=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(!cookie.contains("Max-Age"));
        assert!(!cookie.contains("Expires"));

        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
