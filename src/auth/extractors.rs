use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
};

use crate::auth::dto::UserInfo;
use crate::auth::service;
use crate::state::AppState;

/// Name of the HttpOnly session cookie.
pub const SESSION_COOKIE: &str = "poker_session";

/// Pulls the session token out of the request: the cookie wins, the
/// Authorization bearer header is the fallback.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        for part in cookie_header.split(';') {
            if let Some(value) = part.trim().strip_prefix(SESSION_COOKIE) {
                if let Some(token) = value.strip_prefix('=') {
                    return Some(token.to_string());
                }
            }
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Client address for rate limiting and audit: first X-Forwarded-For hop,
/// then X-Real-IP.
pub fn client_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Validates (and renews) the session carried by the request and hands the
/// authenticated user to the handler.
pub struct SessionUser(pub UserInfo);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token_from_headers(&parts.headers)
            .ok_or((StatusCode::UNAUTHORIZED, "missing session token".to_string()))?;

        let validation = service::validate_session(&state.db, &state.config.auth, &token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session validation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            })?;

        match validation.user {
            Some(user) if validation.is_valid => Ok(SessionUser(user)),
            _ => Err((StatusCode::UNAUTHORIZED, "invalid or expired session".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                axum::http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn token_comes_from_cookie() {
        let h = headers(&[("cookie", "poker_session=abc-123; theme=dark")]);
        assert_eq!(session_token_from_headers(&h).as_deref(), Some("abc-123"));
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let h = headers(&[
            ("cookie", "poker_session=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(
            session_token_from_headers(&h).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn bearer_is_the_fallback() {
        let h = headers(&[("authorization", "Bearer tok")]);
        assert_eq!(session_token_from_headers(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn unrelated_cookies_yield_nothing() {
        let h = headers(&[("cookie", "theme=dark; other=1")]);
        assert_eq!(session_token_from_headers(&h), None);
    }

    #[test]
    fn forwarded_for_first_hop_wins() {
        let h = headers(&[
            ("x-forwarded-for", " 10.0.0.1 , 172.16.0.9"),
            ("x-real-ip", "192.168.1.1"),
        ]);
        assert_eq!(client_ip_from_headers(&h).as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let h = headers(&[("x-real-ip", "192.168.1.1")]);
        assert_eq!(client_ip_from_headers(&h).as_deref(), Some("192.168.1.1"));
    }

    #[test]
    fn no_ip_headers_means_unknown() {
        assert_eq!(client_ip_from_headers(&HeaderMap::new()), None);
    }
}
