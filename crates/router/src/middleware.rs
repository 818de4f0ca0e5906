//! Credential -> [`AuthorizationContext`] resolution contract.

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use tollgate_auth::AuthorizationContext;

/// Resolves the authorization context for an inbound request.
///
/// Never fails: an absent or invalid credential is the anonymous context.
#[async_trait]
pub trait AuthMiddleware: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> AuthorizationContext;
}

/// Treats every request as anonymous.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousMiddleware;

#[async_trait]
impl AuthMiddleware for AnonymousMiddleware {
    async fn resolve(&self, _headers: &HeaderMap) -> AuthorizationContext {
        AuthorizationContext::anonymous()
    }
}

/// Token from an `Authorization: Bearer <token>` header, if well-formed.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    (!token.is_empty()).then_some(token)
}

/// Value of cookie `name` across all `Cookie` headers, if present.
pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_requires_scheme_and_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));
    }

    #[test]
    fn cookie_is_found_among_several() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
        headers.append(header::COOKIE, HeaderValue::from_static("session=tok123"));

        assert_eq!(extract_cookie(&headers, "session"), Some("tok123"));
        assert_eq!(extract_cookie(&headers, "lang"), Some("en"));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }
}
