//! Bearer-token guard for the admin routes.
//!
//! The ID token is checked against the identity provider on every request.
//! On success the verified [`AdminUser`] and the raw [`IdToken`] are stored in
//! the request extensions; writes forward the token to the document store.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::ports::AdminUser;
use crate::server::state::AppState;
use crate::utils::error::{KyoError, Result};

pub const MISSING_TOKEN: &str = "Missing or invalid bearer token.";

/// The caller's ID token.
#[derive(Debug, Clone)]
pub struct IdToken(pub String);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .ok_or_else(|| KyoError::unauthorized(MISSING_TOKEN))?;

    let user: AdminUser = state.identity.verify(&token).await.map_err(|e| {
        tracing::warn!("🔒 Authentication failed: {}", e);
        e
    })?;
    tracing::debug!("🔓 {} authorized for {}", user.email, request.uri().path());

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(IdToken(token));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer   abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
