//! Optional bearer-token authentication.
//!
//! A valid token enriches the request with an [`Identity`]; a missing or bad
//! token leaves the request anonymous. Nothing in here ever rejects a request.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::app::AppState;

/// User id reported for requests without a usable token
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token carries no user id")]
    MissingSubject,
    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed(err.to_string()),
        }
    }
}

/// Identity carried by a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Ids are issued either as strings or as numeric database keys
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaimId {
    Text(String),
    Number(i64),
}

impl ClaimId {
    fn into_string(self) -> String {
        match self {
            ClaimId::Text(text) => text,
            ClaimId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(rename = "userId")]
    user_id: Option<ClaimId>,
    sub: Option<ClaimId>,
    email: Option<String>,
    role: Option<String>,
}

/// Verifies an HMAC-signed token and returns the identity it carries.
/// `exp` is checked when present but not required.
pub fn verify_token(token: &str, secret: &[u8]) -> Result<Identity, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.required_spec_claims.clear();
    validation.validate_exp = true;
    validation.leeway = 0;

    let claims = decode::<TokenClaims>(token, &key, &validation)?.claims;
    let user_id = claims
        .user_id
        .or(claims.sub)
        .map(ClaimId::into_string)
        .filter(|id| !id.is_empty())
        .ok_or(AuthError::MissingSubject)?;

    Ok(Identity {
        user_id,
        email: claims.email,
        role: claims.role,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the caller's identity from the `Authorization` header.
/// Returns `None` when there is no token, no secret, or verification fails.
pub fn resolve_identity(headers: &HeaderMap, secret: Option<&str>) -> Option<Identity> {
    let token = bearer_token(headers)?;
    let Some(secret) = secret else {
        debug!("Bearer token supplied but no JWT secret configured; treating as anonymous");
        return None;
    };

    match verify_token(token, secret.as_bytes()) {
        Ok(identity) => Some(identity),
        Err(e) => {
            debug!("Ignoring bearer token: {}", e);
            None
        }
    }
}

/// Middleware that attaches an [`Identity`] to the request when a valid
/// bearer token is present
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = resolve_identity(request.headers(), state.config.jwt_secret.as_deref())
    {
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Extractor for the identity resolved by [`optional_auth`]
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Identity>);

impl CurrentUser {
    pub fn user_id_or_anonymous(&self) -> String {
        self.0
            .as_ref()
            .map(|identity| identity.user_id.clone())
            .unwrap_or_else(|| ANONYMOUS.to_string())
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(parts.extensions.get::<Identity>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let exp = Utc::now().timestamp() + 3600;
        let token = sign(
            json!({ "userId": "u-1", "email": "a@b.c", "role": "seller", "exp": exp }),
            SECRET,
        );

        let identity = resolve_identity(&headers_with(&token), Some(SECRET)).unwrap();
        assert_eq!(identity.user_id, "u-1");
        assert_eq!(identity.email.as_deref(), Some("a@b.c"));
        assert_eq!(identity.role.as_deref(), Some("seller"));
    }

    #[test]
    fn test_numeric_user_id_and_missing_exp() {
        let token = sign(json!({ "userId": 42 }), SECRET);
        let identity = verify_token(&token, SECRET.as_bytes()).unwrap();
        assert_eq!(identity.user_id, "42");
    }

    #[test]
    fn test_sub_claim_fallback() {
        let token = sign(json!({ "sub": "subject-7" }), SECRET);
        let identity = verify_token(&token, SECRET.as_bytes()).unwrap();
        assert_eq!(identity.user_id, "subject-7");
    }

    #[test]
    fn test_expired_token() {
        let exp = Utc::now().timestamp() - 3600;
        let token = sign(json!({ "userId": "u-1", "exp": exp }), SECRET);

        assert!(matches!(
            verify_token(&token, SECRET.as_bytes()),
            Err(AuthError::Expired)
        ));
        assert!(resolve_identity(&headers_with(&token), Some(SECRET)).is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign(json!({ "userId": "u-1" }), "other-secret");
        assert!(matches!(
            verify_token(&token, SECRET.as_bytes()),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            verify_token("not.a.jwt", SECRET.as_bytes()),
            Err(AuthError::Malformed(_))
        ));
        assert!(resolve_identity(&headers_with("garbage"), Some(SECRET)).is_none());
    }

    #[test]
    fn test_token_without_user_id() {
        let token = sign(json!({ "email": "a@b.c" }), SECRET);
        assert!(matches!(
            verify_token(&token, SECRET.as_bytes()),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_missing_header_or_scheme() {
        assert!(resolve_identity(&HeaderMap::new(), Some(SECRET)).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(resolve_identity(&headers, Some(SECRET)).is_none());
    }

    #[test]
    fn test_no_secret_means_anonymous() {
        let token = sign(json!({ "userId": "u-1" }), SECRET);
        assert!(resolve_identity(&headers_with(&token), None).is_none());
    }

    #[test]
    fn test_current_user_fallback() {
        assert_eq!(CurrentUser::default().user_id_or_anonymous(), ANONYMOUS);
        let user = CurrentUser(Some(Identity {
            user_id: "u-9".into(),
            email: None,
            role: None,
        }));
        assert_eq!(user.user_id_or_anonymous(), "u-9");
    }
}
