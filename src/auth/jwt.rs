//! HS256 application tokens.
//!
//! After a Supabase access token is verified, the gateway issues its own
//! short-lived JWT carrying the user's id, email and role. Protected routes
//! verify that token locally without calling Supabase again.

use crate::integrations::AuthUser;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default token lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no token provided")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Claims carried by an application token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtIssuer {
    pub fn new(secret: &str, ttl: Duration) -> anyhow::Result<Self> {
        if secret.is_empty() {
            anyhow::bail!("JWT secret cannot be empty");
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Sign a token for `user`, valid for the configured TTL.
    pub fn issue(&self, user: &AuthUser) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Extract bearer token from Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::supabase::UserMetadata;
    use axum::http::HeaderValue;

    fn user() -> AuthUser {
        AuthUser {
            id: "u-1".into(),
            email: Some("dev@example.com".into()),
            role: Some("authenticated".into()),
            user_metadata: UserMetadata::default(),
        }
    }

    fn issuer() -> JwtIssuer {
        JwtIssuer::new("test-secret", Duration::from_secs(DEFAULT_TOKEN_TTL_SECS)).unwrap()
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(JwtIssuer::new("", Duration::from_secs(60)).is_err());
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = issuer();
        let token = issuer.issue(&user()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.id, "u-1");
        assert_eq!(claims.email.as_deref(), Some("dev@example.com"));
        assert_eq!(claims.role.as_deref(), Some("authenticated"));
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_SECS as i64);
    }

    #[test]
    fn token_from_other_secret_rejected() {
        let other = JwtIssuer::new("other-secret", Duration::from_secs(60)).unwrap();
        let token = other.issue(&user()).unwrap();
        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_rejected() {
        let issuer = issuer();
        let now = chrono::Utc::now().timestamp();
        let token = issuer
            .sign(&Claims {
                id: "u-1".into(),
                email: None,
                role: None,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn garbage_and_empty_tokens() {
        let issuer = issuer();
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(issuer.verify(""), Err(AuthError::MissingToken)));
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
