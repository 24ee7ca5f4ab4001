//! Bearer tokens
//!
//! HS256-signed claim sets shared by both services.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub user_id: String,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl UserClaims {
    pub fn new(user_id: Uuid, is_private: bool) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_private,
            iat: None,
            exp: None,
        }
    }
}

/// Token errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("{0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Signature is fine but the subject names no user
    #[error("unknown token subject: {0}")]
    UnknownSubject(String),
}

/// Signs and verifies bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    validation: Arc<Validation>,
    ttl_secs: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not required
        validation.required_spec_claims.clear();

        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
            ttl_secs,
        }
    }

    /// Sign a token for the given user
    pub fn issue(&self, user_id: Uuid, is_private: bool) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = UserClaims {
            iat: Some(now),
            exp: Some(now + self.ttl_secs),
            ..UserClaims::new(user_id, is_private)
        };
        self.sign(&claims)
    }

    /// Sign an arbitrary claim set
    pub fn sign(&self, claims: &UserClaims) -> Result<String, TokenError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    /// Verify the signature and decode the claims
    pub fn verify(&self, token: &str) -> Result<UserClaims, TokenError> {
        let data = decode::<UserClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// Returns `Ok(None)` when the header is absent.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<&str>, TokenError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| TokenError::MalformedHeader)?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(TokenError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("secret", 60);
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id, true).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.user_id, user_id.to_string());
        assert!(claims.is_private);
        assert!(claims.exp.is_some());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new("secret", 60);
        let verifier = TokenService::new("another-secret", 60);

        let token = issuer.issue(Uuid::new_v4(), false).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_token_without_exp_accepted() {
        let tokens = TokenService::new("secret", 60);
        let token = tokens.sign(&UserClaims::new(Uuid::new_v4(), false)).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret", 60);
        let claims = UserClaims {
            exp: Some(1_000),
            ..UserClaims::new(Uuid::new_v4(), false)
        };
        let token = tokens.sign(&claims).unwrap();

        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = TokenService::new("secret", 60);
        assert!(tokens.verify("not-a-token").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).unwrap().is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, "abc.def.ghi".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_err());
    }
}
