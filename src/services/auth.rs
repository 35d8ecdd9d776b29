use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Caller;

/// Errors that can occur while authenticating a request
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token format")]
    MalformedHeader,

    #[error("Token invalid")]
    InvalidToken,

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims carried by caller tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub id: String,
    /// Expiry as seconds since the epoch
    pub exp: usize,
}

/// Verifies HS256 bearer tokens and turns them into a `Caller`
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Verify an `Authorization` header value of the form `Bearer <jwt>`.
    /// The scheme is matched case-insensitively.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Caller, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let mut parts = header.split_whitespace();

        let token = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => token,
            _ => return Err(AuthError::MalformedHeader),
        };

        self.verify(token)
    }

    pub fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        let user_id = Uuid::parse_str(&data.claims.id).map_err(|_| AuthError::InvalidToken)?;
        Ok(Caller::new(user_id))
    }

    /// Mint a token for `user_id` valid for `ttl_secs`
    pub fn issue(&self, user_id: Uuid, ttl_secs: i64) -> Result<String, AuthError> {
        let exp = chrono::Utc::now().timestamp() + ttl_secs;
        let claims = Claims {
            id: user_id.to_string(),
            exp: exp.max(0) as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let verifier = TokenVerifier::new("secret");
        let user = Uuid::new_v4();
        let token = verifier.issue(user, 3600).unwrap();

        let caller = verifier
            .verify_header(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(caller.user_id, user);
    }

    #[test]
    fn test_header_errors() {
        let verifier = TokenVerifier::new("secret");
        assert!(matches!(verifier.verify_header(None), Err(AuthError::MissingToken)));
        assert!(matches!(
            verifier.verify_header(Some("Bearer ")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            verifier.verify_header(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            verifier.verify_header(Some("Bearer not.a.jwt")),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let verifier = TokenVerifier::new("secret");
        let user = Uuid::new_v4();
        let token = verifier.issue(user, 3600).unwrap();

        for scheme in ["bearer", "BEARER", "Bearer"] {
            let caller = verifier
                .verify_header(Some(&format!("{}  {}", scheme, token)))
                .unwrap();
            assert_eq!(caller.user_id, user);
        }
    }

    #[test]
    fn test_rejects_foreign_signature_and_expiry() {
        let ours = TokenVerifier::new("secret");
        let theirs = TokenVerifier::new("other-secret");
        let user = Uuid::new_v4();

        let forged = theirs.issue(user, 3600).unwrap();
        assert!(matches!(ours.verify(&forged), Err(AuthError::InvalidToken)));

        let expired = ours.issue(user, -3600).unwrap();
        assert!(matches!(ours.verify(&expired), Err(AuthError::InvalidToken)));
    }
}
