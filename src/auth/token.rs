use crate::error::AppError;
use crate::models::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifetime of tokens minted at login unless `TOKEN_TTL_HOURS` overrides it.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    /// Role of the user when the token was minted.
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Absolute expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Identity asserted by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug)]
pub enum TokenError {
    /// Malformed, wrongly signed or expired token.
    InvalidToken(String),
    /// The signing key is unusable; authenticated routes cannot be served.
    Misconfigured(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            TokenError::Misconfigured(msg) => write!(f, "Token signing misconfigured: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::InvalidToken(_) => AppError::Unauthenticated(error.to_string()),
            TokenError::Misconfigured(_) => AppError::InternalError(error.to_string()),
        }
    }
}

/// Signs and verifies session tokens with the single process-wide secret.
///
/// Verification is stateless: it needs only the token and the secret, never
/// the credential store.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::Misconfigured("secret is empty".into()));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Mints a token for `user_id` valid for `ttl` from now.
    pub fn issue(&self, user_id: Uuid, role: Role, ttl: Duration) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            iat,
            exp: iat + ttl.num_seconds(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Misconfigured(e.to_string()))
    }

    /// Checks signature and expiry and returns the asserted identity.
    /// A token is rejected from the second its `exp` is reached.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::InvalidToken(format!("{:?}", e.kind())))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::InvalidToken("ExpiredSignature".into()));
        }

        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test_secret_for_gen_verify").unwrap()
    }

    #[test]
    fn test_token_generation_and_verification() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec
            .issue(user_id, Role::Admin, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
            .unwrap();
        let identity = codec.verify(&token).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_token_expiration() {
        let codec = codec();

        // Expiry equal to issue time: rejected at the expiry instant.
        let token = codec.issue(Uuid::new_v4(), Role::User, Duration::zero()).unwrap();
        match codec.verify(&token) {
            Err(TokenError::InvalidToken(msg)) => assert!(msg.contains("ExpiredSignature")),
            other => panic!("expected expired token, got {:?}", other),
        }

        let token = codec.issue(Uuid::new_v4(), Role::User, Duration::hours(-2)).unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = codec()
            .issue(Uuid::new_v4(), Role::User, Duration::hours(1))
            .unwrap();
        let other = TokenCodec::new("a_completely_different_secret").unwrap();

        match other.verify(&token) {
            Err(TokenError::InvalidToken(msg)) => assert!(msg.contains("InvalidSignature")),
            other => panic!("expected signature failure, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            codec().verify("not.a.token"),
            Err(TokenError::InvalidToken(_))
        ));
        assert!(matches!(codec().verify(""), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_empty_secret_is_misconfiguration() {
        assert!(matches!(TokenCodec::new("  "), Err(TokenError::Misconfigured(_))));
    }

    #[test]
    fn test_token_error_maps_to_app_error() {
        let err: AppError = TokenError::InvalidToken("x".into()).into();
        assert!(matches!(err, AppError::Unauthenticated(_)));
        let err: AppError = TokenError::Misconfigured("x".into()).into();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
